//! TravelMate Common Types
//!
//! Wire types shared by the backend and its clients.

pub mod trip;
pub mod user;

pub use trip::{
    BulkDeleteRequest, BulkDeleteResponse, BulkUpdateRequest, BulkUpdateResponse, ResetResponse,
    SearchQuery, Trip, TripInput, TripPatch,
};
pub use user::{
    LoginRequest, MessageResponse, RegisterRequest, TokenResponse, UpdateUserRequest,
    UpdateUserResponse, UserProfile,
};
