pub mod admin;
pub mod auth;
pub mod health;
pub mod trips;
pub mod users;

use crate::error::ApiError;

/// Ids are SQLite rowids, so anything above `i64::MAX` cannot exist.
const MAX_ID: u64 = i64::MAX as u64;

/// Parse a numeric path id, reporting junk as a validation error.
pub(crate) fn parse_id(raw: &str) -> Result<u64, ApiError> {
    raw.parse::<u64>()
        .ok()
        .filter(|id| *id <= MAX_ID)
        .ok_or_else(|| ApiError::Validation(format!("Invalid id: {}", raw)))
}

/// Reject body ids that no stored row could have.
pub(crate) fn check_ids(ids: &[u64]) -> Result<(), ApiError> {
    match ids.iter().find(|id| **id > MAX_ID) {
        Some(id) => Err(ApiError::Validation(format!("Invalid id: {}", id))),
        None => Ok(()),
    }
}
