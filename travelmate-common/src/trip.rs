//! Trip records and the bodies used to create, change and search them.

use serde::{Deserialize, Serialize};

/// A stored trip, as returned to clients.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Trip {
    pub id: u64,
    pub title: String,
    pub description: String,
    pub location: String,
    pub start_date: String,
    pub end_date: String,
    pub longitude: f64,
    pub latitude: f64,
    pub notes: String,
    pub user_id: u64,
}

/// Body of `POST /trips` and `PUT /trips/:id`.
///
/// `id` and `userId` are accepted on input for client convenience but are
/// ignored: ids come from the store and the owner from the bearer token.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TripInput {
    #[serde(default)]
    pub title: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub location: String,
    #[serde(default)]
    pub start_date: String,
    #[serde(default)]
    pub end_date: String,
    #[serde(default)]
    pub longitude: f64,
    #[serde(default)]
    pub latitude: f64,
    #[serde(default)]
    pub notes: String,
}

/// Field changes applied by a bulk update. Only trip content can be changed
/// this way; unknown keys (including `id` and `userId`) are rejected.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct TripPatch {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub location: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub start_date: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub end_date: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub longitude: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub latitude: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub notes: Option<String>,
}

impl TripPatch {
    pub fn is_empty(&self) -> bool {
        self.title.is_none()
            && self.description.is_none()
            && self.location.is_none()
            && self.start_date.is_none()
            && self.end_date.is_none()
            && self.longitude.is_none()
            && self.latitude.is_none()
            && self.notes.is_none()
    }
}

/// Body of `PUT /trips`.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct BulkUpdateRequest {
    #[serde(default)]
    pub ids: Vec<u64>,
    #[serde(default)]
    pub update: TripPatch,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BulkUpdateResponse {
    pub message: String,
    pub updated: usize,
}

/// Body of `DELETE /trips`.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct BulkDeleteRequest {
    #[serde(default)]
    pub ids: Vec<u64>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BulkDeleteResponse {
    pub message: String,
    pub deleted: usize,
}

/// Query string of `GET /trips/search`.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct SearchQuery {
    #[serde(default)]
    pub query: Option<String>,
}

/// Returned by `POST /admin/reset`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ResetResponse {
    pub message: String,
    pub trips_deleted: usize,
    pub users_deleted: usize,
}
