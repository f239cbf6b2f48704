use serde::Serialize;

use crate::models::domain::{MatchStatus, NearbyCandidate, SpatialCell};

/// Response after a location submission
///
/// Deliberately carries only the privacy cell, not the coordinate.
#[derive(Debug, Clone, Serialize)]
pub struct LocationResponse {
    #[serde(rename = "userId")]
    pub user_id: String,
    pub cell: SpatialCell,
    #[serde(rename = "updatedAt")]
    pub updated_at: chrono::DateTime<chrono::Utc>,
}

/// Response for the proximity check endpoint
#[derive(Debug, Clone, Serialize)]
pub struct ProximityCheckResponse {
    #[serde(rename = "withinRadius")]
    pub within_radius: bool,
    #[serde(rename = "distanceMeters")]
    pub distance_meters: Option<f64>,
}

/// Response after creating a match request
#[derive(Debug, Clone, Serialize)]
pub struct MatchRequestResponse {
    #[serde(rename = "matchId")]
    pub match_id: uuid::Uuid,
    pub status: MatchStatus,
    #[serde(rename = "distanceMeters")]
    pub distance_meters: Option<f64>,
}

/// Response for the nearby candidates endpoint
#[derive(Debug, Clone, Serialize)]
pub struct FindNearbyResponse {
    pub matches: Vec<NearbyCandidate>,
    #[serde(rename = "totalCandidates")]
    pub total_candidates: usize,
}

/// Health check response
#[derive(Debug, Clone, Serialize)]
pub struct HealthResponse {
    pub status: String,
    pub version: String,
    pub timestamp: chrono::DateTime<chrono::Utc>,
}

/// Error response
#[derive(Debug, Clone, Serialize)]
pub struct ErrorResponse {
    pub error: String,
    pub message: String,
    pub status_code: u16,
}
