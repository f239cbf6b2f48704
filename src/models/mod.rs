// Model exports
pub mod domain;
pub mod requests;
pub mod responses;

pub use domain::{
    GeoCoordinate, MatchRequest, MatchStatus, NearbyCandidate, ProximityResult, SpatialCell,
    UserLocation,
};
pub use requests::{
    CheckProximityRequest, CreateMatchRequest, FindNearbyRequest, UpdateLocationRequest,
};
pub use responses::{
    ErrorResponse, FindNearbyResponse, HealthResponse, LocationResponse, MatchRequestResponse,
    ProximityCheckResponse,
};
