//! Jobximity Algo - privacy-preserving proximity matching for the Jobximity hiring platform
//!
//! This library provides the core matching engine used by the Jobximity backend.
//! Exact coordinates are folded into coarse hexagonal privacy cells; matching
//! runs a cell-ring coarse filter followed by exact great-circle verification.

pub mod config;
pub mod core;
pub mod models;
pub mod routes;
pub mod services;

// Re-export commonly used types
pub use crate::core::{
    haversine_distance_meters, CellIndexer, GeoError, MatchResult, NearbyMatcher,
    ProximityConfig, ProximityResolver,
};
pub use crate::models::{
    GeoCoordinate, MatchStatus, NearbyCandidate, ProximityResult, SpatialCell, UserLocation,
};
