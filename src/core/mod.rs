// Core algorithm exports
pub mod cell;
pub mod distance;
pub mod error;
pub mod matcher;
pub mod resolver;

pub use cell::{
    CellIndexer, DEFAULT_PROXIMITY_RADIUS_METERS, DEFAULT_RESOLUTION, DEFAULT_RING_SIZE,
};
pub use distance::{haversine_distance_meters, EARTH_RADIUS_METERS};
pub use error::GeoError;
pub use matcher::{MatchResult, NearbyMatcher};
pub use resolver::{ProximityConfig, ProximityResolver};
