// Route exports
pub mod locations;
pub mod matches;

use actix_web::web;
use std::sync::Arc;

use crate::core::{NearbyMatcher, ProximityResolver};
use crate::services::{CacheManager, LocationStore};

/// Application state shared across all handlers
#[derive(Clone)]
pub struct AppState {
    pub store: Arc<LocationStore>,
    pub cache: Arc<CacheManager>,
    pub resolver: ProximityResolver,
    pub matcher: NearbyMatcher,
}

pub fn configure_routes(cfg: &mut web::ServiceConfig) {
    cfg.service(
        web::scope("/api/v1")
            .configure(locations::configure)
            .configure(matches::configure),
    );
}
