use actix_web::{web, HttpResponse, Responder};
use validator::Validate;

use crate::models::{
    CheckProximityRequest, CreateMatchRequest, ErrorResponse, FindNearbyRequest,
    FindNearbyResponse, HealthResponse, MatchRequestResponse, MatchStatus,
    ProximityCheckResponse, UserLocation,
};
use crate::routes::AppState;
use crate::services::{CacheKey, CachedLocation, StoreError};

/// Configure all match-related routes
pub fn configure(cfg: &mut web::ServiceConfig) {
    cfg.route("/health", web::get().to(health_check))
        .route("/matches/check", web::post().to(check_proximity))
        .route("/matches/request", web::post().to(request_match))
        .route("/matches/nearby", web::post().to(find_nearby))
        .route("/matches/incoming", web::get().to(incoming_requests));
}

/// Health check endpoint
async fn health_check(state: web::Data<AppState>) -> impl Responder {
    let pg_healthy = state.store.health_check().await.unwrap_or(false);

    let status = if pg_healthy { "healthy" } else { "degraded" };

    HttpResponse::Ok().json(HealthResponse {
        status: status.to_string(),
        version: env!("CARGO_PKG_VERSION").to_string(),
        timestamp: chrono::Utc::now(),
    })
}

/// Load a stored location, cache first
async fn load_location(
    state: &AppState,
    user_id: &str,
) -> Result<Option<UserLocation>, StoreError> {
    let key = CacheKey::location(user_id);

    if let Ok(cached) = state.cache.get::<CachedLocation>(&key).await {
        match cached.into_location() {
            Ok(location) => return Ok(Some(location)),
            Err(e) => {
                tracing::warn!("Discarding corrupt cache entry for {}: {}", user_id, e);
            }
        }
    }

    let location = state.store.get_location(user_id).await?;

    if let Some(ref location) = location {
        if let Err(e) = state
            .cache
            .set(&key, &CachedLocation::from(location))
            .await
        {
            tracing::warn!("Failed to cache location for {}: {}", user_id, e);
        }
    }

    Ok(location)
}

fn location_missing(user_id: &str) -> HttpResponse {
    HttpResponse::NotFound().json(ErrorResponse {
        error: "Location not found".to_string(),
        message: format!("No stored location for user {}", user_id),
        status_code: 404,
    })
}

fn store_failure(context: &str, e: StoreError) -> HttpResponse {
    tracing::error!("{}: {}", context, e);
    HttpResponse::InternalServerError().json(ErrorResponse {
        error: context.to_string(),
        message: e.to_string(),
        status_code: 500,
    })
}

/// Check whether two users are within matching radius
///
/// POST /api/v1/matches/check
///
/// Request body:
/// ```json
/// {
///   "requesterId": "string",
///   "targetId": "string"
/// }
/// ```
async fn check_proximity(
    state: web::Data<AppState>,
    req: web::Json<CheckProximityRequest>,
) -> impl Responder {
    if let Err(errors) = req.validate() {
        return HttpResponse::BadRequest().json(ErrorResponse {
            error: "Validation failed".to_string(),
            message: errors.to_string(),
            status_code: 400,
        });
    }

    let requester = match load_location(&state, &req.requester_id).await {
        Ok(Some(location)) => location,
        Ok(None) => return location_missing(&req.requester_id),
        Err(e) => return store_failure("Failed to fetch requester location", e),
    };

    let target = match load_location(&state, &req.target_id).await {
        Ok(Some(location)) => location,
        Ok(None) => return location_missing(&req.target_id),
        Err(e) => return store_failure("Failed to fetch target location", e),
    };

    let result = state.resolver.check_locations(&requester, &target);

    tracing::debug!(
        "Proximity check {} -> {}: within={} distance={:?}",
        req.requester_id,
        req.target_id,
        result.within_radius,
        result.distance_meters
    );

    HttpResponse::Ok().json(ProximityCheckResponse {
        within_radius: result.within_radius,
        distance_meters: result.distance_meters,
    })
}

/// Create a match request; the resolver decides its initial status
///
/// POST /api/v1/matches/request
///
/// Request body:
/// ```json
/// {
///   "requesterId": "string",
///   "targetId": "string"
/// }
/// ```
///
/// The request is recorded as `pending` when the pair is within radius and
/// `out_of_range` otherwise.
async fn request_match(
    state: web::Data<AppState>,
    req: web::Json<CreateMatchRequest>,
) -> impl Responder {
    if let Err(errors) = req.validate() {
        return HttpResponse::BadRequest().json(ErrorResponse {
            error: "Validation failed".to_string(),
            message: errors.to_string(),
            status_code: 400,
        });
    }

    if req.requester_id == req.target_id {
        return HttpResponse::BadRequest().json(ErrorResponse {
            error: "Invalid match request".to_string(),
            message: "A user cannot request a match with themselves".to_string(),
            status_code: 400,
        });
    }

    let requester = match load_location(&state, &req.requester_id).await {
        Ok(Some(location)) => location,
        Ok(None) => return location_missing(&req.requester_id),
        Err(e) => return store_failure("Failed to fetch requester location", e),
    };

    let target = match load_location(&state, &req.target_id).await {
        Ok(Some(location)) => location,
        Ok(None) => return location_missing(&req.target_id),
        Err(e) => return store_failure("Failed to fetch target location", e),
    };

    let result = state.resolver.check_locations(&requester, &target);

    let status = if result.within_radius {
        MatchStatus::Pending
    } else {
        MatchStatus::OutOfRange
    };

    let match_request = match state
        .store
        .create_match_request(
            &req.requester_id,
            &req.target_id,
            status,
            result.distance_meters,
        )
        .await
    {
        Ok(request) => request,
        Err(e) => return store_failure("Failed to record match request", e),
    };

    tracing::info!(
        "Match request {} -> {} recorded as {:?}",
        req.requester_id,
        req.target_id,
        status
    );

    HttpResponse::Ok().json(MatchRequestResponse {
        match_id: match_request.id,
        status: match_request.status,
        distance_meters: match_request.distance_meters,
    })
}

/// Find verified nearby candidates around the caller
///
/// POST /api/v1/matches/nearby
///
/// Request body:
/// ```json
/// {
///   "userId": "string",
///   "limit": 20
/// }
/// ```
async fn find_nearby(
    state: web::Data<AppState>,
    req: web::Json<FindNearbyRequest>,
) -> impl Responder {
    if let Err(errors) = req.validate() {
        return HttpResponse::BadRequest().json(ErrorResponse {
            error: "Validation failed".to_string(),
            message: errors.to_string(),
            status_code: 400,
        });
    }

    // Cap limit at 100 to prevent excessive queries
    let limit = req.limit.min(100) as usize;

    let origin = match load_location(&state, &req.user_id).await {
        Ok(Some(location)) => location,
        Ok(None) => return location_missing(&req.user_id),
        Err(e) => return store_failure("Failed to fetch user location", e),
    };

    // Coarse phase: the ring becomes an indexed cell-membership query.
    // Over-fetch so exact verification still has enough rows to rank.
    let ring = state.resolver.ring_of(origin.cell());
    let candidates = match state
        .store
        .candidates_in_cells(&ring, &req.user_id, limit * 5)
        .await
    {
        Ok(candidates) => candidates,
        Err(e) => return store_failure("Failed to query candidates", e),
    };

    let result = state.matcher.find_nearby(&origin, candidates, limit);

    tracing::info!(
        "Returning {} nearby candidates for {} (from {} in ring)",
        result.matches.len(),
        req.user_id,
        result.total_candidates
    );

    HttpResponse::Ok().json(FindNearbyResponse {
        matches: result.matches,
        total_candidates: result.total_candidates,
    })
}

/// List match requests targeting a user
///
/// GET /api/v1/matches/incoming?userId={userId}
async fn incoming_requests(
    state: web::Data<AppState>,
    query: web::Query<std::collections::HashMap<String, String>>,
) -> impl Responder {
    let user_id = match query.get("userId") {
        Some(id) => id,
        None => {
            return HttpResponse::BadRequest().json(ErrorResponse {
                error: "Missing userId parameter".to_string(),
                message: "userId query parameter is required".to_string(),
                status_code: 400,
            });
        }
    };

    match state.store.incoming_match_requests(user_id, 100).await {
        Ok(requests) => {
            let count = requests.len();
            HttpResponse::Ok().json(serde_json::json!({
                "userId": user_id,
                "requests": requests,
                "count": count,
            }))
        }
        Err(e) => store_failure("Failed to fetch match requests", e),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_health_check_response() {
        let response = HealthResponse {
            status: "healthy".to_string(),
            version: "0.1.0".to_string(),
            timestamp: chrono::Utc::now(),
        };

        assert_eq!(response.status, "healthy");
    }
}
