use actix_web::{web, HttpResponse, Responder};
use validator::Validate;

use crate::models::{
    ErrorResponse, GeoCoordinate, LocationResponse, UpdateLocationRequest, UserLocation,
};
use crate::routes::AppState;
use crate::services::{CacheKey, CachedLocation};

/// Configure location routes
pub fn configure(cfg: &mut web::ServiceConfig) {
    cfg.route("/locations", web::put().to(update_location));
}

/// Submit or update the caller's location
///
/// PUT /api/v1/locations
///
/// Request body:
/// ```json
/// {
///   "userId": "string",
///   "latitude": 40.7128,
///   "longitude": -74.0060
/// }
/// ```
///
/// The response carries the derived privacy cell; the coordinate is stored
/// but never echoed back.
async fn update_location(
    state: web::Data<AppState>,
    req: web::Json<UpdateLocationRequest>,
) -> impl Responder {
    if let Err(errors) = req.validate() {
        tracing::info!("Validation failed for update_location request: {:?}", errors);
        return HttpResponse::BadRequest().json(ErrorResponse {
            error: "Validation failed".to_string(),
            message: errors.to_string(),
            status_code: 400,
        });
    }

    // The domain type re-checks ranges and refuses to clamp
    let coordinate = match GeoCoordinate::new(req.latitude, req.longitude) {
        Ok(coordinate) => coordinate,
        Err(e) => {
            return HttpResponse::BadRequest().json(ErrorResponse {
                error: "Invalid coordinate".to_string(),
                message: e.to_string(),
                status_code: 400,
            });
        }
    };

    // Cell and coordinate are derived together here and written together below
    let location =
        match UserLocation::new(req.user_id.clone(), coordinate, state.resolver.indexer()) {
            Ok(location) => location,
            Err(e) => {
                return HttpResponse::BadRequest().json(ErrorResponse {
                    error: "Invalid coordinate".to_string(),
                    message: e.to_string(),
                    status_code: 400,
                });
            }
        };

    if let Err(e) = state.store.upsert_location(&location).await {
        tracing::error!("Failed to store location for {}: {}", req.user_id, e);
        return HttpResponse::InternalServerError().json(ErrorResponse {
            error: "Failed to store location".to_string(),
            message: e.to_string(),
            status_code: 500,
        });
    }

    // Refresh the cache with the new snapshot
    let key = CacheKey::location(&req.user_id);
    if let Err(e) = state
        .cache
        .set(&key, &CachedLocation::from(&location))
        .await
    {
        tracing::warn!("Failed to refresh location cache for {}: {}", req.user_id, e);
    }

    tracing::info!(
        "Updated location for {} (cell {})",
        req.user_id,
        location.cell()
    );

    HttpResponse::Ok().json(LocationResponse {
        user_id: location.owner_id.clone(),
        cell: *location.cell(),
        updated_at: location.updated_at,
    })
}
