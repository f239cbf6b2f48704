use std::collections::HashSet;
use std::time::Duration;

use sqlx::postgres::{PgPoolOptions, PgRow};
use sqlx::{PgPool, Row};
use thiserror::Error;
use uuid::Uuid;

use crate::core::error::GeoError;
use crate::models::{GeoCoordinate, MatchRequest, MatchStatus, SpatialCell, UserLocation};

/// Errors that can occur when interacting with the location store
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("SQLx error: {0}")]
    SqlxError(#[from] sqlx::Error),

    #[error("Migration error: {0}")]
    MigrateError(#[from] sqlx::migrate::MigrateError),

    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Corrupt row: {0}")]
    CorruptRow(#[from] GeoError),
}

/// PostgreSQL store for user locations and match requests
///
/// Locations are written coordinate-and-cell together through a single
/// upsert, and the `h3_cell` column is indexed so the coarse filter runs as
/// an `= ANY(...)` lookup instead of per-row geometry.
pub struct LocationStore {
    pool: PgPool,
}

impl LocationStore {
    /// Create a new store from a connection string
    pub async fn new(
        database_url: &str,
        max_connections: u32,
        min_connections: u32,
    ) -> Result<Self, StoreError> {
        let pool = PgPoolOptions::new()
            .max_connections(max_connections)
            .min_connections(min_connections)
            .acquire_timeout(Duration::from_secs(5))
            .idle_timeout(Duration::from_secs(600))
            .test_before_acquire(true)
            .connect(database_url)
            .await?;

        // Run migrations on startup
        sqlx::migrate!("./migrations").run(&pool).await?;

        Ok(Self { pool })
    }

    /// Create a new store from settings
    pub async fn from_settings(
        url: &str,
        max_connections: Option<u32>,
        min_connections: Option<u32>,
    ) -> Result<Self, StoreError> {
        Self::new(
            url,
            max_connections.unwrap_or(10),
            min_connections.unwrap_or(1),
        )
        .await
    }

    /// Insert or replace a user's location
    ///
    /// Coordinate, cell and timestamp always travel together; there is no
    /// statement that updates one of them alone.
    pub async fn upsert_location(&self, location: &UserLocation) -> Result<(), StoreError> {
        let query = r#"
            INSERT INTO user_location (user_id, h3_cell, latitude, longitude, updated_at)
            VALUES ($1, $2, $3, $4, $5)
            ON CONFLICT (user_id)
            DO UPDATE SET
                h3_cell = EXCLUDED.h3_cell,
                latitude = EXCLUDED.latitude,
                longitude = EXCLUDED.longitude,
                updated_at = EXCLUDED.updated_at
        "#;

        sqlx::query(query)
            .bind(&location.owner_id)
            .bind(location.cell().to_string())
            .bind(location.coordinate().latitude())
            .bind(location.coordinate().longitude())
            .bind(location.updated_at)
            .execute(&self.pool)
            .await?;

        tracing::debug!(
            "Stored location for {} in cell {}",
            location.owner_id,
            location.cell()
        );

        Ok(())
    }

    /// Fetch a user's stored location
    pub async fn get_location(&self, user_id: &str) -> Result<Option<UserLocation>, StoreError> {
        let query = r#"
            SELECT user_id, h3_cell, latitude, longitude, updated_at
            FROM user_location
            WHERE user_id = $1
        "#;

        let row = sqlx::query(query)
            .bind(user_id)
            .fetch_optional(&self.pool)
            .await?;

        row.map(|row| location_from_row(&row)).transpose()
    }

    /// Fetch candidate locations whose cell lies in the given set
    ///
    /// This is the indexed form of the coarse filter: membership in the
    /// requester's neighbor ring narrows the table before any exact
    /// geometry runs.
    pub async fn candidates_in_cells(
        &self,
        cells: &HashSet<SpatialCell>,
        exclude_user_id: &str,
        limit: usize,
    ) -> Result<Vec<UserLocation>, StoreError> {
        let tokens: Vec<String> = cells.iter().map(|cell| cell.to_string()).collect();

        let query = r#"
            SELECT user_id, h3_cell, latitude, longitude, updated_at
            FROM user_location
            WHERE h3_cell = ANY($1) AND user_id <> $2
            LIMIT $3
        "#;

        let rows = sqlx::query(query)
            .bind(&tokens)
            .bind(exclude_user_id)
            .bind(limit as i64)
            .fetch_all(&self.pool)
            .await?;

        let locations: Result<Vec<UserLocation>, StoreError> =
            rows.iter().map(location_from_row).collect();

        let locations = locations?;
        tracing::debug!(
            "Cell filter matched {} candidates across {} cells",
            locations.len(),
            tokens.len()
        );

        Ok(locations)
    }

    /// Record a match request with the status the resolver decided
    ///
    /// Re-requesting the same target refreshes the existing row, so a pair
    /// that moved into range gets a fresh `pending` status.
    pub async fn create_match_request(
        &self,
        requester_id: &str,
        target_id: &str,
        status: MatchStatus,
        distance_meters: Option<f64>,
    ) -> Result<MatchRequest, StoreError> {
        let id = Uuid::new_v4();
        let requested_at = chrono::Utc::now();

        let query = r#"
            INSERT INTO match_request (id, requester_id, target_id, status, distance_meters, requested_at)
            VALUES ($1, $2, $3, $4, $5, $6)
            ON CONFLICT (requester_id, target_id)
            DO UPDATE SET
                status = EXCLUDED.status,
                distance_meters = EXCLUDED.distance_meters,
                requested_at = EXCLUDED.requested_at
            RETURNING id
        "#;

        let row = sqlx::query(query)
            .bind(id)
            .bind(requester_id)
            .bind(target_id)
            .bind(status)
            .bind(distance_meters)
            .bind(requested_at)
            .fetch_one(&self.pool)
            .await?;

        let id: Uuid = row.get("id");

        tracing::debug!(
            "Recorded match request {} -> {} ({:?})",
            requester_id,
            target_id,
            status
        );

        Ok(MatchRequest {
            id,
            requester_id: requester_id.to_string(),
            target_id: target_id.to_string(),
            status,
            distance_meters,
            requested_at,
        })
    }

    /// List match requests targeting a user, newest first
    pub async fn incoming_match_requests(
        &self,
        target_id: &str,
        limit: usize,
    ) -> Result<Vec<MatchRequest>, StoreError> {
        let query = r#"
            SELECT id, requester_id, target_id, status, distance_meters, requested_at
            FROM match_request
            WHERE target_id = $1
            ORDER BY requested_at DESC
            LIMIT $2
        "#;

        let rows = sqlx::query(query)
            .bind(target_id)
            .bind(limit as i64)
            .fetch_all(&self.pool)
            .await?;

        let requests = rows
            .iter()
            .map(|row| MatchRequest {
                id: row.get("id"),
                requester_id: row.get("requester_id"),
                target_id: row.get("target_id"),
                status: row.get("status"),
                distance_meters: row.get("distance_meters"),
                requested_at: row.get("requested_at"),
            })
            .collect();

        Ok(requests)
    }

    /// Health check for the database connection
    pub async fn health_check(&self) -> Result<bool, StoreError> {
        sqlx::query("SELECT 1")
            .fetch_one(&self.pool)
            .await
            .map(|_| true)
            .map_err(Into::into)
    }
}

fn location_from_row(row: &PgRow) -> Result<UserLocation, StoreError> {
    let latitude: f64 = row.get("latitude");
    let longitude: f64 = row.get("longitude");
    let coordinate = GeoCoordinate::new(latitude, longitude)?;

    let cell: SpatialCell = row.get::<String, _>("h3_cell").parse()?;

    Ok(UserLocation::from_stored(
        row.get("user_id"),
        coordinate,
        cell,
        row.get("updated_at"),
    ))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_corrupt_row_errors_carry_the_cause() {
        let err = StoreError::from(GeoError::InvalidCellToken("junk".to_string()));
        assert!(err.to_string().contains("junk"));
    }
}
