use std::fmt;
use std::str::FromStr;

use h3o::CellIndex;
use serde::{Deserialize, Deserializer, Serialize, Serializer};

use crate::core::cell::CellIndexer;
use crate::core::error::GeoError;

/// A validated geographic coordinate in degrees
///
/// Construction is the validation boundary: out-of-range or non-finite
/// values are rejected with [`GeoError::InvalidCoordinate`] and are never
/// clamped or wrapped. Fields are private so an invalid pair cannot exist.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct GeoCoordinate {
    latitude: f64,
    longitude: f64,
}

impl GeoCoordinate {
    pub fn new(latitude: f64, longitude: f64) -> Result<Self, GeoError> {
        let valid = latitude.is_finite()
            && longitude.is_finite()
            && (-90.0..=90.0).contains(&latitude)
            && (-180.0..=180.0).contains(&longitude);

        if !valid {
            return Err(GeoError::InvalidCoordinate {
                latitude,
                longitude,
            });
        }

        Ok(Self {
            latitude,
            longitude,
        })
    }

    #[inline]
    pub fn latitude(&self) -> f64 {
        self.latitude
    }

    #[inline]
    pub fn longitude(&self) -> f64 {
        self.longitude
    }
}

impl fmt::Display for GeoCoordinate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "({}, {})", self.latitude, self.longitude)
    }
}

/// Opaque privacy-zone token produced by the cell indexer
///
/// Wraps an H3 cell index but exposes only equality, hashing and string
/// round-tripping. Many coordinates map to one cell; the token alone cannot
/// be turned back into a point, which is what makes it safe to store, index
/// and return to clients.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct SpatialCell(CellIndex);

impl SpatialCell {
    pub(crate) fn from_index(index: CellIndex) -> Self {
        Self(index)
    }

    pub(crate) fn index(&self) -> CellIndex {
        self.0
    }

    /// Resolution level this token was produced at
    pub fn resolution(&self) -> u8 {
        self.0.resolution().into()
    }
}

impl fmt::Display for SpatialCell {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.fmt(f)
    }
}

impl FromStr for SpatialCell {
    type Err = GeoError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        CellIndex::from_str(s)
            .map(Self)
            .map_err(|_| GeoError::InvalidCellToken(s.to_string()))
    }
}

impl Serialize for SpatialCell {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

impl<'de> Deserialize<'de> for SpatialCell {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let token = String::deserialize(deserializer)?;
        token.parse().map_err(serde::de::Error::custom)
    }
}

/// A user's stored location: exact coordinate plus its privacy cell
///
/// Invariant: `cell` is always the indexer's output for `coordinate` at the
/// configured resolution. The fields are private and [`UserLocation::new`]
/// is the only public construction path, so no code path can update one
/// without the other.
#[derive(Debug, Clone)]
pub struct UserLocation {
    pub owner_id: String,
    coordinate: GeoCoordinate,
    cell: SpatialCell,
    pub updated_at: chrono::DateTime<chrono::Utc>,
}

impl UserLocation {
    /// Build a location record, deriving the privacy cell from the coordinate
    pub fn new(
        owner_id: impl Into<String>,
        coordinate: GeoCoordinate,
        indexer: &CellIndexer,
    ) -> Result<Self, GeoError> {
        let cell = indexer.cell_of(&coordinate)?;

        Ok(Self {
            owner_id: owner_id.into(),
            coordinate,
            cell,
            updated_at: chrono::Utc::now(),
        })
    }

    /// Rehydrate a row whose coordinate and cell were written together
    pub(crate) fn from_stored(
        owner_id: String,
        coordinate: GeoCoordinate,
        cell: SpatialCell,
        updated_at: chrono::DateTime<chrono::Utc>,
    ) -> Self {
        Self {
            owner_id,
            coordinate,
            cell,
            updated_at,
        }
    }

    #[inline]
    pub fn coordinate(&self) -> &GeoCoordinate {
        &self.coordinate
    }

    #[inline]
    pub fn cell(&self) -> &SpatialCell {
        &self.cell
    }
}

/// Outcome of a single proximity decision
///
/// Transient, never persisted. `distance_meters` is `None` only when the
/// resolver was configured to skip exact verification on a coarse-filter
/// miss.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct ProximityResult {
    pub within_radius: bool,
    pub distance_meters: Option<f64>,
}

/// Status of a match request between two users
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type)]
#[sqlx(type_name = "match_status", rename_all = "snake_case")]
#[serde(rename_all = "snake_case")]
pub enum MatchStatus {
    Pending,
    Accepted,
    Declined,
    OutOfRange,
}

/// Persisted match request
#[derive(Debug, Clone, Serialize)]
pub struct MatchRequest {
    pub id: uuid::Uuid,
    #[serde(rename = "requesterId")]
    pub requester_id: String,
    #[serde(rename = "targetId")]
    pub target_id: String,
    pub status: MatchStatus,
    #[serde(rename = "distanceMeters")]
    pub distance_meters: Option<f64>,
    #[serde(rename = "requestedAt")]
    pub requested_at: chrono::DateTime<chrono::Utc>,
}

/// A verified nearby user, ready for ranking
///
/// Carries the privacy cell and the measured distance, never the raw
/// coordinates.
#[derive(Debug, Clone, Serialize)]
pub struct NearbyCandidate {
    #[serde(rename = "ownerId")]
    pub owner_id: String,
    pub cell: SpatialCell,
    #[serde(rename = "distanceMeters")]
    pub distance_meters: f64,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_coordinate_accepts_valid_ranges() {
        assert!(GeoCoordinate::new(0.0, 0.0).is_ok());
        assert!(GeoCoordinate::new(90.0, 180.0).is_ok());
        assert!(GeoCoordinate::new(-90.0, -180.0).is_ok());
        assert!(GeoCoordinate::new(40.7128, -74.0060).is_ok());
    }

    #[test]
    fn test_coordinate_rejects_out_of_range() {
        assert!(GeoCoordinate::new(90.01, 0.0).is_err());
        assert!(GeoCoordinate::new(-90.01, 0.0).is_err());
        assert!(GeoCoordinate::new(0.0, 180.01).is_err());
        assert!(GeoCoordinate::new(0.0, -180.01).is_err());
    }

    #[test]
    fn test_coordinate_rejects_non_finite() {
        assert!(GeoCoordinate::new(f64::NAN, 0.0).is_err());
        assert!(GeoCoordinate::new(0.0, f64::INFINITY).is_err());
        assert!(GeoCoordinate::new(f64::NEG_INFINITY, 0.0).is_err());
    }

    #[test]
    fn test_coordinate_never_clamps() {
        // The offending value is reported back untouched
        let err = GeoCoordinate::new(95.0, 0.0).unwrap_err();
        match err {
            GeoError::InvalidCoordinate { latitude, .. } => assert_eq!(latitude, 95.0),
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[test]
    fn test_cell_token_round_trip() {
        let indexer = CellIndexer::new(8).unwrap();
        let coordinate = GeoCoordinate::new(40.7128, -74.0060).unwrap();
        let cell = indexer.cell_of(&coordinate).unwrap();

        let token = cell.to_string();
        let parsed: SpatialCell = token.parse().unwrap();
        assert_eq!(parsed, cell);
    }

    #[test]
    fn test_cell_token_rejects_garbage() {
        assert!("not-a-cell".parse::<SpatialCell>().is_err());
        assert!("".parse::<SpatialCell>().is_err());
    }

    #[test]
    fn test_user_location_cell_matches_coordinate() {
        let indexer = CellIndexer::new(8).unwrap();
        let coordinate = GeoCoordinate::new(51.5074, -0.1278).unwrap();
        let location = UserLocation::new("user_1", coordinate, &indexer).unwrap();

        assert_eq!(*location.cell(), indexer.cell_of(&coordinate).unwrap());
        assert_eq!(location.owner_id, "user_1");
    }
}
