use std::collections::HashSet;

use crate::core::cell::{
    CellIndexer, DEFAULT_PROXIMITY_RADIUS_METERS, DEFAULT_RESOLUTION, DEFAULT_RING_SIZE,
};
use crate::core::distance::haversine_distance_meters;
use crate::core::error::GeoError;
use crate::models::{GeoCoordinate, ProximityResult, SpatialCell, UserLocation};

/// Tunable knobs for the proximity engine
///
/// Passed explicitly into [`ProximityResolver::new`] so different
/// configurations can coexist (and be tested) in the same process.
#[derive(Debug, Clone, Copy)]
pub struct ProximityConfig {
    /// H3 resolution for privacy cells (0-15)
    pub resolution: u8,
    /// Grid-disk hops expanded around the requester's cell
    pub ring_size: u32,
    /// Matching radius in meters; the boundary itself is a match
    pub radius_meters: f64,
    /// Skip the exact distance computation when the coarse filter misses.
    ///
    /// Trades a rare false negative right at the ring boundary for speed.
    /// Off by default: exact verification is authoritative.
    pub skip_exact_on_coarse_miss: bool,
}

impl Default for ProximityConfig {
    fn default() -> Self {
        Self {
            resolution: DEFAULT_RESOLUTION,
            ring_size: DEFAULT_RING_SIZE,
            radius_meters: DEFAULT_PROXIMITY_RADIUS_METERS,
            skip_exact_on_coarse_miss: false,
        }
    }
}

/// Decides whether two users are within matching radius
///
/// # Pipeline phases
/// 1. Coarse filter: is the target's privacy cell inside the requester's
///    neighbor ring? Cheap set membership, usable as an indexed query.
/// 2. Exact verification: Haversine distance against the radius, inclusive.
///    Authoritative; the coarse phase never changes the outcome unless the
///    configured short-circuit is enabled.
#[derive(Debug, Clone, Copy)]
pub struct ProximityResolver {
    indexer: CellIndexer,
    ring_size: u32,
    radius_meters: f64,
    skip_exact_on_coarse_miss: bool,
}

impl ProximityResolver {
    /// Validate the configuration and build a resolver
    ///
    /// Fails fast at configuration time: unsupported resolution, a
    /// non-positive radius, or a ring too small to cover the radius are all
    /// rejected here so no per-call validation is needed.
    pub fn new(config: ProximityConfig) -> Result<Self, GeoError> {
        let indexer = CellIndexer::new(config.resolution)?;

        if !config.radius_meters.is_finite() || config.radius_meters <= 0.0 {
            return Err(GeoError::InvalidRadius(config.radius_meters));
        }

        let coverage_meters = indexer.coverage_radius_meters(config.ring_size);
        if config.ring_size == 0 || coverage_meters < config.radius_meters {
            return Err(GeoError::InvalidRingSize {
                ring_size: config.ring_size,
                coverage_meters,
                radius_meters: config.radius_meters,
            });
        }

        Ok(Self {
            indexer,
            ring_size: config.ring_size,
            radius_meters: config.radius_meters,
            skip_exact_on_coarse_miss: config.skip_exact_on_coarse_miss,
        })
    }

    pub fn indexer(&self) -> &CellIndexer {
        &self.indexer
    }

    pub fn radius_meters(&self) -> f64 {
        self.radius_meters
    }

    pub fn ring_size(&self) -> u32 {
        self.ring_size
    }

    /// The requester's full neighbor ring, for batch candidate filtering
    pub fn ring_of(&self, center: &SpatialCell) -> HashSet<SpatialCell> {
        self.indexer.neighbors_of(center, self.ring_size)
    }

    /// Phase 1 in isolation: cell-ring membership
    pub fn coarse_contains(&self, center: &SpatialCell, candidate: &SpatialCell) -> bool {
        self.ring_of(center).contains(candidate)
    }

    /// Decide proximity for two raw coordinates
    pub fn check(
        &self,
        a: &GeoCoordinate,
        b: &GeoCoordinate,
    ) -> Result<ProximityResult, GeoError> {
        let cell_a = self.indexer.cell_of(a)?;
        let cell_b = self.indexer.cell_of(b)?;
        Ok(self.decide(a, b, &cell_a, &cell_b))
    }

    /// Decide proximity for two stored locations, reusing their cells
    pub fn check_locations(&self, a: &UserLocation, b: &UserLocation) -> ProximityResult {
        self.decide(a.coordinate(), b.coordinate(), a.cell(), b.cell())
    }

    fn decide(
        &self,
        a: &GeoCoordinate,
        b: &GeoCoordinate,
        cell_a: &SpatialCell,
        cell_b: &SpatialCell,
    ) -> ProximityResult {
        let coarse_hit = self.coarse_contains(cell_a, cell_b);

        if !coarse_hit && self.skip_exact_on_coarse_miss {
            return ProximityResult {
                within_radius: false,
                distance_meters: None,
            };
        }

        let distance_meters = haversine_distance_meters(a, b);
        let within_radius = distance_meters <= self.radius_meters;

        if within_radius && !coarse_hit {
            // In-radius pair outside the ring: the configured ring is too
            // tight for the radius at this spot
            tracing::warn!(
                "coarse filter missed an in-radius pair ({distance_meters:.0}m, ring {})",
                self.ring_size
            );
        }

        ProximityResult {
            within_radius,
            distance_meters: Some(distance_meters),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn resolver() -> ProximityResolver {
        ProximityResolver::new(ProximityConfig::default()).unwrap()
    }

    fn coord(lat: f64, lon: f64) -> GeoCoordinate {
        GeoCoordinate::new(lat, lon).unwrap()
    }

    #[test]
    fn test_rejects_zero_ring() {
        let config = ProximityConfig {
            ring_size: 0,
            ..ProximityConfig::default()
        };
        assert!(matches!(
            ProximityResolver::new(config),
            Err(GeoError::InvalidRingSize { .. })
        ));
    }

    #[test]
    fn test_rejects_undersized_ring() {
        // One ring at resolution 8 covers well under 2km
        let config = ProximityConfig {
            ring_size: 1,
            ..ProximityConfig::default()
        };
        assert!(matches!(
            ProximityResolver::new(config),
            Err(GeoError::InvalidRingSize { .. })
        ));
    }

    #[test]
    fn test_rejects_bad_radius() {
        for radius_meters in [0.0, -1.0, f64::NAN, f64::INFINITY] {
            let config = ProximityConfig {
                radius_meters,
                ..ProximityConfig::default()
            };
            assert!(ProximityResolver::new(config).is_err());
        }
    }

    #[test]
    fn test_rejects_bad_resolution() {
        let config = ProximityConfig {
            resolution: 16,
            ..ProximityConfig::default()
        };
        assert!(matches!(
            ProximityResolver::new(config),
            Err(GeoError::InvalidResolution(16))
        ));
    }

    #[test]
    fn test_identical_coordinates_match() {
        let resolver = resolver();
        let nyc = coord(40.7128, -74.0060);

        let result = resolver.check(&nyc, &nyc).unwrap();
        assert!(result.within_radius);
        assert!(result.distance_meters.unwrap() < 1e-6);
    }

    #[test]
    fn test_close_pair_matches() {
        // ~500m apart at mid-latitude
        let resolver = resolver();
        let a = coord(40.7128, -74.0060);
        let b = coord(40.7173, -74.0060);

        let result = resolver.check(&a, &b).unwrap();
        assert!(result.within_radius);
        let distance = result.distance_meters.unwrap();
        assert!(distance > 400.0 && distance < 600.0);
    }

    #[test]
    fn test_far_pair_does_not_match() {
        let resolver = resolver();
        let nyc = coord(40.7128, -74.0060);
        let london = coord(51.5074, -0.1278);

        let result = resolver.check(&nyc, &london).unwrap();
        assert!(!result.within_radius);
        assert!(result.distance_meters.unwrap() > 5_000_000.0);
    }

    #[test]
    fn test_boundary_is_inclusive() {
        // Configure the radius to the measured distance; <= must match
        let a = coord(40.7128, -74.0060);
        let b = coord(40.7308, -74.0060);
        let default_resolver = resolver();
        let measured = default_resolver
            .check(&a, &b)
            .unwrap()
            .distance_meters
            .unwrap();
        assert!((measured - 2000.0).abs() < 15.0);

        let exact = ProximityResolver::new(ProximityConfig {
            radius_meters: measured,
            ..ProximityConfig::default()
        })
        .unwrap();

        let result = exact.check(&a, &b).unwrap();
        assert!(result.within_radius);
        assert_eq!(result.distance_meters, Some(measured));
    }

    #[test]
    fn test_coarse_phase_is_separable() {
        let resolver = resolver();
        let indexer = resolver.indexer();

        let center = indexer.cell_of(&coord(40.7128, -74.0060)).unwrap();
        let near = indexer.cell_of(&coord(40.7173, -74.0060)).unwrap();
        let far = indexer.cell_of(&coord(51.5074, -0.1278)).unwrap();

        assert!(resolver.coarse_contains(&center, &center));
        assert!(resolver.coarse_contains(&center, &near));
        assert!(!resolver.coarse_contains(&center, &far));
    }

    #[test]
    fn test_skip_mode_omits_distance_on_miss() {
        let skipping = ProximityResolver::new(ProximityConfig {
            skip_exact_on_coarse_miss: true,
            ..ProximityConfig::default()
        })
        .unwrap();

        let nyc = coord(40.7128, -74.0060);
        let london = coord(51.5074, -0.1278);

        let result = skipping.check(&nyc, &london).unwrap();
        assert!(!result.within_radius);
        assert_eq!(result.distance_meters, None);

        // A coarse hit still verifies exactly
        let near = coord(40.7173, -74.0060);
        let result = skipping.check(&nyc, &near).unwrap();
        assert!(result.within_radius);
        assert!(result.distance_meters.is_some());
    }

    #[test]
    fn test_check_locations_uses_stored_cells() {
        let resolver = resolver();
        let indexer = resolver.indexer();

        let a = UserLocation::new("a", coord(40.7128, -74.0060), indexer).unwrap();
        let b = UserLocation::new("b", coord(40.7173, -74.0060), indexer).unwrap();

        let result = resolver.check_locations(&a, &b);
        assert!(result.within_radius);
    }
}
