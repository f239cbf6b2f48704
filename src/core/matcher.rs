use crate::core::distance::haversine_distance_meters;
use crate::core::resolver::ProximityResolver;
use crate::models::{NearbyCandidate, UserLocation};

/// Result of the nearby-candidate pipeline
#[derive(Debug)]
pub struct MatchResult {
    pub matches: Vec<NearbyCandidate>,
    pub total_candidates: usize,
}

/// Candidate pipeline over stored locations
///
/// # Pipeline Stages
/// 1. Privacy-cell ring membership (coarse geospatial pre-filter)
/// 2. Exact great-circle verification against the matching radius
/// 3. Ranking by distance and truncation
///
/// Stage 1 is the in-process equivalent of the indexed cell-membership
/// query the store runs; stage 2 is always authoritative for what gets
/// returned.
#[derive(Debug, Clone)]
pub struct NearbyMatcher {
    resolver: ProximityResolver,
}

impl NearbyMatcher {
    pub fn new(resolver: ProximityResolver) -> Self {
        Self { resolver }
    }

    pub fn resolver(&self) -> &ProximityResolver {
        &self.resolver
    }

    /// Find candidates within matching radius of `origin`, closest first
    ///
    /// # Arguments
    /// * `origin` - The requesting user's stored location
    /// * `candidates` - Candidate locations fetched by the caller
    /// * `limit` - Maximum number of matches to return
    pub fn find_nearby(
        &self,
        origin: &UserLocation,
        candidates: Vec<UserLocation>,
        limit: usize,
    ) -> MatchResult {
        let total_candidates = candidates.len();

        // Build the ring once; membership is then O(1) per candidate
        let ring = self.resolver.ring_of(origin.cell());

        let mut matches: Vec<NearbyCandidate> = candidates
            .into_iter()
            .filter(|candidate| candidate.owner_id != origin.owner_id)
            // Stage 1: coarse cell-ring filter
            .filter(|candidate| ring.contains(candidate.cell()))
            // Stage 2: exact verification
            .filter_map(|candidate| {
                let distance_meters =
                    haversine_distance_meters(origin.coordinate(), candidate.coordinate());

                if distance_meters <= self.resolver.radius_meters() {
                    Some(NearbyCandidate {
                        cell: *candidate.cell(),
                        owner_id: candidate.owner_id,
                        distance_meters,
                    })
                } else {
                    None
                }
            })
            .collect();

        // Closest first
        matches.sort_by(|a, b| {
            a.distance_meters
                .partial_cmp(&b.distance_meters)
                .unwrap_or(std::cmp::Ordering::Equal)
        });
        matches.truncate(limit);

        MatchResult {
            matches,
            total_candidates,
        }
    }
}
