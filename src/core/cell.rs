use std::collections::HashSet;

use h3o::{LatLng, Resolution};

use crate::core::error::GeoError;
use crate::models::{GeoCoordinate, SpatialCell};

/// H3 resolution used for privacy cells
///
/// The resolution is the privacy/precision trade-off: one cell must be
/// coarse enough to hide an exact position but fine enough that ring
/// expansion tracks the matching radius.
pub const DEFAULT_RESOLUTION: u8 = 8;

/// Grid-disk hops expanded around a cell when matching
pub const DEFAULT_RING_SIZE: u32 = 4;

/// Target real-world matching radius
pub const DEFAULT_PROXIMITY_RADIUS_METERS: f64 = 2000.0;

/// Guaranteed coverage per ring hop, as a multiple of the mean edge length.
///
/// Two hexagons at grid distance k have centers at least 1.5 * edge * k
/// apart (the worst-case direction on a regular hex grid), so k rings are
/// guaranteed to contain every cell whose center lies within that distance.
const COVERAGE_PER_RING_FACTOR: f64 = 1.5;

/// Maps coordinates to coarse hexagonal cells and expands neighbor rings
///
/// This is the only module that touches the H3 library; everything else
/// sees [`SpatialCell`] as an opaque token, so an equal-area tessellation
/// with the same ring semantics could be substituted behind this type.
#[derive(Debug, Clone, Copy)]
pub struct CellIndexer {
    resolution: Resolution,
}

impl CellIndexer {
    pub fn new(resolution: u8) -> Result<Self, GeoError> {
        let resolution = Resolution::try_from(resolution)
            .map_err(|_| GeoError::InvalidResolution(resolution))?;

        Ok(Self { resolution })
    }

    pub fn resolution(&self) -> u8 {
        self.resolution.into()
    }

    /// Mean hexagon edge length at this resolution, in meters
    pub fn edge_length_meters(&self) -> f64 {
        self.resolution.edge_length_m()
    }

    /// Radius guaranteed to be covered by `ring_size` hops, in meters
    ///
    /// A conservative bound based on the mean edge length; configuration
    /// validation requires it to meet the matching radius so the coarse
    /// filter cannot drop in-radius candidates.
    pub fn coverage_radius_meters(&self, ring_size: u32) -> f64 {
        ring_size as f64 * COVERAGE_PER_RING_FACTOR * self.edge_length_meters()
    }

    /// Convert a coordinate to its privacy cell at the fixed resolution
    ///
    /// Deterministic: the same coordinate always maps to the same cell.
    pub fn cell_of(&self, coordinate: &GeoCoordinate) -> Result<SpatialCell, GeoError> {
        let latlng = LatLng::new(coordinate.latitude(), coordinate.longitude()).map_err(|_| {
            GeoError::InvalidCoordinate {
                latitude: coordinate.latitude(),
                longitude: coordinate.longitude(),
            }
        })?;

        Ok(SpatialCell::from_index(latlng.to_cell(self.resolution)))
    }

    /// All cells reachable within `ring_size` hops, center included
    pub fn neighbors_of(&self, cell: &SpatialCell, ring_size: u32) -> HashSet<SpatialCell> {
        cell.index()
            .grid_disk::<Vec<_>>(ring_size)
            .into_iter()
            .map(SpatialCell::from_index)
            .collect()
    }
}
