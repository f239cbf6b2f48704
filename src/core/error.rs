use thiserror::Error;

/// Errors produced by the proximity core
///
/// All of these are local computation errors: there is no partial state to
/// roll back and nothing to retry. Coordinates are validated at construction
/// and tuning parameters at configuration time, never per call.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum GeoError {
    #[error("invalid coordinate: latitude {latitude}, longitude {longitude} (latitude must be within [-90, 90], longitude within [-180, 180])")]
    InvalidCoordinate { latitude: f64, longitude: f64 },

    #[error("invalid cell resolution: {0} (supported range is 0-15)")]
    InvalidResolution(u8),

    #[error("ring size {ring_size} guarantees only ~{coverage_meters:.0}m of coverage, below the {radius_meters:.0}m matching radius")]
    InvalidRingSize {
        ring_size: u32,
        coverage_meters: f64,
        radius_meters: f64,
    },

    #[error("invalid proximity radius: {0} (must be a positive, finite number of meters)")]
    InvalidRadius(f64),

    #[error("invalid cell token: {0}")]
    InvalidCellToken(String),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_messages_name_the_bounds() {
        let err = GeoError::InvalidCoordinate {
            latitude: 91.0,
            longitude: 0.0,
        };
        assert!(err.to_string().contains("[-90, 90]"));

        let err = GeoError::InvalidResolution(16);
        assert!(err.to_string().contains("0-15"));
    }
}
