use crate::models::GeoCoordinate;

/// Earth's mean radius in meters (spherical approximation)
pub const EARTH_RADIUS_METERS: f64 = 6_371_000.0;

/// Calculate the Haversine great-circle distance between two coordinates
///
/// # Arguments
/// * `a` - First coordinate
/// * `b` - Second coordinate
///
/// # Returns
/// Distance in meters
///
/// Pure and symmetric; identical inputs return 0 up to floating-point
/// rounding (< 1e-6 m). The central angle is built with `atan2` rather than
/// `asin`, which stays numerically stable for antipodal pairs.
#[inline]
pub fn haversine_distance_meters(a: &GeoCoordinate, b: &GeoCoordinate) -> f64 {
    let lat1_rad = a.latitude().to_radians();
    let lat2_rad = b.latitude().to_radians();
    let delta_lat = (b.latitude() - a.latitude()).to_radians();
    let delta_lon = (b.longitude() - a.longitude()).to_radians();

    let h = (delta_lat / 2.0).sin().powi(2)
        + lat1_rad.cos() * lat2_rad.cos() * (delta_lon / 2.0).sin().powi(2);
    let central_angle = 2.0 * h.sqrt().atan2((1.0 - h).sqrt());

    EARTH_RADIUS_METERS * central_angle
}

#[cfg(test)]
mod tests {
    use super::*;

    fn coord(lat: f64, lon: f64) -> GeoCoordinate {
        GeoCoordinate::new(lat, lon).unwrap()
    }

    #[test]
    fn test_identity_is_zero() {
        let nyc = coord(40.7128, -74.0060);
        assert!(haversine_distance_meters(&nyc, &nyc).abs() < 1e-6);
    }

    #[test]
    fn test_symmetry() {
        let nyc = coord(40.7128, -74.0060);
        let london = coord(51.5074, -0.1278);

        let forward = haversine_distance_meters(&nyc, &london);
        let backward = haversine_distance_meters(&london, &nyc);
        assert!((forward - backward).abs() < 1e-6);
    }

    #[test]
    fn test_new_york_to_london() {
        // ~5,570 km, allow 1%
        let nyc = coord(40.7128, -74.0060);
        let london = coord(51.5074, -0.1278);

        let distance = haversine_distance_meters(&nyc, &london);
        assert!(
            (distance - 5_570_000.0).abs() < 55_700.0,
            "expected ~5,570km, got {distance}m"
        );
    }

    #[test]
    fn test_antipodal_points_stay_finite() {
        // Half the Earth's circumference, no precision collapse near pi*R
        let a = coord(0.0, 0.0);
        let b = coord(0.0, 180.0);

        let distance = haversine_distance_meters(&a, &b);
        assert!(distance.is_finite());
        assert!((distance - 20_015_086.0).abs() < 10_000.0);
    }

    #[test]
    fn test_never_negative() {
        let samples = [
            coord(0.0, 0.0),
            coord(90.0, 0.0),
            coord(-90.0, 0.0),
            coord(40.7128, -74.0060),
            coord(-33.8688, 151.2093),
        ];

        for a in &samples {
            for b in &samples {
                assert!(haversine_distance_meters(a, b) >= 0.0);
            }
        }
    }

    #[test]
    fn test_triangle_inequality() {
        let berlin = coord(52.5200, 13.4050);
        let paris = coord(48.8566, 2.3522);
        let madrid = coord(40.4168, -3.7038);

        let ab = haversine_distance_meters(&berlin, &paris);
        let bc = haversine_distance_meters(&paris, &madrid);
        let ac = haversine_distance_meters(&berlin, &madrid);

        assert!(ac <= ab + bc + 1e-6);
    }

    #[test]
    fn test_meridian_arc_matches_radius() {
        // Along a meridian the distance is exactly R * delta_lat
        let a = coord(40.0, -74.0);
        let b = coord(41.0, -74.0);

        let expected = EARTH_RADIUS_METERS * 1f64.to_radians();
        let distance = haversine_distance_meters(&a, &b);
        assert!((distance - expected).abs() < 1.0);
    }
}
