// ABOUTME: Great-circle distance helpers for trip telemetry
// ABOUTME: Haversine distance between coordinate pairs and summed path distance
//
// Licensed under either of Apache License, Version 2.0 or MIT License at your option.
// Copyright ©2025 Ride With Vic

//! Great-circle distance computation over `(latitude, longitude)` pairs.
//!
//! Trip distance is the haversine distance between consecutive points of the
//! location timeline, summed. No timestamp-weighted smoothing and no outlier
//! rejection is applied.

/// Mean Earth radius in kilometers
const EARTH_RADIUS_KM: f64 = 6371.0;

/// Haversine great-circle distance between two coordinate pairs, in kilometers
#[must_use]
pub fn haversine_km(a: (f64, f64), b: (f64, f64)) -> f64 {
    let (lat1, lon1) = a;
    let (lat2, lon2) = b;

    let d_lat = (lat2 - lat1).to_radians();
    let d_lon = (lon2 - lon1).to_radians();

    let h = (d_lat / 2.0).sin().powi(2)
        + lat1.to_radians().cos() * lat2.to_radians().cos() * (d_lon / 2.0).sin().powi(2);
    let c = 2.0 * h.sqrt().atan2((1.0 - h).sqrt());

    EARTH_RADIUS_KM * c
}

/// Total distance along an ordered coordinate path, in kilometers
///
/// Sums the haversine distance of every consecutive pair. Paths with fewer
/// than two points have zero length.
#[must_use]
pub fn path_distance_km(path: &[(f64, f64)]) -> f64 {
    path.windows(2).map(|pair| haversine_km(pair[0], pair[1])).sum()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn assert_close(actual: f64, expected: f64, tolerance: f64) {
        assert!(
            (actual - expected).abs() < tolerance,
            "expected {expected} +/- {tolerance}, got {actual}"
        );
    }

    #[test]
    fn test_zero_distance_for_identical_points() {
        assert_close(haversine_km((40.7128, -74.0060), (40.7128, -74.0060)), 0.0, 1e-9);
    }

    #[test]
    fn test_one_degree_of_latitude_at_equator() {
        // One degree of latitude is ~111.19 km on a 6371 km sphere
        assert_close(haversine_km((0.0, 0.0), (1.0, 0.0)), 111.195, 0.01);
    }

    #[test]
    fn test_known_city_pair() {
        // New York City to Philadelphia, ~129.6 km great-circle
        let nyc = (40.7128, -74.0060);
        let phl = (39.9526, -75.1652);
        assert_close(haversine_km(nyc, phl), 129.6, 1.0);
    }

    #[test]
    fn test_path_distance_sums_segments() {
        let a = (0.0, 0.0);
        let b = (1.0, 0.0);
        let c = (2.0, 0.0);
        let total = path_distance_km(&[a, b, c]);
        let segments = haversine_km(a, b) + haversine_km(b, c);
        assert_close(total, segments, 1e-9);
    }

    #[test]
    fn test_short_paths_have_zero_length() {
        assert_close(path_distance_km(&[]), 0.0, 1e-9);
        assert_close(path_distance_km(&[(10.0, 10.0)]), 0.0, 1e-9);
    }
}
