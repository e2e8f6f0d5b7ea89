// src/distance.rs

//! Great-circle distance and the proximity bucket derived from it.

/// Mean Earth radius, km.
pub const EARTH_RADIUS_KM: f64 = 6371.0;

/// Priority bucket for candidate ordering. Lower is closer.
pub const BUCKET_SAME_CITY: u8 = 0;
pub const BUCKET_NEAR: u8 = 1;
pub const BUCKET_REGIONAL: u8 = 2;
pub const BUCKET_FAR: u8 = 3;
pub const BUCKET_VERY_FAR: u8 = 4;
pub const BUCKET_UNKNOWN: u8 = 5;

/// Haversine distance in km between two (lat, lon) pairs in degrees.
pub fn haversine_km(a: (f64, f64), b: (f64, f64)) -> f64 {
    let (lat1, lon1) = (a.0.to_radians(), a.1.to_radians());
    let (lat2, lon2) = (b.0.to_radians(), b.1.to_radians());

    let dlat = lat2 - lat1;
    let dlon = lon2 - lon1;

    let h = (dlat / 2.0).sin().powi(2) + lat1.cos() * lat2.cos() * (dlon / 2.0).sin().powi(2);

    2.0 * EARTH_RADIUS_KM * h.sqrt().asin()
}

/// Distance between two optional coordinate pairs; infinite when either
/// side is unknown.
pub fn distance_km(a: Option<(f64, f64)>, b: Option<(f64, f64)>) -> f64 {
    match (a, b) {
        (Some(a), Some(b)) => haversine_km(a, b),
        _ => f64::INFINITY,
    }
}

/// Derives the proximity bucket. A canonical city-name match wins outright,
/// even when coordinates are missing.
pub fn priority_bucket(same_city: bool, distance_km: f64) -> u8 {
    if same_city || distance_km < 15.0 {
        BUCKET_SAME_CITY
    } else if distance_km <= 100.0 {
        BUCKET_NEAR
    } else if distance_km <= 500.0 {
        BUCKET_REGIONAL
    } else if distance_km <= 2000.0 {
        BUCKET_FAR
    } else if distance_km.is_finite() {
        BUCKET_VERY_FAR
    } else {
        BUCKET_UNKNOWN
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const MOSCOW: (f64, f64) = (55.7558, 37.6176);
    const SPB: (f64, f64) = (59.9343, 30.3351);

    #[test]
    fn moscow_to_spb_is_roughly_635_km() {
        let d = haversine_km(MOSCOW, SPB);
        assert!((d - 635.0).abs() < 10.0, "got {}", d);
    }

    #[test]
    fn distance_is_symmetric_and_zero_on_self() {
        let d1 = haversine_km(MOSCOW, SPB);
        let d2 = haversine_km(SPB, MOSCOW);
        assert!((d1 - d2).abs() < 1e-9);
        assert_eq!(haversine_km(MOSCOW, MOSCOW), 0.0);
    }

    #[test]
    fn missing_coordinates_are_infinitely_far() {
        assert_eq!(distance_km(Some(MOSCOW), None), f64::INFINITY);
        assert_eq!(distance_km(None, None), f64::INFINITY);
    }

    #[test]
    fn buckets_follow_distance_bands() {
        assert_eq!(priority_bucket(true, f64::INFINITY), BUCKET_SAME_CITY);
        assert_eq!(priority_bucket(false, 3.0), BUCKET_SAME_CITY);
        assert_eq!(priority_bucket(false, 50.0), BUCKET_NEAR);
        assert_eq!(priority_bucket(false, 300.0), BUCKET_REGIONAL);
        assert_eq!(priority_bucket(false, 635.0), BUCKET_FAR);
        assert_eq!(priority_bucket(false, 5000.0), BUCKET_VERY_FAR);
        assert_eq!(priority_bucket(false, f64::INFINITY), BUCKET_UNKNOWN);
    }
}
