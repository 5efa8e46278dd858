//! Geographic primitives.
//!
//! Coordinates are WGS84 degrees. Distances use the haversine formula,
//! which is accurate to well under 0.5% at city scale — more than enough
//! for dispatch planning.
//!
//! # Reference
//! Sinnott (1984), "Virtues of the Haversine", *Sky and Telescope* 68(2)

use serde::{Deserialize, Serialize};

/// Mean Earth radius in kilometers.
const EARTH_RADIUS_KM: f64 = 6371.0;

/// Kilometers per degree of latitude (approximation used to convert
/// degree-based neighborhood radii to kilometers).
pub const KM_PER_DEGREE: f64 = 111.0;

/// A WGS84 coordinate.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct GeoPoint {
    /// Latitude in degrees.
    pub lat: f64,
    /// Longitude in degrees.
    pub lng: f64,
}

impl GeoPoint {
    /// Creates a point from latitude and longitude in degrees.
    pub fn new(lat: f64, lng: f64) -> Self {
        Self { lat, lng }
    }

    /// Great-circle distance to another point in kilometers.
    pub fn haversine_km(&self, other: &GeoPoint) -> f64 {
        let lat1 = self.lat.to_radians();
        let lat2 = other.lat.to_radians();
        let d_lat = (other.lat - self.lat).to_radians();
        let d_lng = (other.lng - self.lng).to_radians();

        let a = (d_lat / 2.0).sin().powi(2)
            + lat1.cos() * lat2.cos() * (d_lng / 2.0).sin().powi(2);
        let c = 2.0 * a.sqrt().atan2((1.0 - a).sqrt());

        EARTH_RADIUS_KM * c
    }

    /// Centroid of a non-empty set of points.
    ///
    /// Returns `None` for an empty slice. Arithmetic mean of coordinates,
    /// adequate at city scale where the curvature error is negligible.
    pub fn centroid(points: &[GeoPoint]) -> Option<GeoPoint> {
        if points.is_empty() {
            return None;
        }
        let n = points.len() as f64;
        let lat = points.iter().map(|p| p.lat).sum::<f64>() / n;
        let lng = points.iter().map(|p| p.lng).sum::<f64>() / n;
        Some(GeoPoint::new(lat, lng))
    }
}

/// Converts a radius expressed in degrees to kilometers.
#[inline]
pub fn degrees_to_km(degrees: f64) -> f64 {
    degrees * KM_PER_DEGREE
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_haversine_zero() {
        let p = GeoPoint::new(59.3293, 18.0686);
        assert!(p.haversine_km(&p).abs() < 1e-10);
    }

    #[test]
    fn test_haversine_known_distance() {
        // Stockholm city hall → Uppsala cathedral, ~63 km
        let stockholm = GeoPoint::new(59.3275, 18.0540);
        let uppsala = GeoPoint::new(59.8586, 17.6330);
        let d = stockholm.haversine_km(&uppsala);
        assert!(d > 60.0 && d < 66.0, "got {d}");
    }

    #[test]
    fn test_haversine_symmetric() {
        let a = GeoPoint::new(59.33, 18.07);
        let b = GeoPoint::new(59.40, 17.95);
        assert!((a.haversine_km(&b) - b.haversine_km(&a)).abs() < 1e-10);
    }

    #[test]
    fn test_centroid() {
        let points = vec![
            GeoPoint::new(59.0, 18.0),
            GeoPoint::new(60.0, 18.0),
            GeoPoint::new(59.5, 17.0),
        ];
        let c = GeoPoint::centroid(&points).unwrap();
        assert!((c.lat - 59.5).abs() < 1e-10);
        assert!((c.lng - 17.666666666666668).abs() < 1e-10);
    }

    #[test]
    fn test_centroid_empty() {
        assert!(GeoPoint::centroid(&[]).is_none());
    }

    #[test]
    fn test_degrees_to_km() {
        assert!((degrees_to_km(1.0) - 111.0).abs() < 1e-10);
        assert!((degrees_to_km(0.0145) - 1.6095).abs() < 1e-10);
    }
}
