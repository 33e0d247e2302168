//! Coordinates and spherical geometry helpers
//!
//! All math here assumes city-block scale fences. Antimeridian crossing,
//! polar latitudes, and degenerate geometry are not handled.

use serde::{Deserialize, Serialize};

/// Mean Earth radius in meters (spherical model)
pub const EARTH_RADIUS_M: f64 = 6_371_000.0;

/// Newtype wrapper for fence IDs to provide type safety
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[repr(transparent)]
pub struct FenceId(pub u32);

impl std::fmt::Display for FenceId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// A latitude/longitude pair in degrees
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Location {
    pub lat: f64,
    pub lon: f64,
}

impl Location {
    pub fn new(lat: f64, lon: f64) -> Self {
        Self { lat, lon }
    }
}

impl std::fmt::Display for Location {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "({:.6}, {:.6})", self.lat, self.lon)
    }
}

/// Great-circle distance between two points in meters (haversine formula)
pub fn haversine_m(a: Location, b: Location) -> f64 {
    let dlat = (b.lat - a.lat).to_radians();
    let dlon = (b.lon - a.lon).to_radians();
    let lat1 = a.lat.to_radians();
    let lat2 = b.lat.to_radians();

    let h = (dlat / 2.0).sin().powi(2) + lat1.cos() * lat2.cos() * (dlon / 2.0).sin().powi(2);
    2.0 * EARTH_RADIUS_M * h.sqrt().asin()
}

/// Offset a point by meters north and east using a local planar approximation.
///
/// Accurate to well under a meter at the scales used here (< a few km).
pub fn offset_m(origin: Location, north_m: f64, east_m: f64) -> Location {
    let dlat = (north_m / EARTH_RADIUS_M).to_degrees();
    let dlon = (east_m / (EARTH_RADIUS_M * origin.lat.to_radians().cos())).to_degrees();
    Location { lat: origin.lat + dlat, lon: origin.lon + dlon }
}

/// Displacement from `from` to `to` as (north_m, east_m) in the local plane
pub fn displacement_m(from: Location, to: Location) -> (f64, f64) {
    let north = (to.lat - from.lat).to_radians() * EARTH_RADIUS_M;
    let east = (to.lon - from.lon).to_radians() * EARTH_RADIUS_M * from.lat.to_radians().cos();
    (north, east)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_haversine_zero_distance() {
        let p = Location::new(13.050, 80.282);
        assert_eq!(haversine_m(p, p), 0.0);
    }

    #[test]
    fn test_haversine_one_degree_longitude_at_equator() {
        let a = Location::new(0.0, 0.0);
        let b = Location::new(0.0, 1.0);
        let d = haversine_m(a, b);
        // One degree of longitude at the equator is ~111.19 km
        assert!((d - 111_195.0).abs() < 100.0, "got {d}");
    }

    #[test]
    fn test_offset_roundtrip() {
        let origin = Location::new(13.050, 80.282);
        let moved = offset_m(origin, 300.0, -400.0);
        let d = haversine_m(origin, moved);
        // 3-4-5 triangle: 500m displacement
        assert!((d - 500.0).abs() < 1.0, "got {d}");

        let (north, east) = displacement_m(origin, moved);
        assert!((north - 300.0).abs() < 1.0);
        assert!((east + 400.0).abs() < 1.0);
    }

    #[test]
    fn test_displacement_signs() {
        let origin = Location::new(13.050, 80.282);
        let ne = offset_m(origin, 100.0, 100.0);
        let (n, e) = displacement_m(origin, ne);
        assert!(n > 0.0 && e > 0.0);
    }
}
