//! Geofence model and containment tests
//!
//! A fence is a named geographic region (circle or polygon) with a safety
//! classification. Fences are immutable after session seeding.

use crate::domain::geo::{haversine_m, FenceId, Location};
use serde::Serialize;

/// Safety classification of a fence
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum FenceKind {
    Danger,
    Tourist,
    Market,
}

impl FenceKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            FenceKind::Danger => "danger",
            FenceKind::Tourist => "tourist",
            FenceKind::Market => "market",
        }
    }
}

/// Fence geometry - a circle with radius in meters, or a closed vertex ring
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Geometry {
    Circle { center: Location, radius_m: f64 },
    Polygon { ring: Vec<Location> },
}

impl Geometry {
    /// Representative center: circle center, or polygon vertex centroid
    pub fn center(&self) -> Location {
        match self {
            Geometry::Circle { center, .. } => *center,
            Geometry::Polygon { ring } => {
                if ring.is_empty() {
                    return Location::new(0.0, 0.0);
                }
                let n = ring.len() as f64;
                let lat = ring.iter().map(|p| p.lat).sum::<f64>() / n;
                let lon = ring.iter().map(|p| p.lon).sum::<f64>() / n;
                Location::new(lat, lon)
            }
        }
    }

    /// Representative radius: circle radius, or max centroid-to-vertex distance
    pub fn radius_m(&self) -> f64 {
        match self {
            Geometry::Circle { radius_m, .. } => *radius_m,
            Geometry::Polygon { ring } => {
                let c = self.center();
                ring.iter().map(|p| haversine_m(c, *p)).fold(0.0, f64::max)
            }
        }
    }
}

/// A geofence with metadata, seeded once per session
#[derive(Debug, Clone, Serialize)]
pub struct GeoFence {
    pub id: FenceId,
    pub name: String,
    pub kind: FenceKind,
    pub geometry: Geometry,
    /// 0-100, higher is safer
    pub safety_score: u8,
    pub description: String,
}

impl GeoFence {
    /// Containment test for a point.
    ///
    /// Circle boundary is inclusive: a point exactly on the radius counts as
    /// inside. This is the single containment policy for the whole system.
    pub fn contains(&self, point: Location) -> bool {
        match &self.geometry {
            Geometry::Circle { center, radius_m } => haversine_m(point, *center) <= *radius_m,
            Geometry::Polygon { ring } => point_in_ring(point, ring),
        }
    }

    pub fn center(&self) -> Location {
        self.geometry.center()
    }

    pub fn radius_m(&self) -> f64 {
        self.geometry.radius_m()
    }
}

/// Even-odd ray casting over an ordered vertex ring.
///
/// Rings with fewer than 3 vertices contain nothing.
fn point_in_ring(point: Location, ring: &[Location]) -> bool {
    if ring.len() < 3 {
        return false;
    }

    let mut inside = false;
    let mut j = ring.len() - 1;
    for i in 0..ring.len() {
        let a = ring[i];
        let b = ring[j];
        if (a.lat > point.lat) != (b.lat > point.lat) {
            let cross = (b.lon - a.lon) * (point.lat - a.lat) / (b.lat - a.lat) + a.lon;
            if point.lon < cross {
                inside = !inside;
            }
        }
        j = i;
    }
    inside
}
