//! Session fence seeding
//!
//! Fences are generated once per session, placed relative to the first known
//! coordinate so the simulated walk always has something to intersect. The
//! descriptor table is fixed; offsets get a little seeded jitter so repeated
//! sessions with different seeds don't overlap exactly.

use crate::domain::fence::{FenceKind, GeoFence, Geometry};
use crate::domain::geo::{offset_m, FenceId, Location};
use crate::infra::config::Config;
use crate::infra::rng::SeededRng;
use tracing::info;

/// Static fence descriptor: name, kind, nominal offset from origin (north_m,
/// east_m), safety score, description
struct FenceSpec {
    name: &'static str,
    kind: FenceKind,
    north_m: f64,
    east_m: f64,
    safety_score: u8,
    description: &'static str,
}

const FENCE_SPECS: [FenceSpec; 4] = [
    FenceSpec {
        name: "Construction corridor",
        kind: FenceKind::Danger,
        north_m: 240.0,
        east_m: 180.0,
        safety_score: 25,
        description: "Active construction site, unstable scaffolding reported",
    },
    FenceSpec {
        name: "Old harbour steps",
        kind: FenceKind::Danger,
        north_m: -300.0,
        east_m: 110.0,
        safety_score: 35,
        description: "Slippery stone steps, no railing after dark",
    },
    FenceSpec {
        name: "Heritage quarter",
        kind: FenceKind::Tourist,
        north_m: 100.0,
        east_m: -260.0,
        safety_score: 85,
        description: "Well-patrolled historic district with tourist police",
    },
    FenceSpec {
        name: "Night market",
        kind: FenceKind::Market,
        north_m: -150.0,
        east_m: -150.0,
        safety_score: 70,
        description: "Crowded evening market, watch for pickpockets",
    },
];

/// Generate the session fence set relative to the origin fix.
///
/// The first two specs become a danger circle and a danger polygon; the
/// tourist spec becomes an irregular polygon and the market spec a circle.
pub fn seed_session_fences(
    origin: Location,
    config: &Config,
    rng: &mut dyn SeededRng,
) -> Vec<GeoFence> {
    let jitter = config.offset_jitter_m();
    let mut fences = Vec::with_capacity(FENCE_SPECS.len());

    for (i, spec) in FENCE_SPECS.iter().enumerate() {
        let center = offset_m(
            origin,
            spec.north_m + rng.gaussian(0.0, jitter),
            spec.east_m + rng.gaussian(0.0, jitter),
        );

        let geometry = match (spec.kind, i) {
            (FenceKind::Danger, 0) => {
                Geometry::Circle { center, radius_m: config.danger_radius_m() }
            }
            (FenceKind::Danger, _) => square_ring(center, config.danger_radius_m() * 0.6),
            (FenceKind::Tourist, _) => pentagon_ring(center, 140.0),
            (FenceKind::Market, _) => {
                Geometry::Circle { center, radius_m: config.market_radius_m() }
            }
        };

        let fence = GeoFence {
            id: FenceId(i as u32 + 1),
            name: spec.name.to_string(),
            kind: spec.kind,
            geometry,
            safety_score: spec.safety_score,
            description: spec.description.to_string(),
        };

        info!(
            fence_id = %fence.id,
            name = %fence.name,
            kind = %fence.kind.as_str(),
            center = %fence.center(),
            radius_m = %format!("{:.0}", fence.radius_m()),
            "fence_seeded"
        );

        fences.push(fence);
    }

    fences
}

fn square_ring(center: Location, half_m: f64) -> Geometry {
    Geometry::Polygon {
        ring: vec![
            offset_m(center, half_m, -half_m),
            offset_m(center, half_m, half_m),
            offset_m(center, -half_m, half_m),
            offset_m(center, -half_m, -half_m),
        ],
    }
}

fn pentagon_ring(center: Location, radius_m: f64) -> Geometry {
    let ring = (0..5)
        .map(|i| {
            let angle = std::f64::consts::TAU * i as f64 / 5.0;
            // Slightly squashed east-west so the ring isn't a regular pentagon
            offset_m(center, radius_m * angle.cos(), radius_m * 0.8 * angle.sin())
        })
        .collect();
    Geometry::Polygon { ring }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::infra::rng::Lcg;

    #[test]
    fn test_seeding_is_deterministic() {
        let origin = Location::new(13.0475, 80.2824);
        let config = Config::default();

        let a = seed_session_fences(origin, &config, &mut Lcg::new(7));
        let b = seed_session_fences(origin, &config, &mut Lcg::new(7));

        assert_eq!(a.len(), b.len());
        for (fa, fb) in a.iter().zip(&b) {
            assert_eq!(fa.id, fb.id);
            assert_eq!(fa.center(), fb.center());
        }
    }

    #[test]
    fn test_seeds_one_danger_circle_and_one_danger_polygon() {
        let origin = Location::new(13.0475, 80.2824);
        let config = Config::default();
        let fences = seed_session_fences(origin, &config, &mut Lcg::new(7));

        let dangers: Vec<_> =
            fences.iter().filter(|f| f.kind == FenceKind::Danger).collect();
        assert_eq!(dangers.len(), 2);
        assert!(matches!(dangers[0].geometry, Geometry::Circle { .. }));
        assert!(matches!(dangers[1].geometry, Geometry::Polygon { .. }));
    }

    #[test]
    fn test_fences_are_near_origin() {
        let origin = Location::new(13.0475, 80.2824);
        let config = Config::default();
        let fences = seed_session_fences(origin, &config, &mut Lcg::new(7));

        for fence in &fences {
            let d = crate::domain::geo::haversine_m(origin, fence.center());
            assert!(d < 600.0, "{} is {d}m from origin", fence.name);
        }
    }

    #[test]
    fn test_fence_centers_contained() {
        let origin = Location::new(13.0475, 80.2824);
        let config = Config::default();
        let fences = seed_session_fences(origin, &config, &mut Lcg::new(42));

        for fence in &fences {
            assert!(fence.contains(fence.center()), "{} excludes its center", fence.name);
        }
    }
}
