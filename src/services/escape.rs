//! Exit-route generation for danger zones
//!
//! Synthesizes a short polyline leading from the user's position directly
//! away from a fence's center. Purely illustrative guidance - no road
//! network, no obstacle avoidance.

use crate::domain::fence::GeoFence;
use crate::domain::geo::{displacement_m, offset_m, Location};
use smallvec::SmallVec;

/// Waypoints per generated route
pub const ROUTE_WAYPOINTS: usize = 8;

/// Extra distance past the fence boundary the route extends to
const CLEARANCE_M: f64 = 30.0;

/// Amplitude of the perpendicular wobble, for visual plausibility
const WOBBLE_AMPLITUDE_M: f64 = 6.0;

pub type ExitRoute = SmallVec<[Location; ROUTE_WAYPOINTS]>;

/// Plan a route from `user` away from the fence's center.
///
/// The route extends from the user's position past the fence boundary plus a
/// clearance margin, sampled as fixed waypoints along the outward vector with
/// a small sinusoidal perpendicular offset. If the user stands exactly on the
/// center the route heads due north.
pub fn plan_exit_route(user: Location, fence: &GeoFence) -> ExitRoute {
    let center = fence.center();
    let radius_m = fence.radius_m();

    let (north, east) = displacement_m(center, user);
    let dist = (north * north + east * east).sqrt();

    let (unit_n, unit_e) = if dist < 1.0 { (1.0, 0.0) } else { (north / dist, east / dist) };
    // Perpendicular to the outward vector
    let (perp_n, perp_e) = (-unit_e, unit_n);

    let travel_m = (radius_m - dist).max(0.0) + CLEARANCE_M;

    let mut route = ExitRoute::new();
    for i in 1..=ROUTE_WAYPOINTS {
        let along = travel_m * i as f64 / ROUTE_WAYPOINTS as f64;
        let wobble = WOBBLE_AMPLITUDE_M * (i as f64 * 0.9).sin();
        route.push(offset_m(
            user,
            unit_n * along + perp_n * wobble,
            unit_e * along + perp_e * wobble,
        ));
    }
    route
}

/// Canned instruction text for a navigation step
pub fn instruction_for(idx: usize, total: usize) -> &'static str {
    if idx + 1 >= total {
        "You have reached a safer area"
    } else if idx == 0 {
        "Head directly away from the zone center"
    } else if idx + 2 >= total {
        "Almost clear - keep moving"
    } else {
        "Continue along the marked route"
    }
}
