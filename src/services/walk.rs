//! Synthetic walk planning
//!
//! Precomputes the "walk" path the simulator steps through, standing in for
//! a real GPS watch. The course drifts toward a target (the first danger
//! fence) with Gaussian wobble on heading and step length, so fence
//! intersections happen without being scripted tick-by-tick.

use crate::domain::geo::{displacement_m, offset_m, Location};
use crate::infra::rng::SeededRng;

/// Heading wobble per step (radians)
const HEADING_STD: f64 = 0.35;

/// Step length standard deviation, as a fraction of the nominal step
const STEP_STD_FRAC: f64 = 0.2;

/// Plan a walk of `len` points starting at `origin`.
///
/// The course heads toward `target` until it gets within one step of it,
/// then keeps the last heading, wandering onward past the far side.
pub fn plan_walk(
    origin: Location,
    target: Location,
    len: usize,
    step_m: f64,
    rng: &mut dyn SeededRng,
) -> Vec<Location> {
    let mut path = Vec::with_capacity(len);
    let mut pos = origin;
    let mut heading = bearing_rad(origin, target);

    for _ in 0..len {
        let (north, east) = displacement_m(pos, target);
        let remaining = (north * north + east * east).sqrt();
        if remaining > step_m {
            heading = east.atan2(north);
        }
        let step_heading = heading + rng.gaussian(0.0, HEADING_STD);
        let step = rng.gaussian(step_m, step_m * STEP_STD_FRAC).max(step_m * 0.25);

        pos = offset_m(pos, step * step_heading.cos(), step * step_heading.sin());
        path.push(pos);
    }

    path
}

/// Bearing from `from` to `to` as radians, 0 = north, clockwise positive
fn bearing_rad(from: Location, to: Location) -> f64 {
    let (north, east) = displacement_m(from, to);
    east.atan2(north)
}
