//! Fence transition detection
//!
//! Pure decision logic: given a point and the session fences, recompute the
//! containment set and diff it against the previous one. Side effects (alerts,
//! journaling, navigation) belong to the monitor and downstream handlers.

use crate::domain::fence::GeoFence;
use crate::domain::geo::{FenceId, Location};
use std::collections::HashSet;

/// Direction of a containment change
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TransitionKind {
    Entry,
    Exit,
}

/// A single containment change for one fence
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Transition {
    pub kind: TransitionKind,
    pub fence_id: FenceId,
}

/// Tracks the set of fences currently containing the observed point
#[derive(Debug, Default)]
pub struct TransitionDetector {
    active: HashSet<FenceId>,
}

impl TransitionDetector {
    pub fn new() -> Self {
        Self { active: HashSet::new() }
    }

    /// Observe a new position and emit transitions.
    ///
    /// Entries are reported before exits within a single observation; both
    /// follow the fence list order so output is deterministic. Re-entering a
    /// fence after an exit always produces a fresh entry.
    pub fn observe(&mut self, point: Location, fences: &[GeoFence]) -> Vec<Transition> {
        let mut next = HashSet::with_capacity(self.active.len() + 1);
        let mut transitions = Vec::new();

        for fence in fences {
            if fence.contains(point) {
                next.insert(fence.id);
                if !self.active.contains(&fence.id) {
                    transitions.push(Transition { kind: TransitionKind::Entry, fence_id: fence.id });
                }
            }
        }

        for fence in fences {
            if self.active.contains(&fence.id) && !next.contains(&fence.id) {
                transitions.push(Transition { kind: TransitionKind::Exit, fence_id: fence.id });
            }
        }

        self.active = next;
        transitions
    }

    /// Whether the observed point is currently inside the given fence
    pub fn is_inside(&self, fence_id: FenceId) -> bool {
        self.active.contains(&fence_id)
    }

    /// Number of fences currently containing the point
    pub fn active_count(&self) -> usize {
        self.active.len()
    }

    /// The current containment set
    pub fn active(&self) -> &HashSet<FenceId> {
        &self.active
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::fence::{FenceKind, Geometry};
    use crate::domain::geo::offset_m;

    fn circle(id: u32, center: Location, radius_m: f64) -> GeoFence {
        GeoFence {
            id: FenceId(id),
            name: format!("fence_{id}"),
            kind: FenceKind::Tourist,
            geometry: Geometry::Circle { center, radius_m },
            safety_score: 80,
            description: String::new(),
        }
    }

    #[test]
    fn test_entry_then_exit_fires_once_each_in_order() {
        let center = Location::new(13.050, 80.282);
        let fences = vec![circle(1, center, 100.0)];
        let mut detector = TransitionDetector::new();

        let outside = offset_m(center, 0.0, 500.0);
        assert!(detector.observe(outside, &fences).is_empty());

        let entered = detector.observe(center, &fences);
        assert_eq!(entered.len(), 1);
        assert_eq!(entered[0].kind, TransitionKind::Entry);
        assert!(detector.is_inside(FenceId(1)));

        // Staying inside produces nothing
        assert!(detector.observe(offset_m(center, 10.0, 0.0), &fences).is_empty());

        let exited = detector.observe(outside, &fences);
        assert_eq!(exited.len(), 1);
        assert_eq!(exited[0].kind, TransitionKind::Exit);
        assert_eq!(detector.active_count(), 0);
    }

    #[test]
    fn test_reentry_fires_fresh_entry() {
        let center = Location::new(13.050, 80.282);
        let fences = vec![circle(1, center, 100.0)];
        let mut detector = TransitionDetector::new();
        let outside = offset_m(center, 0.0, 500.0);

        detector.observe(center, &fences);
        detector.observe(outside, &fences);

        let reentered = detector.observe(center, &fences);
        assert_eq!(reentered.len(), 1);
        assert_eq!(reentered[0].kind, TransitionKind::Entry);
        assert_eq!(reentered[0].fence_id, FenceId(1));
    }

    #[test]
    fn test_crossing_between_overlapping_fences() {
        let a_center = Location::new(13.050, 80.282);
        let b_center = offset_m(a_center, 0.0, 150.0);
        let fences = vec![circle(1, a_center, 100.0), circle(2, b_center, 100.0)];
        let mut detector = TransitionDetector::new();

        // Inside A only
        detector.observe(a_center, &fences);
        assert!(detector.is_inside(FenceId(1)));
        assert!(!detector.is_inside(FenceId(2)));

        // Midpoint is inside both; only B is new
        let mid = offset_m(a_center, 0.0, 75.0);
        let transitions = detector.observe(mid, &fences);
        assert_eq!(transitions.len(), 1);
        assert_eq!(transitions[0], Transition { kind: TransitionKind::Entry, fence_id: FenceId(2) });

        // Moving to B's center leaves A, entry before exit not applicable (only exit)
        let transitions = detector.observe(b_center, &fences);
        assert_eq!(transitions.len(), 1);
        assert_eq!(transitions[0], Transition { kind: TransitionKind::Exit, fence_id: FenceId(1) });
    }

    #[test]
    fn test_entries_precede_exits_in_one_observation() {
        let a_center = Location::new(13.050, 80.282);
        let b_center = offset_m(a_center, 0.0, 400.0);
        let fences = vec![circle(1, a_center, 100.0), circle(2, b_center, 100.0)];
        let mut detector = TransitionDetector::new();

        detector.observe(a_center, &fences);
        // Jump straight from A into B: one entry and one exit in a single tick
        let transitions = detector.observe(b_center, &fences);
        assert_eq!(transitions.len(), 2);
        assert_eq!(transitions[0], Transition { kind: TransitionKind::Entry, fence_id: FenceId(2) });
        assert_eq!(transitions[1], Transition { kind: TransitionKind::Exit, fence_id: FenceId(1) });
    }
}
