//! Event handlers for the Monitor
//!
//! Each handler mutates session state and pushes resulting commands onto the
//! egress channel. Transition detection itself lives in the detector; route
//! geometry in the escape planner. Handlers only wire decisions to effects.

use super::{Monitor, MonitorState};
use crate::domain::event::{epoch_ms, ZoneEvent, ZoneEventKind};
use crate::domain::fence::{FenceKind, GeoFence};
use crate::domain::geo::{haversine_m, Location};
use crate::io::egress_channel::{AlertReason, NavProgressPayload};
use crate::io::journal;
use crate::services::detector::{TransitionDetector, TransitionKind};
use crate::services::escape::{instruction_for, plan_exit_route};
use crate::services::seeder::seed_session_fences;
use crate::services::walk::plan_walk;
use std::path::Path;
use tracing::{debug, info, warn};

impl Monitor {
    /// Begin a session. Seeds fences around the origin, plans the walk toward
    /// the first danger fence, and processes the initial fix.
    pub(crate) fn handle_start(&mut self) {
        if !matches!(self.state, MonitorState::Idle) {
            debug!(state = %self.state.as_str(), "start_ignored_session_active");
            return;
        }

        // Origin is the last known position: the location source's initial
        // fix when one was resolved, the configured origin otherwise
        let origin = self.position;
        self.fences = seed_session_fences(origin, &self.config, &mut self.rng);

        // Aim the walk at the first danger fence so intersections happen
        let target = self
            .fences
            .iter()
            .find(|f| f.kind == FenceKind::Danger)
            .map(|f| f.center())
            .unwrap_or(origin);

        self.walk = plan_walk(
            origin,
            target,
            self.config.walk_len(),
            self.config.step_m(),
            &mut self.rng,
        );
        self.walk_idx = 0;
        self.detector = TransitionDetector::new();
        self.state = MonitorState::Simulating;

        info!(
            origin = %origin,
            fences = %self.fences.len(),
            walk_len = %self.walk.len(),
            "session_started"
        );

        self.process_fix(origin);
    }

    /// One step along the precomputed walk. The course wraps around so long
    /// sessions keep producing fixes.
    pub(crate) fn handle_walk_tick(&mut self) {
        if !matches!(self.state, MonitorState::Simulating) {
            return;
        }
        if self.walk.is_empty() {
            return;
        }

        let pos = self.walk[self.walk_idx];
        self.walk_idx = (self.walk_idx + 1) % self.walk.len();
        self.position = pos;
        self.process_fix(pos);
    }

    /// One waypoint along the active exit route
    pub(crate) fn handle_nav_tick(&mut self) {
        let (pos, idx, total, last, fence_id) = match &self.state {
            MonitorState::Navigating { route, idx, fence_id } => (
                route[*idx],
                *idx,
                route.len(),
                *route.last().expect("route is never empty"),
                *fence_id,
            ),
            _ => return,
        };

        self.position = pos;
        let done = idx + 1 >= total;

        self.egress.send_nav_progress(NavProgressPayload {
            site: None,
            ts: epoch_ms(),
            idx,
            total,
            remaining_m: haversine_m(pos, last),
            instruction: instruction_for(idx, total).to_string(),
            done,
        });

        // May itself replace the route if this step enters another danger fence
        self.process_fix(pos);

        let route_unchanged = matches!(
            &self.state,
            MonitorState::Navigating { fence_id: fid, .. } if *fid == fence_id
        );
        if route_unchanged {
            if done {
                info!(fence_id = %fence_id, "navigation_completed");
                self.state = MonitorState::Simulating;
            } else if let MonitorState::Navigating { idx, .. } = &mut self.state {
                *idx += 1;
            }
        }
    }

    /// Externally supplied fix, e.g. from a replay file. Accepted in any
    /// non-idle state.
    pub(crate) fn handle_fix(&mut self, location: Location) {
        if matches!(self.state, MonitorState::Idle) {
            return;
        }
        self.position = location;
        self.process_fix(location);
    }

    /// Panic button: record an SOS event and push an alert regardless of
    /// fence containment
    pub(crate) fn handle_sos(&mut self) {
        if matches!(self.state, MonitorState::Idle) {
            return;
        }

        let mut event = ZoneEvent::new(
            ZoneEventKind::Sos,
            self.position,
            "SOS triggered by user",
        );
        // Attach the containing fence when inside one
        if let Some(fence) =
            self.fences.iter().find(|f| self.detector.is_inside(f.id))
        {
            event = event.with_fence(fence.id, &fence.name, fence.kind);
        }

        warn!(event_id = %event.id, location = %self.position, "sos_triggered");
        self.metrics.record_sos();
        self.egress.send_zone_event(&event);
        self.egress.send_alert(AlertReason::Sos, &event);
        self.events.push(event);
    }

    /// End the session and export the event window as CSV next to the journal
    pub(crate) fn handle_stop(&mut self) {
        if matches!(self.state, MonitorState::Idle) {
            return;
        }

        let export_path =
            Path::new(self.config.journal_file()).with_extension("csv");
        match journal::export_csv(&self.events.snapshot(), &export_path) {
            Ok(rows) => {
                info!(path = %export_path.display(), rows = %rows, "session_export_written")
            }
            Err(e) => warn!(error = %e, "session_export_failed"),
        }

        info!(events = %self.events.len(), "session_stopped");
        self.state = MonitorState::Idle;
    }

    /// Run a position through the detector and handle every transition
    fn process_fix(&mut self, point: Location) {
        self.metrics.record_fix();
        let transitions = self.detector.observe(point, &self.fences);
        self.metrics.set_active_zones(self.detector.active_count());

        for transition in transitions {
            let Some(fence) =
                self.fences.iter().find(|f| f.id == transition.fence_id).cloned()
            else {
                continue;
            };

            let (kind, message) = match transition.kind {
                TransitionKind::Entry => (
                    ZoneEventKind::Entry,
                    format!("Entered {} ({})", fence.name, fence.kind.as_str()),
                ),
                TransitionKind::Exit => {
                    (ZoneEventKind::Exit, format!("Left {}", fence.name))
                }
            };

            let event = ZoneEvent::new(kind, point, message)
                .with_fence(fence.id, &fence.name, fence.kind);

            info!(
                event_id = %event.id,
                kind = %event.kind.as_str(),
                fence = %fence.name,
                safety_score = %fence.safety_score,
                location = %point,
                "zone_transition"
            );

            match transition.kind {
                TransitionKind::Entry => self.metrics.record_entry(fence.id.0),
                TransitionKind::Exit => self.metrics.record_exit(),
            }

            self.egress.send_zone_event(&event);

            if transition.kind == TransitionKind::Entry && fence.kind == FenceKind::Danger {
                self.egress.send_alert(AlertReason::DangerEntry, &event);
                self.begin_navigation(point, &fence);
            }

            self.events.push(event);
        }
    }

    /// Switch to navigation along a fresh exit route, unless already
    /// navigating away from this same fence
    fn begin_navigation(&mut self, point: Location, fence: &GeoFence) {
        if matches!(&self.state, MonitorState::Navigating { fence_id, .. } if *fence_id == fence.id)
        {
            return;
        }

        let route = plan_exit_route(point, fence);
        self.metrics.record_route_generated();
        self.egress.send_route(&fence.name, &route);

        info!(
            fence = %fence.name,
            waypoints = %route.len(),
            "exit_route_generated"
        );

        self.state =
            MonitorState::Navigating { route, idx: 0, fence_id: fence.id };
    }
}
