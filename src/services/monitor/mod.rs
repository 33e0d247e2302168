//! Zone monitor - session state machine and event orchestration
//!
//! The Monitor is the central event processor that coordinates:
//! - Session lifecycle (fence seeding, walk planning, start/stop)
//! - Transition detection on every position fix
//! - Exit-route navigation after a danger entry
//! - SOS handling and egress of events, alerts, and routes
//!
//! All side effects go through the egress channel; the monitor itself only
//! decides and records.

mod handlers;

use crate::domain::event::EventLog;
use crate::domain::fence::GeoFence;
use crate::domain::geo::{FenceId, Location};
use crate::infra::config::Config;
use crate::infra::metrics::Metrics;
use crate::infra::rng::Lcg;
use crate::io::EgressSender;
use crate::services::detector::TransitionDetector;
use crate::services::escape::ExitRoute;
use std::sync::Arc;
use std::time::Instant;
use tokio::sync::mpsc;

/// Inputs to the monitor loop
#[derive(Debug, Clone)]
pub enum MonitorEvent {
    /// Begin a session: seed fences, plan the walk, start simulating
    Start,
    /// Advance one step along the simulated walk
    WalkTick,
    /// Advance one waypoint along the active exit route
    NavTick,
    /// Externally supplied position fix (replay source)
    Fix(Location),
    /// Panic button
    Sos,
    /// End the session and export the event window
    Stop,
}

/// Session state
#[derive(Debug)]
pub enum MonitorState {
    /// No session running
    Idle,
    /// Stepping through the simulated walk
    Simulating,
    /// Following an exit route out of a danger fence
    Navigating { route: ExitRoute, idx: usize, fence_id: FenceId },
}

impl MonitorState {
    pub fn as_str(&self) -> &'static str {
        match self {
            MonitorState::Idle => "idle",
            MonitorState::Simulating => "simulating",
            MonitorState::Navigating { .. } => "navigating",
        }
    }
}

/// Central event processor for the geofence session
pub struct Monitor {
    /// Application configuration
    pub(crate) config: Config,
    /// Session fences, seeded on Start
    pub(crate) fences: Vec<GeoFence>,
    /// Containment-set differ
    pub(crate) detector: TransitionDetector,
    /// Recent event window
    pub(crate) events: EventLog,
    /// Current session state
    pub(crate) state: MonitorState,
    /// Precomputed walk course
    pub(crate) walk: Vec<Location>,
    /// Next walk point to emit (wraps around)
    pub(crate) walk_idx: usize,
    /// Last known position
    pub(crate) position: Location,
    /// Seeded RNG for fence jitter and walk wobble
    pub(crate) rng: Lcg,
    /// Metrics collector
    pub(crate) metrics: Arc<Metrics>,
    /// Egress channel to the backend publisher
    pub(crate) egress: EgressSender,
}

impl Monitor {
    pub fn new(config: Config, metrics: Arc<Metrics>, egress: EgressSender) -> Self {
        let origin = config.origin();
        let event_window = config.event_window();
        let seed = config.seed();
        Self {
            config,
            fences: Vec::new(),
            detector: TransitionDetector::new(),
            events: EventLog::new(event_window),
            state: MonitorState::Idle,
            walk: Vec::new(),
            walk_idx: 0,
            position: origin,
            rng: Lcg::new(seed),
            metrics,
            egress,
        }
    }

    /// Override the starting position, normally with a location source's
    /// initial fix
    pub fn with_origin(mut self, origin: Location) -> Self {
        self.position = origin;
        self
    }

    /// Run the monitor, consuming events from the channel until Stop or the
    /// channel closes
    pub async fn run(&mut self, mut event_rx: mpsc::Receiver<MonitorEvent>) {
        while let Some(event) = event_rx.recv().await {
            let stop = matches!(event, MonitorEvent::Stop);
            self.process_event(event);
            if stop {
                break;
            }
        }
    }

    /// Process a single event, dispatching to the appropriate handler
    pub fn process_event(&mut self, event: MonitorEvent) {
        let process_start = Instant::now();

        match event {
            MonitorEvent::Start => self.handle_start(),
            MonitorEvent::WalkTick => self.handle_walk_tick(),
            MonitorEvent::NavTick => self.handle_nav_tick(),
            MonitorEvent::Fix(location) => self.handle_fix(location),
            MonitorEvent::Sos => self.handle_sos(),
            MonitorEvent::Stop => self.handle_stop(),
        }

        let latency_us = process_start.elapsed().as_micros() as u64;
        self.metrics.record_tick_latency(latency_us);
    }

    /// Current session state name
    pub fn state_name(&self) -> &'static str {
        self.state.as_str()
    }
}
