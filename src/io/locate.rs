//! Location sources
//!
//! Abstraction over where the session origin and subsequent fixes come from.
//! The default deployment has no real GPS hardware: StaticSource pins the
//! origin from config and the simulator takes over, while ReplaySource feeds
//! recorded fixes (and SOS markers) from a JSONL file into the monitor.

use crate::domain::geo::Location;
use crate::services::monitor::MonitorEvent;
use async_trait::async_trait;
use serde::Deserialize;
use tokio::sync::{mpsc, watch};
use tokio::time::{sleep, Duration};
use tracing::{info, warn};

/// Where the session's first coordinate comes from
#[async_trait]
pub trait LocationSource: Send + Sync {
    async fn initial_fix(&self) -> Option<Location>;
}

/// Fixed origin, typically from config
pub struct StaticSource {
    origin: Location,
}

impl StaticSource {
    pub fn new(origin: Location) -> Self {
        Self { origin }
    }
}

#[async_trait]
impl LocationSource for StaticSource {
    async fn initial_fix(&self) -> Option<Location> {
        Some(self.origin)
    }
}

/// One line of a replay file: either a position fix or an SOS marker
#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum ReplayLine {
    Event { event: String },
    Fix { lat: f64, lon: f64 },
}

/// Replays recorded fixes from a JSONL file at a fixed cadence
pub struct ReplaySource {
    path: String,
    interval_ms: u64,
}

impl ReplaySource {
    pub fn new(path: &str, interval_ms: u64) -> Self {
        Self { path: path.to_string(), interval_ms }
    }

    fn parse_lines(content: &str) -> Vec<MonitorEvent> {
        let mut events = Vec::new();
        for (n, line) in content.lines().enumerate() {
            if line.trim().is_empty() {
                continue;
            }
            match serde_json::from_str::<ReplayLine>(line) {
                Ok(ReplayLine::Fix { lat, lon }) => {
                    events.push(MonitorEvent::Fix(Location::new(lat, lon)));
                }
                Ok(ReplayLine::Event { event }) if event == "sos" => {
                    events.push(MonitorEvent::Sos);
                }
                Ok(ReplayLine::Event { event }) => {
                    warn!(line = %(n + 1), event = %event, "replay_event_skipped");
                }
                Err(e) => {
                    warn!(line = %(n + 1), error = %e, "replay_line_skipped");
                }
            }
        }
        events
    }

    /// Feed the replay file into the monitor, one line per interval.
    ///
    /// Returns when the file is exhausted or shutdown is signaled.
    pub async fn run(
        self,
        tx: mpsc::Sender<MonitorEvent>,
        mut shutdown: watch::Receiver<bool>,
    ) {
        let content = match tokio::fs::read_to_string(&self.path).await {
            Ok(content) => content,
            Err(e) => {
                warn!(path = %self.path, error = %e, "replay_file_unreadable");
                return;
            }
        };

        let events = Self::parse_lines(&content);
        info!(path = %self.path, fixes = %events.len(), "replay_started");

        for event in events {
            tokio::select! {
                _ = shutdown.changed() => {
                    if *shutdown.borrow() {
                        return;
                    }
                }
                _ = sleep(Duration::from_millis(self.interval_ms)) => {
                    if tx.send(event).await.is_err() {
                        return;
                    }
                }
            }
        }

        info!(path = %self.path, "replay_finished");
    }
}

#[async_trait]
impl LocationSource for ReplaySource {
    /// First fix in the replay file, if any
    async fn initial_fix(&self) -> Option<Location> {
        let content = tokio::fs::read_to_string(&self.path).await.ok()?;
        Self::parse_lines(&content).into_iter().find_map(|e| match e {
            MonitorEvent::Fix(location) => Some(location),
            _ => None,
        })
    }
}
