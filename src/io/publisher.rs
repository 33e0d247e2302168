//! Backend publisher - executes egress commands
//!
//! Receives messages from the egress channel and performs their side
//! effects: journaling events locally, forwarding them to the external
//! backend, and logging route/navigation progress. This keeps all IO out
//! of the monitor's decision loop.

use crate::io::backend::BackendClient;
use crate::io::egress_channel::EgressMessage;
use crate::io::journal::EventJournal;
use std::sync::Arc;
use tokio::sync::{mpsc, watch};
use tracing::{debug, info};

/// Publisher actor
pub struct BackendPublisher {
    backend: Arc<BackendClient>,
    journal: EventJournal,
    rx: mpsc::Receiver<EgressMessage>,
}

impl BackendPublisher {
    pub fn new(
        backend: Arc<BackendClient>,
        journal: EventJournal,
        rx: mpsc::Receiver<EgressMessage>,
    ) -> Self {
        Self { backend, journal, rx }
    }

    /// Run the publisher loop
    ///
    /// Processes messages from the channel until shutdown; drains whatever
    /// is queued before returning so late alerts are not lost.
    pub async fn run(mut self, mut shutdown: watch::Receiver<bool>) {
        info!("backend_publisher_started");

        loop {
            tokio::select! {
                _ = shutdown.changed() => {
                    if *shutdown.borrow() {
                        info!("backend_publisher_shutdown");
                        while let Ok(msg) = self.rx.try_recv() {
                            self.handle_message(msg).await;
                        }
                        return;
                    }
                }
                Some(msg) = self.rx.recv() => {
                    self.handle_message(msg).await;
                }
            }
        }
    }

    async fn handle_message(&self, msg: EgressMessage) {
        match msg {
            EgressMessage::ZoneEvent(payload) => {
                self.journal.write_event(&payload);
                self.backend.send_geoevent(&payload).await;
            }
            EgressMessage::Alert(payload) => {
                self.backend.send_alert(&payload).await;
            }
            EgressMessage::Route(payload) => {
                info!(
                    fence = %payload.fence_name,
                    waypoints = %payload.waypoints.len(),
                    "exit_route_published"
                );
            }
            EgressMessage::NavProgress(payload) => {
                debug!(
                    idx = %payload.idx,
                    total = %payload.total,
                    remaining_m = %format!("{:.0}", payload.remaining_m),
                    done = %payload.done,
                    instruction = %payload.instruction,
                    "nav_progress"
                );
            }
            EgressMessage::Metrics(payload) => {
                debug!(site = %payload.site, "metrics_snapshot_published");
            }
        }
    }
}
