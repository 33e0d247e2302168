//! Typed channel for egress messages
//!
//! Decouples the monitor's decisions from their side effects: the monitor
//! pushes commands/events here and the backend publisher performs the HTTP
//! calls and journaling. Uses bounded mpsc channels to prevent unbounded
//! memory growth; senders never block.

use crate::domain::event::{epoch_ms, ZoneEvent};
use crate::domain::geo::Location;
use crate::infra::metrics::MetricsSummary;
use serde::Serialize;
use tokio::sync::mpsc;

/// Messages that can be sent to the backend publisher
#[derive(Debug)]
pub enum EgressMessage {
    /// Zone event for journaling and the geoevents feed
    ZoneEvent(ZoneEventPayload),
    /// Alert command (danger entry or SOS) for immediate backend delivery
    Alert(AlertPayload),
    /// Generated exit route
    Route(RoutePayload),
    /// Navigation progress along an exit route
    NavProgress(NavProgressPayload),
    /// Periodic metrics snapshot
    Metrics(MetricsPayload),
}

/// Payload for zone events
#[derive(Debug, Clone, Serialize)]
pub struct ZoneEventPayload {
    /// Site identifier
    #[serde(skip_serializing_if = "Option::is_none")]
    pub site: Option<String>,
    #[serde(flatten)]
    pub event: ZoneEvent,
}

/// What triggered an alert
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum AlertReason {
    DangerEntry,
    Sos,
}

impl AlertReason {
    pub fn as_str(&self) -> &'static str {
        match self {
            AlertReason::DangerEntry => "danger_entry",
            AlertReason::Sos => "sos",
        }
    }
}

/// Payload for alert commands
#[derive(Debug, Clone, Serialize)]
pub struct AlertPayload {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub site: Option<String>,
    pub reason: AlertReason,
    #[serde(flatten)]
    pub event: ZoneEvent,
}

/// Payload for generated exit routes
#[derive(Debug, Clone, Serialize)]
pub struct RoutePayload {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub site: Option<String>,
    /// Timestamp (epoch ms)
    pub ts: u64,
    /// Fence the route escapes from
    pub fence_name: String,
    pub waypoints: Vec<Location>,
}

/// Payload for navigation progress
#[derive(Debug, Clone, Serialize)]
pub struct NavProgressPayload {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub site: Option<String>,
    /// Timestamp (epoch ms)
    pub ts: u64,
    /// Current waypoint index (0-based)
    pub idx: usize,
    /// Total waypoints in the route
    pub total: usize,
    /// Distance to the final waypoint in meters
    pub remaining_m: f64,
    pub instruction: String,
    pub done: bool,
}

/// Payload for metrics snapshots
#[derive(Debug, Serialize)]
pub struct MetricsPayload {
    pub site: String,
    /// Timestamp (epoch ms)
    pub ts: u64,
    #[serde(flatten)]
    pub summary: MetricsSummary,
}

impl MetricsPayload {
    pub fn from_summary(summary: MetricsSummary, site: String) -> Self {
        Self { site, ts: epoch_ms(), summary }
    }
}

/// Sender handle for egress messages
///
/// Clone this to share across multiple producers.
/// Non-blocking - if the channel is full, messages are dropped.
#[derive(Clone)]
pub struct EgressSender {
    tx: mpsc::Sender<EgressMessage>,
    site_id: String,
}

impl EgressSender {
    pub fn new(tx: mpsc::Sender<EgressMessage>, site_id: String) -> Self {
        Self { tx, site_id }
    }

    /// Send a zone event for journaling and forwarding
    pub fn send_zone_event(&self, event: &ZoneEvent) {
        let payload =
            ZoneEventPayload { site: Some(self.site_id.clone()), event: event.clone() };
        // Use try_send to avoid blocking - drop if channel full
        let _ = self.tx.try_send(EgressMessage::ZoneEvent(payload));
    }

    /// Send an alert command for immediate delivery
    pub fn send_alert(&self, reason: AlertReason, event: &ZoneEvent) {
        let payload = AlertPayload {
            site: Some(self.site_id.clone()),
            reason,
            event: event.clone(),
        };
        let _ = self.tx.try_send(EgressMessage::Alert(payload));
    }

    /// Send a generated exit route
    pub fn send_route(&self, fence_name: &str, waypoints: &[Location]) {
        let payload = RoutePayload {
            site: Some(self.site_id.clone()),
            ts: epoch_ms(),
            fence_name: fence_name.to_string(),
            waypoints: waypoints.to_vec(),
        };
        let _ = self.tx.try_send(EgressMessage::Route(payload));
    }

    /// Send navigation progress
    pub fn send_nav_progress(&self, mut payload: NavProgressPayload) {
        payload.site = Some(self.site_id.clone());
        let _ = self.tx.try_send(EgressMessage::NavProgress(payload));
    }

    /// Send a metrics snapshot
    pub fn send_metrics(&self, summary: MetricsSummary) {
        let payload = MetricsPayload::from_summary(summary, self.site_id.clone());
        let _ = self.tx.try_send(EgressMessage::Metrics(payload));
    }
}

/// Create a new egress channel pair
///
/// Returns (sender, receiver) where sender can be cloned and shared.
/// Buffer size determines how many messages can be queued.
/// site_id is injected into every payload for downstream consumers.
pub fn create_egress_channel(
    buffer_size: usize,
    site_id: String,
) -> (EgressSender, mpsc::Receiver<EgressMessage>) {
    let (tx, rx) = mpsc::channel(buffer_size);
    (EgressSender::new(tx, site_id), rx)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::event::ZoneEventKind;

    #[test]
    fn test_payloads_carry_site_id() {
        let (sender, mut rx) = create_egress_channel(8, "marina".to_string());
        let event =
            ZoneEvent::new(ZoneEventKind::Entry, Location::new(13.05, 80.28), "entered");

        sender.send_zone_event(&event);
        sender.send_alert(AlertReason::DangerEntry, &event);

        match rx.try_recv().unwrap() {
            EgressMessage::ZoneEvent(p) => assert_eq!(p.site.as_deref(), Some("marina")),
            other => panic!("unexpected message {other:?}"),
        }
        match rx.try_recv().unwrap() {
            EgressMessage::Alert(p) => {
                assert_eq!(p.reason, AlertReason::DangerEntry);
                assert_eq!(p.site.as_deref(), Some("marina"));
            }
            other => panic!("unexpected message {other:?}"),
        }
    }

    #[test]
    fn test_full_channel_drops_instead_of_blocking() {
        let (sender, _rx) = create_egress_channel(1, "marina".to_string());
        let event = ZoneEvent::new(ZoneEventKind::Sos, Location::new(13.05, 80.28), "sos");

        // Second send overflows the buffer; neither call blocks or panics
        sender.send_zone_event(&event);
        sender.send_zone_event(&event);
    }

    #[test]
    fn test_alert_payload_json_shape() {
        let event = ZoneEvent::new(ZoneEventKind::Sos, Location::new(13.05, 80.28), "help");
        let payload = AlertPayload { site: Some("marina".to_string()), reason: AlertReason::Sos, event };
        let json = serde_json::to_value(&payload).unwrap();

        assert_eq!(json["reason"], "sos");
        assert_eq!(json["kind"], "sos");
        assert_eq!(json["message"], "help");
        assert_eq!(json["site"], "marina");
    }
}
