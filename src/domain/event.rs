//! Zone event model - the append-only alert/event record
//!
//! Events are created by the transition detector (entry/exit) or by the SOS
//! action, and kept in a capped in-memory window. Nothing here persists
//! across restarts; durable output goes through the journal.

use crate::domain::fence::FenceKind;
use crate::domain::geo::{FenceId, Location};
use serde::Serialize;
use std::collections::VecDeque;
use std::time::{SystemTime, UNIX_EPOCH};
use uuid::Uuid;

/// Generate a new UUIDv7 (time-sortable)
pub fn new_uuid_v7() -> String {
    Uuid::now_v7().to_string()
}

/// Get current epoch milliseconds
#[inline]
pub fn epoch_ms() -> u64 {
    SystemTime::now().duration_since(UNIX_EPOCH).unwrap_or_default().as_millis() as u64
}

/// Event classification
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum ZoneEventKind {
    Entry,
    Exit,
    Sos,
}

impl ZoneEventKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            ZoneEventKind::Entry => "entry",
            ZoneEventKind::Exit => "exit",
            ZoneEventKind::Sos => "sos",
        }
    }
}

/// A single zone event
#[derive(Debug, Clone, Serialize)]
pub struct ZoneEvent {
    /// UUIDv7 event ID
    pub id: String,
    pub kind: ZoneEventKind,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub fence_id: Option<FenceId>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub fence_name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub fence_kind: Option<FenceKind>,
    /// Epoch milliseconds
    pub ts: u64,
    pub location: Location,
    pub message: String,
}

impl ZoneEvent {
    pub fn new(kind: ZoneEventKind, location: Location, message: impl Into<String>) -> Self {
        Self {
            id: new_uuid_v7(),
            kind,
            fence_id: None,
            fence_name: None,
            fence_kind: None,
            ts: epoch_ms(),
            location,
            message: message.into(),
        }
    }

    pub fn with_fence(mut self, id: FenceId, name: &str, kind: FenceKind) -> Self {
        self.fence_id = Some(id);
        self.fence_name = Some(name.to_string());
        self.fence_kind = Some(kind);
        self
    }
}

/// Append-only event list capped to a recent window.
///
/// Oldest events are evicted first once the cap is reached.
#[derive(Debug)]
pub struct EventLog {
    events: VecDeque<ZoneEvent>,
    cap: usize,
}

impl EventLog {
    pub fn new(cap: usize) -> Self {
        Self { events: VecDeque::with_capacity(cap.min(256)), cap: cap.max(1) }
    }

    pub fn push(&mut self, event: ZoneEvent) {
        if self.events.len() == self.cap {
            self.events.pop_front();
        }
        self.events.push_back(event);
    }

    pub fn len(&self) -> usize {
        self.events.len()
    }

    pub fn is_empty(&self) -> bool {
        self.events.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &ZoneEvent> {
        self.events.iter()
    }

    pub fn latest(&self) -> Option<&ZoneEvent> {
        self.events.back()
    }

    /// Snapshot of the current window, oldest first
    pub fn snapshot(&self) -> Vec<ZoneEvent> {
        self.events.iter().cloned().collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn event(kind: ZoneEventKind) -> ZoneEvent {
        ZoneEvent::new(kind, Location::new(13.050, 80.282), "test")
    }

    #[test]
    fn test_event_ids_are_unique() {
        let a = event(ZoneEventKind::Entry);
        let b = event(ZoneEventKind::Entry);
        assert_ne!(a.id, b.id);
        assert_eq!(a.id.len(), 36);
    }

    #[test]
    fn test_with_fence() {
        let e = event(ZoneEventKind::Entry).with_fence(FenceId(7), "Night market", FenceKind::Market);
        assert_eq!(e.fence_id, Some(FenceId(7)));
        assert_eq!(e.fence_name.as_deref(), Some("Night market"));
        assert_eq!(e.fence_kind, Some(FenceKind::Market));
    }

    #[test]
    fn test_log_caps_to_window() {
        let mut log = EventLog::new(3);
        for _ in 0..5 {
            log.push(event(ZoneEventKind::Entry));
        }
        log.push(event(ZoneEventKind::Sos));

        assert_eq!(log.len(), 3);
        assert_eq!(log.latest().unwrap().kind, ZoneEventKind::Sos);
        // Oldest entries evicted
        assert!(log.iter().take(2).all(|e| e.kind == ZoneEventKind::Entry));
    }

    #[test]
    fn test_event_serializes_lowercase_kind() {
        let e = event(ZoneEventKind::Exit);
        let json = serde_json::to_value(&e).unwrap();
        assert_eq!(json["kind"], "exit");
        assert!(json.get("fence_id").is_none());
        assert_eq!(json["location"]["lat"], 13.050);
    }
}
