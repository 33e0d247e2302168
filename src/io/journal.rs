//! Event journal - local JSONL log and CSV export
//!
//! Events are written in JSONL format (one JSON object per line) to the file
//! specified in config. CSV export produces a spreadsheet-friendly snapshot
//! of the in-memory event window.

use crate::domain::event::ZoneEvent;
use crate::io::egress_channel::ZoneEventPayload;
use chrono::{TimeZone, Utc};
use std::fs::OpenOptions;
use std::io::Write;
use std::path::Path;
use tracing::{debug, error, info};

/// Journal writer for zone events
pub struct EventJournal {
    file_path: String,
}

impl EventJournal {
    pub fn new(file_path: &str) -> Self {
        info!(file_path = %file_path, "journal_initialized");
        Self { file_path: file_path.to_string() }
    }

    /// Write an event to the journal file
    /// Returns true if successful, false otherwise
    pub fn write_event(&self, payload: &ZoneEventPayload) -> bool {
        let json = match serde_json::to_string(payload) {
            Ok(json) => json,
            Err(e) => {
                error!(error = %e, "journal_serialize_failed");
                return false;
            }
        };

        match self.append_line(&json) {
            Ok(()) => {
                debug!(
                    event_id = %payload.event.id,
                    kind = %payload.event.kind.as_str(),
                    "event_journaled"
                );
                true
            }
            Err(e) => {
                error!(event_id = %payload.event.id, error = %e, "journal_write_failed");
                false
            }
        }
    }

    /// Append a line to the journal file
    fn append_line(&self, line: &str) -> std::io::Result<()> {
        let path = Path::new(&self.file_path);

        // Create parent directories if they don't exist
        if let Some(parent) = path.parent() {
            if !parent.as_os_str().is_empty() && !parent.exists() {
                std::fs::create_dir_all(parent)?;
            }
        }

        let mut file = OpenOptions::new().create(true).append(true).open(path)?;

        writeln!(file, "{}", line)?;
        Ok(())
    }
}

/// Export events to CSV, oldest first. Returns the number of rows written.
pub fn export_csv<P: AsRef<Path>>(events: &[ZoneEvent], path: P) -> std::io::Result<usize> {
    let path = path.as_ref();
    if let Some(parent) = path.parent() {
        if !parent.as_os_str().is_empty() && !parent.exists() {
            std::fs::create_dir_all(parent)?;
        }
    }

    let mut file = std::fs::File::create(path)?;
    writeln!(file, "id,kind,fence_id,fence_name,fence_kind,timestamp,lat,lon,message")?;

    for event in events {
        let fence_id =
            event.fence_id.map(|id| id.to_string()).unwrap_or_default();
        let fence_kind =
            event.fence_kind.map(|k| k.as_str().to_string()).unwrap_or_default();
        writeln!(
            file,
            "{},{},{},{},{},{},{:.6},{:.6},{}",
            event.id,
            event.kind.as_str(),
            fence_id,
            csv_field(event.fence_name.as_deref().unwrap_or("")),
            fence_kind,
            rfc3339_ms(event.ts),
            event.location.lat,
            event.location.lon,
            csv_field(&event.message),
        )?;
    }

    info!(path = %path.display(), rows = %events.len(), "csv_exported");
    Ok(events.len())
}

/// Quote a CSV field if it contains a delimiter or quote
fn csv_field(value: &str) -> String {
    if value.contains(',') || value.contains('"') || value.contains('\n') {
        format!("\"{}\"", value.replace('"', "\"\""))
    } else {
        value.to_string()
    }
}

fn rfc3339_ms(epoch_ms: u64) -> String {
    match Utc.timestamp_millis_opt(epoch_ms as i64).single() {
        Some(dt) => dt.to_rfc3339(),
        None => epoch_ms.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::event::ZoneEventKind;
    use crate::domain::fence::FenceKind;
    use crate::domain::geo::{FenceId, Location};
    use tempfile::tempdir;

    fn payload(kind: ZoneEventKind) -> ZoneEventPayload {
        let event = ZoneEvent::new(kind, Location::new(13.05, 80.28), "test")
            .with_fence(FenceId(1), "Night market", FenceKind::Market);
        ZoneEventPayload { site: Some("test".to_string()), event }
    }

    #[test]
    fn test_write_event_appends_jsonl() {
        let dir = tempdir().unwrap();
        let file_path = dir.path().join("events.jsonl");
        let journal = EventJournal::new(file_path.to_str().unwrap());

        assert!(journal.write_event(&payload(ZoneEventKind::Entry)));
        assert!(journal.write_event(&payload(ZoneEventKind::Exit)));

        let content = std::fs::read_to_string(&file_path).unwrap();
        let lines: Vec<&str> = content.lines().collect();
        assert_eq!(lines.len(), 2);

        let first: serde_json::Value = serde_json::from_str(lines[0]).unwrap();
        assert_eq!(first["kind"], "entry");
        assert_eq!(first["fence_name"], "Night market");
        assert_eq!(first["site"], "test");
    }

    #[test]
    fn test_journal_creates_parent_dirs() {
        let dir = tempdir().unwrap();
        let file_path = dir.path().join("nested/deep/events.jsonl");
        let journal = EventJournal::new(file_path.to_str().unwrap());

        assert!(journal.write_event(&payload(ZoneEventKind::Sos)));
        assert!(file_path.exists());
    }

    #[test]
    fn test_export_csv() {
        let dir = tempdir().unwrap();
        let csv_path = dir.path().join("export.csv");

        let events = vec![
            payload(ZoneEventKind::Entry).event,
            ZoneEvent::new(ZoneEventKind::Sos, Location::new(13.05, 80.28), "help, now"),
        ];
        let rows = export_csv(&events, &csv_path).unwrap();
        assert_eq!(rows, 2);

        let content = std::fs::read_to_string(&csv_path).unwrap();
        let lines: Vec<&str> = content.lines().collect();
        assert_eq!(lines.len(), 3);
        assert!(lines[0].starts_with("id,kind,fence_id"));
        assert!(lines[1].contains(",entry,1,Night market,market,"));
        // Field with a comma gets quoted
        assert!(lines[2].contains("\"help, now\""));
    }

    #[test]
    fn test_rfc3339_ms() {
        // 2025-01-04T18:19:05.678Z
        let formatted = rfc3339_ms(1736014745678);
        assert!(formatted.starts_with("2025-01-04T"), "{formatted}");
    }
}
