//! HTTP client for the external alert backend
//!
//! The backend contract is an external collaborator: this client only knows
//! the endpoint paths and that they accept/return JSON. Alert delivery is
//! fire-and-forget - failures are logged, counted, and spooled to a JSONL
//! file for best-effort replay once the backend is reachable again. Nothing
//! here is fatal.

use crate::infra::config::Config;
use crate::infra::metrics::Metrics;
use crate::io::egress_channel::{AlertPayload, AlertReason, ZoneEventPayload};
use anyhow::Context;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, info, warn};

const SEND_ALERT_PATH: &str = "/api/send_alert/";
const SOS_PATH: &str = "/api/sos/";
const GEOEVENTS_PATH: &str = "/api/geoevents/";
const GET_ALERTS_PATH: &str = "/api/get_alerts/";

/// One spooled payload awaiting replay
#[derive(Debug, Serialize, Deserialize)]
struct SpoolEntry {
    path: String,
    body: String,
    ts: u64,
}

pub struct BackendClient {
    base_url: String,
    enabled: bool,
    client: Option<reqwest::Client>,
    spool_file: PathBuf,
    metrics: Arc<Metrics>,
}

impl BackendClient {
    pub fn new(config: &Config, metrics: Arc<Metrics>) -> Self {
        // Create HTTP client once for reuse (connection pooling)
        let client = reqwest::Client::builder()
            .timeout(Duration::from_millis(config.backend_timeout_ms()))
            .http1_only()
            .build()
            .ok();

        Self {
            base_url: config.backend_base_url().trim_end_matches('/').to_string(),
            enabled: config.backend_enabled(),
            client,
            spool_file: PathBuf::from(config.backend_spool_file()),
            metrics,
        }
    }

    /// Deliver an alert command (danger entry or SOS).
    ///
    /// On failure the payload is spooled for later replay.
    pub async fn send_alert(&self, payload: &AlertPayload) {
        let path = match payload.reason {
            AlertReason::Sos => SOS_PATH,
            AlertReason::DangerEntry => SEND_ALERT_PATH,
        };

        let body = match serde_json::to_string(payload) {
            Ok(body) => body,
            Err(e) => {
                warn!(error = %e, "alert_serialize_failed");
                return;
            }
        };

        if !self.enabled {
            debug!(path = %path, "backend_disabled_alert_skipped");
            return;
        }

        match self.post_raw(path, body.clone()).await {
            Ok(()) => {
                self.metrics.record_alert_sent();
                info!(
                    reason = %payload.reason.as_str(),
                    event_id = %payload.event.id,
                    path = %path,
                    "alert_sent"
                );
            }
            Err(e) => {
                self.metrics.record_alert_failed();
                warn!(
                    reason = %payload.reason.as_str(),
                    event_id = %payload.event.id,
                    error = %e,
                    "alert_send_failed"
                );
                if self.spool(path, &body) {
                    self.metrics.record_alert_spooled();
                }
            }
        }
    }

    /// Forward a zone event to the geoevents feed. Log-only on failure -
    /// the journal already holds the durable copy.
    pub async fn send_geoevent(&self, payload: &ZoneEventPayload) {
        if !self.enabled {
            return;
        }
        let body = match serde_json::to_string(payload) {
            Ok(body) => body,
            Err(e) => {
                warn!(error = %e, "geoevent_serialize_failed");
                return;
            }
        };

        if let Err(e) = self.post_raw(GEOEVENTS_PATH, body).await {
            debug!(error = %e, "geoevent_send_failed");
        }
    }

    /// Fetch recent alerts from the backend.
    ///
    /// Failures degrade to an empty list so callers never have to handle a
    /// missing backend.
    pub async fn fetch_alerts(&self) -> serde_json::Value {
        if !self.enabled {
            return serde_json::json!([]);
        }

        match self.get_json(GET_ALERTS_PATH).await {
            Ok(value) => value,
            Err(e) => {
                warn!(error = %e, "get_alerts_failed_using_fallback");
                serde_json::json!([])
            }
        }
    }

    /// Retry spooled payloads. Successfully delivered entries are removed;
    /// the rest stay spooled for the next pass.
    pub async fn replay_spool(&self) {
        let entries = match self.read_spool() {
            Ok(entries) => entries,
            Err(e) => {
                debug!(error = %e, "spool_read_skipped");
                return;
            }
        };
        if entries.is_empty() {
            return;
        }

        let mut remaining = Vec::new();
        let mut replayed = 0usize;

        for entry in entries {
            match self.post_raw(&entry.path, entry.body.clone()).await {
                Ok(()) => {
                    replayed += 1;
                    self.metrics.record_alert_replayed();
                }
                Err(_) => remaining.push(entry),
            }
        }

        if let Err(e) = self.write_spool(&remaining) {
            warn!(error = %e, "spool_rewrite_failed");
        }

        if replayed > 0 {
            info!(replayed = %replayed, remaining = %remaining.len(), "spool_replayed");
        }
    }

    async fn post_raw(&self, path: &str, body: String) -> anyhow::Result<()> {
        let client = self.client.as_ref().context("http client not initialized")?;
        let url = format!("{}{}", self.base_url, path);

        client
            .post(&url)
            .header("content-type", "application/json")
            .body(body)
            .send()
            .await
            .with_context(|| format!("POST {url}"))?
            .error_for_status()
            .with_context(|| format!("POST {url}"))?;

        Ok(())
    }

    async fn get_json(&self, path: &str) -> anyhow::Result<serde_json::Value> {
        let client = self.client.as_ref().context("http client not initialized")?;
        let url = format!("{}{}", self.base_url, path);

        let text = client
            .get(&url)
            .send()
            .await
            .with_context(|| format!("GET {url}"))?
            .error_for_status()
            .with_context(|| format!("GET {url}"))?
            .text()
            .await
            .context("read body")?;

        serde_json::from_str(&text).context("parse response JSON")
    }

    fn spool(&self, path: &str, body: &str) -> bool {
        let entry = SpoolEntry {
            path: path.to_string(),
            body: body.to_string(),
            ts: crate::domain::event::epoch_ms(),
        };

        match self.append_spool_entry(&entry) {
            Ok(()) => {
                debug!(path = %path, file = %self.spool_file.display(), "alert_spooled");
                true
            }
            Err(e) => {
                warn!(error = %e, "alert_spool_failed");
                false
            }
        }
    }

    fn append_spool_entry(&self, entry: &SpoolEntry) -> anyhow::Result<()> {
        use std::io::Write;

        if let Some(parent) = self.spool_file.parent() {
            if !parent.as_os_str().is_empty() && !parent.exists() {
                std::fs::create_dir_all(parent)
                    .with_context(|| format!("create {}", parent.display()))?;
            }
        }

        let mut file = std::fs::OpenOptions::new()
            .create(true)
            .append(true)
            .open(&self.spool_file)
            .with_context(|| format!("open {}", self.spool_file.display()))?;

        writeln!(file, "{}", serde_json::to_string(entry)?)?;
        Ok(())
    }

    fn read_spool(&self) -> anyhow::Result<Vec<SpoolEntry>> {
        if !Path::new(&self.spool_file).exists() {
            return Ok(Vec::new());
        }
        let content = std::fs::read_to_string(&self.spool_file)
            .with_context(|| format!("read {}", self.spool_file.display()))?;

        let mut entries = Vec::new();
        for line in content.lines().filter(|l| !l.trim().is_empty()) {
            match serde_json::from_str::<SpoolEntry>(line) {
                Ok(entry) => entries.push(entry),
                Err(e) => warn!(error = %e, "spool_line_skipped"),
            }
        }
        Ok(entries)
    }

    fn write_spool(&self, entries: &[SpoolEntry]) -> anyhow::Result<()> {
        use std::io::Write;

        if entries.is_empty() {
            if Path::new(&self.spool_file).exists() {
                std::fs::remove_file(&self.spool_file)
                    .with_context(|| format!("remove {}", self.spool_file.display()))?;
            }
            return Ok(());
        }

        let mut file = std::fs::File::create(&self.spool_file)
            .with_context(|| format!("create {}", self.spool_file.display()))?;
        for entry in entries {
            writeln!(file, "{}", serde_json::to_string(entry)?)?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::event::{ZoneEvent, ZoneEventKind};
    use crate::domain::geo::Location;
    use tempfile::tempdir;

    fn client_with_spool(spool: &Path) -> BackendClient {
        BackendClient {
            base_url: "http://localhost:1".to_string(),
            enabled: true,
            client: None,
            spool_file: spool.to_path_buf(),
            metrics: Arc::new(Metrics::new()),
        }
    }

    fn alert_payload() -> AlertPayload {
        let event = ZoneEvent::new(ZoneEventKind::Sos, Location::new(13.05, 80.28), "help");
        AlertPayload { site: Some("test".to_string()), reason: AlertReason::Sos, event }
    }

    #[tokio::test]
    async fn test_failed_alert_is_spooled() {
        let dir = tempdir().unwrap();
        let spool = dir.path().join("spool/alerts.jsonl");
        let client = client_with_spool(&spool);

        client.send_alert(&alert_payload()).await;

        let entries = client.read_spool().unwrap();
        assert_eq!(entries.len(), 1);
        assert_eq!(entries[0].path, SOS_PATH);

        let parsed: serde_json::Value = serde_json::from_str(&entries[0].body).unwrap();
        assert_eq!(parsed["reason"], "sos");
    }

    #[tokio::test]
    async fn test_replay_keeps_failing_entries() {
        let dir = tempdir().unwrap();
        let spool = dir.path().join("alerts.jsonl");
        let client = client_with_spool(&spool);

        client.send_alert(&alert_payload()).await;
        client.send_alert(&alert_payload()).await;

        // Backend still unreachable (no http client) - everything stays spooled
        client.replay_spool().await;
        assert_eq!(client.read_spool().unwrap().len(), 2);
    }

    #[tokio::test]
    async fn test_disabled_backend_skips_network_and_spool() {
        let dir = tempdir().unwrap();
        let spool = dir.path().join("alerts.jsonl");
        let mut client = client_with_spool(&spool);
        client.enabled = false;

        client.send_alert(&alert_payload()).await;
        assert!(client.read_spool().unwrap().is_empty());

        let alerts = client.fetch_alerts().await;
        assert_eq!(alerts, serde_json::json!([]));
    }

    #[test]
    fn test_spool_rewrite_removes_file_when_empty() {
        let dir = tempdir().unwrap();
        let spool = dir.path().join("alerts.jsonl");
        let client = client_with_spool(&spool);

        client.spool(SOS_PATH, "{}");
        assert!(spool.exists());

        client.write_spool(&[]).unwrap();
        assert!(!spool.exists());
    }
}
