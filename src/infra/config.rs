//! Configuration loading from TOML files
//!
//! Config file is selected via:
//! 1. --config <path> command line argument
//! 2. CONFIG_FILE environment variable
//! 3. Default: config/dev.toml

use crate::domain::geo::Location;
use anyhow::Context;
use serde::Deserialize;
use std::env;
use std::fs;
use std::path::Path;

#[derive(Debug, Clone, Deserialize)]
pub struct SiteConfig {
    /// Unique site identifier (e.g., "marina", "fort-district")
    #[serde(default = "default_site_id")]
    pub id: String,
}

impl Default for SiteConfig {
    fn default() -> Self {
        Self { id: default_site_id() }
    }
}

fn default_site_id() -> String {
    "zonewatch".to_string()
}

#[derive(Debug, Clone, Deserialize)]
pub struct BackendConfig {
    /// Base URL of the external alert backend
    #[serde(default = "default_backend_base_url")]
    pub base_url: String,
    #[serde(default = "default_backend_timeout_ms")]
    pub timeout_ms: u64,
    /// Disable to run fully offline (events still journaled)
    #[serde(default = "default_backend_enabled")]
    pub enabled: bool,
    /// JSONL file buffering payloads that failed to send
    #[serde(default = "default_spool_file")]
    pub spool_file: String,
    /// How often to retry spooled payloads
    #[serde(default = "default_replay_interval_secs")]
    pub replay_interval_secs: u64,
}

impl Default for BackendConfig {
    fn default() -> Self {
        Self {
            base_url: default_backend_base_url(),
            timeout_ms: default_backend_timeout_ms(),
            enabled: default_backend_enabled(),
            spool_file: default_spool_file(),
            replay_interval_secs: default_replay_interval_secs(),
        }
    }
}

fn default_backend_base_url() -> String {
    "http://localhost:9090".to_string()
}

fn default_backend_timeout_ms() -> u64 {
    2000
}

fn default_backend_enabled() -> bool {
    true
}

fn default_spool_file() -> String {
    "spool/alerts.jsonl".to_string()
}

fn default_replay_interval_secs() -> u64 {
    30
}

#[derive(Debug, Clone, Deserialize)]
pub struct OriginConfig {
    /// Fallback coordinate when no location source is available
    #[serde(default = "default_origin_lat")]
    pub lat: f64,
    #[serde(default = "default_origin_lon")]
    pub lon: f64,
}

impl Default for OriginConfig {
    fn default() -> Self {
        Self { lat: default_origin_lat(), lon: default_origin_lon() }
    }
}

fn default_origin_lat() -> f64 {
    13.0475
}

fn default_origin_lon() -> f64 {
    80.2824
}

#[derive(Debug, Clone, Deserialize)]
pub struct SimConfig {
    /// Walk step interval (one synthetic fix per tick)
    #[serde(default = "default_walk_tick_ms")]
    pub walk_tick_ms: u64,
    /// Navigation step interval while following an exit route
    #[serde(default = "default_nav_tick_ms")]
    pub nav_tick_ms: u64,
    /// Number of precomputed walk points
    #[serde(default = "default_walk_len")]
    pub walk_len: usize,
    /// Nominal walk step length in meters
    #[serde(default = "default_step_m")]
    pub step_m: f64,
    /// RNG seed for fence jitter and walk wobble
    #[serde(default = "default_seed")]
    pub seed: u64,
}

impl Default for SimConfig {
    fn default() -> Self {
        Self {
            walk_tick_ms: default_walk_tick_ms(),
            nav_tick_ms: default_nav_tick_ms(),
            walk_len: default_walk_len(),
            step_m: default_step_m(),
            seed: default_seed(),
        }
    }
}

fn default_walk_tick_ms() -> u64 {
    1000
}

fn default_nav_tick_ms() -> u64 {
    1500
}

fn default_walk_len() -> usize {
    240
}

fn default_step_m() -> f64 {
    25.0
}

fn default_seed() -> u64 {
    7
}

#[derive(Debug, Clone, Deserialize)]
pub struct FencesConfig {
    #[serde(default = "default_danger_radius_m")]
    pub danger_radius_m: f64,
    #[serde(default = "default_market_radius_m")]
    pub market_radius_m: f64,
    /// Gaussian jitter applied to seeded fence offsets
    #[serde(default = "default_offset_jitter_m")]
    pub offset_jitter_m: f64,
}

impl Default for FencesConfig {
    fn default() -> Self {
        Self {
            danger_radius_m: default_danger_radius_m(),
            market_radius_m: default_market_radius_m(),
            offset_jitter_m: default_offset_jitter_m(),
        }
    }
}

fn default_danger_radius_m() -> f64 {
    120.0
}

fn default_market_radius_m() -> f64 {
    90.0
}

fn default_offset_jitter_m() -> f64 {
    20.0
}

#[derive(Debug, Clone, Deserialize)]
pub struct EventsConfig {
    /// Recent-window cap for the in-memory event log
    #[serde(default = "default_event_window")]
    pub window: usize,
}

impl Default for EventsConfig {
    fn default() -> Self {
        Self { window: default_event_window() }
    }
}

fn default_event_window() -> usize {
    200
}

#[derive(Debug, Clone, Deserialize)]
pub struct JournalConfig {
    /// File path for the event journal (JSONL format)
    #[serde(default = "default_journal_file")]
    pub file: String,
}

impl Default for JournalConfig {
    fn default() -> Self {
        Self { file: default_journal_file() }
    }
}

fn default_journal_file() -> String {
    "events.jsonl".to_string()
}

#[derive(Debug, Clone, Deserialize)]
pub struct MetricsConfig {
    #[serde(default = "default_metrics_interval_secs")]
    pub interval_secs: u64,
}

impl Default for MetricsConfig {
    fn default() -> Self {
        Self { interval_secs: default_metrics_interval_secs() }
    }
}

fn default_metrics_interval_secs() -> u64 {
    10
}

#[derive(Debug, Clone, Deserialize, Default)]
pub struct TomlConfig {
    #[serde(default)]
    pub site: SiteConfig,
    #[serde(default)]
    pub backend: BackendConfig,
    #[serde(default)]
    pub origin: OriginConfig,
    #[serde(default)]
    pub sim: SimConfig,
    #[serde(default)]
    pub fences: FencesConfig,
    #[serde(default)]
    pub events: EventsConfig,
    #[serde(default)]
    pub journal: JournalConfig,
    #[serde(default)]
    pub metrics: MetricsConfig,
}

/// Main configuration struct used throughout the application
#[derive(Debug, Clone)]
pub struct Config {
    site_id: String,
    backend_base_url: String,
    backend_timeout_ms: u64,
    backend_enabled: bool,
    backend_spool_file: String,
    backend_replay_interval_secs: u64,
    origin: Location,
    walk_tick_ms: u64,
    nav_tick_ms: u64,
    walk_len: usize,
    step_m: f64,
    seed: u64,
    danger_radius_m: f64,
    market_radius_m: f64,
    offset_jitter_m: f64,
    event_window: usize,
    journal_file: String,
    metrics_interval_secs: u64,
    config_file: String,
}

impl Default for Config {
    fn default() -> Self {
        Self::from_toml(TomlConfig::default(), "default")
    }
}

impl Config {
    fn from_toml(toml: TomlConfig, source: &str) -> Self {
        Self {
            site_id: toml.site.id,
            backend_base_url: toml.backend.base_url,
            backend_timeout_ms: toml.backend.timeout_ms,
            backend_enabled: toml.backend.enabled,
            backend_spool_file: toml.backend.spool_file,
            backend_replay_interval_secs: toml.backend.replay_interval_secs,
            origin: Location::new(toml.origin.lat, toml.origin.lon),
            walk_tick_ms: toml.sim.walk_tick_ms,
            nav_tick_ms: toml.sim.nav_tick_ms,
            walk_len: toml.sim.walk_len,
            step_m: toml.sim.step_m,
            seed: toml.sim.seed,
            danger_radius_m: toml.fences.danger_radius_m,
            market_radius_m: toml.fences.market_radius_m,
            offset_jitter_m: toml.fences.offset_jitter_m,
            event_window: toml.events.window,
            journal_file: toml.journal.file,
            metrics_interval_secs: toml.metrics.interval_secs,
            config_file: source.to_string(),
        }
    }

    /// Determine config file path from args or environment
    pub fn resolve_config_path(args: &[String]) -> String {
        for (i, arg) in args.iter().enumerate() {
            if arg == "--config" {
                if let Some(path) = args.get(i + 1) {
                    return path.clone();
                }
            }
            if let Some(path) = arg.strip_prefix("--config=") {
                return path.to_string();
            }
        }

        if let Ok(path) = env::var("CONFIG_FILE") {
            return path;
        }

        "config/dev.toml".to_string()
    }

    /// Load configuration from a TOML file
    pub fn from_file<P: AsRef<Path>>(path: P) -> anyhow::Result<Self> {
        let path = path.as_ref();
        let content = fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file {}", path.display()))?;

        let toml_config: TomlConfig = toml::from_str(&content)
            .with_context(|| format!("Failed to parse config file {}", path.display()))?;

        Ok(Self::from_toml(toml_config, &path.display().to_string()))
    }

    /// Load configuration from a path - falls back to defaults on failure
    pub fn load_from_path(path: &str) -> Self {
        match Self::from_file(path) {
            Ok(config) => config,
            Err(e) => {
                eprintln!("Warning: {e:#}. Using defaults.");
                Self::default()
            }
        }
    }

    // Getters for all config fields
    pub fn site_id(&self) -> &str {
        &self.site_id
    }

    pub fn backend_base_url(&self) -> &str {
        &self.backend_base_url
    }

    pub fn backend_timeout_ms(&self) -> u64 {
        self.backend_timeout_ms
    }

    pub fn backend_enabled(&self) -> bool {
        self.backend_enabled
    }

    pub fn backend_spool_file(&self) -> &str {
        &self.backend_spool_file
    }

    pub fn backend_replay_interval_secs(&self) -> u64 {
        self.backend_replay_interval_secs
    }

    pub fn origin(&self) -> Location {
        self.origin
    }

    pub fn walk_tick_ms(&self) -> u64 {
        self.walk_tick_ms
    }

    pub fn nav_tick_ms(&self) -> u64 {
        self.nav_tick_ms
    }

    pub fn walk_len(&self) -> usize {
        self.walk_len
    }

    pub fn step_m(&self) -> f64 {
        self.step_m
    }

    pub fn seed(&self) -> u64 {
        self.seed
    }

    pub fn danger_radius_m(&self) -> f64 {
        self.danger_radius_m
    }

    pub fn market_radius_m(&self) -> f64 {
        self.market_radius_m
    }

    pub fn offset_jitter_m(&self) -> f64 {
        self.offset_jitter_m
    }

    pub fn event_window(&self) -> usize {
        self.event_window
    }

    pub fn journal_file(&self) -> &str {
        &self.journal_file
    }

    pub fn metrics_interval_secs(&self) -> u64 {
        self.metrics_interval_secs
    }

    pub fn config_file(&self) -> &str {
        &self.config_file
    }

    /// Builder method for tests to pin the RNG seed
    #[cfg(test)]
    pub fn with_seed(mut self, seed: u64) -> Self {
        self.seed = seed;
        self
    }

    /// Builder method for tests to shrink the event window
    #[cfg(test)]
    pub fn with_event_window(mut self, window: usize) -> Self {
        self.event_window = window;
        self
    }

    /// Builder method for tests to redirect the journal
    #[cfg(test)]
    pub fn with_journal_file(mut self, file: &str) -> Self {
        self.journal_file = file.to_string();
        self
    }

    /// Builder method for tests to toggle backend delivery
    #[cfg(test)]
    pub fn with_backend_enabled(mut self, enabled: bool) -> Self {
        self.backend_enabled = enabled;
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = Config::default();
        assert_eq!(config.site_id(), "zonewatch");
        assert_eq!(config.backend_base_url(), "http://localhost:9090");
        assert!(config.backend_enabled());
        assert_eq!(config.walk_tick_ms(), 1000);
        assert_eq!(config.nav_tick_ms(), 1500);
        assert_eq!(config.event_window(), 200);
        assert_eq!(config.journal_file(), "events.jsonl");
        assert!((config.origin().lat - 13.0475).abs() < 1e-9);
    }

    #[test]
    fn test_resolve_config_path_default() {
        let args: Vec<String> = vec!["zonewatch".to_string()];
        assert_eq!(Config::resolve_config_path(&args), "config/dev.toml");
    }

    #[test]
    fn test_resolve_config_path_from_arg() {
        let args: Vec<String> = vec![
            "zonewatch".to_string(),
            "--config".to_string(),
            "config/marina.toml".to_string(),
        ];
        assert_eq!(Config::resolve_config_path(&args), "config/marina.toml");
    }

    #[test]
    fn test_resolve_config_path_from_arg_equals() {
        let args: Vec<String> =
            vec!["zonewatch".to_string(), "--config=config/fort.toml".to_string()];
        assert_eq!(Config::resolve_config_path(&args), "config/fort.toml");
    }

    #[test]
    fn test_partial_toml_uses_section_defaults() {
        let toml_config: TomlConfig = toml::from_str(
            r#"
            [site]
            id = "marina"

            [sim]
            seed = 99
            "#,
        )
        .unwrap();
        let config = Config::from_toml(toml_config, "inline");

        assert_eq!(config.site_id(), "marina");
        assert_eq!(config.seed(), 99);
        // Untouched sections keep defaults
        assert_eq!(config.walk_tick_ms(), 1000);
        assert_eq!(config.backend_timeout_ms(), 2000);
    }
}
