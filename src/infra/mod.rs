//! Infrastructure - configuration, metrics, and randomness
//!
//! This module contains infrastructure concerns:
//! - `config` - Application configuration (TOML loading, defaults)
//! - `metrics` - Lock-free metrics collection
//! - `rng` - Seeded RNG port for deterministic synthetic data

pub mod config;
pub mod metrics;
pub mod rng;

// Re-export commonly used types
pub use config::Config;
pub use metrics::Metrics;
pub use rng::{Lcg, SeededRng};
