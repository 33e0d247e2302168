//! Zonewatch - geofence intersection engine for tourist safety monitoring
//!
//! Tracks a (simulated) walker against session-seeded geofences, detects
//! entry/exit transitions, generates exit routes out of danger zones, and
//! delivers alerts to an external backend with offline spooling.
//!
//! Module structure:
//! - `domain/` - Core types (Location, GeoFence, ZoneEvent)
//! - `io/` - External interfaces (backend HTTP, journal, egress, replay)
//! - `services/` - Business logic (detector, escape planner, monitor)
//! - `infra/` - Infrastructure (Config, Metrics, seeded RNG)

pub mod domain;
pub mod infra;
pub mod io;
pub mod services;
