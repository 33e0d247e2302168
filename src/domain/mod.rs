//! Domain models - core geofencing types
//!
//! This module contains the canonical data types used throughout the system:
//! - `Location` / `FenceId` - coordinates and identity
//! - `GeoFence` - a geofence with geometry, kind, and safety score
//! - `ZoneEvent` - entry/exit/SOS events, kept in a capped window

pub mod event;
pub mod fence;
pub mod geo;
