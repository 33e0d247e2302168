//! Lock-free metrics collection and periodic reporting
//!
//! Uses atomics for hot-path counters to avoid mutex contention. The only
//! locked structure is the per-fence entry map, which is touched once per
//! fence entry.
//!
//! NOTE: All atomics use Relaxed ordering intentionally. These are statistical
//! counters only; do not use them for coordination or logic decisions.

use parking_lot::{Mutex, RwLock};
use rustc_hash::FxHashMap;
use serde::Serialize;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Instant;
use tracing::info;

/// Update an atomic max value using compare-and-swap loop
#[inline]
fn update_atomic_max(atomic_max: &AtomicU64, new_value: u64) {
    let mut current_max = atomic_max.load(Ordering::Relaxed);
    while new_value > current_max {
        match atomic_max.compare_exchange_weak(
            current_max,
            new_value,
            Ordering::Relaxed,
            Ordering::Relaxed,
        ) {
            Ok(_) => break,
            Err(actual) => current_max = actual,
        }
    }
}

/// Lock-free metrics collector
///
/// All recording operations are lock-free using atomics.
/// The `report()` method atomically swaps interval counters to get a
/// consistent snapshot.
pub struct Metrics {
    /// Location fixes processed (monotonic)
    fixes_total: AtomicU64,
    /// Zone events produced (monotonic)
    events_total: AtomicU64,
    /// Events since last report (reset on report)
    events_since_report: AtomicU64,
    /// Fence entries (monotonic)
    entries_total: AtomicU64,
    /// Fence exits (monotonic)
    exits_total: AtomicU64,
    /// SOS events (monotonic)
    sos_total: AtomicU64,
    /// Exit routes generated (monotonic)
    routes_total: AtomicU64,
    /// Alert payloads delivered to the backend (monotonic)
    alerts_sent_total: AtomicU64,
    /// Alert deliveries that failed (monotonic)
    alerts_failed_total: AtomicU64,
    /// Alert payloads written to the offline spool (monotonic)
    alerts_spooled_total: AtomicU64,
    /// Spooled payloads replayed successfully (monotonic)
    alerts_replayed_total: AtomicU64,
    /// Sum of tick processing latencies in microseconds (reset on report)
    tick_latency_sum_us: AtomicU64,
    /// Max tick processing latency in microseconds (reset on report)
    tick_latency_max_us: AtomicU64,
    /// Ticks since last report (reset on report)
    ticks_since_report: AtomicU64,
    /// Fences currently containing the observed point (gauge)
    active_zones: AtomicU64,
    /// Entry counts per fence ID
    fence_entries: RwLock<FxHashMap<u32, u64>>,
    /// Time of last report, for events/sec
    last_report: Mutex<Instant>,
}

impl Metrics {
    pub fn new() -> Self {
        Self {
            fixes_total: AtomicU64::new(0),
            events_total: AtomicU64::new(0),
            events_since_report: AtomicU64::new(0),
            entries_total: AtomicU64::new(0),
            exits_total: AtomicU64::new(0),
            sos_total: AtomicU64::new(0),
            routes_total: AtomicU64::new(0),
            alerts_sent_total: AtomicU64::new(0),
            alerts_failed_total: AtomicU64::new(0),
            alerts_spooled_total: AtomicU64::new(0),
            alerts_replayed_total: AtomicU64::new(0),
            tick_latency_sum_us: AtomicU64::new(0),
            tick_latency_max_us: AtomicU64::new(0),
            ticks_since_report: AtomicU64::new(0),
            active_zones: AtomicU64::new(0),
            fence_entries: RwLock::new(FxHashMap::default()),
            last_report: Mutex::new(Instant::now()),
        }
    }

    #[inline]
    pub fn record_fix(&self) {
        self.fixes_total.fetch_add(1, Ordering::Relaxed);
    }

    #[inline]
    pub fn record_entry(&self, fence_id: u32) {
        self.entries_total.fetch_add(1, Ordering::Relaxed);
        self.events_total.fetch_add(1, Ordering::Relaxed);
        self.events_since_report.fetch_add(1, Ordering::Relaxed);
        *self.fence_entries.write().entry(fence_id).or_insert(0) += 1;
    }

    #[inline]
    pub fn record_exit(&self) {
        self.exits_total.fetch_add(1, Ordering::Relaxed);
        self.events_total.fetch_add(1, Ordering::Relaxed);
        self.events_since_report.fetch_add(1, Ordering::Relaxed);
    }

    #[inline]
    pub fn record_sos(&self) {
        self.sos_total.fetch_add(1, Ordering::Relaxed);
        self.events_total.fetch_add(1, Ordering::Relaxed);
        self.events_since_report.fetch_add(1, Ordering::Relaxed);
    }

    #[inline]
    pub fn record_route_generated(&self) {
        self.routes_total.fetch_add(1, Ordering::Relaxed);
    }

    #[inline]
    pub fn record_alert_sent(&self) {
        self.alerts_sent_total.fetch_add(1, Ordering::Relaxed);
    }

    #[inline]
    pub fn record_alert_failed(&self) {
        self.alerts_failed_total.fetch_add(1, Ordering::Relaxed);
    }

    #[inline]
    pub fn record_alert_spooled(&self) {
        self.alerts_spooled_total.fetch_add(1, Ordering::Relaxed);
    }

    #[inline]
    pub fn record_alert_replayed(&self) {
        self.alerts_replayed_total.fetch_add(1, Ordering::Relaxed);
    }

    #[inline]
    pub fn set_active_zones(&self, zones: usize) {
        self.active_zones.store(zones as u64, Ordering::Relaxed);
    }

    #[inline]
    pub fn record_tick_latency(&self, latency_us: u64) {
        self.tick_latency_sum_us.fetch_add(latency_us, Ordering::Relaxed);
        self.ticks_since_report.fetch_add(1, Ordering::Relaxed);
        update_atomic_max(&self.tick_latency_max_us, latency_us);
    }

    /// Produce a summary and reset the interval counters
    pub fn report(&self) -> MetricsSummary {
        let events_interval = self.events_since_report.swap(0, Ordering::Relaxed);
        let latency_sum = self.tick_latency_sum_us.swap(0, Ordering::Relaxed);
        let latency_max = self.tick_latency_max_us.swap(0, Ordering::Relaxed);
        let ticks = self.ticks_since_report.swap(0, Ordering::Relaxed);

        let elapsed = {
            let mut last = self.last_report.lock();
            let elapsed = last.elapsed().as_secs_f64();
            *last = Instant::now();
            elapsed
        };

        let events_per_sec =
            if elapsed > 0.0 { events_interval as f64 / elapsed } else { 0.0 };
        let avg_tick_latency_us = if ticks > 0 { latency_sum / ticks } else { 0 };

        MetricsSummary {
            fixes_total: self.fixes_total.load(Ordering::Relaxed),
            events_total: self.events_total.load(Ordering::Relaxed),
            events_per_sec,
            entries_total: self.entries_total.load(Ordering::Relaxed),
            exits_total: self.exits_total.load(Ordering::Relaxed),
            sos_total: self.sos_total.load(Ordering::Relaxed),
            routes_total: self.routes_total.load(Ordering::Relaxed),
            alerts_sent: self.alerts_sent_total.load(Ordering::Relaxed),
            alerts_failed: self.alerts_failed_total.load(Ordering::Relaxed),
            alerts_spooled: self.alerts_spooled_total.load(Ordering::Relaxed),
            alerts_replayed: self.alerts_replayed_total.load(Ordering::Relaxed),
            avg_tick_latency_us,
            max_tick_latency_us: latency_max,
            active_zones: self.active_zones.load(Ordering::Relaxed) as usize,
            fence_entries: self.fence_entries.read().clone(),
        }
    }
}

impl Default for Metrics {
    fn default() -> Self {
        Self::new()
    }
}

/// Consistent snapshot of metrics for logging and egress
#[derive(Debug, Clone, Serialize)]
pub struct MetricsSummary {
    pub fixes_total: u64,
    pub events_total: u64,
    pub events_per_sec: f64,
    pub entries_total: u64,
    pub exits_total: u64,
    pub sos_total: u64,
    pub routes_total: u64,
    pub alerts_sent: u64,
    pub alerts_failed: u64,
    pub alerts_spooled: u64,
    pub alerts_replayed: u64,
    pub avg_tick_latency_us: u64,
    pub max_tick_latency_us: u64,
    pub active_zones: usize,
    pub fence_entries: FxHashMap<u32, u64>,
}

impl MetricsSummary {
    pub fn log(&self) {
        info!(
            fixes = %self.fixes_total,
            events = %self.events_total,
            events_per_sec = %format!("{:.2}", self.events_per_sec),
            entries = %self.entries_total,
            exits = %self.exits_total,
            sos = %self.sos_total,
            routes = %self.routes_total,
            alerts_sent = %self.alerts_sent,
            alerts_failed = %self.alerts_failed,
            alerts_spooled = %self.alerts_spooled,
            alerts_replayed = %self.alerts_replayed,
            avg_tick_us = %self.avg_tick_latency_us,
            max_tick_us = %self.max_tick_latency_us,
            active_zones = %self.active_zones,
            "metrics_summary"
        );
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_counters_accumulate() {
        let metrics = Metrics::new();
        metrics.record_fix();
        metrics.record_entry(1);
        metrics.record_entry(1);
        metrics.record_entry(2);
        metrics.record_exit();
        metrics.record_sos();
        metrics.set_active_zones(2);

        let summary = metrics.report();
        assert_eq!(summary.fixes_total, 1);
        assert_eq!(summary.entries_total, 3);
        assert_eq!(summary.exits_total, 1);
        assert_eq!(summary.sos_total, 1);
        assert_eq!(summary.events_total, 5);
        assert_eq!(summary.fence_entries.get(&1), Some(&2));
        assert_eq!(summary.fence_entries.get(&2), Some(&1));
        assert_eq!(summary.active_zones, 2);
    }

    #[test]
    fn test_interval_counters_reset_on_report() {
        let metrics = Metrics::new();
        metrics.record_tick_latency(100);
        metrics.record_tick_latency(300);

        let first = metrics.report();
        assert_eq!(first.avg_tick_latency_us, 200);
        assert_eq!(first.max_tick_latency_us, 300);

        let second = metrics.report();
        assert_eq!(second.avg_tick_latency_us, 0);
        assert_eq!(second.max_tick_latency_us, 0);
    }

    #[test]
    fn test_atomic_max() {
        let max = AtomicU64::new(10);
        update_atomic_max(&max, 5);
        assert_eq!(max.load(Ordering::Relaxed), 10);
        update_atomic_max(&max, 50);
        assert_eq!(max.load(Ordering::Relaxed), 50);
    }
}
