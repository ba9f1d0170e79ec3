// Lock-free delivery statistics shared between a channel's worker and its sender.

use serde::{Deserialize, Serialize};
use std::sync::atomic::{AtomicU64, Ordering};

#[derive(Debug, Default)]
pub struct DeliveryStats {
    batches_delivered: AtomicU64,
    events_delivered: AtomicU64,
    streams_created: AtomicU64,
    token_recoveries: AtomicU64,
    duplicates_suppressed: AtomicU64,
    resets: AtomicU64,
    events_dropped: AtomicU64,
    skipped_ticks: AtomicU64,
}

impl DeliveryStats {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn record_delivered(&self, events: usize) {
        self.batches_delivered.fetch_add(1, Ordering::Relaxed);
        self.events_delivered.fetch_add(events as u64, Ordering::Relaxed);
    }

    pub fn record_stream_created(&self) {
        self.streams_created.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_token_recovery(&self) {
        self.token_recoveries.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_duplicate_suppressed(&self) {
        self.duplicates_suppressed.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_reset(&self, events_dropped: usize) {
        self.resets.fetch_add(1, Ordering::Relaxed);
        self.events_dropped
            .fetch_add(events_dropped as u64, Ordering::Relaxed);
    }

    /// A timer fire that found the previous tick still in flight.
    pub fn record_skipped_tick(&self) {
        self.skipped_ticks.fetch_add(1, Ordering::Relaxed);
    }

    pub fn snapshot(&self) -> DeliveryStatsSnapshot {
        DeliveryStatsSnapshot {
            batches_delivered: self.batches_delivered.load(Ordering::Relaxed),
            events_delivered: self.events_delivered.load(Ordering::Relaxed),
            streams_created: self.streams_created.load(Ordering::Relaxed),
            token_recoveries: self.token_recoveries.load(Ordering::Relaxed),
            duplicates_suppressed: self.duplicates_suppressed.load(Ordering::Relaxed),
            resets: self.resets.load(Ordering::Relaxed),
            events_dropped: self.events_dropped.load(Ordering::Relaxed),
            skipped_ticks: self.skipped_ticks.load(Ordering::Relaxed),
        }
    }

    /// Reset all statistics (mainly for testing)
    pub fn reset(&self) {
        self.batches_delivered.store(0, Ordering::Relaxed);
        self.events_delivered.store(0, Ordering::Relaxed);
        self.streams_created.store(0, Ordering::Relaxed);
        self.token_recoveries.store(0, Ordering::Relaxed);
        self.duplicates_suppressed.store(0, Ordering::Relaxed);
        self.resets.store(0, Ordering::Relaxed);
        self.events_dropped.store(0, Ordering::Relaxed);
        self.skipped_ticks.store(0, Ordering::Relaxed);
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DeliveryStatsSnapshot {
    pub batches_delivered: u64,
    pub events_delivered: u64,
    pub streams_created: u64,
    pub token_recoveries: u64,
    pub duplicates_suppressed: u64,
    pub resets: u64,
    pub events_dropped: u64,
    pub skipped_ticks: u64,
}

impl DeliveryStatsSnapshot {
    /// Share of attempted batches that reached the sink (0.0 to 1.0).
    pub fn delivery_rate(&self) -> f64 {
        let attempted = self.batches_delivered + self.resets;
        if attempted == 0 {
            return 1.0;
        }
        self.batches_delivered as f64 / attempted as f64
    }
}
