use serde::{Deserialize, Serialize};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

/// Snapshot of the pipeline counters.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DeliveryReport {
    /// Messages forwarded into the work queue
    pub accepted: u64,
    pub delivered: u64,
    pub failed: u64,
}

impl DeliveryReport {
    /// Messages a worker has finished with, successfully or not.
    pub fn attempted(&self) -> u64 {
        self.delivered + self.failed
    }
}

/// Shared counters, updated by the dispatcher and the workers.
#[derive(Debug, Clone, Default)]
pub struct DeliveryStats {
    inner: Arc<Counters>,
}

#[derive(Debug, Default)]
struct Counters {
    accepted: AtomicU64,
    delivered: AtomicU64,
    failed: AtomicU64,
}

impl DeliveryStats {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn record_accepted(&self) {
        self.inner.accepted.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_attempt(&self, delivered: bool) {
        let counter = if delivered {
            &self.inner.delivered
        } else {
            &self.inner.failed
        };
        counter.fetch_add(1, Ordering::Relaxed);
    }

    pub fn snapshot(&self) -> DeliveryReport {
        DeliveryReport {
            accepted: self.inner.accepted.load(Ordering::Relaxed),
            delivered: self.inner.delivered.load(Ordering::Relaxed),
            failed: self.inner.failed.load(Ordering::Relaxed),
        }
    }
}
