//! Fixed-size pool of delivery workers.
//!
//! Workers never look at the shutdown signal. Their only exit condition is the
//! work queue reporting that it is finalized and empty, which is what lets
//! messages queued before shutdown still go out.

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;

use tokio::task::JoinHandle;
use tracing::{debug, error, info, warn};

use crate::metrics::DeliveryStats;
use crate::queue::QueueConsumer;
use crate::sender::NotificationSender;

/// Counts workers that have not exited yet.
#[derive(Debug, Clone, Default)]
pub struct CompletionBarrier {
    remaining: Arc<AtomicUsize>,
}

impl CompletionBarrier {
    fn new(count: usize) -> Self {
        Self {
            remaining: Arc::new(AtomicUsize::new(count)),
        }
    }

    pub fn remaining(&self) -> usize {
        self.remaining.load(Ordering::Acquire)
    }

    fn arrive(&self) {
        self.remaining.fetch_sub(1, Ordering::AcqRel);
    }
}

/// Decrements the barrier when a worker's future finishes, including by panic.
struct Arrival(CompletionBarrier);

impl Drop for Arrival {
    fn drop(&mut self) {
        self.0.arrive();
    }
}

pub struct WorkerPool {
    handles: Vec<JoinHandle<()>>,
    barrier: CompletionBarrier,
}

impl WorkerPool {
    /// Spawn `size` workers, numbered from 1, all pulling from `queue`.
    pub fn spawn(
        size: usize,
        interval: Duration,
        queue: QueueConsumer,
        sender: Arc<dyn NotificationSender>,
        stats: DeliveryStats,
    ) -> Self {
        info!(worker_count = size, interval_ms = interval.as_millis() as u64, "spawning workers");

        let barrier = CompletionBarrier::new(size);
        let handles = (1..=size)
            .map(|worker_id| {
                let arrival = Arrival(barrier.clone());
                let queue = queue.clone();
                let sender = sender.clone();
                let stats = stats.clone();
                tokio::spawn(async move {
                    let _arrival = arrival;
                    run_worker(worker_id, queue, sender, interval, stats).await;
                })
            })
            .collect();

        Self { handles, barrier }
    }

    pub fn size(&self) -> usize {
        self.handles.len()
    }

    pub fn barrier(&self) -> CompletionBarrier {
        self.barrier.clone()
    }

    /// Cancel every worker, dropping whatever it holds, and wait for the tasks to go.
    pub async fn abort(self) {
        for handle in &self.handles {
            handle.abort();
        }
        for (index, handle) in self.handles.into_iter().enumerate() {
            if let Err(join_error) = handle.await {
                if join_error.is_panic() {
                    error!(worker_id = index + 1, error = %join_error, "worker task panicked");
                }
            }
        }
        warn!("all workers aborted");
    }

    /// Block until every worker has exited.
    ///
    /// There is no timeout: a sender call that never returns stalls this.
    pub async fn wait(self) {
        for (index, handle) in self.handles.into_iter().enumerate() {
            if let Err(join_error) = handle.await {
                error!(
                    worker_id = index + 1,
                    error = %join_error,
                    "worker task panicked"
                );
            }
        }
        info!("all workers finished");
    }
}

/// Body of a single worker.
///
/// Pulls until the queue is finalized and drained. Each message waits out the
/// rate-limit `interval` and then gets exactly one delivery attempt; a failure
/// is logged and the message is dropped.
pub async fn run_worker(
    worker_id: usize,
    queue: QueueConsumer,
    sender: Arc<dyn NotificationSender>,
    interval: Duration,
    stats: DeliveryStats,
) {
    debug!(worker_id, "worker started");
    let mut delivered = 0u64;
    let mut failed = 0u64;

    while let Some(message) = queue.pop().await {
        tokio::time::sleep(interval).await;
        debug!(worker_id, message_id = %message.id(), "starting job");

        match sender.attempt_deliver(&message).await {
            Ok(()) => {
                delivered += 1;
                stats.record_attempt(true);
                info!(worker_id, message_id = %message.id(), msg = message.body(), "successfully notified the message");
            }
            Err(e) => {
                failed += 1;
                stats.record_attempt(false);
                error!(worker_id, message_id = %message.id(), error = %e, "failed to notify the message, dropping it");
            }
        }
    }

    warn!(worker_id, delivered, failed, "gracefully finishing job");
}
