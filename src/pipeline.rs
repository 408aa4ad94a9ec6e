//! Lifecycle coordination: wiring, shutdown and the completion wait.
//!
//! ```text
//! input -> Submitter -> Dispatcher -> work queue -> WorkerPool -> NotificationSender
//! ```
//!
//! The pipeline moves `Running -> Draining -> Stopped` and never back.

use std::future::Future;
use std::sync::Arc;

use tokio::io::AsyncRead;
use tokio::sync::watch;
use tokio::task::JoinHandle;
use tracing::{error, info, warn};

use crate::config::Config;
use crate::dispatcher::{inbound_channel, Dispatcher, Submitter};
use crate::error::{NotifierError, Result};
use crate::input::LineReader;
use crate::metrics::{DeliveryReport, DeliveryStats};
use crate::queue::work_queue;
use crate::sender::{HttpSender, NotificationSender};
use crate::shutdown::{ShutdownReason, ShutdownSignal};
use crate::worker::{CompletionBarrier, WorkerPool};

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum PipelineState {
    /// Accepting input.
    Running,
    /// Shutdown observed and the work queue finalized; workers are emptying it.
    Draining,
    /// Every worker has exited.
    Stopped,
}

/// Publishes the pipeline state. Transitions only move forward.
#[derive(Debug, Clone)]
pub struct StateTracker {
    tx: Arc<watch::Sender<PipelineState>>,
}

impl Default for StateTracker {
    fn default() -> Self {
        Self::new()
    }
}

impl StateTracker {
    pub fn new() -> Self {
        let (tx, _rx) = watch::channel(PipelineState::Running);
        Self { tx: Arc::new(tx) }
    }

    pub fn current(&self) -> PipelineState {
        *self.tx.borrow()
    }

    pub fn subscribe(&self) -> watch::Receiver<PipelineState> {
        self.tx.subscribe()
    }

    pub(crate) fn advance(&self, next: PipelineState) {
        self.tx.send_if_modified(|state| {
            if next > *state {
                info!(from = ?*state, to = ?next, "pipeline state changed");
                *state = next;
                true
            } else {
                false
            }
        });
    }
}

/// Result of a complete run.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PipelineOutcome {
    pub reason: ShutdownReason,
    pub report: DeliveryReport,
}

/// A configured, not yet started pipeline.
pub struct Pipeline {
    config: Config,
    sender: Arc<dyn NotificationSender>,
}

impl Pipeline {
    /// Validate `config` and pair it with `sender`.
    ///
    /// An invalid config, such as an empty pool, is refused here so that a
    /// started pipeline always has a consumer for every accepted message.
    pub fn new(config: Config, sender: Arc<dyn NotificationSender>) -> Result<Self> {
        let config = config.validated()?;
        Ok(Self { config, sender })
    }

    /// Validate `config` and deliver over HTTP to `config.url`.
    pub fn from_config(config: Config) -> Result<Self> {
        let config = config.validated()?;
        let sender = HttpSender::from_config(&config)?;
        Self::new(config, Arc::new(sender))
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    /// Spawn the dispatcher and the workers. Must be called inside a tokio runtime.
    pub fn start(self) -> RunningPipeline {
        info!(
            url = %self.config.url,
            workers = self.config.workers,
            interval_ms = self.config.interval.as_millis() as u64,
            "starting notification pipeline"
        );

        let shutdown = ShutdownSignal::new();
        let state = StateTracker::new();
        let stats = DeliveryStats::new();

        let (submitter, inbound) = inbound_channel();
        let (producer, consumer) = work_queue(self.config.queue_capacity());

        let workers = WorkerPool::spawn(
            self.config.workers,
            self.config.interval,
            consumer,
            self.sender,
            stats.clone(),
        );
        let dispatcher = Dispatcher::new(inbound, producer, stats.clone(), state.clone());
        let dispatcher = tokio::spawn(dispatcher.start(shutdown.clone()));

        RunningPipeline {
            submitter,
            shutdown,
            state,
            stats,
            barrier: workers.barrier(),
            dispatcher,
            workers,
        }
    }

    /// Run until `input` ends or `interrupt` resolves, whichever comes first,
    /// then drain and return.
    ///
    /// A fatal input error skips the drain: the dispatcher and workers are
    /// aborted and the error is returned.
    pub async fn run<R, F>(self, input: R, interrupt: F) -> Result<PipelineOutcome>
    where
        R: AsyncRead + Unpin + Send + 'static,
        F: Future<Output = ()>,
    {
        let reader = LineReader::new(self.config.max_line_length).with_echo(self.config.echo);
        let running = self.start();
        let submitter = running.submitter();
        let mut input_task = tokio::spawn(async move { reader.run(input, submitter).await });

        tokio::select! {
            _ = interrupt => {
                running.shutdown(ShutdownReason::Interrupt);
                input_task.abort();
            }
            read = &mut input_task => match read {
                Ok(Ok(_)) => {
                    running.shutdown(ShutdownReason::EndOfInput);
                }
                Ok(Err(e)) => {
                    error!(error = %e, "fatal input error, exiting without draining");
                    running.abort().await;
                    return Err(e);
                }
                Err(join_error) => {
                    error!(error = %join_error, "input reader crashed");
                    running.abort().await;
                    return Err(NotifierError::InputError(join_error.to_string()));
                }
            },
        }

        let reason = running
            .shutdown_signal()
            .reason()
            .unwrap_or(ShutdownReason::Interrupt);
        let report = running.wait().await;
        Ok(PipelineOutcome { reason, report })
    }
}

/// Handle to a started pipeline.
pub struct RunningPipeline {
    submitter: Submitter,
    shutdown: ShutdownSignal,
    state: StateTracker,
    stats: DeliveryStats,
    barrier: CompletionBarrier,
    dispatcher: JoinHandle<()>,
    workers: WorkerPool,
}

impl RunningPipeline {
    pub fn submitter(&self) -> Submitter {
        self.submitter.clone()
    }

    pub fn shutdown_signal(&self) -> ShutdownSignal {
        self.shutdown.clone()
    }

    /// Raise the cancellation signal. Repeated calls are no-ops.
    pub fn shutdown(&self, reason: ShutdownReason) -> bool {
        self.shutdown.trigger(reason)
    }

    pub fn state(&self) -> PipelineState {
        self.state.current()
    }

    pub fn subscribe_state(&self) -> watch::Receiver<PipelineState> {
        self.state.subscribe()
    }

    pub fn outstanding_workers(&self) -> usize {
        self.barrier.remaining()
    }

    pub fn stats(&self) -> DeliveryReport {
        self.stats.snapshot()
    }

    /// Tear the pipeline down without draining.
    ///
    /// Queued and in-flight messages are dropped. Returns once the dispatcher
    /// and every worker task are gone.
    pub async fn abort(self) -> DeliveryReport {
        let RunningPipeline {
            stats,
            dispatcher,
            workers,
            ..
        } = self;

        dispatcher.abort();
        if let Err(join_error) = dispatcher.await {
            if join_error.is_panic() {
                error!(error = %join_error, "dispatcher task panicked");
            }
        }
        workers.abort().await;

        let report = stats.snapshot();
        warn!(
            accepted = report.accepted,
            delivered = report.delivered,
            failed = report.failed,
            "pipeline aborted"
        );
        report
    }

    /// Wait for the dispatcher to finalize the queue and every worker to exit.
    ///
    /// Does not raise the shutdown signal itself.
    pub async fn wait(self) -> DeliveryReport {
        let RunningPipeline {
            submitter,
            state,
            stats,
            dispatcher,
            workers,
            ..
        } = self;
        drop(submitter);

        if let Err(join_error) = dispatcher.await {
            error!(error = %join_error, "dispatcher task panicked");
        }
        workers.wait().await;
        state.advance(PipelineState::Stopped);

        let report = stats.snapshot();
        info!(
            accepted = report.accepted,
            delivered = report.delivered,
            failed = report.failed,
            "pipeline stopped"
        );
        report
    }
}
