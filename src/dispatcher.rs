//! Routes messages from the inbound channel into the work queue.

use tokio::sync::mpsc;

use crate::error::{NotifierError, Result};
use crate::message::Message;
use crate::metrics::DeliveryStats;
use crate::pipeline::{PipelineState, StateTracker};
use crate::queue::QueueProducer;
use crate::shutdown::ShutdownSignal;

/// Capacity of the hand-off between the input reader and the dispatcher.
pub const INBOUND_CAPACITY: usize = 1;

/// Create the inbound channel.
pub fn inbound_channel() -> (Submitter, mpsc::Receiver<Message>) {
    let (tx, rx) = mpsc::channel(INBOUND_CAPACITY);
    (Submitter { tx }, rx)
}

/// Handle used by the input side to feed the pipeline.
#[derive(Debug, Clone)]
pub struct Submitter {
    tx: mpsc::Sender<Message>,
}

impl Submitter {
    /// Hand a message to the dispatcher, waiting while the hand-off is occupied.
    ///
    /// Fails with [`NotifierError::Closed`] once the dispatcher has observed
    /// shutdown. A message accepted here will reach the work queue.
    pub async fn submit(&self, message: impl Into<Message>) -> Result<()> {
        self.tx
            .send(message.into())
            .await
            .map_err(|_| NotifierError::Closed)
    }

    pub fn is_closed(&self) -> bool {
        self.tx.is_closed()
    }
}

/// Single writer of the work queue.
#[derive(Debug)]
pub struct Dispatcher {
    inbound: mpsc::Receiver<Message>,
    queue: QueueProducer,
    stats: DeliveryStats,
    state: StateTracker,
}

impl Dispatcher {
    pub fn new(
        inbound: mpsc::Receiver<Message>,
        queue: QueueProducer,
        stats: DeliveryStats,
        state: StateTracker,
    ) -> Self {
        Self {
            inbound,
            queue,
            stats,
            state,
        }
    }

    /// Forward messages until `shutdown` is raised, then finalize the queue.
    ///
    /// A forward that is blocked on a full queue completes before shutdown is
    /// looked at again, so finalization never overlaps a push. Messages still
    /// sitting in the inbound channel when shutdown is observed are forwarded
    /// too; anything submitted afterwards is refused.
    pub async fn start(mut self, shutdown: ShutdownSignal) {
        tracing::debug!("dispatcher started");

        loop {
            tokio::select! {
                biased;
                _ = shutdown.triggered() => break,
                received = self.inbound.recv() => match received {
                    Some(message) => self.forward(message).await,
                    None => {
                        // Every submitter is gone; nothing else can arrive.
                        shutdown.triggered().await;
                        break;
                    }
                },
            }
        }

        tracing::warn!("received cancellation, closing inbound channel");
        self.inbound.close();
        while let Some(message) = self.inbound.recv().await {
            self.forward(message).await;
        }

        let Dispatcher { queue, state, .. } = self;
        queue.finalize();
        state.advance(PipelineState::Draining);
        tracing::warn!("work queue finalized");
    }

    async fn forward(&self, message: Message) {
        let message_id = message.id();
        tracing::debug!(%message_id, "received message from inbound channel");

        match self.queue.push(message).await {
            Ok(()) => self.stats.record_accepted(),
            Err(e) => {
                tracing::error!(%message_id, error = %e, "no workers left, message dropped");
            }
        }
    }
}
