//! Bounded work queue between the dispatcher and the worker pool.
//!
//! The queue is split into halves. [`QueueProducer`] is not `Clone`: the
//! dispatcher owns the only one, so it is the sole writer, and
//! [`QueueProducer::finalize`] consumes it, so finalization happens exactly
//! once and can never overlap a push. [`QueueConsumer`] is shared by every
//! worker.
//!
//! Finalization is carried by the channel itself rather than a sentinel
//! value: once the producer is gone, `pop` keeps returning buffered messages
//! and only then reports `None`.

use std::sync::Arc;

use tokio::sync::{mpsc, Mutex};

use crate::error::{NotifierError, Result};
use crate::message::Message;

/// Create a work queue holding at most `capacity` messages.
pub fn work_queue(capacity: usize) -> (QueueProducer, QueueConsumer) {
    let (tx, rx) = mpsc::channel(capacity.max(1));
    (
        QueueProducer { tx },
        QueueConsumer {
            rx: Arc::new(Mutex::new(rx)),
        },
    )
}

#[derive(Debug)]
pub struct QueueProducer {
    tx: mpsc::Sender<Message>,
}

impl QueueProducer {
    /// Push a message, waiting while the queue is full.
    ///
    /// Only fails if every consumer has been dropped.
    pub async fn push(&self, message: Message) -> Result<()> {
        self.tx.send(message).await.map_err(|_| NotifierError::Closed)
    }

    /// Free slots right now.
    pub fn available(&self) -> usize {
        self.tx.capacity()
    }

    /// Mark the queue as finished. No further pushes are possible.
    pub fn finalize(self) {
        drop(self.tx);
    }
}

#[derive(Debug, Clone)]
pub struct QueueConsumer {
    rx: Arc<Mutex<mpsc::Receiver<Message>>>,
}

impl QueueConsumer {
    /// Take the next message.
    ///
    /// Waits while the queue is empty and still open. Returns `None` only when
    /// the queue has been finalized and fully drained.
    pub async fn pop(&self) -> Option<Message> {
        let mut rx = self.rx.lock().await;
        rx.recv().await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;
    use tokio::time::timeout;

    #[tokio::test]
    async fn test_pop_drains_before_reporting_finalized() {
        let (producer, consumer) = work_queue(3);
        producer.push(Message::new("a")).await.unwrap();
        producer.push(Message::new("b")).await.unwrap();
        producer.finalize();

        assert_eq!(consumer.pop().await.unwrap().body(), "a");
        assert_eq!(consumer.pop().await.unwrap().body(), "b");
        assert!(consumer.pop().await.is_none());
        assert!(consumer.pop().await.is_none());
    }

    #[tokio::test]
    async fn test_pop_blocks_while_open_and_empty() {
        let (_producer, consumer) = work_queue(1);
        let result = timeout(Duration::from_millis(50), consumer.pop()).await;
        assert!(result.is_err(), "pop should still be waiting");
    }

    #[tokio::test]
    async fn test_push_blocks_when_full() {
        let (producer, consumer) = work_queue(1);
        producer.push(Message::new("first")).await.unwrap();
        assert_eq!(producer.available(), 0);

        let blocked = timeout(Duration::from_millis(50), producer.push(Message::new("second"))).await;
        assert!(blocked.is_err(), "push should wait for a free slot");

        assert_eq!(consumer.pop().await.unwrap().body(), "first");
        producer.push(Message::new("third")).await.unwrap();
        assert_eq!(consumer.pop().await.unwrap().body(), "third");
    }

    #[tokio::test]
    async fn test_consumers_share_one_queue() {
        let (producer, consumer) = work_queue(4);
        let other = consumer.clone();
        for body in ["1", "2", "3", "4"] {
            producer.push(Message::new(body)).await.unwrap();
        }
        producer.finalize();

        let mut seen = Vec::new();
        while let Some(m) = consumer.pop().await {
            seen.push(m.into_body());
            if let Some(m) = other.pop().await {
                seen.push(m.into_body());
            }
        }
        assert_eq!(seen, vec!["1", "2", "3", "4"]);
        assert!(other.pop().await.is_none());
    }

    #[tokio::test]
    async fn test_push_fails_once_consumers_are_gone() {
        let (producer, consumer) = work_queue(1);
        drop(consumer);
        assert!(matches!(
            producer.push(Message::new("late")).await,
            Err(NotifierError::Closed)
        ));
    }
}
