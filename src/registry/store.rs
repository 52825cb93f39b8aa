//! Consumer registry implementation
//!
//! The coordinator that owns the set of live consumers and fans published
//! messages out to their queues.

use std::sync::atomic::{AtomicU64, Ordering};

use bytes::Bytes;
use tokio::sync::{mpsc, RwLock};

use crate::message::{encode, Message};
use crate::stats::{BroadcastMetrics, BroadcastStats};

use super::entry::{ConsumerEntry, ConsumerId, Delivery};
use super::error::RegistryError;

/// Lifecycle of the registry
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RegistryState {
    /// Accepting consumers and messages
    Running,
    /// Shut down; terminal
    Closed,
}

/// Per-publish fan-out result
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct PublishReport {
    /// Consumers the frame was queued for
    pub queued: usize,
    /// Consumers whose queue was full
    pub dropped: usize,
    /// Consumers found gone and removed
    pub pruned: usize,
}

struct Inner {
    consumers: Vec<ConsumerEntry>,
    state: RegistryState,
}

/// Central registry of live consumers
///
/// All mutation and fan-out takes the write lock; `count()` takes the read
/// lock. Nothing performed under either lock waits on a connection.
pub struct ConsumerRegistry {
    inner: RwLock<Inner>,
    next_id: AtomicU64,
    metrics: BroadcastMetrics,
}

impl ConsumerRegistry {
    /// Create an empty, running registry
    pub fn new() -> Self {
        Self {
            inner: RwLock::new(Inner {
                consumers: Vec::new(),
                state: RegistryState::Running,
            }),
            next_id: AtomicU64::new(1),
            metrics: BroadcastMetrics::new(),
        }
    }

    /// Allocate an id for a new consumer
    pub fn next_id(&self) -> ConsumerId {
        ConsumerId::new(self.next_id.fetch_add(1, Ordering::Relaxed))
    }

    /// Register a consumer's queue
    ///
    /// Fails only once the registry has been shut down.
    pub async fn register(
        &self,
        id: ConsumerId,
        tx: mpsc::Sender<Bytes>,
    ) -> Result<(), RegistryError> {
        let mut inner = self.inner.write().await;

        if inner.state == RegistryState::Closed {
            return Err(RegistryError::Closed);
        }

        if inner.consumers.iter().any(|entry| entry.id == id) {
            tracing::warn!(consumer_id = %id, "Consumer already registered");
            return Ok(());
        }

        inner.consumers.push(ConsumerEntry::new(id, tx));
        self.metrics.record_accepted();

        tracing::debug!(
            consumer_id = %id,
            consumers = inner.consumers.len(),
            "Consumer registered"
        );

        Ok(())
    }

    /// Encode a message once and offer it to every live consumer
    ///
    /// Full queues drop the frame for that consumer. Consumers whose task has
    /// already exited are removed in the same pass.
    pub async fn publish(&self, message: &Message) -> Result<PublishReport, RegistryError> {
        let frame = encode(message);
        self.publish_frame(frame).await
    }

    /// Offer an already encoded frame to every live consumer
    pub async fn publish_frame(&self, frame: Bytes) -> Result<PublishReport, RegistryError> {
        let mut inner = self.inner.write().await;

        if inner.state == RegistryState::Closed {
            return Err(RegistryError::Closed);
        }

        let mut report = PublishReport::default();

        // Consumers whose queue is closed are dropped in the same pass
        inner.consumers.retain(|entry| match entry.offer(&frame) {
            Delivery::Queued => {
                report.queued += 1;
                true
            }
            Delivery::Dropped => {
                report.dropped += 1;
                tracing::trace!(consumer_id = %entry.id, "Queue full, frame dropped");
                true
            }
            Delivery::Closed => {
                report.pruned += 1;
                false
            }
        });

        if report.pruned > 0 {
            self.metrics.record_removed(report.pruned as u64);
            tracing::debug!(
                pruned = report.pruned,
                consumers = inner.consumers.len(),
                "Removed consumers with closed queues"
            );
        }

        self.metrics
            .record_publish(report.queued as u64, report.dropped as u64);

        Ok(report)
    }

    /// Remove a consumer and close its queue
    ///
    /// Idempotent: returns `false` if the consumer was not registered.
    pub async fn mark_stale(&self, id: ConsumerId) -> bool {
        let mut inner = self.inner.write().await;

        let before = inner.consumers.len();
        inner.consumers.retain(|entry| entry.id != id);
        let removed = before - inner.consumers.len();

        if removed > 0 {
            self.metrics.record_removed(removed as u64);
            tracing::debug!(
                consumer_id = %id,
                consumers = inner.consumers.len(),
                "Stale consumer removed"
            );
        }

        removed > 0
    }

    /// Close every consumer queue and stop accepting work
    ///
    /// Returns the number of consumers that were closed. Calling it again is
    /// a no-op returning 0.
    pub async fn shutdown(&self) -> usize {
        let mut inner = self.inner.write().await;

        if inner.state == RegistryState::Closed {
            return 0;
        }

        inner.state = RegistryState::Closed;
        let closed = inner.consumers.len();
        // Dropping the senders closes each queue
        inner.consumers.clear();
        self.metrics.record_removed(closed as u64);

        tracing::info!(consumers = closed, "Consumer registry shut down");

        closed
    }

    /// Number of registered consumers
    pub async fn count(&self) -> usize {
        self.inner.read().await.consumers.len()
    }

    /// Whether a consumer is currently registered
    pub async fn contains(&self, id: ConsumerId) -> bool {
        self.inner
            .read()
            .await
            .consumers
            .iter()
            .any(|entry| entry.id == id)
    }

    /// Current lifecycle state
    pub async fn state(&self) -> RegistryState {
        self.inner.read().await.state
    }

    /// Whether shutdown has run
    pub async fn is_closed(&self) -> bool {
        self.state().await == RegistryState::Closed
    }

    /// Snapshot of broadcaster counters
    pub fn stats(&self) -> BroadcastStats {
        self.metrics.snapshot()
    }

    pub(crate) fn metrics(&self) -> &BroadcastMetrics {
        &self.metrics
    }
}

impl Default for ConsumerRegistry {
    fn default() -> Self {
        Self::new()
    }
}
