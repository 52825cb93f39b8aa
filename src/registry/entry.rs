//! Registry entry types
//!
//! This module defines the per-consumer record stored in the registry.

use bytes::Bytes;
use tokio::sync::mpsc::{self, error::TrySendError};

/// Opaque consumer identity
///
/// The registry looks consumers up by id; it never holds the connection.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ConsumerId(u64);

impl ConsumerId {
    pub(crate) fn new(id: u64) -> Self {
        Self(id)
    }

    /// Numeric value of the id
    pub fn as_u64(&self) -> u64 {
        self.0
    }
}

impl std::fmt::Display for ConsumerId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Outcome of offering a frame to one consumer
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Delivery {
    /// Frame queued
    Queued,
    /// Queue full, frame dropped for this consumer
    Dropped,
    /// Consumer task is gone
    Closed,
}

/// Entry for a single consumer in the registry
pub struct ConsumerEntry {
    /// Consumer identity
    pub id: ConsumerId,

    /// Sending half of the consumer's inbound queue
    tx: mpsc::Sender<Bytes>,
}

impl ConsumerEntry {
    pub(super) fn new(id: ConsumerId, tx: mpsc::Sender<Bytes>) -> Self {
        Self { id, tx }
    }

    /// Offer a frame without waiting
    ///
    /// Cloning `Bytes` only bumps a reference count.
    pub(super) fn offer(&self, frame: &Bytes) -> Delivery {
        match self.tx.try_send(frame.clone()) {
            Ok(()) => Delivery::Queued,
            Err(TrySendError::Full(_)) => Delivery::Dropped,
            Err(TrySendError::Closed(_)) => Delivery::Closed,
        }
    }
}

impl std::fmt::Debug for ConsumerEntry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ConsumerEntry")
            .field("id", &self.id)
            .field("queued", &(self.tx.max_capacity() - self.tx.capacity()))
            .finish()
    }
}
