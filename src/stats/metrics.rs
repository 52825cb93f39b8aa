//! Statistics and metrics for the broadcaster and its consumers

use std::sync::atomic::{AtomicU64, Ordering};
use std::time::{Duration, Instant};

/// Broadcaster-wide counters
///
/// Updated without locking from the registry and the accept path. Read a
/// consistent-enough copy with [`BroadcastMetrics::snapshot`].
#[derive(Debug, Default)]
pub struct BroadcastMetrics {
    messages_published: AtomicU64,
    frames_enqueued: AtomicU64,
    frames_dropped: AtomicU64,
    consumers_accepted: AtomicU64,
    consumers_removed: AtomicU64,
    handshake_failures: AtomicU64,
}

impl BroadcastMetrics {
    pub fn new() -> Self {
        Self::default()
    }

    pub(crate) fn record_publish(&self, enqueued: u64, dropped: u64) {
        self.messages_published.fetch_add(1, Ordering::Relaxed);
        self.frames_enqueued.fetch_add(enqueued, Ordering::Relaxed);
        self.frames_dropped.fetch_add(dropped, Ordering::Relaxed);
    }

    pub(crate) fn record_accepted(&self) {
        self.consumers_accepted.fetch_add(1, Ordering::Relaxed);
    }

    pub(crate) fn record_removed(&self, n: u64) {
        self.consumers_removed.fetch_add(n, Ordering::Relaxed);
    }

    pub(crate) fn record_handshake_failure(&self) {
        self.handshake_failures.fetch_add(1, Ordering::Relaxed);
    }

    /// Copy the current counter values
    pub fn snapshot(&self) -> BroadcastStats {
        BroadcastStats {
            messages_published: self.messages_published.load(Ordering::Relaxed),
            frames_enqueued: self.frames_enqueued.load(Ordering::Relaxed),
            frames_dropped: self.frames_dropped.load(Ordering::Relaxed),
            consumers_accepted: self.consumers_accepted.load(Ordering::Relaxed),
            consumers_removed: self.consumers_removed.load(Ordering::Relaxed),
            handshake_failures: self.handshake_failures.load(Ordering::Relaxed),
        }
    }
}

/// Point-in-time copy of [`BroadcastMetrics`]
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct BroadcastStats {
    /// Messages accepted by publish
    pub messages_published: u64,
    /// Encoded frames placed into consumer queues
    pub frames_enqueued: u64,
    /// Frames discarded because a consumer queue was full
    pub frames_dropped: u64,
    /// Consumers that completed the handshake and were registered
    pub consumers_accepted: u64,
    /// Consumers removed as stale or at shutdown
    pub consumers_removed: u64,
    /// Connections that failed during the handshake
    pub handshake_failures: u64,
}

/// Per-consumer delivery statistics
#[derive(Debug, Clone)]
pub struct ConsumerStats {
    /// When the consumer connected
    pub connected_at: Instant,
    /// Frames fully written to the connection
    pub frames_written: u64,
    /// Bytes written, before compression
    pub bytes_written: u64,
    /// Frames dropped on a tolerated write timeout
    pub frames_timed_out: u64,
}

impl ConsumerStats {
    pub fn new() -> Self {
        Self {
            connected_at: Instant::now(),
            frames_written: 0,
            bytes_written: 0,
            frames_timed_out: 0,
        }
    }

    /// Record a delivered frame
    pub fn on_written(&mut self, len: usize) {
        self.frames_written += 1;
        self.bytes_written += len as u64;
    }

    /// Record a frame lost to a tolerated write timeout
    pub fn on_timed_out(&mut self) {
        self.frames_timed_out += 1;
    }

    /// Time since the consumer connected
    pub fn duration(&self) -> Duration {
        self.connected_at.elapsed()
    }
}

impl Default for ConsumerStats {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_broadcast_metrics_new() {
        let metrics = BroadcastMetrics::new();
        assert_eq!(metrics.snapshot(), BroadcastStats::default());
    }

    #[test]
    fn test_broadcast_metrics_record_publish() {
        let metrics = BroadcastMetrics::new();
        metrics.record_publish(3, 1);
        metrics.record_publish(2, 0);

        let stats = metrics.snapshot();
        assert_eq!(stats.messages_published, 2);
        assert_eq!(stats.frames_enqueued, 5);
        assert_eq!(stats.frames_dropped, 1);
    }

    #[test]
    fn test_broadcast_metrics_consumers() {
        let metrics = BroadcastMetrics::new();
        metrics.record_accepted();
        metrics.record_accepted();
        metrics.record_removed(2);
        metrics.record_handshake_failure();

        let stats = metrics.snapshot();
        assert_eq!(stats.consumers_accepted, 2);
        assert_eq!(stats.consumers_removed, 2);
        assert_eq!(stats.handshake_failures, 1);
    }

    #[test]
    fn test_consumer_stats() {
        let mut stats = ConsumerStats::new();
        stats.on_written(12);
        stats.on_written(8);
        stats.on_timed_out();

        assert_eq!(stats.frames_written, 2);
        assert_eq!(stats.bytes_written, 20);
        assert_eq!(stats.frames_timed_out, 1);
    }
}
