//! Consumer state machine
//!
//! Tracks one consumer from the end of its handshake to disconnection.

use crate::registry::ConsumerId;
use crate::stats::ConsumerStats;

/// Consumer lifecycle phase
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConsumerPhase {
    /// Handshake done, delivering frames
    Streaming,
    /// Unusable (fatal write error, write timeout, or idle expiry)
    Stale,
    /// Connection closed
    Closed,
}

/// Why a consumer went stale
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StaleReason {
    /// A write failed
    WriteError,
    /// A write exceeded its deadline and the policy is to close
    WriteTimeout,
    /// No frame arrived within the idle timeout
    Idle,
}

impl StaleReason {
    pub fn as_str(&self) -> &'static str {
        match self {
            StaleReason::WriteError => "write error",
            StaleReason::WriteTimeout => "write timeout",
            StaleReason::Idle => "idle timeout",
        }
    }
}

/// Complete consumer state
#[derive(Debug)]
pub struct ConsumerState {
    /// Consumer identity
    pub id: ConsumerId,

    /// Current phase
    pub phase: ConsumerPhase,

    /// Set when the consumer went stale
    pub stale_reason: Option<StaleReason>,

    /// Whether frames are gzip-compressed
    pub compressed: bool,

    /// Delivery statistics
    pub stats: ConsumerStats,
}

impl ConsumerState {
    /// Create state for a consumer that finished its handshake
    pub fn new(id: ConsumerId, compressed: bool) -> Self {
        Self {
            id,
            phase: ConsumerPhase::Streaming,
            stale_reason: None,
            compressed,
            stats: ConsumerStats::new(),
        }
    }

    /// Mark the consumer stale
    ///
    /// Returns `true` only for the first call; later failures lose.
    pub fn mark_stale(&mut self, reason: StaleReason) -> bool {
        if self.phase != ConsumerPhase::Streaming {
            return false;
        }
        self.phase = ConsumerPhase::Stale;
        self.stale_reason = Some(reason);
        true
    }

    /// Record that the connection has been closed
    pub fn close(&mut self) {
        self.phase = ConsumerPhase::Closed;
    }

    /// Whether frames may still be written
    pub fn is_streaming(&self) -> bool {
        self.phase == ConsumerPhase::Streaming
    }

    /// Whether the consumer went stale before closing
    pub fn was_stale(&self) -> bool {
        self.stale_reason.is_some()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_consumer_lifecycle() {
        let mut state = ConsumerState::new(ConsumerId::new(1), false);
        assert!(state.is_streaming());
        assert!(!state.was_stale());

        state.close();
        assert_eq!(state.phase, ConsumerPhase::Closed);
        assert!(!state.was_stale());
    }

    #[test]
    fn test_first_stale_reason_wins() {
        let mut state = ConsumerState::new(ConsumerId::new(1), true);

        assert!(state.mark_stale(StaleReason::Idle));
        assert!(!state.mark_stale(StaleReason::WriteError));

        assert_eq!(state.phase, ConsumerPhase::Stale);
        assert_eq!(state.stale_reason, Some(StaleReason::Idle));
        assert!(!state.is_streaming());

        state.close();
        assert!(!state.mark_stale(StaleReason::WriteTimeout));
        assert!(state.was_stale());
    }
}
