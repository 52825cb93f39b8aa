//! Broadcaster and consumer statistics

pub mod metrics;

pub use metrics::{BroadcastMetrics, BroadcastStats, ConsumerStats};
