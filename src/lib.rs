//! Server-sent events broadcaster for tokio
//!
//! Holds long-lived client connections open and fans application messages
//! out to all of them as a `text/event-stream`.
//!
//! - [`EventSource`] takes ownership of accepted connections and publishes
//!   messages to every connected consumer.
//! - [`SseServer`] is an optional minimal HTTP front end that hands
//!   requests for one path to an `EventSource`.
//!
//! Each consumer has a bounded queue. A slow consumer loses messages rather
//! than slowing down the publisher or other consumers, and a consumer that
//! fails a write or stays idle too long is dropped.
//!
//! # Example
//! ```no_run
//! use std::time::Duration;
//!
//! use eventsource_rs::{EventSource, ServerConfig, Settings, SseServer};
//!
//! # async fn example() -> eventsource_rs::Result<()> {
//! let es = EventSource::new(Settings::default());
//! let server = SseServer::new(ServerConfig::default(), es.clone());
//!
//! tokio::spawn(async move {
//!     let mut id = 1;
//!     loop {
//!         es.send_event_message("tick", "tick-event", id.to_string()).await;
//!         id += 1;
//!         tokio::time::sleep(Duration::from_secs(2)).await;
//!     }
//! });
//!
//! server.run().await
//! # }
//! ```

pub mod error;
pub mod message;
pub mod registry;
pub mod server;
pub mod session;
pub mod stats;

#[cfg(test)]
mod test_util;

pub use error::{Error, Result};
pub use message::{EventMessage, Message};
pub use registry::{ConsumerId, ConsumerRegistry, PublishReport, RegistryError};
pub use server::{EventSource, HeaderDecorator, ServerConfig, Settings, SseServer};
pub use session::RequestMeta;
pub use stats::BroadcastStats;
