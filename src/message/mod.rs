//! Messages broadcast to consumers
//!
//! A [`Message`] is either an event (optional id and event type plus a
//! data payload) or a retry directive telling clients how long to wait
//! before reconnecting. Messages are encoded once per publish into a
//! reference-counted [`bytes::Bytes`] buffer, so every consumer queue
//! shares the same allocation.
//!
//! # Wire format
//!
//! ```text
//! id: 42
//! event: tick
//! data: first line
//! data: second line
//!
//! ```

pub mod encode;
pub mod event;

pub use encode::encode;
pub use event::{EventMessage, Message};
