//! Consumer registry and broadcast coordination
//!
//! The registry is the single authority over which consumers are live. Every
//! membership change and every publish fan-out runs under one write lock, so
//! a publish never interleaves with a half-applied add or remove, and a
//! concurrent `count()` never sees a consumer mid-removal.
//!
//! # Architecture
//!
//! ```text
//!                      Arc<ConsumerRegistry>
//!                 ┌───────────────────────────┐
//!                 │ consumers: Vec<           │
//!                 │   ConsumerEntry {         │
//!                 │     id,                   │
//!                 │     tx: mpsc::Sender,     │
//!                 │   }                       │
//!                 │ >                         │
//!                 └─────────────┬─────────────┘
//!                               │ try_send (never blocks)
//!         ┌─────────────────────┼─────────────────────┐
//!         ▼                     ▼                     ▼
//!    [Consumer]            [Consumer]            [Consumer]
//!    rx.recv()             rx.recv()             rx.recv()
//!    write ──► TCP         write ──► TCP         write ──► TCP
//! ```
//!
//! The registry only stores a consumer's id and the sending half of its
//! queue. It never performs I/O on a connection; each consumer task owns
//! its own stream and reports back through [`ConsumerRegistry::mark_stale`].
//!
//! # Backpressure
//!
//! Queues are bounded. When a consumer's queue is full the frame is dropped
//! for that consumer only, so one slow client cannot stall the publisher or
//! anyone else.

pub mod entry;
pub mod error;
pub mod store;

pub use entry::{ConsumerEntry, ConsumerId, Delivery};
pub use error::RegistryError;
pub use store::{ConsumerRegistry, PublishReport, RegistryState};
