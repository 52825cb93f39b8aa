//! Consumer sessions
//!
//! Each connected client is served by its own [`Consumer`]: a handshake
//! followed by a delivery loop that owns the connection, with its own
//! bounded queue, write deadline, and idle timer.

pub mod consumer;
pub mod context;
pub mod handshake;
pub mod state;
pub mod writer;

pub use consumer::Consumer;
pub use context::RequestMeta;
pub use state::{ConsumerPhase, ConsumerState, StaleReason};
pub use writer::ConsumerWriter;
