//! Event source facade and listener

pub mod config;
pub mod event_source;
pub mod listener;

pub use config::{ServerConfig, Settings};
pub use event_source::{EventSource, HeaderDecorator};
pub use listener::SseServer;
