//! Event source and server configuration

use std::net::SocketAddr;
use std::time::Duration;

/// Default write deadline per frame
pub const DEFAULT_WRITE_TIMEOUT: Duration = Duration::from_secs(2);

/// Default idle timeout before a silent consumer is dropped
pub const DEFAULT_IDLE_TIMEOUT: Duration = Duration::from_secs(30 * 60);

/// Default capacity of each consumer's inbound queue
pub const DEFAULT_QUEUE_CAPACITY: usize = 10;

/// Event source settings
///
/// Read by every consumer when it is created; changing a clone afterwards
/// does not affect running consumers.
#[derive(Debug, Clone)]
pub struct Settings {
    /// Deadline for writing one frame (and for the handshake)
    pub write_timeout: Duration,

    /// Close the connection when a write times out; otherwise drop the
    /// frame and keep the consumer
    ///
    /// If the connection gets closed on a timeout, it's the client's
    /// responsibility to reconnect. If it doesn't, frames may keep going to
    /// a dead client until the idle timeout.
    pub close_on_write_timeout: bool,

    /// Drop consumers that have received nothing for this long
    pub idle_timeout: Duration,

    /// Compress with gzip when the client accepts it
    pub gzip: bool,

    /// Frames buffered per consumer before new ones are dropped
    pub queue_capacity: usize,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            write_timeout: DEFAULT_WRITE_TIMEOUT,
            close_on_write_timeout: true,
            idle_timeout: DEFAULT_IDLE_TIMEOUT,
            gzip: false,
            queue_capacity: DEFAULT_QUEUE_CAPACITY,
        }
    }
}

impl Settings {
    /// Set the per-frame write timeout
    pub fn write_timeout(mut self, timeout: Duration) -> Self {
        self.write_timeout = timeout;
        self
    }

    /// Set whether a write timeout closes the connection
    pub fn close_on_write_timeout(mut self, close: bool) -> Self {
        self.close_on_write_timeout = close;
        self
    }

    /// Set the idle timeout
    pub fn idle_timeout(mut self, timeout: Duration) -> Self {
        self.idle_timeout = timeout;
        self
    }

    /// Enable gzip for clients that accept it
    pub fn gzip(mut self, enabled: bool) -> Self {
        self.gzip = enabled;
        self
    }

    /// Set the per-consumer queue capacity (minimum 1)
    pub fn queue_capacity(mut self, capacity: usize) -> Self {
        self.queue_capacity = capacity.max(1);
        self
    }
}

/// Listener configuration
#[derive(Debug, Clone)]
pub struct ServerConfig {
    /// Address to bind to
    pub bind_addr: SocketAddr,

    /// Path served as the event stream; other paths get 404
    pub path: String,

    /// Time allowed for the client to send its request head
    pub request_timeout: Duration,

    /// Largest accepted request head in bytes
    pub max_request_head: usize,

    /// Enable TCP_NODELAY (disable Nagle's algorithm)
    pub tcp_nodelay: bool,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            bind_addr: SocketAddr::from(([0, 0, 0, 0], 8080)),
            path: "/events".into(),
            request_timeout: Duration::from_secs(10),
            max_request_head: 8 * 1024,
            tcp_nodelay: true, // Events should leave immediately
        }
    }
}

impl ServerConfig {
    /// Create a new config with custom bind address
    pub fn with_addr(addr: SocketAddr) -> Self {
        Self {
            bind_addr: addr,
            ..Default::default()
        }
    }

    /// Set the bind address
    pub fn bind(mut self, addr: SocketAddr) -> Self {
        self.bind_addr = addr;
        self
    }

    /// Set the event stream path
    pub fn path(mut self, path: impl Into<String>) -> Self {
        self.path = path.into();
        self
    }

    /// Set the request head timeout
    pub fn request_timeout(mut self, timeout: Duration) -> Self {
        self.request_timeout = timeout;
        self
    }

    /// Set the request head size limit
    pub fn max_request_head(mut self, max: usize) -> Self {
        self.max_request_head = max;
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_settings() {
        let settings = Settings::default();

        assert_eq!(settings.write_timeout, Duration::from_secs(2));
        assert!(settings.close_on_write_timeout);
        assert_eq!(settings.idle_timeout, Duration::from_secs(1800));
        assert!(!settings.gzip);
        assert_eq!(settings.queue_capacity, 10);
    }

    #[test]
    fn test_settings_builder_chaining() {
        let settings = Settings::default()
            .write_timeout(Duration::from_millis(500))
            .close_on_write_timeout(false)
            .idle_timeout(Duration::from_secs(60))
            .gzip(true)
            .queue_capacity(0);

        assert_eq!(settings.write_timeout, Duration::from_millis(500));
        assert!(!settings.close_on_write_timeout);
        assert_eq!(settings.idle_timeout, Duration::from_secs(60));
        assert!(settings.gzip);
        // Capacity is clamped
        assert_eq!(settings.queue_capacity, 1);
    }

    #[test]
    fn test_default_server_config() {
        let config = ServerConfig::default();

        assert_eq!(config.bind_addr.port(), 8080);
        assert_eq!(config.path, "/events");
        assert!(config.tcp_nodelay);
    }

    #[test]
    fn test_server_config_builder() {
        let addr: SocketAddr = "127.0.0.1:9000".parse().unwrap();
        let config = ServerConfig::with_addr(addr)
            .path("/stream")
            .request_timeout(Duration::from_secs(1))
            .max_request_head(1024);

        assert_eq!(config.bind_addr, addr);
        assert_eq!(config.path, "/stream");
        assert_eq!(config.request_timeout, Duration::from_secs(1));
        assert_eq!(config.max_request_head, 1024);
    }
}
