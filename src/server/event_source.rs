//! Event source facade
//!
//! The public entry point: turns accepted connections into consumers and
//! forwards publish, count, and shutdown calls to the registry.

use std::sync::Arc;
use std::time::Duration;

use tokio::io::{AsyncWrite, AsyncWriteExt};

use crate::error::{Error, Result};
use crate::message::Message;
use crate::registry::{ConsumerId, ConsumerRegistry, PublishReport, RegistryError};
use crate::server::config::Settings;
use crate::session::{Consumer, RequestMeta};
use crate::stats::BroadcastStats;

/// Produces extra response header lines for a new consumer
///
/// Each returned line is written as-is (e.g. `"X-Accel-Buffering: no"`).
pub type HeaderDecorator = Arc<dyn Fn(&RequestMeta) -> Vec<String> + Send + Sync>;

struct Shared {
    settings: Settings,
    header_decorator: Option<HeaderDecorator>,
    registry: Arc<ConsumerRegistry>,
}

/// Server-sent events broadcaster
///
/// Cheap to clone; clones share the same consumers.
///
/// # Example
/// ```no_run
/// use eventsource_rs::{EventSource, RequestMeta, Settings};
///
/// # async fn example(socket: tokio::net::TcpStream) -> eventsource_rs::Result<()> {
/// let es = EventSource::new(Settings::default());
///
/// es.accept(socket, &RequestMeta::new("GET", "/events")).await?;
/// es.send_event_message("tick", "tick-event", "1").await;
///
/// es.close().await;
/// # Ok(())
/// # }
/// ```
#[derive(Clone)]
pub struct EventSource {
    shared: Arc<Shared>,
}

impl EventSource {
    /// Create an event source
    pub fn new(settings: Settings) -> Self {
        Self::build(settings, None)
    }

    /// Create an event source that adds headers to every consumer's response
    pub fn with_header_decorator<F>(settings: Settings, decorator: F) -> Self
    where
        F: Fn(&RequestMeta) -> Vec<String> + Send + Sync + 'static,
    {
        Self::build(settings, Some(Arc::new(decorator)))
    }

    fn build(settings: Settings, header_decorator: Option<HeaderDecorator>) -> Self {
        Self {
            shared: Arc::new(Shared {
                settings,
                header_decorator,
                registry: Arc::new(ConsumerRegistry::new()),
            }),
        }
    }

    /// Settings shared by all consumers
    pub fn settings(&self) -> &Settings {
        &self.shared.settings
    }

    /// The underlying consumer registry
    pub fn registry(&self) -> &Arc<ConsumerRegistry> {
        &self.shared.registry
    }

    /// Whether a consumer for `meta` would get a gzip stream
    pub fn wants_gzip(&self, meta: &RequestMeta) -> bool {
        self.shared.settings.gzip && meta.accepts_gzip()
    }

    /// Take ownership of a client connection
    ///
    /// Writes the response head, registers the consumer, and spawns its
    /// delivery loop. Handshake failures are returned; the connection is
    /// closed and nothing is registered.
    pub async fn accept<S>(&self, mut stream: S, meta: &RequestMeta) -> Result<ConsumerId>
    where
        S: AsyncWrite + Unpin + Send + 'static,
    {
        let registry = &self.shared.registry;
        let settings = &self.shared.settings;

        if registry.is_closed().await {
            let _ = tokio::time::timeout(settings.write_timeout, stream.shutdown()).await;
            return Err(RegistryError::Closed.into());
        }

        let compress = self.wants_gzip(meta);
        let extra_headers = self
            .shared
            .header_decorator
            .as_ref()
            .map(|decorate| decorate(meta))
            .unwrap_or_default();

        let id = registry.next_id();
        let (consumer, tx) =
            match Consumer::open(id, stream, settings, compress, &extra_headers).await {
                Ok(opened) => opened,
                Err(e) => {
                    registry.metrics().record_handshake_failure();
                    tracing::warn!(
                        peer = ?meta.peer_addr,
                        error = %e,
                        "Can't create connection to a consumer"
                    );
                    return Err(e);
                }
            };

        if let Err(e) = registry.register(id, tx).await {
            // Queue sender is gone, so the loop closes the connection at once
            consumer.run(Arc::clone(registry)).await;
            return Err(Error::Registry(e));
        }

        tokio::spawn(consumer.run(Arc::clone(registry)));

        tracing::info!(
            consumer_id = %id,
            peer = ?meta.peer_addr,
            path = %meta.path,
            compressed = compress,
            "Consumer connected"
        );

        Ok(id)
    }

    /// Broadcast a message to every consumer
    ///
    /// Per-consumer failures are never reported here. Fails only after
    /// [`close`](Self::close).
    pub async fn send(&self, message: Message) -> Result<PublishReport> {
        let report = self.shared.registry.publish(&message).await?;

        tracing::trace!(
            kind = message.kind(),
            queued = report.queued,
            dropped = report.dropped,
            "Message published"
        );

        Ok(report)
    }

    /// Broadcast an event; ignored after close
    pub async fn send_event_message(
        &self,
        data: impl Into<String>,
        event: impl Into<String>,
        id: impl Into<String>,
    ) {
        self.send_or_log(Message::event(data, event, id)).await;
    }

    /// Broadcast a reconnection delay; ignored after close
    pub async fn send_retry_message(&self, interval: Duration) {
        self.send_or_log(Message::retry(interval)).await;
    }

    async fn send_or_log(&self, message: Message) {
        if let Err(e) = self.send(message).await {
            tracing::debug!(error = %e, "Message discarded");
        }
    }

    /// Number of connected consumers
    pub async fn consumers_count(&self) -> usize {
        self.shared.registry.count().await
    }

    /// Broadcaster counters
    pub fn stats(&self) -> BroadcastStats {
        self.shared.registry.stats()
    }

    /// Whether [`close`](Self::close) has run
    pub async fn is_closed(&self) -> bool {
        self.shared.registry.is_closed().await
    }

    /// Close every consumer connection and stop accepting new ones
    ///
    /// Consumers close their connections asynchronously after draining
    /// frames already queued. Calling this again has no effect.
    pub async fn close(&self) {
        self.shared.registry.shutdown().await;
    }
}

impl std::fmt::Debug for EventSource {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("EventSource")
            .field("settings", &self.shared.settings)
            .field("header_decorator", &self.shared.header_decorator.is_some())
            .finish()
    }
}
