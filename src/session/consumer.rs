//! Consumer session
//!
//! One consumer per connected client. [`Consumer::open`] performs the
//! handshake; [`Consumer::run`] is the delivery loop that owns the
//! connection until the queue closes, a write fails, or the idle timer
//! fires.

use std::sync::Arc;
use std::time::Duration;

use bytes::Bytes;
use tokio::io::{AsyncWrite, AsyncWriteExt};
use tokio::sync::mpsc;
use tokio::time::Instant;

use crate::error::Result;
use crate::registry::{ConsumerId, ConsumerRegistry};
use crate::server::config::Settings;

use super::handshake;
use super::state::{ConsumerState, StaleReason};
use super::writer::ConsumerWriter;

/// Stand-in deadline for idle timeouts too long to represent
const FAR_FUTURE: Duration = Duration::from_secs(86400 * 365 * 30);

fn idle_deadline(idle_timeout: Duration) -> Instant {
    let now = Instant::now();
    now.checked_add(idle_timeout).unwrap_or_else(|| now + FAR_FUTURE)
}

/// A connected consumer and its delivery state
pub struct Consumer<S> {
    writer: ConsumerWriter<S>,
    rx: mpsc::Receiver<Bytes>,
    settings: Settings,
    state: ConsumerState,
}

impl<S> Consumer<S>
where
    S: AsyncWrite + Unpin + Send + 'static,
{
    /// Perform the handshake on `stream`
    ///
    /// Returns the consumer and the sending half of its queue, to be handed
    /// to the registry. On failure the stream is shut down and dropped.
    pub async fn open(
        id: ConsumerId,
        mut stream: S,
        settings: &Settings,
        compress: bool,
        extra_headers: &[String],
    ) -> Result<(Self, mpsc::Sender<Bytes>)> {
        let head = handshake::response_head(compress, extra_headers);

        if let Err(e) = handshake::write_head(&mut stream, &head, settings.write_timeout).await {
            let _ = tokio::time::timeout(settings.write_timeout, stream.shutdown()).await;
            return Err(e);
        }

        let (tx, rx) = mpsc::channel(settings.queue_capacity.max(1));

        let consumer = Self {
            writer: ConsumerWriter::new(stream, compress),
            rx,
            settings: settings.clone(),
            state: ConsumerState::new(id, compress),
        };

        Ok((consumer, tx))
    }

    /// Consumer identity
    pub fn id(&self) -> ConsumerId {
        self.state.id
    }

    /// Run the delivery loop to completion
    ///
    /// Exits when the queue is closed by the registry, or when the consumer
    /// goes stale; in the latter case it reports itself to `registry` once.
    pub async fn run(mut self, registry: Arc<ConsumerRegistry>) {
        let id = self.state.id;
        let idle_timeout = self.settings.idle_timeout;
        let write_timeout = self.settings.write_timeout;

        let idle = tokio::time::sleep_until(idle_deadline(idle_timeout));
        tokio::pin!(idle);

        loop {
            tokio::select! {
                frame = self.rx.recv() => {
                    let Some(frame) = frame else {
                        break;
                    };

                    match tokio::time::timeout(write_timeout, self.writer.write_frame(&frame)).await {
                        Ok(Ok(())) => self.state.stats.on_written(frame.len()),
                        Ok(Err(e)) => {
                            tracing::debug!(consumer_id = %id, error = %e, "Write failed");
                            self.state.mark_stale(StaleReason::WriteError);
                            break;
                        }
                        Err(_) if self.settings.close_on_write_timeout => {
                            self.state.mark_stale(StaleReason::WriteTimeout);
                            break;
                        }
                        Err(_) => {
                            self.state.stats.on_timed_out();
                            tracing::debug!(
                                consumer_id = %id,
                                timeout_ms = write_timeout.as_millis() as u64,
                                "Write timed out, frame dropped"
                            );
                        }
                    }

                    // Also reset after a tolerated timeout
                    idle.as_mut().reset(idle_deadline(idle_timeout));
                }
                () = &mut idle => {
                    self.state.mark_stale(StaleReason::Idle);
                    break;
                }
            }
        }

        self.close().await;

        if self.state.was_stale() {
            tracing::debug!(
                consumer_id = %id,
                reason = self.state.stale_reason.map(|r| r.as_str()).unwrap_or_default(),
                "Consumer stale"
            );
            registry.mark_stale(id).await;
        }
    }

    async fn close(&mut self) {
        // A peer that stopped reading must not hold the task forever
        match tokio::time::timeout(self.settings.write_timeout, self.writer.close()).await {
            Ok(Ok(())) => {}
            Ok(Err(e)) => {
                tracing::debug!(consumer_id = %self.state.id, error = %e, "Close failed");
            }
            Err(_) => {
                tracing::debug!(consumer_id = %self.state.id, "Close timed out");
            }
        }
        self.state.close();

        let stats = &self.state.stats;
        tracing::debug!(
            consumer_id = %self.state.id,
            compressed = self.state.compressed,
            frames_written = stats.frames_written,
            bytes_written = stats.bytes_written,
            frames_timed_out = stats.frames_timed_out,
            duration_ms = stats.duration().as_millis() as u64,
            "Consumer closed"
        );
    }
}
