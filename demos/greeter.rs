//! Greeter: broadcasts "hello" to every connected client every two seconds
//!
//! Run with: cargo run --example greeter [BIND_ADDR]
//!
//! Then, in another terminal:
//!   curl -N http://localhost:8080/events
//!
//! With compression:
//!   curl -N --compressed http://localhost:8080/events

use std::net::SocketAddr;
use std::time::Duration;

use eventsource_rs::{EventSource, RequestMeta, ServerConfig, Settings, SseServer};
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let addr: SocketAddr = std::env::args()
        .nth(1)
        .unwrap_or_else(|| "0.0.0.0:8080".into())
        .parse()?;

    let settings = Settings::default()
        .gzip(true)
        .idle_timeout(Duration::from_secs(60));

    let es = EventSource::with_header_decorator(settings, |_: &RequestMeta| {
        vec![
            "X-Accel-Buffering: no".to_string(),
            "Access-Control-Allow-Origin: *".to_string(),
        ]
    });

    let publisher = es.clone();
    tokio::spawn(async move {
        publisher.send_retry_message(Duration::from_secs(3)).await;
        loop {
            publisher.send_event_message("hello", "", "").await;
            let consumers = publisher.consumers_count().await;
            tracing::info!(
                consumers = consumers,
                "Hello has been sent"
            );
            tokio::time::sleep(Duration::from_secs(2)).await;
        }
    });

    let server = SseServer::new(ServerConfig::with_addr(addr), es);
    tracing::info!("Open http://{}/events", addr);

    server
        .run_until(async {
            let _ = tokio::signal::ctrl_c().await;
        })
        .await?;

    Ok(())
}
