//! Event stream listener
//!
//! Minimal HTTP/1.x front end: accepts TCP connections, parses the request
//! head with `httparse`, and hands matching requests to an [`EventSource`].

use std::net::SocketAddr;

use bytes::BytesMut;
use http::{header, Method, StatusCode};
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::{TcpListener, TcpStream};

use crate::error::{Error, Result};
use crate::server::config::ServerConfig;
use crate::server::event_source::EventSource;
use crate::session::RequestMeta;

/// Server-sent events server
pub struct SseServer {
    config: ServerConfig,
    event_source: EventSource,
}

impl SseServer {
    /// Create a new server publishing through `event_source`
    pub fn new(config: ServerConfig, event_source: EventSource) -> Self {
        Self {
            config,
            event_source,
        }
    }

    /// The event source consumers are handed to
    pub fn event_source(&self) -> &EventSource {
        &self.event_source
    }

    /// Run the server
    ///
    /// This method blocks until the server is shut down.
    pub async fn run(&self) -> Result<()> {
        let listener = TcpListener::bind(self.config.bind_addr).await?;
        tracing::info!(addr = %self.config.bind_addr, path = %self.config.path, "SSE server listening");

        self.serve(listener).await
    }

    /// Run the server with graceful shutdown
    ///
    /// When `shutdown` resolves the accept loop stops and the event source
    /// is closed, which closes every consumer connection.
    pub async fn run_until<F>(&self, shutdown: F) -> Result<()>
    where
        F: std::future::Future<Output = ()>,
    {
        let listener = TcpListener::bind(self.config.bind_addr).await?;
        tracing::info!(addr = %self.config.bind_addr, path = %self.config.path, "SSE server listening");

        let result = tokio::select! {
            _ = shutdown => {
                tracing::info!("Shutdown signal received");
                Ok(())
            }
            result = self.serve(listener) => result,
        };

        self.event_source.close().await;

        result
    }

    /// Accept connections from an already bound listener
    pub async fn serve(&self, listener: TcpListener) -> Result<()> {
        loop {
            match listener.accept().await {
                Ok((socket, peer_addr)) => self.handle_connection(socket, peer_addr),
                Err(e) => {
                    tracing::error!(error = %e, "Failed to accept connection");
                }
            }
        }
    }

    fn handle_connection(&self, socket: TcpStream, peer_addr: SocketAddr) {
        tracing::debug!(peer = %peer_addr, "New connection");

        if self.config.tcp_nodelay {
            if let Err(e) = socket.set_nodelay(true) {
                tracing::error!(error = %e, "Failed to configure socket");
                return;
            }
        }

        let config = self.config.clone();
        let event_source = self.event_source.clone();

        tokio::spawn(async move {
            if let Err(e) = serve_request(socket, peer_addr, &config, &event_source).await {
                tracing::debug!(peer = %peer_addr, error = %e, "Request failed");
            }
        });
    }
}

async fn serve_request(
    mut socket: TcpStream,
    peer_addr: SocketAddr,
    config: &ServerConfig,
    event_source: &EventSource,
) -> Result<()> {
    let meta = match tokio::time::timeout(
        config.request_timeout,
        read_request(&mut socket, config.max_request_head),
    )
    .await
    {
        Ok(Ok(meta)) => meta.with_peer_addr(peer_addr),
        Ok(Err(e)) => {
            reject(&mut socket, StatusCode::BAD_REQUEST).await;
            return Err(e);
        }
        Err(_) => {
            let _ = socket.shutdown().await;
            return Err(Error::RequestTimeout(config.request_timeout));
        }
    };

    if meta.path_only() != config.path {
        tracing::debug!(peer = %peer_addr, path = %meta.path, "Unknown path");
        reject(&mut socket, StatusCode::NOT_FOUND).await;
        return Ok(());
    }

    if meta.method != Method::GET.as_str() {
        reject(&mut socket, StatusCode::METHOD_NOT_ALLOWED).await;
        return Ok(());
    }

    event_source.accept(socket, &meta).await?;
    Ok(())
}

/// Read until `httparse` sees a complete request head
async fn read_request(socket: &mut TcpStream, max: usize) -> Result<RequestMeta> {
    let mut buf = BytesMut::with_capacity(1024);

    loop {
        if socket.read_buf(&mut buf).await? == 0 {
            return Err(Error::BadRequest("connection closed before request head".into()));
        }

        if let Some(meta) = RequestMeta::parse(&buf)? {
            return Ok(meta);
        }
        if buf.len() > max {
            return Err(Error::BadRequest(format!("request head exceeds {} bytes", max)));
        }
    }
}

fn error_response(status: StatusCode) -> String {
    let mut response = format!(
        "HTTP/1.1 {} {}\r\n{}: 0\r\n{}: close\r\n",
        status.as_str(),
        status.canonical_reason().unwrap_or_default(),
        header::CONTENT_LENGTH.as_str(),
        header::CONNECTION.as_str(),
    );
    if status == StatusCode::METHOD_NOT_ALLOWED {
        response.push_str(&format!(
            "{}: {}\r\n",
            header::ALLOW.as_str(),
            Method::GET.as_str()
        ));
    }
    response.push_str("\r\n");
    response
}

async fn reject(socket: &mut TcpStream, status: StatusCode) {
    let _ = socket.write_all(error_response(status).as_bytes()).await;
    let _ = socket.shutdown().await;
}
