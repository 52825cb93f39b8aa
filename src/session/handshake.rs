//! Consumer handshake
//!
//! Writes the HTTP response head that switches a connection into an event
//! stream. The head always goes out uncompressed; when gzip is negotiated
//! the body writer is swapped in afterwards.

use std::time::Duration;

use bytes::{BufMut, Bytes, BytesMut};
use tokio::io::{AsyncWrite, AsyncWriteExt};

use crate::error::{Error, Result};

const STATUS_LINE: &[u8] = b"HTTP/1.1 200 OK\r\n";
const CONTENT_TYPE: &[u8] = b"Content-Type: text/event-stream\r\n";
const VARY: &[u8] = b"Vary: Accept-Encoding\r\n";
const CONTENT_ENCODING_GZIP: &[u8] = b"Content-Encoding: gzip\r\n";

/// Build the response head
///
/// Extra header lines are written in order, each terminated by CRLF. Line
/// breaks inside a caller-supplied line are removed so it cannot end the
/// header block early.
pub fn response_head(compress: bool, extra_headers: &[String]) -> Bytes {
    let extra_len: usize = extra_headers.iter().map(|h| h.len() + 2).sum();
    let mut buf = BytesMut::with_capacity(128 + extra_len);

    buf.put_slice(STATUS_LINE);
    buf.put_slice(CONTENT_TYPE);
    buf.put_slice(VARY);
    if compress {
        buf.put_slice(CONTENT_ENCODING_GZIP);
    }
    for header in extra_headers {
        for chunk in header.split(['\r', '\n']) {
            buf.put_slice(chunk.as_bytes());
        }
        buf.put_slice(b"\r\n");
    }
    buf.put_slice(b"\r\n");

    buf.freeze()
}

/// Write the response head within `timeout`
pub async fn write_head<S>(stream: &mut S, head: &[u8], timeout: Duration) -> Result<()>
where
    S: AsyncWrite + Unpin,
{
    let write = async {
        stream.write_all(head).await?;
        stream.flush().await
    };

    match tokio::time::timeout(timeout, write).await {
        Ok(Ok(())) => Ok(()),
        Ok(Err(e)) => Err(Error::Handshake(e)),
        Err(_) => Err(Error::HandshakeTimeout(timeout)),
    }
}
