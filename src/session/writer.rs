//! Consumer connection writer
//!
//! Wraps the raw connection, optionally behind a streaming gzip encoder.
//! Every frame is flushed as soon as it is written so events reach the
//! client immediately; for gzip this emits a sync flush block.

use std::io;

use async_compression::tokio::write::GzipEncoder;
use tokio::io::{AsyncWrite, AsyncWriteExt};

/// Writer owned by a consumer's delivery loop
pub enum ConsumerWriter<S> {
    /// Uncompressed stream
    Plain(S),
    /// Gzip-compressed stream
    Gzip(GzipEncoder<S>),
}

impl<S> ConsumerWriter<S>
where
    S: AsyncWrite + Unpin,
{
    /// Wrap a stream, compressing if `compress` is set
    pub fn new(stream: S, compress: bool) -> Self {
        if compress {
            ConsumerWriter::Gzip(GzipEncoder::new(stream))
        } else {
            ConsumerWriter::Plain(stream)
        }
    }

    /// Whether frames are gzip-compressed
    pub fn is_compressed(&self) -> bool {
        matches!(self, ConsumerWriter::Gzip(_))
    }

    /// Write and flush one encoded frame
    pub async fn write_frame(&mut self, frame: &[u8]) -> io::Result<()> {
        match self {
            ConsumerWriter::Plain(stream) => {
                stream.write_all(frame).await?;
                stream.flush().await
            }
            ConsumerWriter::Gzip(encoder) => {
                encoder.write_all(frame).await?;
                encoder.flush().await
            }
        }
    }

    /// Finish the stream and shut the connection down
    ///
    /// For gzip this writes the trailer first.
    pub async fn close(&mut self) -> io::Result<()> {
        match self {
            ConsumerWriter::Plain(stream) => stream.shutdown().await,
            ConsumerWriter::Gzip(encoder) => encoder.shutdown().await,
        }
    }
}

impl<S> std::fmt::Debug for ConsumerWriter<S> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ConsumerWriter::Plain(_) => f.write_str("ConsumerWriter::Plain"),
            ConsumerWriter::Gzip(_) => f.write_str("ConsumerWriter::Gzip"),
        }
    }
}

#[cfg(test)]
mod tests {
    use async_compression::tokio::bufread::GzipDecoder;
    use tokio::io::{AsyncReadExt, BufReader};

    use super::*;

    #[tokio::test]
    async fn test_plain_write_and_close() {
        let (client, mut server) = tokio::io::duplex(1024);
        let mut writer = ConsumerWriter::new(client, false);
        assert!(!writer.is_compressed());

        writer.write_frame(b"data: a\n\n").await.unwrap();
        writer.close().await.unwrap();

        let mut out = String::new();
        server.read_to_string(&mut out).await.unwrap();
        assert_eq!(out, "data: a\n\n");
    }

    #[tokio::test]
    async fn test_gzip_frame_readable_before_close() {
        let (client, server) = tokio::io::duplex(4096);
        let mut writer = ConsumerWriter::new(client, true);
        assert!(writer.is_compressed());

        writer.write_frame(b"data: hello\n\n").await.unwrap();

        let mut decoder = GzipDecoder::new(BufReader::new(server));
        let mut buf = [0u8; 13];
        decoder.read_exact(&mut buf).await.unwrap();
        assert_eq!(&buf, b"data: hello\n\n");

        writer.write_frame(b"data: again\n\n").await.unwrap();
        writer.close().await.unwrap();

        let mut rest = String::new();
        decoder.read_to_string(&mut rest).await.unwrap();
        assert_eq!(rest, "data: again\n\n");
    }
}
