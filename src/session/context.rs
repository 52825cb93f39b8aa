//! Request metadata
//!
//! The parts of the originating HTTP request a consumer needs: enough to
//! decide extra response headers and whether to compress.

use std::net::SocketAddr;

use crate::error::{Error, Result};

/// Header fields accepted in one request head
const MAX_HEADERS: usize = 64;

/// Metadata of the request that opened a consumer connection
#[derive(Debug, Clone, Default)]
pub struct RequestMeta {
    /// Request method (e.g., "GET")
    pub method: String,

    /// Request target path, including any query string
    pub path: String,

    /// HTTP version token (e.g., "HTTP/1.1")
    pub version: String,

    /// Remote peer address, when known
    pub peer_addr: Option<SocketAddr>,

    /// Header fields in arrival order
    headers: Vec<(String, String)>,
}

impl RequestMeta {
    /// Create metadata for a request line
    pub fn new(method: impl Into<String>, path: impl Into<String>) -> Self {
        Self {
            method: method.into(),
            path: path.into(),
            version: "HTTP/1.1".into(),
            peer_addr: None,
            headers: Vec::new(),
        }
    }

    /// Add a header field
    pub fn with_header(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.headers.push((name.into(), value.into()));
        self
    }

    /// Set the peer address
    pub fn with_peer_addr(mut self, addr: SocketAddr) -> Self {
        self.peer_addr = Some(addr);
        self
    }

    /// First value of a header, matched case-insensitively
    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers
            .iter()
            .find(|(n, _)| n.eq_ignore_ascii_case(name))
            .map(|(_, v)| v.as_str())
    }

    /// All header fields in arrival order
    pub fn headers(&self) -> impl Iterator<Item = (&str, &str)> {
        self.headers.iter().map(|(n, v)| (n.as_str(), v.as_str()))
    }

    /// Request path without the query string
    pub fn path_only(&self) -> &str {
        self.path.split('?').next().unwrap_or_default()
    }

    /// Whether the client advertised gzip in `Accept-Encoding`
    pub fn accepts_gzip(&self) -> bool {
        self.header("Accept-Encoding")
            .map(|v| v.contains("gzip"))
            .unwrap_or(false)
    }

    /// Parse an HTTP/1.x request head
    ///
    /// Returns `Ok(None)` while `buf` does not yet hold the whole head.
    pub fn parse(buf: &[u8]) -> Result<Option<Self>> {
        let mut headers = [httparse::EMPTY_HEADER; MAX_HEADERS];
        let mut request = httparse::Request::new(&mut headers);

        match request.parse(buf) {
            Ok(httparse::Status::Complete(_)) => {}
            Ok(httparse::Status::Partial) => return Ok(None),
            Err(e) => return Err(Error::BadRequest(e.to_string())),
        }

        let (Some(method), Some(path), Some(version)) =
            (request.method, request.path, request.version)
        else {
            return Err(Error::BadRequest("incomplete request line".into()));
        };

        let mut meta = RequestMeta::new(method, path);
        meta.version = format!("HTTP/1.{}", version);
        meta.headers = request
            .headers
            .iter()
            .map(|h| {
                (
                    h.name.to_string(),
                    String::from_utf8_lossy(h.value).trim().to_string(),
                )
            })
            .collect();

        Ok(Some(meta))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_request_head() {
        let head = b"GET /events?x=1 HTTP/1.1\r\nHost: localhost\r\nAccept-Encoding: gzip, deflate\r\n\r\n";
        let meta = RequestMeta::parse(head).unwrap().unwrap();

        assert_eq!(meta.method, "GET");
        assert_eq!(meta.path, "/events?x=1");
        assert_eq!(meta.path_only(), "/events");
        assert_eq!(meta.version, "HTTP/1.1");
        assert_eq!(meta.header("host"), Some("localhost"));
        assert!(meta.accepts_gzip());
        assert_eq!(meta.headers().count(), 2);
    }

    #[test]
    fn test_parse_partial_head() {
        assert!(RequestMeta::parse(b"").unwrap().is_none());
        assert!(RequestMeta::parse(b"GET /events HTTP/1.1\r\nHost: x\r\n")
            .unwrap()
            .is_none());

        let meta = RequestMeta::parse(b"GET / HTTP/1.0\r\n\r\n").unwrap().unwrap();
        assert_eq!(meta.version, "HTTP/1.0");
        assert!(!meta.accepts_gzip());
    }

    #[test]
    fn test_parse_rejects_garbage() {
        assert!(matches!(
            RequestMeta::parse(b"hello\r\n\r\n"),
            Err(Error::BadRequest(_))
        ));
        assert!(matches!(
            RequestMeta::parse(b"GET / HTTP/1.1\r\nno-colon\r\n\r\n"),
            Err(Error::BadRequest(_))
        ));
    }

    #[test]
    fn test_parse_rejects_too_many_headers() {
        let mut head = String::from("GET / HTTP/1.1\r\n");
        for i in 0..=MAX_HEADERS {
            head.push_str(&format!("X-H{}: v\r\n", i));
        }
        head.push_str("\r\n");

        assert!(matches!(
            RequestMeta::parse(head.as_bytes()),
            Err(Error::BadRequest(_))
        ));
    }

    #[test]
    fn test_builder_headers() {
        let meta = RequestMeta::new("GET", "/")
            .with_header("Accept-Encoding", "br")
            .with_header("X-Token", "abc");

        assert!(!meta.accepts_gzip());
        assert_eq!(meta.header("x-token"), Some("abc"));
    }
}
