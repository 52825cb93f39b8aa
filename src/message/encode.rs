//! Message encoding
//!
//! Renders a [`Message`] into `text/event-stream` bytes. Encoding is pure and
//! runs once per publish; the resulting buffer is shared by every consumer.

use bytes::{BufMut, Bytes, BytesMut};

use super::event::{EventMessage, Message};

/// Encode a message into its wire representation
pub fn encode(message: &Message) -> Bytes {
    match message {
        Message::Event(event) => encode_event(event),
        Message::Retry(interval) => {
            let mut buf = BytesMut::with_capacity(16);
            buf.put_slice(b"retry: ");
            buf.put_slice(interval.as_millis().to_string().as_bytes());
            buf.put_slice(b"\n\n");
            buf.freeze()
        }
    }
}

fn encode_event(event: &EventMessage) -> Bytes {
    let mut buf =
        BytesMut::with_capacity(event.id.len() + event.event.len() + event.data.len() + 32);

    if !event.id.is_empty() {
        put_single_line_field(&mut buf, b"id: ", &event.id);
    }
    if !event.event.is_empty() {
        put_single_line_field(&mut buf, b"event: ", &event.event);
    }
    if !event.data.is_empty() {
        // A trailing newline yields a trailing empty `data: ` line
        for line in event.data.split('\n') {
            buf.put_slice(b"data: ");
            buf.put_slice(line.as_bytes());
            buf.put_u8(b'\n');
        }
    }
    buf.put_u8(b'\n');

    buf.freeze()
}

/// Write `prefix` followed by `value` with line breaks removed
fn put_single_line_field(buf: &mut BytesMut, prefix: &[u8], value: &str) {
    buf.put_slice(prefix);
    for chunk in value.split(['\n', '\r']) {
        buf.put_slice(chunk.as_bytes());
    }
    buf.put_u8(b'\n');
}

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use super::*;

    fn event(data: &str, event: &str, id: &str) -> Bytes {
        encode(&Message::event(data, event, id))
    }

    #[test]
    fn test_data_only() {
        assert_eq!(event("test", "", ""), "data: test\n\n");
    }

    #[test]
    fn test_with_id() {
        assert_eq!(event("test", "", "1"), "id: 1\ndata: test\n\n");
    }

    #[test]
    fn test_id_newlines_stripped() {
        assert_eq!(event("test", "", "1\n1"), "id: 11\ndata: test\n\n");
        assert_eq!(event("test", "", "1\r\n1"), "id: 11\ndata: test\n\n");
    }

    #[test]
    fn test_with_event_type() {
        assert_eq!(
            event("test", "notification", ""),
            "event: notification\ndata: test\n\n"
        );
    }

    #[test]
    fn test_event_type_newlines_stripped() {
        assert_eq!(
            event("test", "notification\n2", ""),
            "event: notification2\ndata: test\n\n"
        );
    }

    #[test]
    fn test_multiline_data_keeps_trailing_line() {
        assert_eq!(
            event("test\ntest2\ntest3\n", "", ""),
            "data: test\ndata: test2\ndata: test3\ndata: \n\n"
        );
    }

    #[test]
    fn test_field_order() {
        assert_eq!(
            event("a\nb", "tick", "9"),
            "id: 9\nevent: tick\ndata: a\ndata: b\n\n"
        );
    }

    #[test]
    fn test_empty_event_is_bare_terminator() {
        assert_eq!(event("", "", ""), "\n");
    }

    #[test]
    fn test_retry() {
        assert_eq!(
            encode(&Message::retry(Duration::from_secs(3))),
            "retry: 3000\n\n"
        );
    }

    #[test]
    fn test_retry_truncates_to_whole_millis() {
        assert_eq!(
            encode(&Message::retry(Duration::from_micros(1500))),
            "retry: 1\n\n"
        );
    }
}
