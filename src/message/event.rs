//! Message types
//!
//! Values handed to the broadcaster by application code.

use std::time::Duration;

/// A single `text/event-stream` event
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct EventMessage {
    /// Event id (`id:` field), empty to omit
    pub id: String,
    /// Event type (`event:` field), empty to omit
    pub event: String,
    /// Payload, one `data:` line per newline-separated segment
    pub data: String,
}

impl EventMessage {
    /// Create an event carrying only data
    pub fn new(data: impl Into<String>) -> Self {
        Self {
            data: data.into(),
            ..Default::default()
        }
    }

    /// Set the event type
    pub fn event(mut self, event: impl Into<String>) -> Self {
        self.event = event.into();
        self
    }

    /// Set the event id
    pub fn id(mut self, id: impl Into<String>) -> Self {
        self.id = id.into();
        self
    }
}

/// A unit of broadcast
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Message {
    /// Regular event
    Event(EventMessage),
    /// Reconnection delay directive (`retry:` field)
    Retry(Duration),
}

impl Message {
    /// Build an event message from its three fields
    ///
    /// Argument order follows the publish API: data first, then the event
    /// type and id.
    pub fn event(data: impl Into<String>, event: impl Into<String>, id: impl Into<String>) -> Self {
        Message::Event(EventMessage::new(data).event(event).id(id))
    }

    /// Build a retry directive
    pub fn retry(interval: Duration) -> Self {
        Message::Retry(interval)
    }

    /// Short name used in log fields
    pub fn kind(&self) -> &'static str {
        match self {
            Message::Event(_) => "event",
            Message::Retry(_) => "retry",
        }
    }
}

impl From<EventMessage> for Message {
    fn from(event: EventMessage) -> Self {
        Message::Event(event)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_event_builder() {
        let msg = EventMessage::new("payload").event("tick").id("7");

        assert_eq!(msg.data, "payload");
        assert_eq!(msg.event, "tick");
        assert_eq!(msg.id, "7");
    }

    #[test]
    fn test_message_event_argument_order() {
        let msg = Message::event("payload", "tick", "7");

        assert_eq!(
            msg,
            Message::Event(EventMessage {
                id: "7".into(),
                event: "tick".into(),
                data: "payload".into(),
            })
        );
        assert_eq!(msg.kind(), "event");
    }

    #[test]
    fn test_retry_kind() {
        assert_eq!(Message::retry(Duration::from_secs(1)).kind(), "retry");
    }
}
