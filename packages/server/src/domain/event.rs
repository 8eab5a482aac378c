//! Chat events flowing through the broadcast pipeline.

use super::value::{Timestamp, Username};

/// Origin used for notices produced by the server itself.
pub const SERVER_ORIGIN: &str = "SERVER";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EventKind {
    Server,
    Message,
    Whisper,
}

/// An immutable unit of broadcastable content.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChatEvent {
    kind: EventKind,
    origin: String,
    recipient: Option<String>,
    text: String,
    timestamp: Timestamp,
}

impl ChatEvent {
    /// Notice from the server (join/leave/kick/shutdown or operator chatter)
    pub fn server(text: impl Into<String>, timestamp: Timestamp) -> Self {
        Self {
            kind: EventKind::Server,
            origin: SERVER_ORIGIN.to_string(),
            recipient: None,
            text: text.into(),
            timestamp,
        }
    }

    /// Public chat line from a session
    pub fn message(from: &Username, text: impl Into<String>, timestamp: Timestamp) -> Self {
        Self {
            kind: EventKind::Message,
            origin: from.as_str().to_string(),
            recipient: None,
            text: text.into(),
            timestamp,
        }
    }

    /// Private line between two sessions; recorded but never fanned out
    pub fn whisper(
        from: &Username,
        to: &Username,
        text: impl Into<String>,
        timestamp: Timestamp,
    ) -> Self {
        Self {
            kind: EventKind::Whisper,
            origin: from.as_str().to_string(),
            recipient: Some(to.as_str().to_string()),
            text: text.into(),
            timestamp,
        }
    }

    pub fn joined(username: &Username, timestamp: Timestamp) -> Self {
        Self::server(format!("{} has joined the chat!", username), timestamp)
    }

    pub fn left(username: &Username, timestamp: Timestamp) -> Self {
        Self::server(format!("{} has left the chat.", username), timestamp)
    }

    pub fn kicked(username: &Username, timestamp: Timestamp) -> Self {
        Self::server(
            format!("{} has been kicked from the chat.", username),
            timestamp,
        )
    }

    pub fn shutting_down(timestamp: Timestamp) -> Self {
        Self::server("Server is shutting down.", timestamp)
    }

    pub fn kind(&self) -> EventKind {
        self.kind
    }

    pub fn origin(&self) -> &str {
        &self.origin
    }

    pub fn recipient(&self) -> Option<&str> {
        self.recipient.as_deref()
    }

    pub fn text(&self) -> &str {
        &self.text
    }

    pub fn timestamp(&self) -> Timestamp {
        self.timestamp
    }

    /// Public events are fanned out to every session and replayed to newcomers.
    pub fn is_public(&self) -> bool {
        !matches!(self.kind, EventKind::Whisper)
    }

    /// The line as it appears on the wire and in the server console.
    pub fn render(&self) -> String {
        match (self.kind, &self.recipient) {
            (EventKind::Whisper, Some(to)) => {
                format!("{} -> {} (whisper): {}", self.origin, to, self.text)
            }
            _ => format!("{}: {}", self.origin, self.text),
        }
    }
}
