//! Domain error types.

use thiserror::Error;

/// Reasons a requested username is refused at join time.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum UsernameError {
    #[error("Username must not be empty")]
    Empty,

    #[error("Username must not contain whitespace")]
    ContainsWhitespace,

    #[error("Username must be at most {max} characters")]
    TooLong { max: usize },

    #[error("Username '{0}' is reserved")]
    Reserved(String),
}

/// Malformed commands. Always answered with a direct reply to the invoker.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum CommandError {
    #[error("Unknown command '{0}'. Type /help for a list of commands")]
    UnknownCommand(String),

    #[error("usage: {0}")]
    Usage(&'static str),
}

/// Failures while pushing a line to a session's outbound channel.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum MessagePushError {
    #[error("Session '{0}' not found")]
    SessionNotFound(String),

    #[error("Push failed: {0}")]
    PushFailed(String),
}
