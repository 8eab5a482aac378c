//! Session: the server's record of one registered client.

use std::net::SocketAddr;

use super::value::{SessionId, Timestamp, Username};

/// A connected, registered client.
///
/// The username is fixed at join time. The socket itself is not part of the
/// record: it stays with the connection handler that accepted it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Session {
    pub id: SessionId,
    pub username: Username,
    pub remote_addr: SocketAddr,
    pub joined_at: Timestamp,
}

impl Session {
    pub fn new(username: Username, remote_addr: SocketAddr, joined_at: Timestamp) -> Self {
        Self {
            id: SessionId::generate(),
            username,
            remote_addr,
            joined_at,
        }
    }
}

/// Why a session was closed from outside its own read loop.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CloseReason {
    /// Removed by the operator's `/kick`.
    Kicked,
    /// The whole server is going down.
    Shutdown,
    /// Fan-out found the session's outbound channel closed.
    Unreachable,
}

impl CloseReason {
    /// Whether the handler should publish a "left" notice after closing.
    pub fn announces_departure(&self) -> bool {
        matches!(self, CloseReason::Unreachable)
    }
}
