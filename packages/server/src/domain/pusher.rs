//! Outbound delivery seam.
//!
//! The use cases only need "send this line to that session" and "send this
//! line to everyone". How a line reaches a socket is up to the implementor.

use async_trait::async_trait;

use super::{error::MessagePushError, value::SessionId};

#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait MessagePusher: Send + Sync {
    /// Queue one line for a single session.
    async fn push_to(&self, session_id: &SessionId, line: &str) -> Result<(), MessagePushError>;

    /// Queue one line for every registered session.
    ///
    /// Delivery failures are contained: the failing sessions are dropped and
    /// returned, the remaining recipients still get the line.
    async fn broadcast(&self, line: &str) -> Vec<SessionId>;
}
