//! UseCase: session teardown

use std::sync::Arc;

use hiroba_shared::time::Clock;

use crate::{
    domain::{ChatEvent, CloseReason, Session, Timestamp},
    infrastructure::InMemorySessionRegistry,
};

use super::broadcast_pipeline::EventPublisher;

pub struct DisconnectSessionUseCase {
    registry: Arc<InMemorySessionRegistry>,
    publisher: EventPublisher,
    clock: Arc<dyn Clock>,
}

impl DisconnectSessionUseCase {
    pub fn new(
        registry: Arc<InMemorySessionRegistry>,
        publisher: EventPublisher,
        clock: Arc<dyn Clock>,
    ) -> Self {
        Self {
            registry,
            publisher,
            clock,
        }
    }

    /// Deregister a session that had joined.
    ///
    /// `reason` is `None` when the peer went away on its own (EOF or read
    /// error). Removal is idempotent. A peer that went away is announced only
    /// if it was still registered: a kick or shutdown racing the peer's own
    /// close has already removed it and produced its own notice. Unreachable
    /// sessions are removed by the fan-out, so they are always announced.
    ///
    /// Returns `true` if the session was still registered.
    pub async fn execute(&self, session: &Session, reason: Option<CloseReason>) -> bool {
        let removed = self.registry.remove(&session.id).await.is_some();

        let announce = match reason {
            None => removed,
            Some(reason) => reason.announces_departure(),
        };
        if announce {
            self.publisher.publish(ChatEvent::left(
                &session.username,
                Timestamp::new(self.clock.now_millis()),
            ));
        }

        removed
    }
}
