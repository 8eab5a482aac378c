//! UseCase: public chat message

use std::sync::Arc;

use hiroba_shared::time::Clock;

use crate::domain::{ChatEvent, Session, Timestamp};

use super::broadcast_pipeline::EventPublisher;

pub struct SendMessageUseCase {
    publisher: EventPublisher,
    clock: Arc<dyn Clock>,
}

impl SendMessageUseCase {
    pub fn new(publisher: EventPublisher, clock: Arc<dyn Clock>) -> Self {
        Self { publisher, clock }
    }

    /// Enqueue a MESSAGE event from `from`. Blank text is ignored.
    ///
    /// Returns whether an event was enqueued.
    pub fn execute(&self, from: &Session, text: &str) -> bool {
        let text = text.trim();
        if text.is_empty() {
            return false;
        }
        tracing::debug!("Message from '{}': {}", from.username, text);
        self.publisher.publish(ChatEvent::message(
            &from.username,
            text,
            Timestamp::new(self.clock.now_millis()),
        ))
    }
}
