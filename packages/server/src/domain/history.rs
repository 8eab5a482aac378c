//! Bounded chat history.

use std::collections::VecDeque;

use super::event::ChatEvent;

pub const DEFAULT_HISTORY_CAPACITY: usize = 50;

/// Ring buffer holding the most recent chat events.
///
/// Invariant: `len() <= capacity()`. Pushing into a full buffer evicts the
/// oldest event. A capacity of zero disables history entirely.
#[derive(Debug, Clone)]
pub struct HistoryBuffer {
    events: VecDeque<ChatEvent>,
    capacity: usize,
}

impl HistoryBuffer {
    pub fn new(capacity: usize) -> Self {
        Self {
            events: VecDeque::with_capacity(capacity),
            capacity,
        }
    }

    /// Append an event, evicting the oldest one when full.
    ///
    /// Returns the evicted event, if any.
    pub fn push(&mut self, event: ChatEvent) -> Option<ChatEvent> {
        if self.capacity == 0 {
            return None;
        }
        let evicted = if self.events.len() == self.capacity {
            self.events.pop_front()
        } else {
            None
        };
        self.events.push_back(event);
        evicted
    }

    pub fn len(&self) -> usize {
        self.events.len()
    }

    pub fn is_empty(&self) -> bool {
        self.events.is_empty()
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    /// Copy of every recorded event, oldest first.
    pub fn snapshot(&self) -> Vec<ChatEvent> {
        self.events.iter().cloned().collect()
    }

    /// Rendered lines a newly joined session should see, oldest first.
    ///
    /// Whispers stay in the log but are never replayed.
    pub fn replay_lines(&self) -> Vec<String> {
        self.events
            .iter()
            .filter(|event| event.is_public())
            .map(ChatEvent::render)
            .collect()
    }
}

impl Default for HistoryBuffer {
    fn default() -> Self {
        Self::new(DEFAULT_HISTORY_CAPACITY)
    }
}
