//! Bounded chat history.
//!
//! Keeps the most recent messages in arrival order in a ring buffer so
//! memory usage stays predictable.

use std::collections::VecDeque;

use bookswap_common::ChatMessage;

/// Default number of messages retained.
pub const DEFAULT_CAPACITY: usize = 100;

/// Default number of messages returned by [`HistoryBuffer::recent`] callers.
pub const DEFAULT_SNAPSHOT: usize = 50;

pub struct HistoryBuffer {
    capacity: usize,
    messages: VecDeque<ChatMessage>,
}

impl HistoryBuffer {
    pub fn new(capacity: usize) -> Self {
        Self {
            capacity,
            messages: VecDeque::with_capacity(capacity),
        }
    }

    /// Append a message, evicting the oldest ones beyond capacity.
    pub fn append(&mut self, msg: ChatMessage) {
        self.messages.push_back(msg);
        while self.messages.len() > self.capacity {
            self.messages.pop_front();
        }
    }

    /// The last `limit` messages, oldest first.
    pub fn recent(&self, limit: usize) -> Vec<ChatMessage> {
        let skip = self.messages.len().saturating_sub(limit);
        self.messages.iter().skip(skip).cloned().collect()
    }

    pub fn len(&self) -> usize {
        self.messages.len()
    }

    pub fn is_empty(&self) -> bool {
        self.messages.is_empty()
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }
}

impl Default for HistoryBuffer {
    fn default() -> Self {
        Self::new(DEFAULT_CAPACITY)
    }
}
