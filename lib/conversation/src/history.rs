//! Bounded conversation history.
//!
//! Keeps the most recent exchanges in insertion order. Appending past the
//! capacity drops the oldest entries.

use crate::exchange::Exchange;
use serde::{Serialize, Serializer};

/// Number of exchanges kept when no capacity is given.
pub const DEFAULT_HISTORY_CAPACITY: usize = 5;

/// Whether a history holds any exchanges.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HistoryState {
    /// Nothing appended since creation or the last clear.
    Empty,
    /// At least one exchange is held.
    Active,
}

/// A sliding window over the most recent exchanges.
#[derive(Debug, Clone)]
pub struct ConversationHistory {
    capacity: usize,
    exchanges: Vec<Exchange>,
}

impl ConversationHistory {
    /// Creates an empty history with the default capacity.
    #[must_use]
    pub fn new() -> Self {
        Self::with_capacity(DEFAULT_HISTORY_CAPACITY)
    }

    /// Creates an empty history holding at most `capacity` exchanges.
    /// A capacity of zero is raised to one.
    #[must_use]
    pub fn with_capacity(capacity: usize) -> Self {
        let capacity = capacity.max(1);
        Self {
            capacity,
            exchanges: Vec::with_capacity(capacity + 1),
        }
    }

    /// Appends an exchange, dropping the oldest ones beyond capacity.
    pub fn append(&mut self, exchange: Exchange) {
        self.exchanges.push(exchange);
        if self.exchanges.len() > self.capacity {
            let excess = self.exchanges.len() - self.capacity;
            self.exchanges.drain(..excess);
        }
    }

    /// Returns the last `k` exchanges, oldest first. Asking for more than
    /// are held returns all of them.
    #[must_use]
    pub fn window(&self, k: usize) -> &[Exchange] {
        let start = self.exchanges.len().saturating_sub(k);
        &self.exchanges[start..]
    }

    /// Returns every held exchange, oldest first.
    #[must_use]
    pub fn all(&self) -> &[Exchange] {
        &self.exchanges
    }

    /// Removes every exchange.
    pub fn clear(&mut self) {
        self.exchanges.clear();
    }

    /// Returns the most recent exchange.
    #[must_use]
    pub fn last(&self) -> Option<&Exchange> {
        self.exchanges.last()
    }

    /// Returns the number of held exchanges.
    #[must_use]
    pub fn len(&self) -> usize {
        self.exchanges.len()
    }

    /// Returns true if no exchanges are held.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.exchanges.is_empty()
    }

    /// Returns the maximum number of exchanges held.
    #[must_use]
    pub fn capacity(&self) -> usize {
        self.capacity
    }

    /// Returns the lifecycle state.
    #[must_use]
    pub fn state(&self) -> HistoryState {
        if self.is_empty() {
            HistoryState::Empty
        } else {
            HistoryState::Active
        }
    }
}

impl Default for ConversationHistory {
    fn default() -> Self {
        Self::new()
    }
}

impl Serialize for ConversationHistory {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        self.exchanges.serialize(serializer)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::exchange::Intent;

    fn exchange(n: usize) -> Exchange {
        Exchange::new(format!("question {n}"), format!("answer {n}"), Intent::General)
    }

    #[test]
    fn seven_appends_keep_last_five_in_order() {
        let mut history = ConversationHistory::new();
        for n in 1..=7 {
            history.append(exchange(n));
        }

        let inputs: Vec<&str> = history.all().iter().map(Exchange::input).collect();
        assert_eq!(
            inputs,
            ["question 3", "question 4", "question 5", "question 6", "question 7"]
        );
    }

    #[test]
    fn window_returns_most_recent() {
        let mut history = ConversationHistory::new();
        for n in 1..=4 {
            history.append(exchange(n));
        }

        let window = history.window(2);
        assert_eq!(window.len(), 2);
        assert_eq!(window[0].input(), "question 3");
        assert_eq!(window[1].input(), "question 4");
    }

    #[test]
    fn oversized_window_returns_everything() {
        let mut history = ConversationHistory::new();
        history.append(exchange(1));

        assert_eq!(history.window(10).len(), 1);
        assert!(ConversationHistory::new().window(3).is_empty());
    }

    #[test]
    fn clear_returns_to_empty() {
        let mut history = ConversationHistory::new();
        assert_eq!(history.state(), HistoryState::Empty);

        history.append(exchange(1));
        history.append(exchange(2));
        assert_eq!(history.state(), HistoryState::Active);

        history.clear();
        assert_eq!(history.state(), HistoryState::Empty);
        assert!(history.is_empty());
        assert!(history.last().is_none());
    }

    #[test]
    fn custom_capacity() {
        let mut history = ConversationHistory::with_capacity(2);
        for n in 1..=3 {
            history.append(exchange(n));
        }
        assert_eq!(history.len(), 2);
        assert_eq!(history.last().map(Exchange::input), Some("question 3"));

        assert_eq!(ConversationHistory::with_capacity(0).capacity(), 1);
    }

    #[test]
    fn serializes_as_plain_array() {
        let mut history = ConversationHistory::new();
        history.append(exchange(1));

        let json = serde_json::to_value(&history).expect("serialize");
        assert!(json.is_array());
        assert_eq!(json[0]["input"], "question 1");
        assert_eq!(json[0]["output"], "answer 1");
    }
}
