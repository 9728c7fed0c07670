//! Bounded undo history. Snapshots are full copies of the song collection,
//! pushed immediately before every mutating store operation and consumed
//! newest-first by undo. The stack holds at most [`HISTORY_CAPACITY`]
//! entries; pushing beyond that evicts the oldest snapshot, so very old
//! states become unreachable rather than the stack growing without bound.

use std::collections::VecDeque;

use crate::models::Song;

/// Maximum number of undo steps kept in memory. Ten covers a realistic
/// editing session without holding dozens of full catalog copies.
pub const HISTORY_CAPACITY: usize = 10;

/// Fixed-capacity snapshot stack: FIFO eviction at the bottom, LIFO
/// consumption at the top. Never persisted across restarts.
#[derive(Debug, Default)]
pub struct History {
    snapshots: VecDeque<Vec<Song>>,
}

impl History {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record the state as it was before a mutation. Evicts the oldest
    /// snapshot first when the stack is full.
    pub fn push(&mut self, snapshot: Vec<Song>) {
        if self.snapshots.len() == HISTORY_CAPACITY {
            self.snapshots.pop_front();
        }
        self.snapshots.push_back(snapshot);
    }

    /// Take back the most recently pushed snapshot, if any remain.
    pub fn pop(&mut self) -> Option<Vec<Song>> {
        self.snapshots.pop_back()
    }

    pub fn len(&self) -> usize {
        self.snapshots.len()
    }

    pub fn is_empty(&self) -> bool {
        self.snapshots.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn snapshot(title: &str) -> Vec<Song> {
        vec![Song {
            id: title.to_string(),
            title: title.to_string(),
            ..Song::default()
        }]
    }

    #[test]
    fn pop_returns_newest_first() {
        let mut history = History::new();
        history.push(snapshot("a"));
        history.push(snapshot("b"));

        assert_eq!(history.pop().unwrap()[0].title, "b");
        assert_eq!(history.pop().unwrap()[0].title, "a");
        assert!(history.pop().is_none());
    }

    #[test]
    fn capacity_evicts_oldest_snapshot() {
        let mut history = History::new();
        for i in 0..HISTORY_CAPACITY + 1 {
            history.push(snapshot(&format!("s{i}")));
        }

        assert_eq!(history.len(), HISTORY_CAPACITY);
        // "s0" fell off the bottom; the oldest retained snapshot is "s1".
        let mut last = None;
        while let Some(s) = history.pop() {
            last = Some(s);
        }
        assert_eq!(last.unwrap()[0].title, "s1");
    }
}
