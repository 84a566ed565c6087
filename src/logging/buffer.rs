//! This module provides the bounded in-memory buffer of accepted log entries.
//!
//! The buffer itself is not synchronized; the `Logger` owns it behind a lock
//! so that appending and mirroring the trailing window happen as one step.
use super::entry::LogEntry;
use std::collections::VecDeque;

/// An append-only sequence of log entries with FIFO eviction.
#[derive(Debug, Clone)]
pub struct LogBuffer {
    /// The log entries, oldest first.
    entries: VecDeque<LogEntry>,
    /// The maximum number of entries to keep.
    max_size: usize,
}

impl LogBuffer {
    /// Creates a new `LogBuffer`.
    ///
    /// # Arguments
    ///
    /// * `max_size` - The maximum number of entries to store in the buffer.
    pub fn new(max_size: usize) -> Self {
        Self {
            entries: VecDeque::with_capacity(max_size.min(4096)),
            max_size,
        }
    }

    /// Adds an entry at the tail, silently evicting from the head until the
    /// buffer is back within `max_size`.
    pub fn append(&mut self, entry: LogEntry) {
        self.entries.push_back(entry);
        while self.entries.len() > self.max_size {
            self.entries.pop_front();
        }
    }

    pub fn clear(&mut self) {
        self.entries.clear();
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn max_size(&self) -> usize {
        self.max_size
    }

    /// Iterates over the entries, oldest first.
    pub fn iter(&self) -> impl Iterator<Item = &LogEntry> {
        self.entries.iter()
    }

    /// Copies the whole buffer, oldest first.
    pub fn snapshot(&self) -> Vec<LogEntry> {
        self.entries.iter().cloned().collect()
    }

    /// Copies the `count` most recent entries, oldest first.
    pub fn tail(&self, count: usize) -> Vec<LogEntry> {
        let skip = self.entries.len().saturating_sub(count);
        self.entries.iter().skip(skip).cloned().collect()
    }
}
