//! Bounded FIFO queue for hostname work items
//!
//! `BoundedQueue` is a plain ring buffer with a fixed capacity. It performs
//! no synchronization of its own: every caller must hold the lookup
//! context's monitor lock before touching it. Pushing onto a full queue
//! hands the item back instead of growing.

use crate::error::QueueError;
use std::collections::VecDeque;
use std::fmt;
use std::sync::Arc;

/// Longest hostname kept, in bytes; longer tokens are truncated
pub const MAX_NAME_LENGTH: usize = 255;

/// A hostname read from an input file, at most `MAX_NAME_LENGTH` bytes
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Hostname(String);

impl Hostname {
    /// Build a hostname from a raw token
    ///
    /// Returns the hostname and whether the token had to be truncated.
    /// Truncation never splits a UTF-8 character.
    pub fn from_token(token: &str) -> (Self, bool) {
        if token.len() <= MAX_NAME_LENGTH {
            return (Self(token.to_owned()), false);
        }

        let mut end = MAX_NAME_LENGTH;
        while !token.is_char_boundary(end) {
            end -= 1;
        }
        (Self(token[..end].to_owned()), true)
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for Hostname {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl AsRef<str> for Hostname {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

/// A hostname on its way from a requester to a resolver
#[derive(Debug, Clone)]
pub struct WorkItem {
    /// Hostname to resolve
    pub hostname: Hostname,

    /// Requester that read it
    pub requester: usize,

    /// Input file it came from
    pub source: Arc<str>,
}

impl WorkItem {
    /// Create a new work item
    pub fn new(hostname: Hostname, requester: usize, source: Arc<str>) -> Self {
        Self {
            hostname,
            requester,
            source,
        }
    }
}

/// Counters kept by a queue over its lifetime
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct QueueStats {
    /// Items accepted by `push`
    pub pushed: u64,

    /// Items returned by `pop`
    pub popped: u64,

    /// Pushes rejected because the queue was full
    pub rejected: u64,

    /// Largest length ever observed
    pub high_water: usize,
}

/// Fixed-capacity FIFO, not internally synchronized
pub struct BoundedQueue<T> {
    /// Stored items, oldest at the front
    items: VecDeque<T>,

    /// Maximum number of items
    capacity: usize,

    /// Lifetime counters
    stats: QueueStats,
}

impl<T> BoundedQueue<T> {
    /// Create a queue holding at most `capacity` items
    pub fn with_capacity(capacity: usize) -> Result<Self, QueueError> {
        if capacity == 0 {
            return Err(QueueError::ZeroCapacity);
        }

        Ok(Self {
            items: VecDeque::with_capacity(capacity),
            capacity,
            stats: QueueStats::default(),
        })
    }

    /// Append an item, or hand it back if the queue is full
    pub fn push(&mut self, item: T) -> Result<(), T> {
        if self.is_full() {
            self.stats.rejected += 1;
            return Err(item);
        }

        self.items.push_back(item);
        self.stats.pushed += 1;
        self.stats.high_water = self.stats.high_water.max(self.items.len());
        Ok(())
    }

    /// Remove the oldest item
    pub fn pop(&mut self) -> Option<T> {
        let item = self.items.pop_front()?;
        self.stats.popped += 1;
        Some(item)
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    pub fn is_full(&self) -> bool {
        self.items.len() >= self.capacity
    }

    /// Current number of items
    pub fn len(&self) -> usize {
        self.items.len()
    }

    /// Maximum number of items
    pub fn capacity(&self) -> usize {
        self.capacity
    }

    /// Free slots left
    pub fn remaining(&self) -> usize {
        self.capacity - self.items.len()
    }

    /// Largest length ever observed
    pub fn high_water(&self) -> usize {
        self.stats.high_water
    }

    pub fn stats(&self) -> QueueStats {
        self.stats
    }

    /// Drop every stored item, returning how many there were
    pub fn clear(&mut self) -> usize {
        let dropped = self.items.len();
        self.items.clear();
        dropped
    }
}

impl<T> fmt::Debug for BoundedQueue<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("BoundedQueue")
            .field("len", &self.items.len())
            .field("capacity", &self.capacity)
            .field("stats", &self.stats)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_queue_basic() {
        let mut queue = BoundedQueue::with_capacity(4).unwrap();
        assert!(queue.is_empty());

        queue.push("a").unwrap();
        queue.push("b").unwrap();
        assert!(!queue.is_empty());
        assert_eq!(queue.len(), 2);

        assert_eq!(queue.pop(), Some("a"));
        assert_eq!(queue.pop(), Some("b"));
        assert_eq!(queue.pop(), None);
        assert!(queue.is_empty());
    }

    #[test]
    fn test_queue_zero_capacity() {
        assert!(matches!(
            BoundedQueue::<u32>::with_capacity(0),
            Err(QueueError::ZeroCapacity)
        ));
    }

    #[test]
    fn test_queue_full_returns_item() {
        let mut queue = BoundedQueue::with_capacity(2).unwrap();
        queue.push(1).unwrap();
        queue.push(2).unwrap();
        assert!(queue.is_full());
        assert_eq!(queue.remaining(), 0);

        assert_eq!(queue.push(3), Err(3));
        assert_eq!(queue.len(), 2);
        assert_eq!(queue.stats().rejected, 1);
    }

    #[test]
    fn test_queue_wraps_around() {
        let mut queue = BoundedQueue::with_capacity(3).unwrap();
        for round in 0..5 {
            for i in 0..3 {
                queue.push(round * 10 + i).unwrap();
            }
            for i in 0..3 {
                assert_eq!(queue.pop(), Some(round * 10 + i));
            }
        }
        assert_eq!(queue.high_water(), 3);
        assert_eq!(queue.stats().pushed, 15);
        assert_eq!(queue.stats().popped, 15);
    }

    #[test]
    fn test_queue_empty_check_is_idempotent() {
        let mut queue: BoundedQueue<u8> = BoundedQueue::with_capacity(1).unwrap();
        for _ in 0..10 {
            assert!(queue.is_empty());
            assert_eq!(queue.pop(), None);
        }
        assert_eq!(queue.stats().popped, 0);
    }

    #[test]
    fn test_queue_clear() {
        let mut queue = BoundedQueue::with_capacity(5).unwrap();
        queue.push('x').unwrap();
        queue.push('y').unwrap();
        assert_eq!(queue.clear(), 2);
        assert!(queue.is_empty());
        assert_eq!(queue.clear(), 0);
    }

    #[test]
    fn test_hostname_short_token_untouched() {
        let (name, truncated) = Hostname::from_token("example.com");
        assert_eq!(name.as_str(), "example.com");
        assert!(!truncated);
    }

    #[test]
    fn test_hostname_truncation() {
        let long = "a".repeat(MAX_NAME_LENGTH + 40);
        let (name, truncated) = Hostname::from_token(&long);
        assert!(truncated);
        assert_eq!(name.as_str().len(), MAX_NAME_LENGTH);

        let exact = "b".repeat(MAX_NAME_LENGTH);
        let (name, truncated) = Hostname::from_token(&exact);
        assert!(!truncated);
        assert_eq!(name.as_str(), exact);
    }

    #[test]
    fn test_hostname_truncation_respects_char_boundary() {
        // 254 ASCII bytes followed by a two-byte character straddling the limit
        let token = format!("{}é", "c".repeat(MAX_NAME_LENGTH - 1));
        let (name, truncated) = Hostname::from_token(&token);
        assert!(truncated);
        assert_eq!(name.as_str().len(), MAX_NAME_LENGTH - 1);
    }
}
