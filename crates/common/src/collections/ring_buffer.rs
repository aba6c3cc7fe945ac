//! A fixed-capacity FIFO buffer that drops its oldest element on overflow.
//!
//! [`RingBuffer`] backs the request metric history: producers append
//! without bound, the buffer keeps only the most recent `capacity` items,
//! and readers aggregate over whatever is currently held.
//!
//! # Complexity
//! - `push`, `pop`, `len`, `is_full` are **O(1)**.
//! - `newest(n)` is **O(n)**.
//!
//! # Thread Safety
//! - No interior mutability. Wrap in a mutex to share between tasks.

use std::collections::VecDeque;

/// Fixed-capacity buffer storing elements oldest-first.
///
/// # Examples
///
/// ```rust
/// use tripline_common::collections::RingBuffer;
///
/// let mut buffer = RingBuffer::new(3);
/// for n in 1..=4 {
///     buffer.push(n);
/// }
///
/// assert_eq!(buffer.iter().copied().collect::<Vec<_>>(), vec![2, 3, 4]);
/// assert_eq!(buffer.newest(2).copied().collect::<Vec<_>>(), vec![4, 3]);
/// ```
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct RingBuffer<T> {
    buf: VecDeque<T>,
    capacity: usize,
}

impl<T> RingBuffer<T> {
    /// Creates an empty buffer. A capacity of zero is clamped to `1`.
    #[inline]
    #[must_use]
    pub fn new(capacity: usize) -> Self {
        let capacity = capacity.max(1);
        Self { buf: VecDeque::with_capacity(capacity), capacity }
    }

    /// Appends `item`, returning the evicted oldest element when full.
    #[inline]
    pub fn push(&mut self, item: T) -> Option<T> {
        let evicted = if self.is_full() { self.buf.pop_front() } else { None };
        self.buf.push_back(item);
        evicted
    }

    /// Removes and returns the oldest element.
    #[inline]
    #[must_use]
    pub fn pop(&mut self) -> Option<T> {
        self.buf.pop_front()
    }

    #[inline]
    #[must_use]
    pub fn len(&self) -> usize {
        self.buf.len()
    }

    #[inline]
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.buf.is_empty()
    }

    #[inline]
    #[must_use]
    pub fn is_full(&self) -> bool {
        self.buf.len() >= self.capacity
    }

    #[inline]
    #[must_use]
    pub fn capacity(&self) -> usize {
        self.capacity
    }

    #[inline]
    pub fn clear(&mut self) {
        self.buf.clear();
    }

    /// Iterates from oldest to newest.
    #[inline]
    pub fn iter(&self) -> impl DoubleEndedIterator<Item = &T> + ExactSizeIterator {
        self.buf.iter()
    }

    /// Iterates over at most `n` elements, newest first.
    #[inline]
    pub fn newest(&self, n: usize) -> impl Iterator<Item = &T> {
        self.buf.iter().rev().take(n)
    }
}

impl<T> Extend<T> for RingBuffer<T> {
    fn extend<I: IntoIterator<Item = T>>(&mut self, iter: I) {
        for item in iter {
            self.push(item);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn zero_capacity_is_clamped() {
        let mut buffer = RingBuffer::new(0);
        assert_eq!(buffer.capacity(), 1);
        assert_eq!(buffer.push('a'), None);
        assert_eq!(buffer.push('b'), Some('a'));
        assert_eq!(buffer.len(), 1);
    }

    #[test]
    fn overflow_evicts_oldest_first() {
        let mut buffer = RingBuffer::new(100);
        buffer.extend(0..150);

        assert_eq!(buffer.len(), 100);
        assert!(buffer.is_full());
        assert_eq!(buffer.iter().next(), Some(&50));
        assert_eq!(buffer.iter().next_back(), Some(&149));
    }

    #[test]
    fn newest_walks_backwards_and_saturates() {
        let mut buffer = RingBuffer::new(4);
        buffer.extend([1, 2, 3]);

        assert_eq!(buffer.newest(10).copied().collect::<Vec<_>>(), vec![3, 2, 1]);
        assert_eq!(buffer.newest(0).count(), 0);
    }

    #[test]
    fn pop_and_clear() {
        let mut buffer = RingBuffer::new(2);
        buffer.extend(["x", "y"]);

        assert_eq!(buffer.pop(), Some("x"));
        buffer.clear();
        assert!(buffer.is_empty());
        assert_eq!(buffer.pop(), None);
    }
}
