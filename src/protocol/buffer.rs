//! Fixed-capacity byte buffer with explicit compaction.
//!
//! Layout of the backing storage:
//!
//! ```text
//! 0        start          end                 capacity
//! ├────────┼──────────────┼───────────────────┤
//! │consumed│   unread     │    remaining      │
//! └────────┴──────────────┴───────────────────┘
//! ```
//!
//! Reads from the transport land in the `remaining` region and advance `end`.
//! Decoding consumes from `unread` and advances `start`. Nothing moves until
//! [`Buffer::compact`] is called, which is what lets the session decide exactly
//! when the copy happens.
//!
//! # Example
//!
//! ```
//! use fast_session::protocol::Buffer;
//!
//! let mut buf = Buffer::with_capacity(16).unwrap();
//! buf.put_slice(b"hello");
//! assert_eq!(buf.unread(), b"hello");
//!
//! buf.consume(2);
//! buf.compact();
//! assert_eq!(buf.unread(), b"llo");
//! assert_eq!(buf.remaining(), 13);
//! ```

use std::collections::TryReserveError;

/// Fixed-capacity byte buffer with separate read and write cursors.
///
/// Storage is allocated once, fallibly, and never grows.
pub struct Buffer {
    /// Backing storage, zero-initialized.
    data: Box<[u8]>,
    /// Offset of the first unread byte.
    start: usize,
    /// Offset one past the last written byte.
    end: usize,
}

impl Buffer {
    /// Allocate a buffer of exactly `capacity` bytes.
    ///
    /// Returns the allocator error instead of aborting when memory cannot be
    /// reserved.
    pub fn with_capacity(capacity: usize) -> std::result::Result<Self, TryReserveError> {
        let mut data = Vec::new();
        data.try_reserve_exact(capacity)?;
        data.resize(capacity, 0);

        Ok(Self {
            data: data.into_boxed_slice(),
            start: 0,
            end: 0,
        })
    }

    /// Total capacity in bytes.
    #[inline]
    pub fn capacity(&self) -> usize {
        self.data.len()
    }

    /// Free space after the write cursor.
    #[inline]
    pub fn remaining(&self) -> usize {
        self.data.len() - self.end
    }

    /// Number of unread bytes.
    #[inline]
    pub fn len(&self) -> usize {
        self.end - self.start
    }

    /// Check if there are no unread bytes.
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.start == self.end
    }

    /// Offset of the read cursor from the front of the storage.
    #[inline]
    pub fn start_offset(&self) -> usize {
        self.start
    }

    /// Unread bytes.
    #[inline]
    pub fn unread(&self) -> &[u8] {
        &self.data[self.start..self.end]
    }

    /// Mark `count` unread bytes as consumed.
    ///
    /// # Panics
    ///
    /// Panics if `count` exceeds [`len`](Self::len).
    #[inline]
    pub fn consume(&mut self, count: usize) {
        assert!(
            count <= self.len(),
            "consume of {} bytes with only {} unread",
            count,
            self.len()
        );
        self.start += count;
    }

    /// Writable region after the write cursor, at most `limit` bytes long.
    ///
    /// Bytes written here become visible only after [`commit`](Self::commit).
    #[inline]
    pub fn spare_mut(&mut self, limit: usize) -> &mut [u8] {
        let end = self.end + limit.min(self.remaining());
        &mut self.data[self.end..end]
    }

    /// Copy `src` after the write cursor.
    ///
    /// # Panics
    ///
    /// Panics if `src` is longer than [`remaining`](Self::remaining).
    pub fn put_slice(&mut self, src: &[u8]) {
        let count = src.len();
        assert!(
            count <= self.remaining(),
            "put of {} bytes with only {} remaining",
            count,
            self.remaining()
        );
        self.spare_mut(count).copy_from_slice(src);
        self.end += count;
    }

    /// Make `count` bytes written through [`spare_mut`](Self::spare_mut) readable.
    ///
    /// # Panics
    ///
    /// Panics if `count` exceeds [`remaining`](Self::remaining).
    #[inline]
    pub fn commit(&mut self, count: usize) {
        assert!(
            count <= self.remaining(),
            "commit of {} bytes with only {} remaining",
            count,
            self.remaining()
        );
        self.end += count;
    }

    /// Move unread bytes to the front and reclaim the consumed prefix.
    ///
    /// Returns the number of bytes reclaimed.
    pub fn compact(&mut self) -> usize {
        let reclaimed = self.start;
        if reclaimed == 0 {
            return 0;
        }

        self.data.copy_within(self.start..self.end, 0);
        self.end -= self.start;
        self.start = 0;
        reclaimed
    }

    /// Drop all content; the full capacity becomes writable again.
    #[inline]
    pub fn reset(&mut self) {
        self.start = 0;
        self.end = 0;
    }
}

impl std::fmt::Debug for Buffer {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Buffer")
            .field("capacity", &self.capacity())
            .field("start", &self.start)
            .field("end", &self.end)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn filled(capacity: usize, bytes: &[u8]) -> Buffer {
        let mut buf = Buffer::with_capacity(capacity).unwrap();
        buf.put_slice(bytes);
        buf
    }

    #[test]
    fn test_new_buffer_is_empty() {
        let buf = Buffer::with_capacity(64).unwrap();

        assert_eq!(buf.capacity(), 64);
        assert_eq!(buf.remaining(), 64);
        assert!(buf.is_empty());
        assert!(buf.unread().is_empty());
    }

    #[test]
    fn test_overflowing_capacity_is_an_error() {
        assert!(Buffer::with_capacity(usize::MAX).is_err());
    }

    #[test]
    fn test_put_and_consume() {
        let mut buf = filled(16, b"abcdef");

        assert_eq!(buf.len(), 6);
        assert_eq!(buf.remaining(), 10);

        buf.consume(4);
        assert_eq!(buf.unread(), b"ef");
        assert_eq!(buf.start_offset(), 4);
        // consuming never frees space at the tail
        assert_eq!(buf.remaining(), 10);
    }

    #[test]
    #[should_panic(expected = "consume of")]
    fn test_consume_past_end_panics() {
        let mut buf = filled(8, b"ab");
        buf.consume(3);
    }

    #[test]
    fn test_compact_moves_unread_to_front() {
        let mut buf = filled(8, b"abcdefgh");
        buf.consume(5);

        assert_eq!(buf.remaining(), 0);
        assert_eq!(buf.compact(), 5);

        assert_eq!(buf.start_offset(), 0);
        assert_eq!(buf.unread(), b"fgh");
        assert_eq!(buf.remaining(), 5);
    }

    #[test]
    fn test_compact_without_consumed_bytes_is_noop() {
        let mut buf = filled(8, b"abc");

        assert_eq!(buf.compact(), 0);
        assert_eq!(buf.unread(), b"abc");
        assert_eq!(buf.remaining(), 5);
    }

    #[test]
    fn test_spare_mut_and_commit() {
        let mut buf = Buffer::with_capacity(8).unwrap();

        let spare = buf.spare_mut(3);
        assert_eq!(spare.len(), 3);
        spare.copy_from_slice(b"xyz");
        buf.commit(3);

        assert_eq!(buf.unread(), b"xyz");
        // limit is clamped to what is left
        assert_eq!(buf.spare_mut(100).len(), 5);
    }

    #[test]
    fn test_reset_restores_full_capacity() {
        let mut buf = filled(8, b"abcd");
        buf.consume(1);
        buf.reset();

        assert!(buf.is_empty());
        assert_eq!(buf.remaining(), buf.capacity());
    }

    #[test]
    #[should_panic(expected = "put of")]
    fn test_put_slice_past_capacity_panics() {
        let mut buf = Buffer::with_capacity(4).unwrap();
        buf.put_slice(b"abc");
        buf.put_slice(b"de");
    }
}
