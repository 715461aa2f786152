//! Bounded queue of timestamp-tagged chunks for timestamp-synchronized mode.

use ringbuf::traits::{Consumer, Observer, RingBuffer};
use ringbuf::HeapRb;

use super::frame_buffer::RELAY_CHANNELS;
use crate::RelayError;

/// Coarsens a producer timestamp so small arrival jitter lands in one bucket.
#[inline]
pub fn normalize_timestamp(timestamp: u64, divisor: u64) -> u64 {
    timestamp / divisor.max(1)
}

/// A block of relayed audio tagged with its normalized timestamp.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Chunk {
    /// Producer timestamp divided by the configured divisor.
    pub normalized_timestamp: u64,
    /// Owned copy of each relayed channel.
    pub channel_data: [Vec<u8>; RELAY_CHANNELS],
    /// Samples per channel.
    pub frame_count: usize,
}

/// FIFO of chunks with a fixed upper bound.
///
/// Pushing into a full queue evicts the oldest chunk, so the newest audio is
/// always kept.
pub struct ChunkQueue {
    ring: HeapRb<Chunk>,
}

impl ChunkQueue {
    /// Creates a queue holding at most `max_chunks` chunks.
    ///
    /// Fails cleanly instead of aborting if the slots cannot be allocated.
    pub fn new(max_chunks: usize) -> Result<Self, RelayError> {
        let slots = max_chunks.max(1);
        let bytes = slots.saturating_mul(std::mem::size_of::<Chunk>());
        let ring = HeapRb::try_new(slots)
            .map_err(|_| RelayError::AllocationFailed { bytes })?;
        Ok(Self { ring })
    }

    /// Enqueues `chunk` at the back, returning the chunk evicted to make room.
    pub fn push(&mut self, chunk: Chunk) -> Option<Chunk> {
        self.ring.push_overwrite(chunk)
    }

    /// Dequeues the chunk at the front.
    pub fn pop(&mut self) -> Option<Chunk> {
        self.ring.try_pop()
    }

    /// Number of queued chunks.
    pub fn len(&self) -> usize {
        self.ring.occupied_len()
    }

    /// Returns `true` if no chunks are queued.
    pub fn is_empty(&self) -> bool {
        self.ring.is_empty()
    }
}

impl std::fmt::Debug for ChunkQueue {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ChunkQueue")
            .field("len", &self.len())
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn chunk(ts: u64, byte: u8) -> Chunk {
        Chunk {
            normalized_timestamp: ts,
            channel_data: [vec![byte; 4], vec![byte; 4]],
            frame_count: 1,
        }
    }

    #[test]
    fn test_normalize_timestamp() {
        assert_eq!(normalize_timestamp(0, 10_000_000), 0);
        assert_eq!(normalize_timestamp(9_999_999, 10_000_000), 0);
        assert_eq!(normalize_timestamp(10_000_000, 10_000_000), 1);
        assert_eq!(normalize_timestamp(25_000_000, 10_000_000), 2);
    }

    #[test]
    fn test_normalize_timestamp_zero_divisor() {
        assert_eq!(normalize_timestamp(42, 0), 42);
    }

    #[test]
    fn test_fifo_order() {
        let mut queue = ChunkQueue::new(4).unwrap();
        assert!(queue.is_empty());
        assert!(queue.push(chunk(1, 1)).is_none());
        assert!(queue.push(chunk(2, 2)).is_none());
        assert_eq!(queue.len(), 2);

        assert_eq!(queue.pop().unwrap().normalized_timestamp, 1);
        assert_eq!(queue.pop().unwrap().normalized_timestamp, 2);
        assert!(queue.pop().is_none());
        assert!(queue.is_empty());
    }

    #[test]
    fn test_full_queue_evicts_oldest() {
        let mut queue = ChunkQueue::new(2).unwrap();
        queue.push(chunk(1, 1));
        queue.push(chunk(2, 2));

        let evicted = queue.push(chunk(3, 3)).unwrap();
        assert_eq!(evicted.normalized_timestamp, 1);
        assert_eq!(queue.len(), 2);
        assert_eq!(queue.pop().unwrap().normalized_timestamp, 2);
        assert_eq!(queue.pop().unwrap().normalized_timestamp, 3);
    }

    #[test]
    fn test_allocation_failure_is_an_error() {
        let result = ChunkQueue::new(usize::MAX / 2);
        assert!(matches!(result, Err(RelayError::AllocationFailed { .. })));
    }
}
