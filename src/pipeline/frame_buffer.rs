//! Lock-step per-channel byte FIFOs for direct relay mode.

use std::collections::VecDeque;

use crate::RelayError;

/// Number of channels the relay carries (one stereo pair).
pub const RELAY_CHANNELS: usize = 2;

/// One byte FIFO per relayed channel.
///
/// Every operation touches all channels by the same amount, so all buffers
/// always hold the same number of bytes.
#[derive(Debug)]
pub struct ChannelBuffers {
    channels: [VecDeque<u8>; RELAY_CHANNELS],
}

impl ChannelBuffers {
    /// Creates empty buffers with `capacity` bytes reserved per channel.
    ///
    /// Fails cleanly instead of aborting if the reservation cannot be made.
    pub fn with_capacity(capacity: usize) -> Result<Self, RelayError> {
        let mut channels: [VecDeque<u8>; RELAY_CHANNELS] = Default::default();
        for channel in &mut channels {
            channel
                .try_reserve(capacity)
                .map_err(|_| RelayError::AllocationFailed { bytes: capacity })?;
        }
        Ok(Self { channels })
    }

    /// Bytes currently buffered per channel.
    pub fn len(&self) -> usize {
        self.channels[0].len()
    }

    /// Returns `true` if no bytes are buffered.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Appends one plane to each channel.
    ///
    /// Both planes must be the same length.
    pub fn push_planes(&mut self, planes: [&[u8]; RELAY_CHANNELS]) {
        debug_assert!(planes.iter().all(|p| p.len() == planes[0].len()));
        for (channel, plane) in self.channels.iter_mut().zip(planes) {
            channel.extend(plane.iter().copied());
        }
    }

    /// Appends `count` zero bytes to every channel.
    pub fn push_zeros(&mut self, count: usize) {
        for channel in &mut self.channels {
            channel.resize(channel.len() + count, 0);
        }
    }

    /// Drops up to `count` bytes from the front of every channel.
    ///
    /// Returns the number of bytes dropped per channel.
    pub fn discard_front(&mut self, count: usize) -> usize {
        let count = count.min(self.len());
        for channel in &mut self.channels {
            channel.drain(..count);
        }
        count
    }

    /// Pops exactly `count` bytes (or everything, if less is buffered) from
    /// every channel, copying channel `i` into `outputs[i]` as far as it reaches.
    ///
    /// Returns the number of bytes popped per channel.
    pub fn pop_into(&mut self, count: usize, outputs: [&mut [u8]; RELAY_CHANNELS]) -> usize {
        let count = count.min(self.len());
        for (channel, out) in self.channels.iter_mut().zip(outputs) {
            for (i, byte) in channel.drain(..count).enumerate() {
                if let Some(dst) = out.get_mut(i) {
                    *dst = byte;
                }
            }
        }
        count
    }

    #[cfg(test)]
    fn channel_lens(&self) -> [usize; RELAY_CHANNELS] {
        [self.channels[0].len(), self.channels[1].len()]
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn buffers() -> ChannelBuffers {
        ChannelBuffers::with_capacity(64).unwrap()
    }

    #[test]
    fn test_push_and_pop_in_order() {
        let mut buf = buffers();
        buf.push_planes([&[1, 2, 3, 4], &[5, 6, 7, 8]]);
        buf.push_planes([&[9, 10], &[11, 12]]);
        assert_eq!(buf.len(), 6);

        let mut left = [0u8; 5];
        let mut right = [0u8; 5];
        assert_eq!(buf.pop_into(5, [&mut left, &mut right]), 5);

        assert_eq!(left, [1, 2, 3, 4, 9]);
        assert_eq!(right, [5, 6, 7, 8, 11]);
        assert_eq!(buf.channel_lens(), [1, 1]);
    }

    #[test]
    fn test_push_zeros_keeps_channels_equal() {
        let mut buf = buffers();
        buf.push_planes([&[1, 1], &[2, 2]]);
        buf.push_zeros(3);
        assert_eq!(buf.channel_lens(), [5, 5]);

        let mut left = [9u8; 5];
        let mut right = [9u8; 5];
        buf.pop_into(5, [&mut left, &mut right]);
        assert_eq!(left, [1, 1, 0, 0, 0]);
        assert_eq!(right, [2, 2, 0, 0, 0]);
        assert!(buf.is_empty());
    }

    #[test]
    fn test_discard_front_drops_oldest() {
        let mut buf = buffers();
        buf.push_planes([&[1, 2, 3, 4], &[5, 6, 7, 8]]);

        assert_eq!(buf.discard_front(2), 2);

        let mut left = [0u8; 2];
        let mut right = [0u8; 2];
        buf.pop_into(2, [&mut left, &mut right]);
        assert_eq!(left, [3, 4]);
        assert_eq!(right, [7, 8]);
    }

    #[test]
    fn test_discard_front_clamps_to_len() {
        let mut buf = buffers();
        buf.push_planes([&[1], &[2]]);
        assert_eq!(buf.discard_front(10), 1);
        assert!(buf.is_empty());
    }

    #[test]
    fn test_pop_into_short_buffer_leaves_tail() {
        let mut buf = buffers();
        buf.push_planes([&[1], &[2]]);

        let mut left = [7u8; 3];
        let mut right = [7u8; 3];
        assert_eq!(buf.pop_into(3, [&mut left, &mut right]), 1);
        assert_eq!(left, [1, 7, 7]);
        assert_eq!(right, [2, 7, 7]);
    }

    #[test]
    fn test_pop_into_short_output_still_consumes() {
        let mut buf = buffers();
        buf.push_planes([&[1, 2, 3, 4], &[5, 6, 7, 8]]);

        let mut left = [0u8; 4];
        let mut right = [0u8; 1];
        buf.pop_into(4, [&mut left, &mut right]);
        assert_eq!(left, [1, 2, 3, 4]);
        assert_eq!(right, [5]);
        assert_eq!(buf.channel_lens(), [0, 0]);
    }

    #[test]
    fn test_allocation_failure_is_an_error() {
        let result = ChannelBuffers::with_capacity(usize::MAX);
        assert!(matches!(result, Err(RelayError::AllocationFailed { .. })));
    }
}
