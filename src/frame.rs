//! Planar audio frames exchanged with the host.
//!
//! Samples are 32-bit float, stored as raw bytes per plane. The relay moves
//! bytes without interpreting them; only the static mixer reads samples.

/// Size of one sample in a plane.
pub const BYTES_PER_SAMPLE: usize = std::mem::size_of::<f32>();

/// A frame emitted by a producer.
///
/// Each plane holds one channel. A well-formed plane carries at least
/// `frames * BYTES_PER_SAMPLE` bytes.
///
/// # Example
///
/// ```
/// use channel_relay::AudioData;
///
/// let frame = AudioData::from_f32(0, &[vec![0.5; 4], vec![-0.5; 4]]);
/// assert_eq!(frame.frames, 4);
/// assert_eq!(frame.frame_bytes(), 16);
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AudioData {
    /// Producer timestamp in host time units.
    pub timestamp: u64,

    /// Samples per plane.
    pub frames: usize,

    /// Per-channel sample bytes.
    pub planes: Vec<Vec<u8>>,
}

impl AudioData {
    /// Creates a frame from raw byte planes.
    pub fn new(timestamp: u64, frames: usize, planes: Vec<Vec<u8>>) -> Self {
        Self {
            timestamp,
            frames,
            planes,
        }
    }

    /// Creates a frame from float planes. `frames` is the shortest plane's length.
    pub fn from_f32(timestamp: u64, planes: &[Vec<f32>]) -> Self {
        let frames = planes.iter().map(Vec::len).min().unwrap_or(0);
        Self {
            timestamp,
            frames,
            planes: planes.iter().map(|p| f32_to_bytes(&p[..frames])).collect(),
        }
    }

    /// Creates a silent frame with the given layout.
    pub fn silence(timestamp: u64, channels: usize, frames: usize) -> Self {
        Self {
            timestamp,
            frames,
            planes: vec![vec![0u8; frames * BYTES_PER_SAMPLE]; channels],
        }
    }

    /// Bytes per plane implied by the frame count.
    pub fn frame_bytes(&self) -> usize {
        self.frames * BYTES_PER_SAMPLE
    }

    /// Returns plane `index` trimmed to the frame size, if it is present and complete.
    pub fn plane(&self, index: usize) -> Option<&[u8]> {
        let bytes = self.frame_bytes();
        self.planes.get(index).and_then(|p| p.get(..bytes))
    }

    /// Returns `true` if the frame carries no samples.
    pub fn is_empty(&self) -> bool {
        self.frames == 0
    }
}

/// The consumer's frame, overwritten in place on every tick.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OutputFrame {
    /// Consumer timestamp in host time units.
    pub timestamp: u64,

    /// Samples per plane.
    pub frames: usize,

    /// Per-channel sample bytes, each `frames * BYTES_PER_SAMPLE` long.
    pub planes: Vec<Vec<u8>>,
}

impl OutputFrame {
    /// Creates a zeroed output frame.
    pub fn new(timestamp: u64, channels: usize, frames: usize) -> Self {
        Self {
            timestamp,
            frames,
            planes: vec![vec![0u8; frames * BYTES_PER_SAMPLE]; channels],
        }
    }

    /// Creates an output frame pre-filled from float planes.
    pub fn from_f32(timestamp: u64, planes: &[Vec<f32>]) -> Self {
        let frames = planes.iter().map(Vec::len).min().unwrap_or(0);
        Self {
            timestamp,
            frames,
            planes: planes.iter().map(|p| f32_to_bytes(&p[..frames])).collect(),
        }
    }

    /// Bytes per plane implied by the frame count.
    pub fn frame_bytes(&self) -> usize {
        self.frames * BYTES_PER_SAMPLE
    }

    /// Reads plane `index` back as samples.
    pub fn plane_f32(&self, index: usize) -> Option<Vec<f32>> {
        self.planes.get(index).map(|p| bytes_to_f32(p))
    }

    /// Zeroes every plane.
    pub fn clear(&mut self) {
        for plane in &mut self.planes {
            plane.fill(0);
        }
    }
}

/// Encodes samples as native-endian bytes.
pub fn f32_to_bytes(samples: &[f32]) -> Vec<u8> {
    samples.iter().flat_map(|s| s.to_ne_bytes()).collect()
}

/// Decodes native-endian bytes into samples. A trailing partial sample is ignored.
pub fn bytes_to_f32(bytes: &[u8]) -> Vec<f32> {
    bytes
        .chunks_exact(BYTES_PER_SAMPLE)
        .map(|b| f32::from_ne_bytes([b[0], b[1], b[2], b[3]]))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_frame_bytes() {
        let frame = AudioData::silence(0, 2, 480);
        assert_eq!(frame.frame_bytes(), 1920);
        assert_eq!(frame.planes[1].len(), 1920);
    }

    #[test]
    fn test_plane_missing_or_short() {
        let frame = AudioData::new(0, 2, vec![vec![0; 8], vec![0; 4]]);
        assert!(frame.plane(0).is_some());
        assert!(frame.plane(1).is_none()); // too short
        assert!(frame.plane(2).is_none()); // absent
    }

    #[test]
    fn test_plane_trims_to_frame_size() {
        let frame = AudioData::new(0, 1, vec![vec![1, 2, 3, 4, 5, 6, 7, 8]]);
        assert_eq!(frame.plane(0), Some(&[1u8, 2, 3, 4][..]));
    }

    #[test]
    fn test_from_f32_uses_shortest_plane() {
        let frame = AudioData::from_f32(7, &[vec![0.25; 3], vec![0.5; 2]]);
        assert_eq!(frame.frames, 2);
        assert_eq!(frame.timestamp, 7);
        assert_eq!(frame.planes[0].len(), 8);
    }

    #[test]
    fn test_empty_frame() {
        let frame = AudioData::from_f32(0, &[]);
        assert!(frame.is_empty());
        assert_eq!(frame.frame_bytes(), 0);
    }

    #[test]
    fn test_output_frame_plane_f32() {
        let frame = OutputFrame::from_f32(0, &[vec![1.0, -1.0]]);
        assert_eq!(frame.plane_f32(0), Some(vec![1.0, -1.0]));
        assert_eq!(frame.plane_f32(1), None);
    }

    #[test]
    fn test_output_frame_clear() {
        let mut frame = OutputFrame::from_f32(0, &[vec![0.3; 4], vec![0.7; 4]]);
        frame.clear();
        assert!(frame.planes.iter().flatten().all(|&b| b == 0));
    }

    #[test]
    fn test_bytes_to_f32_ignores_partial_sample() {
        let mut bytes = f32_to_bytes(&[0.5]);
        bytes.push(0xff);
        assert_eq!(bytes_to_f32(&bytes), vec![0.5]);
    }
}
