//! Static mixer - blends two channel pairs of the consumer's own frame.
//!
//! Nothing crosses threads here. On each tick the mixer reads source planes
//! 4..=7 of an eight-plane frame and writes the blend into planes 0 and 1.
//! The ratio is the only state, stored as atomic `f32` bits so settings
//! updates never contend with the tick.

use std::sync::atomic::{AtomicU32, Ordering};

use crate::frame::{OutputFrame, BYTES_PER_SAMPLE};

/// `(output plane, first source plane, second source plane)` for each mixed channel.
pub const MIX_ROUTING: [(usize, usize, usize); 2] = [(0, 4, 6), (1, 5, 7)];

/// Planes a frame must carry for the mixer to run.
pub const MIX_MIN_PLANES: usize = 8;

/// Blends one sample, weighting `a` by `weight` (`0.0..=1.0`).
///
/// Equal inputs pass through untouched.
#[inline]
pub fn mix_sample(a: f32, b: f32, weight: f32) -> f32 {
    if a == b {
        return a;
    }
    a * weight + b * (1.0 - weight)
}

/// Blends `frame_count` samples of `a` and `b`.
///
/// `ratio_percent` is the weight of `a`, clamped to `0.0..=100.0`. Samples
/// beyond the shorter input are not produced.
///
/// # Example
///
/// ```
/// use channel_relay::mix;
///
/// let out = mix(&[1.0, 1.0], &[0.0, 0.0], 25.0, 2);
/// assert_eq!(out, vec![0.25, 0.25]);
/// ```
pub fn mix(a: &[f32], b: &[f32], ratio_percent: f32, frame_count: usize) -> Vec<f32> {
    let weight = ratio_weight(ratio_percent);
    a.iter()
        .zip(b)
        .take(frame_count)
        .map(|(&a, &b)| mix_sample(a, b, weight))
        .collect()
}

fn ratio_weight(ratio_percent: f32) -> f32 {
    sanitize_ratio(ratio_percent) / 100.0
}

/// Clamps a ratio to `0.0..=100.0`, mapping NaN to 0.
fn sanitize_ratio(ratio_percent: f32) -> f32 {
    if ratio_percent.is_nan() {
        return 0.0;
    }
    ratio_percent.clamp(0.0, 100.0)
}

/// Per-filter mixer holding the current ratio.
#[derive(Debug)]
pub struct StaticMixer {
    ratio_bits: AtomicU32,
}

impl StaticMixer {
    /// Creates a mixer with the given ratio in percent.
    pub fn new(ratio_percent: f32) -> Self {
        Self {
            ratio_bits: AtomicU32::new(sanitize_ratio(ratio_percent).to_bits()),
        }
    }

    /// Current ratio in percent.
    pub fn ratio(&self) -> f32 {
        f32::from_bits(self.ratio_bits.load(Ordering::Relaxed))
    }

    /// Replaces the ratio.
    pub fn set_ratio(&self, ratio_percent: f32) {
        self.ratio_bits
            .store(sanitize_ratio(ratio_percent).to_bits(), Ordering::Relaxed);
    }

    /// Writes the blended pairs into planes 0 and 1 of `frame`.
    ///
    /// Returns `false` and leaves the frame untouched if it carries fewer
    /// than [`MIX_MIN_PLANES`] planes.
    pub fn apply(&self, frame: &mut OutputFrame) -> bool {
        if frame.planes.len() < MIX_MIN_PLANES {
            return false;
        }

        let weight = ratio_weight(self.ratio());
        let bytes = MIX_ROUTING
            .iter()
            .flat_map(|&(out, a, b)| [out, a, b])
            .map(|plane| frame.planes[plane].len())
            .min()
            .unwrap_or(0)
            .min(frame.frame_bytes());

        for &(out, a, b) in &MIX_ROUTING {
            for offset in (0..bytes).step_by(BYTES_PER_SAMPLE) {
                let end = offset + BYTES_PER_SAMPLE;
                if end > bytes {
                    break;
                }
                let sa = read_sample(&frame.planes[a][offset..end]);
                let sb = read_sample(&frame.planes[b][offset..end]);
                frame.planes[out][offset..end]
                    .copy_from_slice(&mix_sample(sa, sb, weight).to_ne_bytes());
            }
        }
        true
    }
}

impl Default for StaticMixer {
    fn default() -> Self {
        Self::new(50.0)
    }
}

#[inline]
fn read_sample(bytes: &[u8]) -> f32 {
    f32::from_ne_bytes([bytes[0], bytes[1], bytes[2], bytes[3]])
}
