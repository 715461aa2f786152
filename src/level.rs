//! Conversion from the user-facing mix level to the internal mix ratio.
//!
//! The host exposes the mix as a level control; the mixer works with a
//! linear ratio in percent. Keeping the conversion behind [`LevelConverter`]
//! lets a host plug in its own decibel utility.

/// Converts a user-facing level into a mix ratio in percent, `0.0..=100.0`.
pub trait LevelConverter: Send + Sync {
    /// Returns the ratio for `level`. Implementations clamp to `0.0..=100.0`.
    fn to_ratio_percent(&self, level: f32) -> f32;
}

/// The level already is a percentage.
#[derive(Debug, Clone, Copy, Default)]
pub struct PercentLevel;

impl LevelConverter for PercentLevel {
    fn to_ratio_percent(&self, level: f32) -> f32 {
        clamp_percent(level)
    }
}

/// The level is in decibels; 0 dB is the full first pair, -inf dB the full second.
#[derive(Debug, Clone, Copy, Default)]
pub struct DecibelLevel;

impl LevelConverter for DecibelLevel {
    fn to_ratio_percent(&self, level: f32) -> f32 {
        clamp_percent(db_to_multiplier(level) * 100.0)
    }
}

/// Converts decibels to a linear multiplier.
#[inline]
pub fn db_to_multiplier(db: f32) -> f32 {
    if db == f32::NEG_INFINITY {
        return 0.0;
    }
    10.0_f32.powf(db / 20.0)
}

fn clamp_percent(value: f32) -> f32 {
    if value.is_nan() {
        return 0.0;
    }
    value.clamp(0.0, 100.0)
}
