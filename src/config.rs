//! Configuration types for the relay and the filter settings it receives.

use crate::RelayError;

/// Producer name meaning "no producer selected".
pub const NO_PRODUCER: &str = "none";

/// Largest channel index a settings change may select.
///
/// Each index picks a stereo pair, so 0..=3 covers an eight-plane layout.
pub const MAX_CHANNEL_INDEX: u32 = 3;

/// Divisor applied to producer timestamps in timestamp-synchronized mode.
pub const DEFAULT_TIMESTAMP_DIVISOR: u64 = 10_000_000;

/// How the filter produces its output on every tick.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum RelayMode {
    /// Per-channel byte FIFOs with overflow trim and underrun zero-fill.
    #[default]
    Direct,

    /// Timestamp-tagged chunks, the front chunk is consumed on every tick.
    TimestampSync,

    /// No cross-thread buffering. Two channel pairs of the consumer's own
    /// frame are blended by the mix ratio.
    StaticMix,
}

/// Configuration for relay behavior.
///
/// Use [`RelayConfig::default()`] for sensible defaults, or customize as needed.
///
/// # Example
///
/// ```
/// use channel_relay::{RelayConfig, RelayMode};
///
/// let config = RelayConfig {
///     mode: RelayMode::TimestampSync,
///     max_queued_chunks: 16,
///     ..Default::default()
/// };
/// assert!(config.validate().is_ok());
/// ```
#[derive(Debug, Clone)]
pub struct RelayConfig {
    /// Operating mode.
    ///
    /// Default: [`RelayMode::Direct`]
    pub mode: RelayMode,

    /// Backlog, in incoming frames, tolerated before the oldest frame is trimmed.
    ///
    /// Default: 2
    pub overflow_slack_frames: usize,

    /// Maximum chunks held in timestamp-synchronized mode.
    ///
    /// When full, the oldest chunk is evicted to make room.
    /// Default: 64
    pub max_queued_chunks: usize,

    /// Timestamps are divided by this to collapse arrival jitter into buckets.
    ///
    /// Default: 10,000,000
    pub timestamp_divisor: u64,

    /// Bytes reserved up front in each channel buffer.
    ///
    /// Reserving at creation keeps the first ticks allocation-free.
    /// Default: 16 KiB
    pub preallocate_bytes: usize,
}

impl Default for RelayConfig {
    fn default() -> Self {
        Self {
            mode: RelayMode::Direct,
            overflow_slack_frames: 2,
            max_queued_chunks: 64,
            timestamp_divisor: DEFAULT_TIMESTAMP_DIVISOR,
            preallocate_bytes: 16 * 1024,
        }
    }
}

impl RelayConfig {
    /// Checks that every field is in range.
    pub fn validate(&self) -> Result<(), RelayError> {
        if self.overflow_slack_frames == 0 {
            return Err(RelayError::invalid_config(
                "overflow slack must be at least 1 frame",
            ));
        }
        if self.max_queued_chunks == 0 {
            return Err(RelayError::invalid_config(
                "chunk queue must hold at least 1 chunk",
            ));
        }
        if self.timestamp_divisor == 0 {
            return Err(RelayError::invalid_config(
                "timestamp divisor must be non-zero",
            ));
        }
        Ok(())
    }
}

/// Settings delivered by the host whenever the user changes the filter.
#[derive(Debug, Clone, PartialEq)]
pub struct FilterSettings {
    /// Name of the producer to relay from. Empty or [`NO_PRODUCER`] unbinds.
    pub producer_name: String,

    /// Stereo pair to take from the producer, `0..=MAX_CHANNEL_INDEX`.
    pub channel_index: u32,

    /// User-facing mix level, converted to a ratio by a
    /// [`LevelConverter`](crate::LevelConverter).
    pub mix_level: f32,
}

impl Default for FilterSettings {
    fn default() -> Self {
        Self {
            producer_name: NO_PRODUCER.to_string(),
            channel_index: 0,
            mix_level: 50.0,
        }
    }
}

impl FilterSettings {
    /// Creates settings relaying `channel_index` of the named producer.
    pub fn relay(producer_name: impl Into<String>, channel_index: u32) -> Self {
        Self {
            producer_name: producer_name.into(),
            channel_index,
            ..Default::default()
        }
    }

    /// Returns the producer name, or `None` when no producer is selected.
    pub fn selected_producer(&self) -> Option<&str> {
        let name = self.producer_name.as_str();
        if name.is_empty() || name == NO_PRODUCER {
            None
        } else {
            Some(name)
        }
    }

    /// Byte-plane offset of the first channel of the selected pair.
    pub fn channel_pair_offset(&self) -> usize {
        self.channel_index as usize * 2
    }

    /// Rejects settings the filter cannot apply.
    pub fn validate(&self) -> Result<(), RelayError> {
        if self.channel_index > MAX_CHANNEL_INDEX {
            return Err(RelayError::InvalidChannelIndex {
                index: self.channel_index,
                max: MAX_CHANNEL_INDEX,
            });
        }
        if !self.mix_level.is_finite() && self.mix_level != f32::NEG_INFINITY {
            return Err(RelayError::InvalidMixLevel {
                value: self.mix_level,
            });
        }
        Ok(())
    }
}
