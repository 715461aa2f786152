//! Error types for channel-relay.
//!
//! Errors are split into two categories:
//! - **Setup errors** ([`RelayError`]): invalid configuration or settings, and
//!   failed buffer allocation while creating a filter
//! - **Recoverable conditions**: underrun, overflow, unresolved producers.
//!   These never surface as errors; they are counted in
//!   [`RelayStats`](crate::RelayStats) and reported via
//!   [`EventCallback`](crate::EventCallback)

/// Errors returned when creating or reconfiguring a relay filter.
///
/// The audio path (`capture` / `drain` / `filter_audio`) never returns these.
#[derive(Debug, thiserror::Error)]
pub enum RelayError {
    /// The requested channel index does not map to a stereo pair.
    #[error("channel index {index} out of range (max {max})")]
    InvalidChannelIndex {
        /// The index that was requested.
        index: u32,
        /// The largest accepted index.
        max: u32,
    },

    /// The mix level is not a finite number.
    #[error("invalid mix level: {value}")]
    InvalidMixLevel {
        /// The rejected value.
        value: f32,
    },

    /// A configuration field is out of its accepted range.
    #[error("invalid relay config: {reason}")]
    InvalidConfig {
        /// What was wrong with the config.
        reason: String,
    },

    /// Buffer preallocation failed while creating the relay.
    #[error("failed to allocate {bytes} bytes of relay buffer")]
    AllocationFailed {
        /// Number of bytes that could not be reserved.
        bytes: usize,
    },
}

impl RelayError {
    /// Creates an invalid config error with the given reason.
    pub fn invalid_config(reason: impl Into<String>) -> Self {
        Self::InvalidConfig {
            reason: reason.into(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_invalid_channel_index_display() {
        let err = RelayError::InvalidChannelIndex { index: 7, max: 3 };
        assert_eq!(err.to_string(), "channel index 7 out of range (max 3)");
    }

    #[test]
    fn test_invalid_config_helper() {
        let err = RelayError::invalid_config("overflow slack must be at least 1");
        assert_eq!(
            err.to_string(),
            "invalid relay config: overflow slack must be at least 1"
        );
    }

    #[test]
    fn test_allocation_failed_display() {
        let err = RelayError::AllocationFailed { bytes: 4096 };
        assert!(err.to_string().contains("4096"));
    }

    #[test]
    fn test_invalid_mix_level_display() {
        let err = RelayError::InvalidMixLevel { value: f32::NAN };
        assert_eq!(err.to_string(), "invalid mix level: NaN");
    }
}
