//! Runtime events for monitoring relay health.
//!
//! Events are non-fatal notifications about relay behavior. The relay
//! keeps running after events are emitted - they're for logging/metrics,
//! not error handling.

use std::sync::Arc;

use crate::source::ProducerId;

/// Runtime events emitted by a relay filter.
///
/// # Example
///
/// ```
/// use channel_relay::RelayEvent;
///
/// fn handle_event(event: RelayEvent) {
///     match event {
///         RelayEvent::BufferOverflow { dropped_bytes } => {
///             eprintln!("Warning: dropped {} bytes per channel", dropped_bytes);
///         }
///         RelayEvent::BufferUnderrun { padded_bytes } => {
///             eprintln!("Underrun: {} bytes of silence", padded_bytes);
///         }
///         RelayEvent::ChunkEvicted { normalized_timestamp } => {
///             eprintln!("Evicted chunk {}", normalized_timestamp);
///         }
///         RelayEvent::FrameRejected { producer_id, reason } => {
///             eprintln!("Frame from {} rejected: {}", producer_id, reason);
///         }
///         RelayEvent::ProducerBound { producer_id, channel_index } => {
///             eprintln!("Relaying {} pair {}", producer_id, channel_index);
///         }
///         RelayEvent::ProducerUnresolved { name } => {
///             eprintln!("No producer named {}", name);
///         }
///         RelayEvent::ProducerReleased { producer_id } => {
///             eprintln!("Released {}", producer_id);
///         }
///     }
/// }
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RelayEvent {
    /// The backlog exceeded its slack and the oldest frame was discarded.
    BufferOverflow {
        /// Bytes dropped from each channel buffer.
        dropped_bytes: usize,
    },

    /// A drain found less data than requested and padded with silence.
    BufferUnderrun {
        /// Zero bytes appended to each channel buffer.
        padded_bytes: usize,
    },

    /// The chunk queue was full and its oldest chunk was evicted.
    ChunkEvicted {
        /// Normalized timestamp of the evicted chunk.
        normalized_timestamp: u64,
    },

    /// A producer frame could not be relayed and was skipped.
    FrameRejected {
        /// Producer that delivered the frame.
        producer_id: ProducerId,
        /// Why the frame was skipped.
        reason: String,
    },

    /// A settings change subscribed the relay to a producer.
    ProducerBound {
        /// The producer now being relayed.
        producer_id: ProducerId,
        /// Selected stereo pair.
        channel_index: u32,
    },

    /// The requested producer name did not resolve; the relay is inert.
    ProducerUnresolved {
        /// The name that failed to resolve.
        name: String,
    },

    /// The relay unsubscribed from a producer.
    ProducerReleased {
        /// The producer that was released.
        producer_id: ProducerId,
    },
}

/// Callback type for receiving runtime events.
///
/// Events about the audio path are emitted from the producer or consumer
/// thread after the relay lock is released. Keep the callback cheap.
pub type EventCallback = Arc<dyn Fn(RelayEvent) + Send + Sync>;

/// Creates an [`EventCallback`] from a closure.
///
/// # Example
///
/// ```
/// use channel_relay::{event_callback, RelayEvent};
///
/// let callback = event_callback(|event| {
///     println!("Got event: {:?}", event);
/// });
/// ```
pub fn event_callback<F>(f: F) -> EventCallback
where
    F: Fn(RelayEvent) + Send + Sync + 'static,
{
    Arc::new(f)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_relay_event_debug() {
        let event = RelayEvent::BufferOverflow { dropped_bytes: 512 };
        let debug = format!("{:?}", event);
        assert!(debug.contains("BufferOverflow"));
        assert!(debug.contains("512"));
    }

    #[test]
    fn test_relay_event_clone() {
        let event = RelayEvent::ProducerBound {
            producer_id: ProducerId::new("A2"),
            channel_index: 1,
        };
        assert_eq!(event.clone(), event);
    }

    #[test]
    fn test_event_callback_helper() {
        use std::sync::atomic::{AtomicBool, Ordering};

        let called = Arc::new(AtomicBool::new(false));
        let called_clone = called.clone();

        let callback = event_callback(move |_| {
            called_clone.store(true, Ordering::SeqCst);
        });

        callback(RelayEvent::BufferUnderrun { padded_bytes: 0 });
        assert!(called.load(Ordering::SeqCst));
    }
}
