//! Capture adapter - turns producer frames into relay writes.
//!
//! The adapter is what the host actually calls on the producer thread. It:
//! - Holds only a weak reference to the relay engine, so a late callback
//!   after teardown finds nothing to write into
//! - Carries the generation it was installed under; the engine rejects the
//!   write if a settings change has retired that generation
//! - Translates the engine's outcome into counters, logs and events

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Weak};

use super::chunk_queue::{normalize_timestamp, Chunk};
use super::frame_buffer::RELAY_CHANNELS;
use super::relay::RelayEngine;
use crate::frame::AudioData;
use crate::source::{CaptureCallback, ProducerId};
use crate::RelayEvent;

/// Log a summary every this many captured frames.
const LOG_EVERY_FRAMES: u64 = 500;

/// What happened to one captured frame.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CaptureOutcome {
    /// Appended to the channel buffers after trimming `trimmed_bytes` of backlog.
    Appended {
        /// Bytes discarded from the front of each channel first.
        trimmed_bytes: usize,
    },
    /// Queued as a chunk, evicting the oldest chunk if the queue was full.
    Queued {
        /// Normalized timestamp of the evicted chunk.
        evicted: Option<u64>,
    },
    /// The frame carried no samples.
    Empty,
    /// The frame does not contain the selected channel pair.
    MissingPlanes {
        /// Offset of the first selected plane.
        offset: usize,
        /// Planes the frame actually carried.
        available: usize,
    },
    /// The adapter's generation was retired by a settings change or teardown.
    Stale,
    /// The engine runs unbuffered (static mix mode) and ignores captures.
    Unbuffered,
}

/// Returns the two planes starting at `offset`, each trimmed to the frame size.
pub fn select_pair(data: &AudioData, offset: usize) -> Option<[&[u8]; RELAY_CHANNELS]> {
    Some([data.plane(offset)?, data.plane(offset + 1)?])
}

/// Copies the selected pair of `data` into an owned, timestamp-tagged chunk.
pub fn chunk_from_frame(data: &AudioData, offset: usize, divisor: u64) -> Option<Chunk> {
    let [left, right] = select_pair(data, offset)?;
    Some(Chunk {
        normalized_timestamp: normalize_timestamp(data.timestamp, divisor),
        channel_data: [left.to_vec(), right.to_vec()],
        frame_count: data.frames,
    })
}

/// Forwards frames from one producer subscription into a relay engine.
pub struct CaptureAdapter {
    engine: Weak<RelayEngine>,
    generation: u64,
    producer_id: ProducerId,
    frames_seen: AtomicU64,
}

impl CaptureAdapter {
    /// Creates an adapter bound to `generation` of `engine`.
    pub fn new(engine: &Arc<RelayEngine>, generation: u64, producer_id: ProducerId) -> Self {
        Self {
            engine: Arc::downgrade(engine),
            generation,
            producer_id,
            frames_seen: AtomicU64::new(0),
        }
    }

    /// Wraps the adapter in the callback shape hosts expect.
    pub fn into_callback(self) -> CaptureCallback {
        let adapter = Arc::new(self);
        Arc::new(move |producer: &ProducerId, data: &AudioData, muted: bool| {
            adapter.on_frame(producer, data, muted);
        })
    }

    /// Handles one frame from the producer thread.
    ///
    /// `muted` is ignored: the relay is meant to re-expose individual channels
    /// of a producer, and muting belongs on the relaying filter itself.
    pub fn on_frame(
        &self,
        producer: &ProducerId,
        data: &AudioData,
        _muted: bool,
    ) -> CaptureOutcome {
        let Some(engine) = self.engine.upgrade() else {
            return CaptureOutcome::Stale;
        };

        if data.is_empty() {
            return CaptureOutcome::Empty;
        }

        let outcome = engine.capture(self.generation, data);
        match outcome {
            CaptureOutcome::Appended { trimmed_bytes } if trimmed_bytes > 0 => {
                tracing::trace!(
                    producer = %producer,
                    trimmed_bytes,
                    "relay backlog over slack, dropped oldest frame"
                );
                engine.emit(RelayEvent::BufferOverflow {
                    dropped_bytes: trimmed_bytes,
                });
            }
            CaptureOutcome::Queued {
                evicted: Some(normalized_timestamp),
            } => {
                tracing::trace!(
                    producer = %producer,
                    normalized_timestamp,
                    "chunk queue full, evicted oldest chunk"
                );
                engine.emit(RelayEvent::ChunkEvicted {
                    normalized_timestamp,
                });
            }
            CaptureOutcome::MissingPlanes { offset, available } => {
                tracing::warn!(
                    producer = %producer,
                    offset,
                    available,
                    "frame does not carry the selected channel pair"
                );
                engine.emit(RelayEvent::FrameRejected {
                    producer_id: producer.clone(),
                    reason: format!(
                        "planes {}..={} requested, frame has {}",
                        offset,
                        offset + 1,
                        available
                    ),
                });
            }
            CaptureOutcome::Stale => {
                tracing::debug!(
                    producer = %producer,
                    generation = self.generation,
                    "dropping frame from retired subscription"
                );
            }
            _ => {}
        }

        let seen = self.frames_seen.fetch_add(1, Ordering::Relaxed) + 1;
        if seen % LOG_EVERY_FRAMES == 0 {
            tracing::debug!(
                "CaptureAdapter {}: {} frames, last ts={} ({} samples)",
                self.producer_id,
                seen,
                data.timestamp,
                data.frames
            );
        }

        outcome
    }
}
