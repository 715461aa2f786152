//! Relay engine - owns the buffered audio and applies the drain policy.
//!
//! A single `parking_lot::Mutex` guards all buffer state. The producer thread
//! takes it in [`RelayEngine::capture`], the consumer thread in
//! [`RelayEngine::drain`]. Neither path allocates beyond the frame it moves,
//! and neither waits on anything but the lock.

use std::sync::atomic::{AtomicU64, Ordering};

use parking_lot::Mutex;

use super::capture::{chunk_from_frame, select_pair, CaptureOutcome};
use super::chunk_queue::ChunkQueue;
use super::frame_buffer::ChannelBuffers;
use crate::config::{RelayConfig, RelayMode};
use crate::event::EventCallback;
use crate::frame::{AudioData, OutputFrame};
use crate::{RelayError, RelayEvent};

/// Log an underrun summary every this many underrun ticks.
const LOG_EVERY_UNDERRUNS: u64 = 100;

/// Statistics about a relay.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RelayStats {
    /// Frames written into the backlog.
    pub frames_captured: u64,
    /// Frames skipped because they lacked the selected channel pair.
    pub frames_rejected: u64,
    /// Frames dropped because their subscription had been retired.
    pub stale_frames: u64,
    /// Captures that trimmed backlog.
    pub overflows: u64,
    /// Bytes per channel discarded by overflow trimming.
    pub bytes_dropped: u64,
    /// Drains that had to pad with silence.
    pub underruns: u64,
    /// Bytes per channel of silence padded in.
    pub bytes_padded: u64,
    /// Chunks evicted from a full chunk queue.
    pub chunks_evicted: u64,
    /// Consumer ticks served.
    pub ticks: u64,
    /// Bytes per channel currently buffered (direct mode).
    pub buffered_bytes: usize,
    /// Chunks currently queued (timestamp-synchronized mode).
    pub queued_chunks: usize,
}

/// Counters shared between the audio paths and [`RelayStats`] snapshots.
#[derive(Default)]
struct RelayCounters {
    frames_captured: AtomicU64,
    frames_rejected: AtomicU64,
    stale_frames: AtomicU64,
    overflows: AtomicU64,
    bytes_dropped: AtomicU64,
    underruns: AtomicU64,
    bytes_padded: AtomicU64,
    chunks_evicted: AtomicU64,
    ticks: AtomicU64,
}

/// Buffered audio, shaped by the relay mode.
#[derive(Debug)]
enum Backlog {
    Direct(ChannelBuffers),
    Chunked(ChunkQueue),
    Unbuffered,
}

/// Everything the lock protects.
#[derive(Debug)]
struct RelayState {
    backlog: Backlog,
    channel_pair_offset: usize,
    generation: u64,
}

/// Cross-thread relay between one producer subscription and the consumer tick.
pub struct RelayEngine {
    state: Mutex<RelayState>,
    counters: RelayCounters,
    overflow_slack_frames: usize,
    timestamp_divisor: u64,
    event_callback: Option<EventCallback>,
}

impl RelayEngine {
    /// Creates an engine for `config.mode`.
    ///
    /// # Errors
    ///
    /// Returns an error if the config is invalid or the channel buffers or
    /// chunk slots cannot be preallocated.
    pub fn new(
        config: &RelayConfig,
        event_callback: Option<EventCallback>,
    ) -> Result<Self, RelayError> {
        config.validate()?;

        let backlog = match config.mode {
            RelayMode::Direct => {
                Backlog::Direct(ChannelBuffers::with_capacity(config.preallocate_bytes)?)
            }
            RelayMode::TimestampSync => {
                Backlog::Chunked(ChunkQueue::new(config.max_queued_chunks)?)
            }
            RelayMode::StaticMix => Backlog::Unbuffered,
        };

        Ok(Self {
            state: Mutex::new(RelayState {
                backlog,
                channel_pair_offset: 0,
                generation: 0,
            }),
            counters: RelayCounters::default(),
            overflow_slack_frames: config.overflow_slack_frames,
            timestamp_divisor: config.timestamp_divisor,
            event_callback,
        })
    }

    /// Writes one producer frame into the backlog.
    ///
    /// Called on the producer thread. The write only happens if `generation`
    /// is still the engine's current generation.
    pub fn capture(&self, generation: u64, data: &AudioData) -> CaptureOutcome {
        let mut state = self.state.lock();

        if state.generation != generation {
            self.counters.stale_frames.fetch_add(1, Ordering::Relaxed);
            return CaptureOutcome::Stale;
        }

        let offset = state.channel_pair_offset;
        let outcome = match &mut state.backlog {
            Backlog::Direct(buffers) => {
                let Some(planes) = select_pair(data, offset) else {
                    return self.reject(offset, data);
                };

                // Keep roughly `overflow_slack_frames` of backlog; sacrifice
                // the oldest frame, never the incoming one.
                let frame_bytes = data.frame_bytes();
                let mut trimmed_bytes = 0;
                if buffers.len() > frame_bytes * self.overflow_slack_frames {
                    trimmed_bytes = buffers.discard_front(frame_bytes);
                    self.counters.overflows.fetch_add(1, Ordering::Relaxed);
                    self.counters
                        .bytes_dropped
                        .fetch_add(trimmed_bytes as u64, Ordering::Relaxed);
                }

                buffers.push_planes(planes);
                CaptureOutcome::Appended { trimmed_bytes }
            }
            Backlog::Chunked(queue) => {
                let Some(chunk) = chunk_from_frame(data, offset, self.timestamp_divisor) else {
                    return self.reject(offset, data);
                };

                let evicted = queue.push(chunk).map(|c| c.normalized_timestamp);
                if evicted.is_some() {
                    self.counters.chunks_evicted.fetch_add(1, Ordering::Relaxed);
                }
                CaptureOutcome::Queued { evicted }
            }
            Backlog::Unbuffered => return CaptureOutcome::Unbuffered,
        };

        self.counters.frames_captured.fetch_add(1, Ordering::Relaxed);
        outcome
    }

    fn reject(&self, offset: usize, data: &AudioData) -> CaptureOutcome {
        self.counters.frames_rejected.fetch_add(1, Ordering::Relaxed);
        CaptureOutcome::MissingPlanes {
            offset,
            available: data.planes.len(),
        }
    }

    /// Overwrites `output` with relayed audio.
    ///
    /// Called on the consumer thread once per tick.
    ///
    /// - Direct mode: every output plane is zeroed, the backlog is padded
    ///   with silence if it holds less than one output frame, then exactly
    ///   one output frame is moved into planes 0 and 1.
    /// - Timestamp-synchronized mode: the front chunk, if any, is copied
    ///   into planes 0 and 1 up to the output size. A short chunk leaves the
    ///   rest of the output as it was; an empty queue leaves it untouched.
    ///   The copy length is in sample bytes (`frames * BYTES_PER_SAMPLE`),
    ///   not the raw frame count.
    /// - Static mix mode: no-op.
    pub fn drain(&self, output: &mut OutputFrame) {
        self.counters.ticks.fetch_add(1, Ordering::Relaxed);
        let output_bytes = output.frame_bytes();

        let padded = {
            let mut state = self.state.lock();
            match &mut state.backlog {
                Backlog::Direct(buffers) => {
                    output.clear();

                    let deficit = output_bytes.saturating_sub(buffers.len());
                    if deficit > 0 {
                        buffers.push_zeros(deficit);
                    }

                    let [left, right] = output_pair(output);
                    buffers.pop_into(output_bytes, [left, right]);
                    deficit
                }
                Backlog::Chunked(queue) => {
                    // The front chunk is always accepted; no alignment against
                    // the consumer timestamp is attempted.
                    if let Some(chunk) = queue.pop() {
                        let [left, right] = output_pair(output);
                        for (out, data) in [left, right].into_iter().zip(&chunk.channel_data) {
                            let count = output_bytes.min(out.len()).min(data.len());
                            out[..count].copy_from_slice(&data[..count]);
                        }
                    }
                    0
                }
                Backlog::Unbuffered => 0,
            }
        };

        if padded > 0 {
            let underruns = self.counters.underruns.fetch_add(1, Ordering::Relaxed) + 1;
            self.counters
                .bytes_padded
                .fetch_add(padded as u64, Ordering::Relaxed);
            if underruns % LOG_EVERY_UNDERRUNS == 1 {
                tracing::debug!(
                    underruns,
                    padded_bytes = padded,
                    "relay underrun, padding with silence"
                );
            }
            self.emit(RelayEvent::BufferUnderrun {
                padded_bytes: padded,
            });
        }
    }

    /// Generation that capture adapters must carry to be accepted.
    pub fn current_generation(&self) -> u64 {
        self.state.lock().generation
    }

    /// Retires the current generation so every installed adapter becomes
    /// inert, returning the new generation.
    pub fn retire_generation(&self) -> u64 {
        let mut state = self.state.lock();
        state.generation = state.generation.wrapping_add(1);
        state.generation
    }

    /// Selects which producer planes are relayed.
    pub fn set_channel_pair_offset(&self, offset: usize) {
        self.state.lock().channel_pair_offset = offset;
    }

    /// Currently selected plane offset.
    pub fn channel_pair_offset(&self) -> usize {
        self.state.lock().channel_pair_offset
    }

    /// Returns current relay statistics.
    pub fn stats(&self) -> RelayStats {
        let (buffered_bytes, queued_chunks) = {
            let state = self.state.lock();
            match &state.backlog {
                Backlog::Direct(buffers) => (buffers.len(), 0),
                Backlog::Chunked(queue) => (0, queue.len()),
                Backlog::Unbuffered => (0, 0),
            }
        };

        let load = |counter: &AtomicU64| counter.load(Ordering::Relaxed);
        RelayStats {
            frames_captured: load(&self.counters.frames_captured),
            frames_rejected: load(&self.counters.frames_rejected),
            stale_frames: load(&self.counters.stale_frames),
            overflows: load(&self.counters.overflows),
            bytes_dropped: load(&self.counters.bytes_dropped),
            underruns: load(&self.counters.underruns),
            bytes_padded: load(&self.counters.bytes_padded),
            chunks_evicted: load(&self.counters.chunks_evicted),
            ticks: load(&self.counters.ticks),
            buffered_bytes,
            queued_chunks,
        }
    }

    /// Emits an event via the callback if registered.
    pub(crate) fn emit(&self, event: RelayEvent) {
        if let Some(ref callback) = self.event_callback {
            callback(event);
        }
    }
}

/// Borrows output planes 0 and 1, substituting empty slices for missing planes.
fn output_pair(output: &mut OutputFrame) -> [&mut [u8]; 2] {
    match output.planes.as_mut_slice() {
        [left, right, ..] => [left.as_mut_slice(), right.as_mut_slice()],
        [left] => [left.as_mut_slice(), Default::default()],
        [] => [Default::default(), Default::default()],
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::frame::BYTES_PER_SAMPLE;

    fn direct() -> RelayEngine {
        RelayEngine::new(&RelayConfig::default(), None).unwrap()
    }

    fn chunked(max_queued_chunks: usize) -> RelayEngine {
        let config = RelayConfig {
            mode: RelayMode::TimestampSync,
            max_queued_chunks,
            ..Default::default()
        };
        RelayEngine::new(&config, None).unwrap()
    }

    /// One-sample stereo frame whose planes are filled with `left` / `right`.
    fn frame(timestamp: u64, left: u8, right: u8) -> AudioData {
        AudioData::new(
            timestamp,
            1,
            vec![vec![left; BYTES_PER_SAMPLE], vec![right; BYTES_PER_SAMPLE]],
        )
    }

    #[test]
    fn test_drain_returns_captured_frames_in_order() {
        let engine = direct();
        engine.capture(0, &frame(0, 1, 2));
        engine.capture(0, &frame(1, 3, 4));

        let mut out = OutputFrame::new(0, 2, 1);
        engine.drain(&mut out);
        assert_eq!(out.planes, vec![vec![1; 4], vec![2; 4]]);

        engine.drain(&mut out);
        assert_eq!(out.planes, vec![vec![3; 4], vec![4; 4]]);

        engine.drain(&mut out);
        assert_eq!(out.planes, vec![vec![0; 4], vec![0; 4]]);

        let stats = engine.stats();
        assert_eq!(stats.underruns, 1);
        assert_eq!(stats.bytes_padded, 4);
        assert_eq!(stats.ticks, 3);
    }

    #[test]
    fn test_drain_without_capture_is_silent() {
        let engine = direct();
        let mut out = OutputFrame::from_f32(0, &[vec![0.9; 64], vec![-0.9; 64]]);
        engine.drain(&mut out);

        assert!(out.planes.iter().all(|p| p.len() == 256));
        assert!(out.planes.iter().flatten().all(|&b| b == 0));
        assert_eq!(engine.stats().buffered_bytes, 0);
    }

    #[test]
    fn test_drain_zeroes_extra_output_planes() {
        let engine = direct();
        engine.capture(0, &frame(0, 1, 2));

        let mut out = OutputFrame::from_f32(0, &[vec![0.5], vec![0.5], vec![0.5]]);
        engine.drain(&mut out);
        assert_eq!(out.planes[2], vec![0; 4]);
    }

    #[test]
    fn test_capture_trims_backlog_over_slack() {
        let engine = direct();
        for i in 0..3 {
            let outcome = engine.capture(0, &frame(i, i as u8, i as u8));
            assert_eq!(outcome, CaptureOutcome::Appended { trimmed_bytes: 0 });
        }
        // 12 bytes buffered > 2 * 4, so the oldest frame goes
        let outcome = engine.capture(0, &frame(3, 3, 3));
        assert_eq!(outcome, CaptureOutcome::Appended { trimmed_bytes: 4 });
        assert_eq!(engine.stats().buffered_bytes, 12);

        let mut out = OutputFrame::new(0, 2, 1);
        engine.drain(&mut out);
        assert_eq!(out.planes[0], vec![1; 4]);

        let stats = engine.stats();
        assert_eq!(stats.overflows, 1);
        assert_eq!(stats.bytes_dropped, 4);
    }

    #[test]
    fn test_backlog_stays_bounded_without_drains() {
        let engine = direct();
        for i in 0..1000 {
            engine.capture(0, &frame(i, 0, 0));
            assert!(engine.stats().buffered_bytes <= 3 * BYTES_PER_SAMPLE);
        }
    }

    #[test]
    fn test_capture_selects_channel_pair() {
        let engine = direct();
        engine.set_channel_pair_offset(2);
        let data = AudioData::new(0, 1, (0..4).map(|i| vec![i; 4]).collect());
        engine.capture(0, &data);

        let mut out = OutputFrame::new(0, 2, 1);
        engine.drain(&mut out);
        assert_eq!(out.planes, vec![vec![2; 4], vec![3; 4]]);
    }

    #[test]
    fn test_stale_generation_is_rejected() {
        let engine = direct();
        let old = engine.current_generation();
        let new = engine.retire_generation();
        assert_ne!(old, new);

        assert_eq!(engine.capture(old, &frame(0, 1, 1)), CaptureOutcome::Stale);
        assert!(matches!(
            engine.capture(new, &frame(0, 1, 1)),
            CaptureOutcome::Appended { .. }
        ));
    }

    #[test]
    fn test_chunk_drain_takes_front_chunk() {
        let engine = chunked(8);
        engine.capture(0, &frame(10_000_000, 1, 2));
        engine.capture(0, &frame(20_000_000, 3, 4));
        assert_eq!(engine.stats().queued_chunks, 2);

        let mut out = OutputFrame::new(0, 2, 1);
        engine.drain(&mut out);
        assert_eq!(out.planes, vec![vec![1; 4], vec![2; 4]]);
        assert_eq!(engine.stats().queued_chunks, 1);
    }

    #[test]
    fn test_chunk_drain_empty_queue_leaves_output() {
        let engine = chunked(8);
        let mut out = OutputFrame::from_f32(0, &[vec![0.25; 2], vec![0.75; 2]]);
        let before = out.clone();
        engine.drain(&mut out);
        assert_eq!(out, before);
    }

    #[test]
    fn test_chunk_drain_short_chunk_leaves_tail() {
        let engine = chunked(8);
        engine.capture(0, &frame(0, 1, 2));

        let mut out = OutputFrame::new(0, 2, 2);
        out.planes[0].fill(9);
        out.planes[1].fill(9);
        engine.drain(&mut out);

        assert_eq!(out.planes[0], vec![1, 1, 1, 1, 9, 9, 9, 9]);
        assert_eq!(out.planes[1], vec![2, 2, 2, 2, 9, 9, 9, 9]);
    }

    #[test]
    fn test_chunk_drain_long_chunk_is_clamped() {
        let engine = chunked(8);
        engine.capture(0, &AudioData::silence(0, 2, 8));

        let mut out = OutputFrame::new(0, 2, 2);
        engine.drain(&mut out);
        assert_eq!(out.planes[0].len(), 8);
    }

    #[test]
    fn test_chunk_queue_evicts_when_full() {
        let engine = chunked(2);
        engine.capture(0, &frame(0, 1, 1));
        engine.capture(0, &frame(10_000_000, 2, 2));
        let outcome = engine.capture(0, &frame(20_000_000, 3, 3));

        assert_eq!(outcome, CaptureOutcome::Queued { evicted: Some(0) });
        assert_eq!(engine.stats().chunks_evicted, 1);

        let mut out = OutputFrame::new(0, 2, 1);
        engine.drain(&mut out);
        assert_eq!(out.planes[0], vec![2; 4]);
    }

    #[test]
    fn test_static_mix_engine_ignores_capture() {
        let config = RelayConfig {
            mode: RelayMode::StaticMix,
            ..Default::default()
        };
        let engine = RelayEngine::new(&config, None).unwrap();
        assert_eq!(
            engine.capture(0, &frame(0, 1, 1)),
            CaptureOutcome::Unbuffered
        );

        let mut out = OutputFrame::from_f32(0, &[vec![0.5], vec![0.5]]);
        let before = out.clone();
        engine.drain(&mut out);
        assert_eq!(out, before);
    }

    #[test]
    fn test_drain_with_single_output_plane_keeps_channels_in_step() {
        let engine = direct();
        engine.capture(0, &frame(0, 1, 2));
        engine.capture(0, &frame(1, 3, 4));

        let mut mono = OutputFrame::new(0, 1, 1);
        engine.drain(&mut mono);
        assert_eq!(mono.planes[0], vec![1; 4]);

        let mut stereo = OutputFrame::new(0, 2, 1);
        engine.drain(&mut stereo);
        assert_eq!(stereo.planes, vec![vec![3; 4], vec![4; 4]]);
    }

    #[test]
    fn test_underrun_emits_event() {
        use std::sync::Arc;

        let events = Arc::new(parking_lot::Mutex::new(Vec::new()));
        let sink = events.clone();
        let callback = crate::event_callback(move |e| sink.lock().push(e));
        let engine = RelayEngine::new(&RelayConfig::default(), Some(callback)).unwrap();

        let mut out = OutputFrame::new(0, 2, 4);
        engine.drain(&mut out);

        assert_eq!(
            events.lock().as_slice(),
            &[RelayEvent::BufferUnderrun { padded_bytes: 16 }]
        );
    }

    #[test]
    fn test_invalid_config_fails_creation() {
        let config = RelayConfig {
            max_queued_chunks: 0,
            ..Default::default()
        };
        assert!(RelayEngine::new(&config, None).is_err());
    }

    #[test]
    fn test_oversized_chunk_queue_fails_creation() {
        let config = RelayConfig {
            mode: RelayMode::TimestampSync,
            max_queued_chunks: usize::MAX / 2,
            ..Default::default()
        };
        assert!(config.validate().is_ok());
        assert!(matches!(
            RelayEngine::new(&config, None),
            Err(RelayError::AllocationFailed { .. })
        ));
    }
}
