//! Relay pipeline components.
//!
//! Audio crosses from the producer thread to the consumer thread through a
//! single locked backlog:
//!
//! ```text
//! Producer Thread → Capture Adapter → Relay Engine (locked backlog) → Consumer Tick
//! ```
//!
//! - **Capture Adapter**: the callback installed on the producer; rejects
//!   writes from retired subscriptions
//! - **Frame Buffer**: lock-step per-channel byte FIFOs (direct mode)
//! - **Chunk Queue**: bounded queue of timestamp-tagged chunks (synchronized mode)
//! - **Relay Engine**: owns the backlog and applies trim / zero-fill policy

mod capture;
mod chunk_queue;
mod frame_buffer;
mod relay;

pub use capture::{CaptureAdapter, CaptureOutcome};
pub use chunk_queue::{normalize_timestamp, Chunk, ChunkQueue};
pub use frame_buffer::{ChannelBuffers, RELAY_CHANNELS};
pub use relay::{RelayEngine, RelayStats};
