//! # channel-relay
//!
//! **Note:** This crate is under active development. The API may change before 1.0.
//!
//! Cross-thread audio channel relay for media-host filters.
//!
//! `channel-relay` takes one stereo pair out of a multi-channel producer
//! running on its own audio thread and delivers it into a consumer's output
//! frame on the consumer's tick, with bounded latency, zero-filled underruns
//! and trimmed overflows. A static mix mode blends two channel pairs of the
//! consumer's own frame instead.
//!
//! ## Quick Start
//!
//! ```rust
//! use channel_relay::{FilterSettings, MockHost, OutputFrame, RelayFilter};
//! use std::sync::Arc;
//!
//! let host = Arc::new(MockHost::new());
//! let a2 = host.add_producer("A2", 8, 48000);
//!
//! let filter = RelayFilter::builder(host.clone())
//!     .settings(FilterSettings::relay("A2", 1))     // planes 2 and 3
//!     .on_event(|e| tracing::debug!(?e, "relay event"))
//!     .build()?;
//!
//! // Producer thread
//! a2.emit_tagged(480);
//!
//! // Consumer tick
//! let mut output = OutputFrame::new(0, 2, 480);
//! filter.filter_audio(&mut output);
//! assert_eq!(output.plane_f32(0).unwrap()[0], 0.3);
//! # Ok::<(), channel_relay::RelayError>(())
//! ```
//!
//! ## Architecture
//!
//! The crate maintains a strict thread boundary:
//!
//! - **Producer Thread**: the capture callback copies the selected pair into
//!   the relay backlog under a short lock
//! - **Relay Engine**: lock-step channel FIFOs (or a bounded chunk queue)
//!   with trim-on-overflow and zero-fill-on-underrun
//! - **Consumer Tick**: `filter_audio` drains exactly one output frame
//!
//! Rebinding retires a generation counter before the old subscription is
//! removed, so a callback still in flight can never write into the relay.

// unsafe_code lint is configured in Cargo.toml as "deny"
#![warn(missing_docs)]
// Audio code requires intentional numeric casts between sample formats
#![allow(
    clippy::cast_precision_loss,
    clippy::cast_possible_truncation,
    clippy::cast_sign_loss,
    clippy::cast_possible_wrap,
    clippy::cast_lossless
)]
// unwrap/expect allowed in tests only
#![cfg_attr(test, allow(clippy::unwrap_used, clippy::expect_used))]
// These doc lints are too strict for internal implementation details
#![allow(clippy::missing_panics_doc, clippy::missing_errors_doc)]

mod builder;
mod config;
mod error;
mod event;
mod filter;
mod frame;
mod level;
mod mixer;
pub mod pipeline;
pub mod source;

pub use builder::RelayFilterBuilder;
pub use config::{
    FilterSettings, RelayConfig, RelayMode, DEFAULT_TIMESTAMP_DIVISOR, MAX_CHANNEL_INDEX,
    NO_PRODUCER,
};
pub use error::RelayError;
pub use event::{event_callback, EventCallback, RelayEvent};
pub use filter::RelayFilter;
pub use frame::{bytes_to_f32, f32_to_bytes, AudioData, OutputFrame, BYTES_PER_SAMPLE};
pub use level::{db_to_multiplier, DecibelLevel, LevelConverter, PercentLevel};
pub use mixer::{mix, mix_sample, StaticMixer, MIX_MIN_PLANES, MIX_ROUTING};
pub use pipeline::{RelayEngine, RelayStats};
pub use source::{
    AudioProducer, CaptureCallback, MockHost, MockProducer, ProducerId, ProducerResolver,
    SubscriptionId,
};
