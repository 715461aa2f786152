//! The relay filter - binds settings changes to the relay and the mixer.
//!
//! A [`RelayFilter`] is the consumer-side object the host creates once per
//! filter instance. It owns the [`RelayEngine`] and [`StaticMixer`], tracks
//! which producer it is subscribed to, and serves the per-tick
//! [`filter_audio`](RelayFilter::filter_audio) call.
//!
//! # Rebinding order
//!
//! On every [`update`](RelayFilter::update):
//!
//! 1. The engine's generation is retired, so any callback still installed
//!    becomes inert, then the old subscription is removed synchronously
//! 2. The new producer name is resolved (outside the buffer lock)
//! 3. The channel-pair offset is updated
//! 4. A capture adapter carrying the new generation is subscribed
//!
//! Subscribe/unsubscribe never run under the buffer lock: a host may block
//! in `unsubscribe` until an in-flight capture returns, and that capture
//! needs the buffer lock.

use std::sync::{Arc, Weak};

use parking_lot::Mutex;

use crate::config::{FilterSettings, RelayMode};
use crate::event::EventCallback;
use crate::frame::OutputFrame;
use crate::level::LevelConverter;
use crate::mixer::StaticMixer;
use crate::pipeline::{CaptureAdapter, RelayEngine, RelayStats};
use crate::source::{AudioProducer, ProducerId, ProducerResolver, SubscriptionId};
use crate::{RelayError, RelayEvent};

/// A live subscription to a producer.
struct ProducerBinding {
    producer_id: ProducerId,
    producer: Weak<dyn AudioProducer>,
    subscription: SubscriptionId,
}

/// Consumer-side relay filter instance.
///
/// Created with [`RelayFilter::builder()`]. Dropping the filter unsubscribes
/// from its producer before the relay buffers are released.
pub struct RelayFilter {
    mode: RelayMode,
    engine: Arc<RelayEngine>,
    mixer: StaticMixer,
    resolver: Arc<dyn ProducerResolver>,
    level: Arc<dyn LevelConverter>,
    /// Serializes settings updates; never taken on the audio path.
    binding: Mutex<Option<ProducerBinding>>,
    settings: Mutex<FilterSettings>,
    event_callback: Option<EventCallback>,
}

impl RelayFilter {
    pub(crate) fn new(
        mode: RelayMode,
        engine: RelayEngine,
        resolver: Arc<dyn ProducerResolver>,
        level: Arc<dyn LevelConverter>,
        event_callback: Option<EventCallback>,
    ) -> Self {
        Self {
            mode,
            engine: Arc::new(engine),
            mixer: StaticMixer::default(),
            resolver,
            level,
            binding: Mutex::new(None),
            settings: Mutex::new(FilterSettings::default()),
            event_callback,
        }
    }

    /// Applies a settings change.
    ///
    /// An unresolvable producer name is not an error: the filter stays
    /// unbound and keeps emitting silence (direct mode).
    ///
    /// # Errors
    ///
    /// Returns an error, leaving the current binding in place, if the
    /// settings are out of range.
    pub fn update(&self, settings: &FilterSettings) -> Result<(), RelayError> {
        settings.validate()?;

        let mut binding = self.binding.lock();

        let generation = self.engine.retire_generation();
        if let Some(old) = binding.take() {
            self.release(old);
        }

        let ratio = self.level.to_ratio_percent(settings.mix_level);
        self.mixer.set_ratio(ratio);
        *self.settings.lock() = settings.clone();

        let Some(name) = settings.selected_producer() else {
            tracing::info!("no producer selected, relay inert");
            return Ok(());
        };

        if self.mode == RelayMode::StaticMix {
            tracing::debug!(
                producer = name,
                "static mix mode does not capture from producers"
            );
            return Ok(());
        }

        let resolved = self.resolver.resolve_by_name(name);
        self.engine
            .set_channel_pair_offset(settings.channel_pair_offset());

        let Some(producer) = resolved else {
            tracing::warn!(producer = name, "producer not found, relay inert");
            self.emit(RelayEvent::ProducerUnresolved {
                name: name.to_string(),
            });
            return Ok(());
        };

        let producer_id = producer.id().clone();
        let adapter = CaptureAdapter::new(&self.engine, generation, producer_id.clone());
        let subscription = producer.subscribe(adapter.into_callback());

        tracing::info!(
            producer = %producer_id,
            channel_index = settings.channel_index,
            generation,
            "relay bound to producer"
        );
        self.emit(RelayEvent::ProducerBound {
            producer_id: producer_id.clone(),
            channel_index: settings.channel_index,
        });

        *binding = Some(ProducerBinding {
            producer_id,
            producer: Arc::downgrade(&producer),
            subscription,
        });
        Ok(())
    }

    /// Overwrites `output` for this tick according to the filter's mode.
    ///
    /// Never fails; missing or late audio becomes silence (direct mode) or
    /// leaves the output as delivered (synchronized and mix modes).
    pub fn filter_audio(&self, output: &mut OutputFrame) {
        match self.mode {
            RelayMode::Direct | RelayMode::TimestampSync => self.engine.drain(output),
            RelayMode::StaticMix => {
                if !self.mixer.apply(output) {
                    tracing::trace!(
                        planes = output.planes.len(),
                        "frame too narrow to mix, passing through"
                    );
                }
            }
        }
    }

    /// The mode this filter was created with.
    pub fn mode(&self) -> RelayMode {
        self.mode
    }

    /// The producer currently subscribed to, if any.
    pub fn producer_id(&self) -> Option<ProducerId> {
        self.binding.lock().as_ref().map(|b| b.producer_id.clone())
    }

    /// Returns `true` if a producer subscription is installed.
    pub fn is_bound(&self) -> bool {
        self.binding.lock().is_some()
    }

    /// The most recently applied settings.
    pub fn settings(&self) -> FilterSettings {
        self.settings.lock().clone()
    }

    /// Current mix ratio in percent.
    pub fn mix_ratio(&self) -> f32 {
        self.mixer.ratio()
    }

    /// Returns current relay statistics.
    pub fn stats(&self) -> RelayStats {
        self.engine.stats()
    }

    /// Unsubscribes from a producer. The producer may already be gone, in
    /// which case its callbacks went with it.
    fn release(&self, binding: ProducerBinding) {
        match binding.producer.upgrade() {
            Some(producer) => {
                if !producer.unsubscribe(binding.subscription) {
                    tracing::debug!(
                        producer = %binding.producer_id,
                        "subscription already removed by host"
                    );
                }
            }
            None => {
                tracing::debug!(
                    producer = %binding.producer_id,
                    "producer dropped before release"
                );
            }
        }

        tracing::info!(producer = %binding.producer_id, "relay released producer");
        self.emit(RelayEvent::ProducerReleased {
            producer_id: binding.producer_id,
        });
    }

    fn emit(&self, event: RelayEvent) {
        if let Some(ref callback) = self.event_callback {
            callback(event);
        }
    }
}

impl Drop for RelayFilter {
    fn drop(&mut self) {
        // Retire first so a callback racing with teardown writes nothing,
        // then remove the subscription before the engine is freed.
        self.engine.retire_generation();
        if let Some(binding) = self.binding.get_mut().take() {
            self.release(binding);
        }
    }
}

impl std::fmt::Debug for RelayFilter {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RelayFilter")
            .field("mode", &self.mode)
            .field("producer", &self.producer_id())
            .field("mix_ratio", &self.mix_ratio())
            .finish_non_exhaustive()
    }
}
