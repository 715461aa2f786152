//! Builder pattern for `RelayFilter`.

use std::sync::Arc;

use crate::filter::RelayFilter;
use crate::level::{LevelConverter, PercentLevel};
use crate::pipeline::RelayEngine;
use crate::source::ProducerResolver;
use crate::{
    event_callback, EventCallback, FilterSettings, RelayConfig, RelayError, RelayEvent, RelayMode,
};

/// Builder for configuring and creating a [`RelayFilter`].
///
/// Use [`RelayFilter::builder()`] to create a new builder.
///
/// # Example
///
/// ```
/// use channel_relay::{FilterSettings, MockHost, RelayFilter, RelayMode};
/// use std::sync::Arc;
///
/// let host = Arc::new(MockHost::new());
/// host.add_producer("A2", 8, 48000);
///
/// let filter = RelayFilter::builder(host)
///     .mode(RelayMode::Direct)
///     .settings(FilterSettings::relay("A2", 1))
///     .on_event(|e| tracing::info!(?e, "relay event"))
///     .build()?;
///
/// assert!(filter.is_bound());
/// # Ok::<(), channel_relay::RelayError>(())
/// ```
#[must_use]
pub struct RelayFilterBuilder {
    resolver: Arc<dyn ProducerResolver>,
    config: RelayConfig,
    settings: FilterSettings,
    level: Arc<dyn LevelConverter>,
    event_callback: Option<EventCallback>,
}

impl RelayFilterBuilder {
    /// Creates a builder resolving producers through `resolver`.
    pub fn new(resolver: Arc<dyn ProducerResolver>) -> Self {
        Self {
            resolver,
            config: RelayConfig::default(),
            settings: FilterSettings::default(),
            level: Arc::new(PercentLevel),
            event_callback: None,
        }
    }

    /// Set the relay mode.
    ///
    /// Default: [`RelayMode::Direct`]
    pub fn mode(mut self, mode: RelayMode) -> Self {
        self.config.mode = mode;
        self
    }

    /// Set custom relay configuration. Replaces any mode set earlier.
    pub fn config(mut self, config: RelayConfig) -> Self {
        self.config = config;
        self
    }

    /// Set the settings applied when the filter is created.
    ///
    /// Default: unbound, channel pair 0, mix level 50.
    pub fn settings(mut self, settings: FilterSettings) -> Self {
        self.settings = settings;
        self
    }

    /// Set how the mix level setting maps to a mix ratio.
    ///
    /// Default: [`PercentLevel`]
    pub fn level_converter<L: LevelConverter + 'static>(mut self, converter: L) -> Self {
        self.level = Arc::new(converter);
        self
    }

    /// Set a callback to receive runtime events.
    ///
    /// Events include overflow and underrun notices, rejected frames and
    /// binding changes. The callback may run on the producer's thread and
    /// must not call back into the filter.
    pub fn on_event<F>(mut self, callback: F) -> Self
    where
        F: Fn(RelayEvent) + Send + Sync + 'static,
    {
        self.event_callback = Some(event_callback(callback));
        self
    }

    /// Creates the filter and applies the initial settings.
    ///
    /// # Errors
    ///
    /// Returns an error if:
    /// - The relay configuration is invalid
    /// - The relay buffers cannot be allocated
    /// - The initial settings are out of range
    pub fn build(self) -> Result<RelayFilter, RelayError> {
        self.settings.validate()?;
        let engine = RelayEngine::new(&self.config, self.event_callback.clone())?;

        let filter = RelayFilter::new(
            self.config.mode,
            engine,
            self.resolver,
            self.level,
            self.event_callback,
        );
        filter.update(&self.settings)?;

        tracing::debug!(mode = ?filter.mode(), "relay filter created");
        Ok(filter)
    }
}

impl RelayFilter {
    /// Creates a new builder for configuring a relay filter.
    pub fn builder(resolver: Arc<dyn ProducerResolver>) -> RelayFilterBuilder {
        RelayFilterBuilder::new(resolver)
    }
}
