//! In-memory host for testing without a media framework.

use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use parking_lot::RwLock;

use super::{AudioProducer, CaptureCallback, ProducerId, ProducerResolver, SubscriptionId};
use crate::frame::AudioData;

/// Host time units per second (nanoseconds).
const TIME_UNITS_PER_SEC: u64 = 1_000_000_000;

/// A producer that emits synthetic frames to its subscribers on demand.
///
/// Subscribers are held behind a read/write lock. [`emit`](Self::emit) holds
/// the read side while callbacks run, so [`unsubscribe`](AudioProducer::unsubscribe)
/// blocks until in-flight callbacks have returned.
///
/// # Example
///
/// ```
/// use channel_relay::{AudioData, AudioProducer, MockProducer, ProducerId};
/// use std::sync::Arc;
///
/// let producer = MockProducer::new("A2", 8, 48000);
/// let sub = producer.subscribe(Arc::new(|_: &ProducerId, data: &AudioData, _: bool| {
///     assert_eq!(data.planes.len(), 8);
/// }));
///
/// producer.emit_sine(440.0, 480);
/// assert!(producer.unsubscribe(sub));
/// ```
pub struct MockProducer {
    id: ProducerId,
    channels: usize,
    sample_rate: u32,
    subscribers: RwLock<Vec<(SubscriptionId, CaptureCallback)>>,
    next_subscription: AtomicU64,
    clock: AtomicU64,
}

impl MockProducer {
    /// Creates a producer with `channels` planes at `sample_rate`.
    pub fn new(id: impl Into<ProducerId>, channels: usize, sample_rate: u32) -> Self {
        Self {
            id: id.into(),
            channels,
            sample_rate,
            subscribers: RwLock::new(Vec::new()),
            next_subscription: AtomicU64::new(1),
            clock: AtomicU64::new(0),
        }
    }

    /// Number of installed callbacks.
    pub fn subscriber_count(&self) -> usize {
        self.subscribers.read().len()
    }

    /// Delivers `data` to every subscriber on the calling thread.
    pub fn emit(&self, data: &AudioData, muted: bool) {
        let subscribers = self.subscribers.read();
        for (_, callback) in subscribers.iter() {
            callback(&self.id, data, muted);
        }
    }

    /// Emits a frame whose plane `i` is filled with `(i + 1) / 10`.
    ///
    /// Handy for checking which planes a consumer picked up.
    pub fn emit_tagged(&self, frames: usize) -> AudioData {
        let planes: Vec<Vec<f32>> = (0..self.channels)
            .map(|i| vec![(i + 1) as f32 / 10.0; frames])
            .collect();
        self.emit_planes(&planes)
    }

    /// Emits silence.
    pub fn emit_silence(&self, frames: usize) -> AudioData {
        self.emit_planes(&vec![vec![0.0; frames]; self.channels])
    }

    /// Emits a sine wave at `frequency`, identical on every plane.
    pub fn emit_sine(&self, frequency: f64, frames: usize) -> AudioData {
        let elapsed = self.clock.load(Ordering::Relaxed);
        let start_frame = elapsed * u64::from(self.sample_rate) / TIME_UNITS_PER_SEC;
        let sample_rate = f64::from(self.sample_rate);

        let wave: Vec<f32> = (0..frames)
            .map(|i| {
                let t = (start_frame + i as u64) as f64 / sample_rate;
                (2.0 * std::f64::consts::PI * frequency * t).sin() as f32
            })
            .collect();

        self.emit_planes(&vec![wave; self.channels])
    }

    /// Emits deterministic white noise with the given peak amplitude.
    pub fn emit_noise(&self, frames: usize, amplitude: f32) -> AudioData {
        // Simple LCG for deterministic "random" noise
        let mut seed: u32 = 12345;
        let planes: Vec<Vec<f32>> = (0..self.channels)
            .map(|_| {
                (0..frames)
                    .map(|_| {
                        seed = seed.wrapping_mul(1_103_515_245).wrapping_add(12345);
                        let random = f32::from((seed >> 16) as u16) / f32::from(u16::MAX);
                        (random * 2.0 - 1.0) * amplitude
                    })
                    .collect()
            })
            .collect();
        self.emit_planes(&planes)
    }

    /// Emits the given float planes, stamping them with the producer clock.
    pub fn emit_planes(&self, planes: &[Vec<f32>]) -> AudioData {
        let frames = planes.iter().map(Vec::len).min().unwrap_or(0);
        let timestamp = self.advance(frames);
        let data = AudioData::from_f32(timestamp, planes);
        self.emit(&data, false);
        data
    }

    /// Advances the producer clock by `frames`, returning the timestamp of
    /// the first of them.
    fn advance(&self, frames: usize) -> u64 {
        let duration = frames as u64 * TIME_UNITS_PER_SEC / u64::from(self.sample_rate.max(1));
        self.clock.fetch_add(duration, Ordering::Relaxed)
    }
}

impl AudioProducer for MockProducer {
    fn id(&self) -> &ProducerId {
        &self.id
    }

    fn subscribe(&self, callback: CaptureCallback) -> SubscriptionId {
        let id = SubscriptionId(self.next_subscription.fetch_add(1, Ordering::Relaxed));
        self.subscribers.write().push((id, callback));
        id
    }

    fn unsubscribe(&self, subscription: SubscriptionId) -> bool {
        let mut subscribers = self.subscribers.write();
        let before = subscribers.len();
        subscribers.retain(|(id, _)| *id != subscription);
        subscribers.len() != before
    }
}

impl std::fmt::Debug for MockProducer {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MockProducer")
            .field("id", &self.id)
            .field("channels", &self.channels)
            .field("sample_rate", &self.sample_rate)
            .field("subscribers", &self.subscriber_count())
            .finish()
    }
}

/// A registry of named producers standing in for the host's source list.
#[derive(Default)]
pub struct MockHost {
    producers: RwLock<HashMap<String, Arc<MockProducer>>>,
}

impl MockHost {
    /// Creates an empty host.
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates and registers a producer, returning it.
    pub fn add_producer(&self, name: &str, channels: usize, sample_rate: u32) -> Arc<MockProducer> {
        let producer = Arc::new(MockProducer::new(name, channels, sample_rate));
        self.producers
            .write()
            .insert(name.to_string(), producer.clone());
        producer
    }

    /// Unregisters a producer. Live handles held elsewhere stay valid.
    pub fn remove_producer(&self, name: &str) -> Option<Arc<MockProducer>> {
        self.producers.write().remove(name)
    }

    /// Registers an existing producer under a new name.
    pub fn rename_producer(&self, from: &str, to: &str) -> bool {
        let mut producers = self.producers.write();
        match producers.remove(from) {
            Some(producer) => {
                producers.insert(to.to_string(), producer);
                true
            }
            None => false,
        }
    }

    /// Names of all registered producers, sorted.
    pub fn producer_names(&self) -> Vec<String> {
        let mut names: Vec<String> = self.producers.read().keys().cloned().collect();
        names.sort();
        names
    }
}

impl ProducerResolver for MockHost {
    fn resolve_by_name(&self, name: &str) -> Option<Arc<dyn AudioProducer>> {
        self.producers
            .read()
            .get(name)
            .map(|p| p.clone() as Arc<dyn AudioProducer>)
    }
}
