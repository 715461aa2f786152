//! Producer abstraction - the seam between the relay and the host.
//!
//! The host owns producers and their audio threads. The relay only needs
//! two things from it: a way to subscribe a capture callback to a producer,
//! and a way to look a producer up by name.

mod mock;
mod source_id;

pub use mock::{MockHost, MockProducer};
pub use source_id::ProducerId;

use std::sync::Arc;

use crate::frame::AudioData;

/// Callback invoked on the producer thread for every frame it emits.
///
/// Arguments are the emitting producer, the frame and the producer's mute state.
pub type CaptureCallback = Arc<dyn Fn(&ProducerId, &AudioData, bool) + Send + Sync>;

/// Handle identifying one installed capture callback.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct SubscriptionId(pub u64);

/// An upstream audio source that frames can be captured from.
///
/// # Implementation Notes
///
/// - `unsubscribe` must be synchronous: once it returns, the callback must
///   not be running and must never be invoked again
/// - Callbacks may be invoked from any thread, concurrently with
///   `subscribe` / `unsubscribe` calls for other subscriptions
pub trait AudioProducer: Send + Sync {
    /// The name the host knows this producer by.
    fn id(&self) -> &ProducerId;

    /// Installs `callback` and returns a handle for removing it.
    fn subscribe(&self, callback: CaptureCallback) -> SubscriptionId;

    /// Removes a previously installed callback.
    ///
    /// Returns `false` if the subscription was not installed.
    fn unsubscribe(&self, subscription: SubscriptionId) -> bool;
}

/// Looks producers up by name.
///
/// Resolution failing is a normal outcome (the producer was renamed or
/// removed), not an error.
pub trait ProducerResolver: Send + Sync {
    /// Returns a live handle to the named producer, if one exists.
    fn resolve_by_name(&self, name: &str) -> Option<Arc<dyn AudioProducer>>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_traits_are_object_safe_and_send_sync() {
        fn assert_send_sync<T: Send + Sync + ?Sized>() {}
        assert_send_sync::<dyn AudioProducer>();
        assert_send_sync::<dyn ProducerResolver>();
        assert_send_sync::<CaptureCallback>();
    }
}
