//! Gesture capability.
//!
//! The controller does not talk to sensors. It subscribes once to a
//! [`GestureSource`] and keeps the returned [`Subscription`] for its lifetime.
//! A source without hardware support returns `None` from
//! [`GestureSource::subscribe`], which the controller treats as "no gesture",
//! not as a failure.

pub mod shake;

pub use shake::{AccelerationSample, ShakeConfig, ShakeDetector};

use std::fmt;
use std::sync::Arc;

/// Callback raised for every recognised gesture.
pub type GestureHandler = Arc<dyn Fn() + Send + Sync + 'static>;

/// Something that can report a shake gesture.
pub trait GestureSource {
    /// Registers `handler`. Returns `None` when the gesture is unsupported.
    fn subscribe(&self, handler: GestureHandler) -> Option<Subscription>;
}

/// Keeps a gesture handler registered until dropped.
pub struct Subscription {
    unsubscribe: Option<Box<dyn FnOnce() + Send + 'static>>,
}

impl Subscription {
    /// Creates a subscription that runs `unsubscribe` when dropped.
    pub fn new(unsubscribe: impl FnOnce() + Send + 'static) -> Self {
        Self {
            unsubscribe: Some(Box::new(unsubscribe)),
        }
    }
}

impl Drop for Subscription {
    fn drop(&mut self) {
        if let Some(unsubscribe) = self.unsubscribe.take() {
            unsubscribe();
        }
    }
}

impl fmt::Debug for Subscription {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Subscription")
            .field("active", &self.unsubscribe.is_some())
            .finish()
    }
}

/// Source for hosts without an accelerometer.
#[derive(Debug, Default, Clone, Copy)]
pub struct NoGesture;

impl GestureSource for NoGesture {
    fn subscribe(&self, _handler: GestureHandler) -> Option<Subscription> {
        tracing::debug!("no gesture hardware, shake menu disabled");
        None
    }
}
