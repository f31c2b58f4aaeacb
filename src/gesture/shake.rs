//! Accelerometer shake detection.
//!
//! Feed raw samples into [`ShakeDetector::on_sample`]. A sample whose
//! magnitude exceeds [`ShakeConfig::threshold_g`] is a jolt. Once
//! `min_jolts` jolts land inside `window`, every subscriber is notified and
//! the jolt history is cleared, so one vigorous shake raises one event.

use crate::gesture::{GestureHandler, GestureSource, Subscription};
use std::collections::VecDeque;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex, PoisonError, Weak};
use std::time::Duration;

/// Tuning for [`ShakeDetector`].
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ShakeConfig {
    /// Acceleration magnitude, in g, above which a sample is a jolt.
    pub threshold_g: f64,
    /// Jolts needed inside `window` to count as a shake.
    pub min_jolts: usize,
    /// Sliding window the jolts must fall in.
    pub window: Duration,
}

impl Default for ShakeConfig {
    fn default() -> Self {
        Self {
            threshold_g: 2.7,
            min_jolts: 3,
            window: Duration::from_millis(500),
        }
    }
}

/// One accelerometer reading.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct AccelerationSample {
    /// X axis, in g.
    pub x: f64,
    /// Y axis, in g.
    pub y: f64,
    /// Z axis, in g.
    pub z: f64,
    /// Monotonic time of the reading.
    pub timestamp: Duration,
}

impl AccelerationSample {
    /// Euclidean norm of the reading.
    pub fn magnitude(&self) -> f64 {
        (self.x * self.x + self.y * self.y + self.z * self.z).sqrt()
    }
}

struct Inner {
    config: ShakeConfig,
    jolts: Mutex<VecDeque<Duration>>,
    subscribers: Mutex<Vec<(u64, GestureHandler)>>,
    next_id: AtomicU64,
}

/// Turns accelerometer samples into shake events.
#[derive(Clone)]
pub struct ShakeDetector {
    inner: Arc<Inner>,
}

impl ShakeDetector {
    /// Creates a detector with the given tuning.
    pub fn new(config: ShakeConfig) -> Self {
        Self {
            inner: Arc::new(Inner {
                config,
                jolts: Mutex::new(VecDeque::new()),
                subscribers: Mutex::new(Vec::new()),
                next_id: AtomicU64::new(0),
            }),
        }
    }

    /// Processes one reading. Returns `true` if it completed a shake.
    pub fn on_sample(&self, sample: AccelerationSample) -> bool {
        let config = self.inner.config;
        if sample.magnitude() <= config.threshold_g {
            return false;
        }

        let shaken = {
            let mut jolts = self.inner.jolts.lock().unwrap_or_else(PoisonError::into_inner);
            while jolts
                .front()
                .is_some_and(|&first| sample.timestamp.saturating_sub(first) > config.window)
            {
                jolts.pop_front();
            }
            jolts.push_back(sample.timestamp);

            let shaken = jolts.len() >= config.min_jolts;
            if shaken {
                jolts.clear();
            }
            shaken
        };

        if shaken {
            tracing::debug!(magnitude = sample.magnitude(), "shake detected");
            self.notify();
        }
        shaken
    }

    /// Number of live subscriptions.
    pub fn subscriber_count(&self) -> usize {
        self.inner
            .subscribers
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .len()
    }

    fn notify(&self) {
        // Handlers run outside the lock so they may subscribe or unsubscribe.
        let handlers: Vec<GestureHandler> = self
            .inner
            .subscribers
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .iter()
            .map(|(_, handler)| Arc::clone(handler))
            .collect();

        for handler in handlers {
            handler();
        }
    }
}

impl Default for ShakeDetector {
    fn default() -> Self {
        Self::new(ShakeConfig::default())
    }
}

impl GestureSource for ShakeDetector {
    fn subscribe(&self, handler: GestureHandler) -> Option<Subscription> {
        let id = self.inner.next_id.fetch_add(1, Ordering::Relaxed);
        self.inner
            .subscribers
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push((id, handler));

        let weak: Weak<Inner> = Arc::downgrade(&self.inner);
        Some(Subscription::new(move || {
            if let Some(inner) = weak.upgrade() {
                inner
                    .subscribers
                    .lock()
                    .unwrap_or_else(PoisonError::into_inner)
                    .retain(|(other, _)| *other != id);
            }
        }))
    }
}
