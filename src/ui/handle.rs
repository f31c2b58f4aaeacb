//! Explicit cancel handles for shown UI artifacts.
//!
//! Every `show` call on a [`Renderer`](crate::ui::Renderer) returns a
//! [`CancelHandle`]. Invoking it forces the artifact closed. Closure is never
//! tied to dropping the handle: a handle that is dropped without being
//! cancelled leaves the artifact up.

use std::fmt;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex, PoisonError};

type CancelFn = Box<dyn FnOnce() + Send + 'static>;

struct HandleInner {
    cancelled: AtomicBool,
    on_cancel: Mutex<Option<CancelFn>>,
}

/// Shared, idempotent handle that closes one shown artifact.
///
/// Clones refer to the same artifact. The cancel callback runs at most once no
/// matter how many clones are cancelled or how often.
#[derive(Clone)]
pub struct CancelHandle {
    inner: Arc<HandleInner>,
}

impl CancelHandle {
    /// Creates a handle that runs `on_cancel` the first time it is cancelled.
    pub fn new(on_cancel: impl FnOnce() + Send + 'static) -> Self {
        Self {
            inner: Arc::new(HandleInner {
                cancelled: AtomicBool::new(false),
                on_cancel: Mutex::new(Some(Box::new(on_cancel))),
            }),
        }
    }

    /// A handle with nothing behind it.
    pub fn noop() -> Self {
        Self::new(|| {})
    }

    /// Cancels the artifact.
    ///
    /// Returns `true` if this call performed the cancellation and `false` if
    /// the handle had already been cancelled.
    pub fn cancel(&self) -> bool {
        if self.inner.cancelled.swap(true, Ordering::SeqCst) {
            return false;
        }

        // Taken out of the lock first: the callback may re-enter the renderer.
        let callback = self
            .inner
            .on_cancel
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .take();

        if let Some(callback) = callback {
            callback();
        }
        true
    }

    /// Whether the handle has been cancelled.
    pub fn is_cancelled(&self) -> bool {
        self.inner.cancelled.load(Ordering::SeqCst)
    }

    /// Whether both handles refer to the same artifact.
    pub fn same_as(&self, other: &Self) -> bool {
        Arc::ptr_eq(&self.inner, &other.inner)
    }
}

impl fmt::Debug for CancelHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CancelHandle")
            .field("cancelled", &self.is_cancelled())
            .finish_non_exhaustive()
    }
}

impl PartialEq for CancelHandle {
    fn eq(&self, other: &Self) -> bool {
        self.same_as(other)
    }
}

impl Eq for CancelHandle {}
