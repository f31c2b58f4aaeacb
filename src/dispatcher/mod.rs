//! UI-affine execution.
//!
//! Every mutation of overlay and menu state happens on a single logical UI
//! context. Callers on other threads are redirected through a
//! [`UiDispatcher`] instead of touching state directly.
//!
//! # Modules
//!
//! - [`messages`]: [`UiJob`] and cross-thread [`TraceContext`] propagation
//! - [`executor`]: the dispatcher trait and its inline and threaded implementations

pub mod executor;
pub mod messages;

pub use executor::{
    assert_on_ui_context, run_on_ui, spawn_on_ui, InlineDispatcher, ThreadDispatcher, UiDispatcher,
};
pub use messages::{TraceContext, UiJob, UiTask};
