//! Renderer collaborator contract.
//!
//! The controller never draws anything. It hands view models to a
//! [`Renderer`] and keeps the [`CancelHandle`] it gets back. Renderers report
//! user-initiated closure through the `on_closed` callback and must never
//! reach into controller state.
//!
//! # Contract
//!
//! - `show_*` returns immediately; the artifact may appear later.
//! - Cancelling the returned handle closes the artifact. For the red box and
//!   the menu, `on_closed` must then be invoked exactly once, whether the
//!   closure was user-initiated or forced through the handle.
//! - `on_closed` may be invoked from any thread, including synchronously from
//!   inside `show_*` or inside the cancel callback.

use crate::ui::handle::CancelHandle;
use crate::ui::viewmodel::{DevMenuView, ProgressView, RedBoxView};

/// Notification fired once when a shown artifact closes.
pub type ClosedCallback = Box<dyn FnOnce() + Send + 'static>;

/// Presents overlays, menus, and progress indicators.
pub trait Renderer: Send + Sync {
    /// Opens the red box overlay.
    fn show_red_box(&self, view: &RedBoxView, on_closed: ClosedCallback) -> CancelHandle;

    /// Replaces the content of the open red box without re-opening it.
    fn update_red_box(&self, view: &RedBoxView);

    /// Opens the debug menu.
    fn show_dev_menu(&self, view: &DevMenuView, on_closed: ClosedCallback) -> CancelHandle;

    /// Shows an indeterminate progress indicator.
    fn show_progress(&self, view: &ProgressView) -> CancelHandle;
}
