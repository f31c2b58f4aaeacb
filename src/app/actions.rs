//! Side effects produced by the event handler.
//!
//! [`handle_event`](crate::app::handle_event) never talks to the renderer. It
//! returns a `Vec<Action>` that the [`DevSupportManager`](crate::DevSupportManager)
//! executes in order, outside the state borrow, so renderer callbacks that
//! re-enter the controller synchronously are safe.

use crate::ui::{CancelHandle, RedBoxView};

/// Commands executed by the manager after a state transition.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Action {
    /// Open the red box. The returned handle is fed back as
    /// [`Event::RedBoxShown`](crate::app::Event::RedBoxShown) with the same generation.
    ShowRedBox {
        /// Generation of the overlay being opened.
        generation: u64,
        /// Content to show.
        view: RedBoxView,
    },

    /// Replace the content of the open red box in place.
    UpdateRedBox(RedBoxView),

    /// Open the debug menu. The manager builds the entries, shows them, and
    /// feeds the handle back as [`Event::DevMenuShown`](crate::app::Event::DevMenuShown).
    ShowDevMenu {
        /// Generation of the menu being opened.
        generation: u64,
    },

    /// Invoke a cancel handle: a forced dismiss, or a handle that arrived for
    /// an artifact that is already gone.
    Cancel(CancelHandle),
}
