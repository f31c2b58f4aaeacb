//! View models handed to the renderer.
//!
//! The controller decides *what* is shown; these types are the snapshot a
//! [`Renderer`](crate::ui::Renderer) turns into pixels or text. They carry no
//! presentation detail beyond the strings and frames themselves.

use crate::domain::{ErrorCookie, StackFrame};
use crate::ui::handle::CancelHandle;
use chrono::{DateTime, Utc};
use std::fmt;
use std::sync::{Arc, OnceLock};

/// Content of the red box overlay.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RedBoxView {
    /// Report owning the overlay.
    pub cookie: ErrorCookie,
    /// Error title.
    pub title: String,
    /// Formatted call stack.
    pub frames: Vec<StackFrame>,
    /// When the report was captured.
    pub reported_at: DateTime<Utc>,
}

/// Content of the reload progress indicator.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProgressView {
    /// Dialog title.
    pub title: String,
    /// Body text.
    pub message: String,
    /// Whether the user may dismiss it. Always `false` for reloads.
    pub cancellable: bool,
}

impl ProgressView {
    /// The indeterminate, non-cancellable indicator shown while reloading.
    pub fn reloading() -> Self {
        Self {
            title: "Please wait...".to_string(),
            message: "Fetching JavaScript bundle.".to_string(),
            cancellable: false,
        }
    }
}

/// Content of the debug menu.
#[derive(Debug, Clone)]
pub struct DevMenuView {
    /// Entries in display order.
    pub entries: Vec<MenuEntry>,
}

/// Late-bound slot holding the cancel handle of the menu an entry belongs to.
///
/// Entries are built before the menu is shown, so the handle is filled in once
/// the renderer returns it.
pub type MenuHandleSlot = Arc<OnceLock<CancelHandle>>;

/// One selectable debug-menu entry.
///
/// Selecting an entry closes its menu first and only then runs the bound
/// operation. A second selection after the menu closed does nothing.
#[derive(Clone)]
pub struct MenuEntry {
    label: String,
    menu: MenuHandleSlot,
    action: Arc<dyn Fn() + Send + Sync>,
}

impl MenuEntry {
    /// Creates an entry bound to `action`, closing the menu held by `menu`.
    pub fn new(
        label: impl Into<String>,
        menu: MenuHandleSlot,
        action: impl Fn() + Send + Sync + 'static,
    ) -> Self {
        Self {
            label: label.into(),
            menu,
            action: Arc::new(action),
        }
    }

    /// Text shown for the entry.
    pub fn label(&self) -> &str {
        &self.label
    }

    /// Invoked by the renderer when the user picks this entry.
    ///
    /// Returns `false` if the menu is not shown yet or had already been
    /// closed, in which case the selection is ignored.
    pub fn select(&self) -> bool {
        let Some(menu) = self.menu.get() else {
            tracing::debug!(entry = %self.label, "menu not shown yet, ignoring selection");
            return false;
        };
        if !menu.cancel() {
            tracing::debug!(entry = %self.label, "menu already closed, ignoring selection");
            return false;
        }

        tracing::debug!(entry = %self.label, "dev menu entry selected");
        (self.action)();
        true
    }
}

impl fmt::Debug for MenuEntry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("MenuEntry")
            .field("label", &self.label)
            .finish_non_exhaustive()
    }
}
