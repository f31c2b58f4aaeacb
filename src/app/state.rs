//! Overlay and menu state.
//!
//! [`DevSupportState`] is the single-owner model behind the controller. It
//! holds at most one open red box ([`OverlayState`]) and at most one open debug
//! menu ([`MenuState`]). Only [`handle_event`](crate::app::handle_event) mutates
//! it, and only while running on the UI-affine context.
//!
//! # Generations
//!
//! Each time an overlay or menu opens, its `generation` increases. Closed
//! notifications and late-arriving cancel handles carry the generation they
//! belong to, so a notification for an artifact that is already gone can never
//! close its successor.

use crate::domain::{ErrorCookie, StackFrame};
use crate::ui::{CancelHandle, MenuEntry, RedBoxView};
use chrono::{DateTime, Utc};

/// The red box overlay.
///
/// Invariant: `dismiss_handle` is `Some` only while `is_open`, and `cookie` is
/// `Some` exactly while `is_open`.
#[derive(Debug, Default)]
pub struct OverlayState {
    /// Whether an overlay is on screen.
    pub is_open: bool,

    /// Owner of the open overlay.
    pub cookie: Option<ErrorCookie>,

    /// Title currently displayed.
    pub title: String,

    /// Stack currently displayed.
    pub frames: Vec<StackFrame>,

    /// When the owning report was captured. Updates keep it.
    pub reported_at: Option<DateTime<Utc>>,

    /// Handle that forces the open overlay closed.
    pub dismiss_handle: Option<CancelHandle>,

    /// Incremented every time an overlay opens.
    pub generation: u64,
}

impl OverlayState {
    /// Snapshot of the open overlay for the renderer.
    pub fn view(&self) -> Option<RedBoxView> {
        let cookie = self.cookie.filter(|_| self.is_open)?;
        Some(RedBoxView {
            cookie,
            title: self.title.clone(),
            frames: self.frames.clone(),
            reported_at: self.reported_at?,
        })
    }

    /// Whether `cookie` owns the open overlay.
    pub fn is_owned_by(&self, cookie: ErrorCookie) -> bool {
        self.is_open && self.cookie == Some(cookie)
    }

    pub(crate) fn close(&mut self) -> Option<CancelHandle> {
        self.is_open = false;
        self.cookie = None;
        self.title.clear();
        self.frames.clear();
        self.reported_at = None;
        self.dismiss_handle.take()
    }
}

/// The debug menu.
#[derive(Debug, Default)]
pub struct MenuState {
    /// Whether the menu is on screen.
    pub is_open: bool,

    /// Entries of the open menu, in display order.
    pub entries: Vec<MenuEntry>,

    /// Handle that forces the open menu closed.
    pub handle: Option<CancelHandle>,

    /// Incremented every time a menu opens.
    pub generation: u64,
}

impl MenuState {
    pub(crate) fn close(&mut self) -> Option<CancelHandle> {
        self.is_open = false;
        self.entries.clear();
        self.handle.take()
    }
}

/// Everything the controller shows, owned by the UI-affine context.
#[derive(Debug, Default)]
pub struct DevSupportState {
    /// The red box.
    pub overlay: OverlayState,
    /// The debug menu.
    pub menu: MenuState,
}

impl DevSupportState {
    /// Creates an empty state: nothing shown.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }
}
