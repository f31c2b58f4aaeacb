//! Debug menu controller.

use super::{DevSupportManager, Inner};
use crate::app::Event;
use crate::dispatcher::run_on_ui;
use crate::ui::{DevMenuView, MenuEntry, MenuHandleSlot};
use std::sync::{Arc, OnceLock};

const RELOAD_LABEL: &str = "Reload JavaScript";

impl Inner {
    pub(super) fn show_dev_menu(self: &Arc<Self>) {
        let inner = Arc::clone(self);
        run_on_ui(self.dispatcher.as_ref(), move || {
            if !inner.is_enabled() {
                tracing::debug!("developer support disabled, not showing dev menu");
                return;
            }
            inner.apply(Event::ShowDevMenu);
        });
    }

    /// Builds the entries, shows the menu, and records its handle.
    pub(super) fn open_menu(self: &Arc<Self>, generation: u64) {
        let slot: MenuHandleSlot = Arc::new(OnceLock::new());
        let entries = self.menu_entries(&slot);

        let weak = Arc::downgrade(self);
        let handle = self.renderer.show_dev_menu(
            &DevMenuView {
                entries: entries.clone(),
            },
            Box::new(move || Self::post_weak(&weak, Event::DevMenuClosed { generation })),
        );

        // The slot is fresh, so this cannot fail.
        let _ = slot.set(handle.clone());
        self.apply(Event::DevMenuShown {
            generation,
            handle,
            entries,
        });
    }

    fn menu_entries(self: &Arc<Self>, slot: &MenuHandleSlot) -> Vec<MenuEntry> {
        let weak = Arc::downgrade(self);
        vec![MenuEntry::new(RELOAD_LABEL, Arc::clone(slot), move || {
            if let Some(inner) = weak.upgrade() {
                inner.request_reload();
            }
        })]
    }
}

impl DevSupportManager {
    /// Opens the debug menu.
    ///
    /// Does nothing while a menu is already open or developer support is
    /// disabled. Each entry closes the menu before running.
    pub fn show_dev_menu(&self) {
        self.inner.show_dev_menu();
    }
}
