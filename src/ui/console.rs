//! Plain-text renderer for terminals and logs.
//!
//! [`ConsoleRenderer`] writes the red box, the debug menu, and the progress
//! indicator as ANSI-styled lines to any writer. It keeps track of what is
//! currently shown so a host can simulate user interaction: dismissing the
//! red box or picking a menu entry.
//!
//! # Output
//!
//! ```text
//!  RED BOX  Cannot read property 'x' of undefined        (script#3, 14:02:51)
//!     at render (App.js:12:4)
//!     at mount (index.js:3:1)
//!  DEV MENU
//!     [0] Reload JavaScript
//!  Please wait... Fetching JavaScript bundle.
//! ```

use crate::ui::handle::CancelHandle;
use crate::ui::renderer::{ClosedCallback, Renderer};
use crate::ui::viewmodel::{DevMenuView, MenuEntry, ProgressView, RedBoxView};
use std::io::{self, Write};
use std::sync::{Arc, Mutex, PoisonError};

const RESET: &str = "\u{1b}[0m";
const RED_BANNER: &str = "\u{1b}[1;97;41m";
const MENU_BANNER: &str = "\u{1b}[1;30;47m";
const DIM: &str = "\u{1b}[2m";

/// An artifact currently on screen.
struct Surface {
    id: u64,
    on_closed: Option<ClosedCallback>,
}

#[derive(Default)]
struct Surfaces {
    next_id: u64,
    red_box: Option<Surface>,
    menu: Option<(Surface, Vec<MenuEntry>)>,
}

impl Surfaces {
    fn next_id(&mut self) -> u64 {
        self.next_id += 1;
        self.next_id
    }
}

#[derive(Clone, Copy, Debug)]
enum Slot {
    RedBox,
    Menu,
}

type SharedWriter = Arc<Mutex<Box<dyn Write + Send>>>;

/// Renderer that prints to a writer.
#[derive(Clone)]
pub struct ConsoleRenderer {
    out: SharedWriter,
    surfaces: Arc<Mutex<Surfaces>>,
}

impl ConsoleRenderer {
    /// Creates a renderer writing to `out`.
    pub fn new(out: impl Write + Send + 'static) -> Self {
        Self {
            out: Arc::new(Mutex::new(Box::new(out))),
            surfaces: Arc::new(Mutex::new(Surfaces::default())),
        }
    }

    /// Creates a renderer writing to standard error.
    pub fn stderr() -> Self {
        Self::new(io::stderr())
    }

    /// Simulates the user dismissing the red box.
    ///
    /// Returns `false` if no red box is shown.
    pub fn dismiss_red_box(&self) -> bool {
        let id = self.current_id(Slot::RedBox);
        id.is_some_and(|id| close(&self.surfaces, &self.out, Slot::RedBox, id))
    }

    /// Simulates the user closing the debug menu without picking anything.
    pub fn close_menu(&self) -> bool {
        let id = self.current_id(Slot::Menu);
        id.is_some_and(|id| close(&self.surfaces, &self.out, Slot::Menu, id))
    }

    /// Simulates the user picking the menu entry at `index`.
    ///
    /// Returns `false` if no menu is shown, the index is out of range, or the
    /// entry ignored the selection.
    pub fn select_menu_entry(&self, index: usize) -> bool {
        let entry = {
            let surfaces = self.surfaces.lock().unwrap_or_else(PoisonError::into_inner);
            surfaces
                .menu
                .as_ref()
                .and_then(|(_, entries)| entries.get(index).cloned())
        };

        entry.is_some_and(|entry| entry.select())
    }

    /// Whether a red box is currently on screen.
    pub fn is_red_box_shown(&self) -> bool {
        self.current_id(Slot::RedBox).is_some()
    }

    /// Whether the debug menu is currently on screen.
    pub fn is_menu_shown(&self) -> bool {
        self.current_id(Slot::Menu).is_some()
    }

    fn current_id(&self, slot: Slot) -> Option<u64> {
        let surfaces = self.surfaces.lock().unwrap_or_else(PoisonError::into_inner);
        match slot {
            Slot::RedBox => surfaces.red_box.as_ref().map(|s| s.id),
            Slot::Menu => surfaces.menu.as_ref().map(|(s, _)| s.id),
        }
    }

    fn write_red_box(&self, view: &RedBoxView) {
        let mut text = format!(
            "{RED_BANNER} RED BOX {RESET} {}  {DIM}({}, {}){RESET}\n",
            view.title,
            view.cookie,
            view.reported_at.format("%H:%M:%S"),
        );
        for frame in &view.frames {
            text.push_str(&format!("    at {frame}\n"));
        }
        write_text(&self.out, &text);
    }

    fn cancel_handle(&self, slot: Slot, id: u64) -> CancelHandle {
        let surfaces = Arc::clone(&self.surfaces);
        let out = Arc::clone(&self.out);
        CancelHandle::new(move || {
            close(&surfaces, &out, slot, id);
        })
    }
}

/// Removes the surface `id` from `slot` and fires its closed notification.
fn close(surfaces: &Mutex<Surfaces>, out: &SharedWriter, slot: Slot, id: u64) -> bool {
    let on_closed = {
        let mut surfaces = surfaces.lock().unwrap_or_else(PoisonError::into_inner);
        match slot {
            Slot::RedBox if surfaces.red_box.as_ref().is_some_and(|s| s.id == id) => {
                surfaces.red_box.take().and_then(|mut s| s.on_closed.take())
            }
            Slot::Menu if surfaces.menu.as_ref().is_some_and(|(s, _)| s.id == id) => {
                surfaces.menu.take().and_then(|(mut s, _)| s.on_closed.take())
            }
            _ => return false,
        }
    };

    write_text(out, &format!("{DIM}[{slot:?} closed]{RESET}\n"));
    if let Some(on_closed) = on_closed {
        on_closed();
    }
    true
}

fn write_text(out: &SharedWriter, text: &str) {
    let mut out = out.lock().unwrap_or_else(PoisonError::into_inner);
    if let Err(e) = out.write_all(text.as_bytes()).and_then(|()| out.flush()) {
        tracing::debug!(error = %e, "console renderer write failed");
    }
}

impl Renderer for ConsoleRenderer {
    fn show_red_box(&self, view: &RedBoxView, on_closed: ClosedCallback) -> CancelHandle {
        let id = {
            let mut surfaces = self.surfaces.lock().unwrap_or_else(PoisonError::into_inner);
            let id = surfaces.next_id();
            surfaces.red_box = Some(Surface {
                id,
                on_closed: Some(on_closed),
            });
            id
        };

        self.write_red_box(view);
        self.cancel_handle(Slot::RedBox, id)
    }

    fn update_red_box(&self, view: &RedBoxView) {
        if self.is_red_box_shown() {
            self.write_red_box(view);
        }
    }

    fn show_dev_menu(&self, view: &DevMenuView, on_closed: ClosedCallback) -> CancelHandle {
        let id = {
            let mut surfaces = self.surfaces.lock().unwrap_or_else(PoisonError::into_inner);
            let id = surfaces.next_id();
            surfaces.menu = Some((
                Surface {
                    id,
                    on_closed: Some(on_closed),
                },
                view.entries.clone(),
            ));
            id
        };

        let mut text = format!("{MENU_BANNER} DEV MENU {RESET}\n");
        for (index, entry) in view.entries.iter().enumerate() {
            text.push_str(&format!("    [{index}] {}\n", entry.label()));
        }
        write_text(&self.out, &text);

        self.cancel_handle(Slot::Menu, id)
    }

    fn show_progress(&self, view: &ProgressView) -> CancelHandle {
        write_text(&self.out, &format!("{} {}\n", view.title, view.message));

        let out = Arc::clone(&self.out);
        CancelHandle::new(move || write_text(&out, &format!("{DIM}[progress closed]{RESET}\n")))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::{ErrorCookie, StackFrame};
    use chrono::{TimeZone, Utc};
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::OnceLock;

    #[derive(Clone, Default)]
    struct Buffer(Arc<Mutex<Vec<u8>>>);

    impl Write for Buffer {
        fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
            self.0.lock().unwrap().extend_from_slice(buf);
            Ok(buf.len())
        }

        fn flush(&mut self) -> io::Result<()> {
            Ok(())
        }
    }

    impl Buffer {
        fn text(&self) -> String {
            String::from_utf8(self.0.lock().unwrap().clone()).unwrap()
        }
    }

    fn view() -> RedBoxView {
        RedBoxView {
            cookie: ErrorCookie::Script(3),
            title: "undefined is not a function".to_string(),
            frames: vec![StackFrame::new("App.js", "render", 12, 4)],
            reported_at: Utc.with_ymd_and_hms(2024, 5, 1, 14, 2, 51).unwrap(),
        }
    }

    fn counting_callback(count: &Arc<AtomicUsize>) -> ClosedCallback {
        let count = Arc::clone(count);
        Box::new(move || {
            count.fetch_add(1, Ordering::SeqCst);
        })
    }

    #[test]
    fn prints_title_and_frames() {
        let buffer = Buffer::default();
        let renderer = ConsoleRenderer::new(buffer.clone());

        renderer.show_red_box(&view(), Box::new(|| {}));

        let text = buffer.text();
        assert!(text.contains("undefined is not a function"));
        assert!(text.contains("at render (App.js:12:4)"));
        assert!(text.contains("script#3, 14:02:51"));
    }

    #[test]
    fn user_dismiss_and_cancel_fire_closed_once() {
        let closed = Arc::new(AtomicUsize::new(0));
        let renderer = ConsoleRenderer::new(Buffer::default());

        let handle = renderer.show_red_box(&view(), counting_callback(&closed));
        assert!(renderer.dismiss_red_box());
        assert!(handle.cancel());
        assert!(!renderer.dismiss_red_box());

        assert_eq!(closed.load(Ordering::SeqCst), 1);
        assert!(!renderer.is_red_box_shown());
    }

    #[test]
    fn stale_handle_does_not_close_newer_red_box() {
        let renderer = ConsoleRenderer::new(Buffer::default());

        let first = renderer.show_red_box(&view(), Box::new(|| {}));
        renderer.dismiss_red_box();
        renderer.show_red_box(&view(), Box::new(|| {}));
        first.cancel();

        assert!(renderer.is_red_box_shown());
    }

    #[test]
    fn selecting_an_entry_closes_the_menu() {
        let closed = Arc::new(AtomicUsize::new(0));
        let ran = Arc::new(AtomicUsize::new(0));
        let renderer = ConsoleRenderer::new(Buffer::default());

        let slot = Arc::new(OnceLock::new());
        let counter = Arc::clone(&ran);
        let entries = vec![MenuEntry::new("Reload JavaScript", Arc::clone(&slot), move || {
            counter.fetch_add(1, Ordering::SeqCst);
        })];
        let handle = renderer.show_dev_menu(&DevMenuView { entries }, counting_callback(&closed));
        slot.set(handle).unwrap();

        assert!(renderer.select_menu_entry(0));
        assert!(!renderer.select_menu_entry(0));

        assert!(!renderer.is_menu_shown());
        assert_eq!(closed.load(Ordering::SeqCst), 1);
        assert_eq!(ran.load(Ordering::SeqCst), 1);
    }
}
