//! Event handling and state transition logic.
//!
//! This module is the state machine behind the red box and the debug menu. It
//! takes an [`Event`], mutates [`DevSupportState`], and returns the
//! [`Action`]s the manager must perform. It does no I/O and never calls the
//! renderer, which keeps every rule below testable in isolation.
//!
//! # Rules
//!
//! - **First shown wins.** A report arriving while an overlay is open is
//!   dropped, whatever its source. Reports never replace visible content.
//! - **Updates need the owner.** A scripted update applies only if its id owns
//!   the open overlay. Updates for dismissed or superseded reports are ignored.
//! - **Natives have no update path.** Native reports all share one sentinel
//!   cookie, and only the drop-if-open rule applies to them.
//! - **One menu.** Asking for the menu while it is open does nothing.
//! - **Generations gate notifications.** A closed notification or shown handle
//!   for an earlier generation is ignored (and a stray handle is cancelled).

use crate::app::state::DevSupportState;
use crate::app::Action;
use crate::domain::{ErrorCookie, ErrorReport, StackFrame};
use crate::ui::{CancelHandle, MenuEntry};

/// Inputs to the state machine.
#[derive(Debug, Clone)]
pub enum Event {
    /// A new error report: opens the overlay or is dropped.
    ReportError(ErrorReport),

    /// New content for an open scripted report.
    UpdateScriptError {
        /// Report id the update belongs to.
        id: i64,
        /// Replacement title.
        title: String,
        /// Replacement stack.
        frames: Vec<StackFrame>,
    },

    /// The renderer returned the dismiss handle for an overlay.
    RedBoxShown {
        /// Generation the handle belongs to.
        generation: u64,
        /// Handle returned by the renderer.
        handle: CancelHandle,
    },

    /// The renderer reported the overlay closed.
    RedBoxClosed {
        /// Generation of the overlay that closed.
        generation: u64,
    },

    /// Force the overlay closed (reload).
    DismissRedBox,

    /// Open the debug menu unless it is already open.
    ShowDevMenu,

    /// The renderer returned the handle for a menu.
    DevMenuShown {
        /// Generation the handle belongs to.
        generation: u64,
        /// Handle returned by the renderer.
        handle: CancelHandle,
        /// Entries that were shown.
        entries: Vec<MenuEntry>,
    },

    /// The renderer reported the menu closed.
    DevMenuClosed {
        /// Generation of the menu that closed.
        generation: u64,
    },
}

/// Applies `event` to `state` and returns the actions to execute, in order.
///
/// Must only be called on the UI-affine context; the manager asserts this
/// before taking the state.
pub fn handle_event(state: &mut DevSupportState, event: Event) -> Vec<Action> {
    let _span = tracing::debug_span!("handle_event", event_type = event.name()).entered();

    match event {
        Event::ReportError(report) => {
            let overlay = &mut state.overlay;
            if overlay.is_open {
                tracing::debug!(
                    dropped = %report.cookie,
                    owner = ?overlay.cookie,
                    "overlay already open, dropping report"
                );
                return vec![];
            }

            overlay.generation += 1;
            overlay.is_open = true;
            overlay.cookie = Some(report.cookie);
            overlay.title = report.title;
            overlay.frames = report.frames;
            overlay.reported_at = Some(report.reported_at);
            overlay.dismiss_handle = None;

            tracing::debug!(
                cookie = %report.cookie,
                reported_at = %report.reported_at,
                generation = overlay.generation,
                frame_count = overlay.frames.len(),
                "opening red box"
            );

            overlay.view().map_or_else(Vec::new, |view| {
                vec![Action::ShowRedBox {
                    generation: overlay.generation,
                    view,
                }]
            })
        }
        Event::UpdateScriptError { id, title, frames } => {
            let overlay = &mut state.overlay;
            if !overlay.is_owned_by(ErrorCookie::Script(id)) {
                tracing::debug!(id, owner = ?overlay.cookie, "ignoring update for report that does not own the overlay");
                return vec![];
            }

            overlay.title = title;
            overlay.frames = frames;
            overlay
                .view()
                .map_or_else(Vec::new, |view| vec![Action::UpdateRedBox(view)])
        }
        Event::RedBoxShown { generation, handle } => {
            let overlay = &mut state.overlay;
            debug_assert!(
                generation <= overlay.generation,
                "handle for red box generation {generation} that was never opened"
            );

            if overlay.is_open && overlay.generation == generation && overlay.dismiss_handle.is_none() {
                overlay.dismiss_handle = Some(handle);
                vec![]
            } else {
                tracing::debug!(generation, current = overlay.generation, "red box already gone, cancelling stray handle");
                vec![Action::Cancel(handle)]
            }
        }
        Event::RedBoxClosed { generation } => {
            let overlay = &mut state.overlay;
            if overlay.is_open && overlay.generation == generation {
                tracing::debug!(generation, cookie = ?overlay.cookie, "red box closed");
                overlay.close();
            } else {
                tracing::trace!(generation, current = overlay.generation, "stale red box close notification");
            }
            vec![]
        }
        Event::DismissRedBox => {
            let overlay = &mut state.overlay;
            if !overlay.is_open {
                return vec![];
            }

            tracing::debug!(cookie = ?overlay.cookie, "dismissing red box");
            overlay.close().map_or_else(Vec::new, |handle| vec![Action::Cancel(handle)])
        }
        Event::ShowDevMenu => {
            let menu = &mut state.menu;
            if menu.is_open {
                tracing::debug!("dev menu already open");
                return vec![];
            }

            menu.generation += 1;
            menu.is_open = true;
            vec![Action::ShowDevMenu {
                generation: menu.generation,
            }]
        }
        Event::DevMenuShown {
            generation,
            handle,
            entries,
        } => {
            let menu = &mut state.menu;
            debug_assert!(
                generation <= menu.generation,
                "handle for menu generation {generation} that was never opened"
            );

            if menu.is_open && menu.generation == generation && menu.handle.is_none() {
                menu.handle = Some(handle);
                menu.entries = entries;
                vec![]
            } else {
                vec![Action::Cancel(handle)]
            }
        }
        Event::DevMenuClosed { generation } => {
            let menu = &mut state.menu;
            if menu.is_open && menu.generation == generation {
                tracing::debug!(generation, "dev menu closed");
                menu.close();
            }
            vec![]
        }
    }
}

impl Event {
    /// Variant name, for spans.
    const fn name(&self) -> &'static str {
        match self {
            Self::ReportError(_) => "ReportError",
            Self::UpdateScriptError { .. } => "UpdateScriptError",
            Self::RedBoxShown { .. } => "RedBoxShown",
            Self::RedBoxClosed { .. } => "RedBoxClosed",
            Self::DismissRedBox => "DismissRedBox",
            Self::ShowDevMenu => "ShowDevMenu",
            Self::DevMenuShown { .. } => "DevMenuShown",
            Self::DevMenuClosed { .. } => "DevMenuClosed",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn report(cookie: ErrorCookie, title: &str) -> Event {
        Event::ReportError(ErrorReport::new(
            cookie,
            title,
            vec![StackFrame::new("App.js", "render", 1, 1)],
        ))
    }

    fn open(state: &mut DevSupportState, cookie: ErrorCookie, title: &str) -> (u64, CancelHandle) {
        let actions = handle_event(state, report(cookie, title));
        let Some(Action::ShowRedBox { generation, .. }) = actions.first() else {
            panic!("expected ShowRedBox, got {actions:?}");
        };
        let handle = CancelHandle::noop();
        assert!(handle_event(
            state,
            Event::RedBoxShown {
                generation: *generation,
                handle: handle.clone(),
            },
        )
        .is_empty());
        (*generation, handle)
    }

    #[test]
    fn only_the_first_report_opens_the_overlay() {
        let mut state = DevSupportState::new();

        let actions = handle_event(&mut state, report(ErrorCookie::Script(1), "first"));
        assert!(matches!(
            actions.as_slice(),
            [Action::ShowRedBox { generation: 1, view }] if view.title == "first"
        ));

        assert!(handle_event(&mut state, report(ErrorCookie::Script(2), "second")).is_empty());
        assert!(handle_event(&mut state, report(ErrorCookie::Native, "native")).is_empty());

        assert_eq!(state.overlay.cookie, Some(ErrorCookie::Script(1)));
        assert_eq!(state.overlay.title, "first");
    }

    #[test]
    fn update_requires_matching_owner() {
        let mut state = DevSupportState::new();
        open(&mut state, ErrorCookie::Script(7), "original");

        let ignored = handle_event(
            &mut state,
            Event::UpdateScriptError {
                id: 8,
                title: "stale".to_string(),
                frames: vec![],
            },
        );
        assert!(ignored.is_empty());
        assert_eq!(state.overlay.title, "original");
        assert_eq!(state.overlay.frames.len(), 1);

        let applied = handle_event(
            &mut state,
            Event::UpdateScriptError {
                id: 7,
                title: "symbolicated".to_string(),
                frames: vec![],
            },
        );
        assert!(matches!(applied.as_slice(), [Action::UpdateRedBox(view)] if view.title == "symbolicated"));
        assert!(state.overlay.frames.is_empty());
    }

    #[test]
    fn red_box_keeps_the_capture_time_across_updates() {
        let mut state = DevSupportState::new();
        let report = ErrorReport::new(ErrorCookie::Script(4), "original", vec![]);
        let captured = report.reported_at;

        let actions = handle_event(&mut state, Event::ReportError(report));
        assert!(matches!(
            actions.as_slice(),
            [Action::ShowRedBox { view, .. }] if view.reported_at == captured
        ));

        let updated = handle_event(
            &mut state,
            Event::UpdateScriptError {
                id: 4,
                title: "symbolicated".to_string(),
                frames: vec![],
            },
        );
        assert!(matches!(updated.as_slice(), [Action::UpdateRedBox(view)] if view.reported_at == captured));

        handle_event(&mut state, Event::DismissRedBox);
        assert_eq!(state.overlay.reported_at, None);
    }

    #[test]
    fn native_reports_have_no_update_path() {
        let mut state = DevSupportState::new();
        open(&mut state, ErrorCookie::Native, "native");

        let actions = handle_event(
            &mut state,
            Event::UpdateScriptError {
                id: -1,
                title: "hijack".to_string(),
                frames: vec![],
            },
        );

        assert!(actions.is_empty());
        assert_eq!(state.overlay.title, "native");
    }

    #[test]
    fn update_after_dismiss_does_not_resurrect() {
        let mut state = DevSupportState::new();
        let (generation, _) = open(&mut state, ErrorCookie::Script(3), "boom");

        handle_event(&mut state, Event::RedBoxClosed { generation });
        let actions = handle_event(
            &mut state,
            Event::UpdateScriptError {
                id: 3,
                title: "late".to_string(),
                frames: vec![],
            },
        );

        assert!(actions.is_empty());
        assert!(!state.overlay.is_open);
        assert!(state.overlay.dismiss_handle.is_none());
    }

    #[test]
    fn report_after_close_opens_a_new_generation() {
        let mut state = DevSupportState::new();
        let (first, _) = open(&mut state, ErrorCookie::Script(1), "one");
        handle_event(&mut state, Event::RedBoxClosed { generation: first });

        let (second, _) = open(&mut state, ErrorCookie::Script(2), "two");

        assert!(second > first);
        assert_eq!(state.overlay.cookie, Some(ErrorCookie::Script(2)));
    }

    #[test]
    fn stale_close_notification_keeps_newer_overlay() {
        let mut state = DevSupportState::new();
        let (first, _) = open(&mut state, ErrorCookie::Script(1), "one");
        handle_event(&mut state, Event::DismissRedBox);
        open(&mut state, ErrorCookie::Script(2), "two");

        handle_event(&mut state, Event::RedBoxClosed { generation: first });

        assert!(state.overlay.is_open);
        assert_eq!(state.overlay.title, "two");
    }

    #[test]
    fn dismiss_cancels_the_stored_handle() {
        let mut state = DevSupportState::new();
        let (_, handle) = open(&mut state, ErrorCookie::Native, "boom");

        let actions = handle_event(&mut state, Event::DismissRedBox);

        assert_eq!(actions, vec![Action::Cancel(handle)]);
        assert!(!state.overlay.is_open);
        assert!(handle_event(&mut state, Event::DismissRedBox).is_empty());
    }

    #[test]
    fn handle_for_closed_overlay_is_cancelled() {
        let mut state = DevSupportState::new();
        let actions = handle_event(&mut state, report(ErrorCookie::Native, "boom"));
        let [Action::ShowRedBox { generation, .. }] = actions.as_slice() else {
            panic!("expected ShowRedBox");
        };

        // Renderer closed it synchronously before returning the handle.
        handle_event(&mut state, Event::RedBoxClosed { generation: *generation });
        let stray = CancelHandle::noop();
        let actions = handle_event(
            &mut state,
            Event::RedBoxShown {
                generation: *generation,
                handle: stray.clone(),
            },
        );

        assert_eq!(actions, vec![Action::Cancel(stray)]);
        assert!(state.overlay.dismiss_handle.is_none());
    }

    #[test]
    fn menu_opens_once_until_closed() {
        let mut state = DevSupportState::new();

        let first = handle_event(&mut state, Event::ShowDevMenu);
        assert_eq!(first, vec![Action::ShowDevMenu { generation: 1 }]);
        assert!(handle_event(&mut state, Event::ShowDevMenu).is_empty());

        handle_event(
            &mut state,
            Event::DevMenuShown {
                generation: 1,
                handle: CancelHandle::noop(),
                entries: vec![],
            },
        );
        handle_event(&mut state, Event::DevMenuClosed { generation: 1 });
        assert!(!state.menu.is_open);
        assert!(state.menu.handle.is_none());

        assert_eq!(
            handle_event(&mut state, Event::ShowDevMenu),
            vec![Action::ShowDevMenu { generation: 2 }]
        );
    }
}
