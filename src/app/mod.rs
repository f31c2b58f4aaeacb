//! Application layer: the red box and dev menu state machine.
//!
//! This module sits between the public [`DevSupportManager`](crate::DevSupportManager)
//! and the renderer. It implements a unidirectional flow:
//!
//! ```text
//! Reports / gestures / closed notifications → Events → handle_event → State → Actions
//!                          ↑                                                 ↓
//!                          └────────── renderer handles and callbacks ───────┘
//! ```
//!
//! # Modules
//!
//! - [`actions`]: Side effects emitted by the event handler
//! - [`handler`]: Event processing and state transitions
//! - [`state`]: Overlay and menu state
//!
//! # Example
//!
//! ```rust
//! use devsupport::app::{handle_event, Action, DevSupportState, Event};
//! use devsupport::domain::{ErrorCookie, ErrorReport};
//!
//! let mut state = DevSupportState::new();
//! let report = ErrorReport::new(ErrorCookie::Script(1), "boom", vec![]);
//! let actions = handle_event(&mut state, Event::ReportError(report));
//! assert!(matches!(actions.as_slice(), [Action::ShowRedBox { .. }]));
//! ```

pub mod actions;
pub mod handler;
pub mod state;

pub use actions::Action;
pub use handler::{handle_event, Event};
pub use state::{DevSupportState, MenuState, OverlayState};
