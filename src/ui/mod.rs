//! Rendering contract between the controller and the host UI.
//!
//! # Modules
//!
//! - [`handle`]: explicit cancel handles returned by every `show` call
//! - [`renderer`]: the [`Renderer`] collaborator trait
//! - [`viewmodel`]: red box, menu, and progress snapshots
//! - [`console`]: a text renderer for terminals and tests

pub mod console;
pub mod handle;
pub mod renderer;
pub mod viewmodel;

pub use console::ConsoleRenderer;
pub use handle::CancelHandle;
pub use renderer::{ClosedCallback, Renderer};
pub use viewmodel::{DevMenuView, MenuEntry, MenuHandleSlot, ProgressView, RedBoxView};
