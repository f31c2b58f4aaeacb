//! Error report coordination: capture, present, update.

use super::{DevSupportManager, Inner};
use crate::app::Event;
use crate::domain::{ErrorCookie, ErrorReport, NativeError, ScriptError};
use serde_json::Value as JsonValue;
use std::error::Error as StdError;
use std::sync::Arc;

impl Inner {
    /// Opens a red box for `report` unless one is already open.
    fn present(self: &Arc<Self>, report: ErrorReport) {
        self.post(Event::ReportError(report));
    }
}

impl DevSupportManager {
    /// Captures an error raised by a native call.
    ///
    /// The red box title is the error's message.
    ///
    /// # Errors
    ///
    /// When developer support is disabled, `error` is handed back unchanged
    /// and nothing is shown.
    #[track_caller]
    pub fn handle_exception<E>(&self, error: E) -> Result<(), E>
    where
        E: StdError + Send + Sync + 'static,
    {
        if !self.is_enabled() {
            return Err(error);
        }

        tracing::error!(error = %error, "exception in native call from script");
        let error = NativeError::new(error);
        let message = error.message();
        self.present_native(message, &error);
        Ok(())
    }

    /// Reports a native error under the reserved native cookie.
    ///
    /// # Errors
    ///
    /// When developer support is disabled, `error` is handed back unchanged
    /// and nothing is shown.
    pub fn report_native_error(&self, message: impl Into<String>, error: NativeError) -> Result<(), NativeError> {
        if !self.is_enabled() {
            return Err(error);
        }

        self.present_native(message.into(), &error);
        Ok(())
    }

    /// Reports an error raised inside the script runtime.
    ///
    /// `stack` is the raw call-stack payload; `id` identifies the report for
    /// later [`update_scripted_error`](Self::update_scripted_error) calls.
    ///
    /// # Errors
    ///
    /// When developer support is disabled, the error is handed back as a
    /// [`ScriptError`] and nothing is shown.
    pub fn report_scripted_error(&self, title: impl Into<String>, stack: JsonValue, id: i64) -> Result<(), ScriptError> {
        let title = title.into();
        if !self.is_enabled() {
            return Err(ScriptError { title, stack, id });
        }

        let frames = self.inner.formatter.format_scripted(&stack);
        tracing::debug!(id, frame_count = frames.len(), "scripted error reported");
        self.inner
            .present(ErrorReport::new(ErrorCookie::Script(id), title, frames));
        Ok(())
    }

    /// Replaces title and stack of the red box owned by report `id`.
    ///
    /// Ignored when the red box was dismissed or belongs to another report.
    pub fn update_scripted_error(&self, title: impl Into<String>, stack: &JsonValue, id: i64) {
        let frames = self.inner.formatter.format_scripted(stack);
        self.inner.post(Event::UpdateScriptError {
            id,
            title: title.into(),
            frames,
        });
    }

    fn present_native(&self, message: String, error: &NativeError) {
        let frames = self.inner.formatter.format_native(error);
        tracing::debug!(location = %error.location(), frame_count = frames.len(), "native error reported");
        self.inner
            .present(ErrorReport::new(ErrorCookie::Native, message, frames));
    }
}
