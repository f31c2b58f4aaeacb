//! Stack trace formatting collaborator.
//!
//! The controller never interprets raw call-stack data itself. It asks a
//! [`StackTraceFormatter`] to turn either a scripted payload or a captured
//! [`NativeError`] into [`StackFrame`]s and carries the result verbatim.
//!
//! [`DefaultStackTraceFormatter`] understands the usual script-runtime payload:
//!
//! ```json
//! [
//!   { "methodName": "render", "file": "App.js", "lineNumber": 12, "column": 4 },
//!   { "methodName": "mount", "file": "index.js", "lineNumber": 3, "column": 1 }
//! ]
//! ```

use crate::domain::report::{NativeError, StackFrame};
use serde_json::Value as JsonValue;

/// Placeholder used when a frame omits its file or method name.
const UNKNOWN: &str = "<unknown>";

/// Converts raw call-stack data into displayable frames.
///
/// Implementations may be called from any thread; formatting happens before a
/// report is marshalled onto the UI-affine context.
pub trait StackTraceFormatter: Send + Sync {
    /// Formats the opaque stack payload delivered with a scripted error.
    fn format_scripted(&self, payload: &JsonValue) -> Vec<StackFrame>;

    /// Formats a captured native error.
    fn format_native(&self, error: &NativeError) -> Vec<StackFrame>;
}

/// Formatter for the JSON frame-array payload and Rust error chains.
#[derive(Debug, Default, Clone, Copy)]
pub struct DefaultStackTraceFormatter;

impl DefaultStackTraceFormatter {
    fn frame_from_json(frame: &JsonValue) -> Option<StackFrame> {
        let object = frame.as_object()?;

        let text = |key: &str| {
            object
                .get(key)
                .and_then(JsonValue::as_str)
                .filter(|s| !s.is_empty())
                .unwrap_or(UNKNOWN)
                .to_string()
        };
        let number = |keys: &[&str]| {
            keys.iter()
                .find_map(|key| object.get(*key).and_then(JsonValue::as_f64))
                .filter(|n| n.is_finite() && *n >= 0.0)
                .map_or(0, |n| n.min(f64::from(u32::MAX)) as u32)
        };

        Some(StackFrame {
            file: text("file"),
            method_name: text("methodName"),
            line: number(&["lineNumber", "line"]),
            column: number(&["column", "columnNumber"]),
        })
    }
}

impl StackTraceFormatter for DefaultStackTraceFormatter {
    fn format_scripted(&self, payload: &JsonValue) -> Vec<StackFrame> {
        let Some(frames) = payload.as_array() else {
            tracing::debug!(payload_kind = ?payload, "scripted stack payload is not an array");
            return Vec::new();
        };

        frames.iter().filter_map(Self::frame_from_json).collect()
    }

    fn format_native(&self, error: &NativeError) -> Vec<StackFrame> {
        let location = error.location();
        let mut frames = vec![StackFrame::new(
            location.file(),
            error.message(),
            location.line(),
            location.column(),
        )];

        frames.extend(
            error
                .chain()
                .skip(1)
                .map(|cause| StackFrame::new("<caused by>", cause.to_string(), 0, 0)),
        );

        frames
    }
}
