//! Error report model: stack frames, cookies, and captured errors.
//!
//! A report is what the red box displays. Reports come from two sources:
//!
//! - **Native**: a Rust error raised by host code while running application
//!   logic, captured as a [`NativeError`].
//! - **Scripted**: an error raised inside the embedded script runtime, arriving
//!   as a title, an opaque JSON stack payload, and a numeric report id
//!   ([`ScriptError`]).
//!
//! Every report carries an [`ErrorCookie`] identifying the owner of the overlay
//! it opens, which is how stale updates are rejected.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::error::Error as StdError;
use std::fmt;
use std::panic::Location;

/// One formatted frame of a call stack.
///
/// Produced by a [`StackTraceFormatter`](crate::domain::StackTraceFormatter)
/// and carried verbatim to the renderer.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StackFrame {
    /// Source file or module the frame belongs to.
    pub file: String,
    /// Function or method name.
    pub method_name: String,
    /// One-based line number, `0` when unknown.
    pub line: u32,
    /// One-based column number, `0` when unknown.
    pub column: u32,
}

impl StackFrame {
    /// Creates a frame from its parts.
    pub fn new(file: impl Into<String>, method_name: impl Into<String>, line: u32, column: u32) -> Self {
        Self {
            file: file.into(),
            method_name: method_name.into(),
            line,
            column,
        }
    }
}

impl fmt::Display for StackFrame {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} ({}:{}:{})", self.method_name, self.file, self.line, self.column)
    }
}

/// Identifies the report that owns the open overlay.
///
/// The native variant is a reserved sentinel shared by every native report, so
/// it can never collide with a scripted id. Internal cookies are minted by the
/// controller itself (reload failures) and are unique per process.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ErrorCookie {
    /// Any error captured from native code.
    Native,
    /// A scripted error report, keyed by the id the script runtime assigned.
    Script(i64),
    /// A report raised by the controller itself.
    Internal(u64),
}

impl fmt::Display for ErrorCookie {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Native => f.write_str("native"),
            Self::Script(id) => write!(f, "script#{id}"),
            Self::Internal(id) => write!(f, "internal#{id}"),
        }
    }
}

/// An error captured from native code, together with where it was captured.
///
/// The wrapped error is kept intact so that, when the controller is disabled,
/// it can be handed back to the caller unchanged via [`NativeError::into_inner`].
pub struct NativeError {
    inner: Box<dyn StdError + Send + Sync + 'static>,
    location: &'static Location<'static>,
}

impl NativeError {
    /// Captures `error`, recording the caller's source location.
    #[track_caller]
    pub fn new<E>(error: E) -> Self
    where
        E: Into<Box<dyn StdError + Send + Sync + 'static>>,
    {
        Self {
            inner: error.into(),
            location: Location::caller(),
        }
    }

    /// The error message, as shown in the red box title.
    pub fn message(&self) -> String {
        self.inner.to_string()
    }

    /// Source location where the error was captured.
    pub const fn location(&self) -> &'static Location<'static> {
        self.location
    }

    /// Borrows the wrapped error.
    pub fn get_ref(&self) -> &(dyn StdError + Send + Sync + 'static) {
        self.inner.as_ref()
    }

    /// Iterates over the wrapped error and its chain of sources.
    pub fn chain(&self) -> impl Iterator<Item = &(dyn StdError + 'static)> {
        let first: &(dyn StdError + 'static) = self.inner.as_ref();
        std::iter::successors(Some(first), |err: &&(dyn StdError + 'static)| {
            let err: &(dyn StdError + 'static) = *err;
            err.source()
        })
    }

    /// Unwraps the original error.
    pub fn into_inner(self) -> Box<dyn StdError + Send + Sync + 'static> {
        self.inner
    }
}

impl fmt::Debug for NativeError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("NativeError")
            .field("inner", &self.inner)
            .field("location", &format_args!("{}", self.location))
            .finish()
    }
}

impl fmt::Display for NativeError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Display::fmt(&self.inner, f)
    }
}

impl StdError for NativeError {
    fn source(&self) -> Option<&(dyn StdError + 'static)> {
        self.inner.source()
    }
}

/// An error raised inside the embedded script runtime.
///
/// Returned unchanged from
/// [`DevSupportManager::report_scripted_error`](crate::DevSupportManager::report_scripted_error)
/// when the controller is disabled.
#[derive(Debug, Clone, PartialEq)]
pub struct ScriptError {
    /// Error title (usually the exception message).
    pub title: String,
    /// Raw call-stack payload as delivered by the script runtime.
    pub stack: serde_json::Value,
    /// Report id assigned by the script runtime.
    pub id: i64,
}

impl fmt::Display for ScriptError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} (report {})", self.title, self.id)
    }
}

impl StdError for ScriptError {}

/// A formatted report ready to be presented.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ErrorReport {
    /// Owner identity for the overlay this report may open.
    pub cookie: ErrorCookie,
    /// Red box title.
    pub title: String,
    /// Formatted call stack.
    pub frames: Vec<StackFrame>,
    /// When the report was captured.
    pub reported_at: DateTime<Utc>,
}

impl ErrorReport {
    /// Creates a report stamped with the current time.
    pub fn new(cookie: ErrorCookie, title: impl Into<String>, frames: Vec<StackFrame>) -> Self {
        Self {
            cookie,
            title: title.into(),
            frames,
            reported_at: Utc::now(),
        }
    }
}
