//! Error types for the developer-support controller.
//!
//! This module defines the centralized error type [`DevSupportError`], the
//! remote-fetch failure type [`FetchError`], and a [`Result`] alias used
//! throughout the crate. All errors are implemented with `thiserror`.
//!
//! Errors raised by *application logic* are not represented here: those are
//! captured as [`NativeError`](crate::domain::NativeError) or
//! [`ScriptError`](crate::domain::ScriptError) and surfaced through the red box.
//! Affinity violations are programming errors and panic instead of returning
//! an error.

use thiserror::Error;

/// Failure reported by a [`BundleFetcher`](crate::bundle::BundleFetcher).
///
/// The variants mirror what a development server round trip can go wrong
/// with. Their `Display` output becomes part of the red box title when a
/// reload fails.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum FetchError {
    /// Connection refused, DNS failure, reset stream and the like.
    #[error("network error: {0}")]
    Network(String),

    /// The server did not answer in time.
    #[error("timed out after {after_ms} ms")]
    Timeout {
        /// Elapsed time before giving up, in milliseconds.
        after_ms: u64,
    },

    /// The server answered with a non-success status.
    #[error("development server returned {status}: {message}")]
    Server {
        /// HTTP status code.
        status: u16,
        /// Body or reason phrase returned by the server.
        message: String,
    },
}

/// The main error type for developer-support operations.
#[derive(Debug, Error)]
pub enum DevSupportError {
    /// Fetching the bundle from the development server failed.
    #[error("Bundle fetch failed: {0}")]
    Fetch(#[from] FetchError),

    /// Reloading from the local bundle file failed.
    #[error("Bundle file reload failed: {0}")]
    BundleFile(String),

    /// The reload was abandoned because the controller shut down mid-flight.
    #[error("Reload cancelled")]
    Cancelled,

    /// A collaborator feature that is intentionally not provided.
    ///
    /// Returned instead of a silent default so callers can tell "empty" apart
    /// from "not implemented here".
    #[error("Not available: {0}")]
    Unavailable(&'static str),

    /// The UI-affine context can no longer accept work.
    #[error("UI dispatcher error: {0}")]
    Dispatcher(String),

    /// Configuration is invalid or could not be parsed.
    #[error("Configuration error: {0}")]
    Config(String),

    /// Filesystem or I/O operation failed.
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// A JSON payload could not be read.
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

/// A specialized `Result` type for developer-support operations.
pub type Result<T> = std::result::Result<T, DevSupportError>;
