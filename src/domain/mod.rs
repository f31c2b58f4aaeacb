//! Domain layer for the developer-support controller.
//!
//! This module holds the types shared by every other layer and free of any
//! dispatcher or renderer concern.
//!
//! # Organization
//!
//! - [`error`]: Error types and result aliases
//! - [`report`]: Error reports, stack frames, cookies, and captured errors
//! - [`stack`]: Stack trace formatter collaborator
//!
//! # Examples
//!
//! ```
//! use devsupport::domain::{DefaultStackTraceFormatter, NativeError, StackTraceFormatter};
//!
//! let err = NativeError::new(std::io::Error::other("bridge call failed"));
//! let frames = DefaultStackTraceFormatter.format_native(&err);
//! assert_eq!(frames[0].method_name, "bridge call failed");
//! ```

pub mod error;
pub mod report;
pub mod stack;

pub use error::{DevSupportError, FetchError, Result};
pub use report::{ErrorCookie, ErrorReport, NativeError, ScriptError, StackFrame};
pub use stack::{DefaultStackTraceFormatter, StackTraceFormatter};
