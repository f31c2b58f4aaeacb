//! Tracing with file-based OpenTelemetry export.
//!
//! ```text
//! tracing spans → tracing-opentelemetry → opentelemetry_sdk → OtlpFileExporter → devsupport-otlp.json
//! ```
//!
//! The trace file lives in the data directory (see
//! [`get_data_dir`](crate::infrastructure::get_data_dir)), rotates at 10 MB,
//! and keeps three backups. `RUST_LOG`-style directives come from
//! [`Config::trace_level`](crate::Config::trace_level).
//!
//! ```rust,no_run
//! use devsupport::observability::init_tracing;
//! use devsupport::Config;
//!
//! init_tracing(&Config::default());
//! tracing::debug!("developer support starting");
//! ```

mod exporter;
mod file_writer;
mod init;
mod span_formatter;

pub use init::{init_tracing, SERVICE_NAME, TRACE_FILE_NAME};
