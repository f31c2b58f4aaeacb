//! devsupport: developer-support controller for embedded application runtimes.
//!
//! The controller sits between a host application and the script runtime it
//! embeds. It provides:
//! - A red box overlay for unhandled native and scripted errors
//! - A debug menu, opened by shaking the device
//! - Reloading of the application bundle from a local file or a development server
//!
//! # Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────────────┐
//! │  Host binary (main.rs) / embedding application     │
//! └─────────────────────────────────────────────────────┘
//!                        │
//! ┌─────────────────────────────────────────────────────┐
//! │  DevSupportManager (manager/)                       │  ← Public facade
//! │  - error reports   - reload   - debug menu          │
//! └─────────────────────────────────────────────────────┘
//!         │                    │                    │
//! ┌───────────────┐   ┌───────────────┐   ┌───────────────┐
//! │ State machine │   │ UI dispatcher │   │ Collaborators │
//! │ (app/)        │   │ (dispatcher/) │   │ ui/ bundle/   │
//! │ Event→Action  │   │ UI affinity   │   │ gesture/      │
//! └───────────────┘   └───────────────┘   └───────────────┘
//!                        │
//! ┌─────────────────────────────────────────────────────┐
//! │  Domain (errors, reports, stack formatting)         │
//! │  Observability (tracing + OTLP file export)         │
//! └─────────────────────────────────────────────────────┘
//! ```
//!
//! All overlay and menu state is owned by a single UI-affine context. Public
//! operations called from other threads are posted there through the
//! injected [`UiDispatcher`](dispatcher::UiDispatcher); the state machine in
//! [`app`] never sees another thread.
//!
//! # Example
//!
//! ```rust
//! use devsupport::bundle::DevCommandsHandler;
//! use devsupport::dispatcher::InlineDispatcher;
//! use devsupport::ui::ConsoleRenderer;
//! use devsupport::{Config, DevSupportManager};
//! use std::sync::Arc;
//!
//! struct Host;
//!
//! #[async_trait::async_trait]
//! impl DevCommandsHandler for Host {
//!     async fn reload_from_file(&self, _bundle_file: &str) -> devsupport::Result<()> {
//!         Ok(())
//!     }
//! }
//!
//! let manager = DevSupportManager::builder(
//!     Config::default(),
//!     Arc::new(InlineDispatcher),
//!     Arc::new(ConsoleRenderer::new(std::io::sink())),
//!     Arc::new(Host),
//! )
//! .build();
//!
//! manager
//!     .report_scripted_error("undefined is not a function", serde_json::json!([]), 1)
//!     .unwrap();
//! assert_eq!(manager.red_box().unwrap().title, "undefined is not a function");
//! ```

pub mod app;
pub mod bundle;
pub mod dispatcher;
pub mod domain;
pub mod gesture;
pub mod infrastructure;
pub mod manager;
pub mod observability;
pub mod ui;

pub use domain::{DevSupportError, ErrorCookie, FetchError, NativeError, Result, ScriptError, StackFrame};
pub use manager::{DevSupportManager, DevSupportManagerBuilder};

use serde::Deserialize;
use std::collections::BTreeMap;
use std::path::Path;

/// Host configuration consumed when the controller is built.
///
/// Can be read from a string map (as handed over by an embedding host) or from
/// a TOML file:
///
/// ```toml
/// enabled = true
/// remote_bundle_name = "index.windows"
/// dev_server_host = "localhost:8081"
/// trace_level = "debug"
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct Config {
    /// Whether errors are captured and the debug menu is available. Default: `true`
    pub enabled: bool,

    /// Bundle file to reload from. When set, reloads never contact the
    /// development server. A leading `~` is expanded.
    pub local_bundle_file: Option<String>,

    /// Bundle requested from the development server.
    pub remote_bundle_name: Option<String>,

    /// Development server `host:port`. Without it, source URLs are unavailable.
    pub dev_server_host: Option<String>,

    /// Tracing filter directives, e.g. `debug` or `devsupport=trace`. Default: `"info"`
    pub trace_level: Option<String>,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            enabled: true,
            local_bundle_file: None,
            remote_bundle_name: None,
            dev_server_host: None,
            trace_level: None,
        }
    }
}

impl Config {
    /// Parses configuration from a host-provided string map.
    ///
    /// Recognised keys: `enabled`, `bundle_file`, `bundle_name`,
    /// `dev_server_host`, `trace_level`. Empty values count as absent, and an
    /// unparsable `enabled` keeps the default.
    ///
    /// ```rust
    /// use std::collections::BTreeMap;
    /// use devsupport::Config;
    ///
    /// let mut map = BTreeMap::new();
    /// map.insert("bundle_name".to_string(), "index.windows".to_string());
    /// map.insert("enabled".to_string(), "false".to_string());
    ///
    /// let config = Config::from_map(&map);
    /// assert!(!config.enabled);
    /// assert_eq!(config.remote_bundle_name.as_deref(), Some("index.windows"));
    /// ```
    #[must_use]
    pub fn from_map(map: &BTreeMap<String, String>) -> Self {
        let get = |key: &str| {
            map.get(key)
                .map(|value| value.trim())
                .filter(|value| !value.is_empty())
                .map(String::from)
        };

        let enabled = get("enabled")
            .and_then(|value| value.parse::<bool>().ok())
            .unwrap_or(true);

        Self {
            enabled,
            local_bundle_file: get("bundle_file"),
            remote_bundle_name: get("bundle_name"),
            dev_server_host: get("dev_server_host"),
            trace_level: get("trace_level"),
        }
        .normalized()
    }

    /// Parses TOML configuration.
    ///
    /// # Errors
    ///
    /// [`DevSupportError::Config`] if the text is not valid configuration.
    pub fn from_toml_str(text: &str) -> Result<Self> {
        toml::from_str::<Self>(text)
            .map(Self::normalized)
            .map_err(|e| DevSupportError::Config(e.to_string()))
    }

    /// Reads TOML configuration from `path`.
    ///
    /// # Errors
    ///
    /// [`DevSupportError::Io`] if the file cannot be read, or
    /// [`DevSupportError::Config`] if it is not valid configuration.
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self> {
        let text = std::fs::read_to_string(path.as_ref())?;
        Self::from_toml_str(&text)
    }

    fn normalized(mut self) -> Self {
        let blank_to_none = |value: Option<String>| value.filter(|v| !v.trim().is_empty());

        self.local_bundle_file =
            blank_to_none(self.local_bundle_file).map(|file| infrastructure::expand_tilde(&file));
        self.remote_bundle_name = blank_to_none(self.remote_bundle_name);
        self.dev_server_host = blank_to_none(self.dev_server_host);
        self.trace_level = blank_to_none(self.trace_level);
        self
    }
}
