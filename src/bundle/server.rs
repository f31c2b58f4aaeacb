//! Development server URL resolution.

use crate::domain::error::{DevSupportError, Result};

const BUNDLE_QUERY: &str = "platform=windows&dev=true";

/// Builds bundle and source-map URLs for the development server.
///
/// Without a configured host nothing can be resolved, and every method says
/// so with [`DevSupportError::Unavailable`] rather than guessing a default.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DevServerHelper {
    host: Option<String>,
}

impl DevServerHelper {
    /// Creates a helper for `host` (for example `"localhost:8081"`).
    pub fn new(host: Option<String>) -> Self {
        Self {
            host: host.filter(|h| !h.trim().is_empty()),
        }
    }

    /// Configured `host:port`, if any.
    pub fn host(&self) -> Option<&str> {
        self.host.as_deref()
    }

    /// URL of the JavaScript bundle called `bundle_name`.
    ///
    /// # Errors
    ///
    /// [`DevSupportError::Unavailable`] when no host is configured.
    pub fn bundle_url(&self, bundle_name: &str) -> Result<String> {
        let host = self.require_host("bundle URL resolution")?;
        Ok(format!("http://{host}/{bundle_name}.bundle?{BUNDLE_QUERY}"))
    }

    /// URL of the source map for `bundle_name`.
    ///
    /// # Errors
    ///
    /// [`DevSupportError::Unavailable`] when no host is configured.
    pub fn source_map_url(&self, bundle_name: &str) -> Result<String> {
        let host = self.require_host("source map URL resolution")?;
        Ok(format!("http://{host}/{bundle_name}.map?{BUNDLE_QUERY}"))
    }

    fn require_host(&self, feature: &'static str) -> Result<&str> {
        self.host.as_deref().ok_or(DevSupportError::Unavailable(feature))
    }
}
