//! Filesystem locations.

use std::path::PathBuf;

/// Directory name under the platform data directory.
const APP_DIR: &str = "devsupport";

/// Returns the directory trace output is written to.
///
/// This is `<platform local data dir>/devsupport`, for example
/// `~/.local/share/devsupport` on Linux. Falls back to the system temporary
/// directory when the platform has no data directory.
#[must_use]
pub fn get_data_dir() -> PathBuf {
    dirs::data_local_dir()
        .unwrap_or_else(std::env::temp_dir)
        .join(APP_DIR)
}

/// Expands a leading `~` to the user's home directory.
///
/// Paths without a leading `~`, and every path when the home directory is
/// unknown, are returned unchanged.
///
/// ```
/// use devsupport::infrastructure::expand_tilde;
///
/// assert_eq!(expand_tilde("/srv/index.bundle"), "/srv/index.bundle");
/// ```
#[must_use]
pub fn expand_tilde(path: &str) -> String {
    let rest = match path.strip_prefix('~') {
        Some(rest) if rest.is_empty() || rest.starts_with('/') => rest,
        _ => return path.to_string(),
    };

    dirs::home_dir().map_or_else(
        || path.to_string(),
        |home| format!("{}{rest}", home.display()),
    )
}
