//! Size-rotated line writer for trace output.
//!
//! Lines are appended to `<path>`. Before a write that would start on a file
//! already larger than the limit, backups shift down (`<path>.1` becomes
//! `<path>.2`, and so on), the current file becomes `<path>.1`, and the
//! oldest backup past the retention count is deleted.

use std::fs::{self, File, OpenOptions};
use std::io::{self, Write};
use std::path::{Path, PathBuf};
use std::sync::{Mutex, PoisonError};

/// Size at which the trace file rotates.
pub const MAX_FILE_SIZE_BYTES: u64 = 10 * 1024 * 1024;

/// Rotated files kept next to the live one.
pub const MAX_BACKUP_FILES: usize = 3;

struct Open {
    file: File,
    len: u64,
}

/// Thread-safe appender with size-based rotation.
pub struct RotatingWriter {
    path: PathBuf,
    max_bytes: u64,
    max_backups: usize,
    current: Mutex<Option<Open>>,
}

impl RotatingWriter {
    /// Writer with the default 10 MB limit and three backups.
    pub const fn new(path: PathBuf) -> Self {
        Self::with_limits(path, MAX_FILE_SIZE_BYTES, MAX_BACKUP_FILES)
    }

    pub const fn with_limits(path: PathBuf, max_bytes: u64, max_backups: usize) -> Self {
        Self {
            path,
            max_bytes,
            max_backups,
            current: Mutex::new(None),
        }
    }

    /// Appends `line` plus a newline, rotating first if the file is full.
    pub fn write_line(&self, line: &str) -> io::Result<()> {
        let mut current = self.current.lock().unwrap_or_else(PoisonError::into_inner);

        if current.is_none() {
            *current = Some(self.open()?);
        }
        if current.as_ref().is_some_and(|open| open.len > self.max_bytes) {
            *current = None;
            self.rotate()?;
            *current = Some(self.open()?);
        }

        let open = current
            .as_mut()
            .ok_or_else(|| io::Error::other("trace file not open"))?;
        writeln!(open.file, "{line}")?;
        open.file.flush()?;
        open.len += line.len() as u64 + 1;
        Ok(())
    }

    fn open(&self) -> io::Result<Open> {
        let file = OpenOptions::new().create(true).append(true).open(&self.path)?;
        let len = file.metadata()?.len();
        Ok(Open { file, len })
    }

    fn rotate(&self) -> io::Result<()> {
        if self.max_backups == 0 {
            return fs::remove_file(&self.path);
        }

        let oldest = backup_path(&self.path, self.max_backups);
        if oldest.exists() {
            fs::remove_file(&oldest)?;
        }
        for index in (1..self.max_backups).rev() {
            let from = backup_path(&self.path, index);
            if from.exists() {
                fs::rename(&from, backup_path(&self.path, index + 1))?;
            }
        }
        fs::rename(&self.path, backup_path(&self.path, 1))
    }
}

impl std::fmt::Debug for RotatingWriter {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RotatingWriter")
            .field("path", &self.path)
            .field("max_bytes", &self.max_bytes)
            .field("max_backups", &self.max_backups)
            .finish_non_exhaustive()
    }
}

fn backup_path(path: &Path, index: usize) -> PathBuf {
    let mut name = path.as_os_str().to_owned();
    name.push(format!(".{index}"));
    PathBuf::from(name)
}
