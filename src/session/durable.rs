//! Durable snapshot of the session table.
//!
//! The log is a flat text file with one [`SessionEntry`] per line. Every
//! write replaces the whole file with the current table contents; it is a
//! snapshot, not an append log.

use std::fs::{self, File};
use std::io::{BufRead, BufReader, BufWriter, ErrorKind, Write};
use std::path::{Path, PathBuf};

use tracing::{debug, warn};

use super::SessionEntry;
use crate::error::{Result, SessionStoreError};

/// Entries recovered from a durable log.
#[derive(Debug, Default)]
pub struct LoadedLog {
    /// Entries that decoded cleanly, in file order.
    pub entries: Vec<SessionEntry>,
    /// Number of malformed lines that were skipped.
    pub skipped: usize,
}

/// Handle to the on-disk snapshot file.
#[derive(Debug, Clone)]
pub struct DurableLog {
    path: PathBuf,
}

impl DurableLog {
    /// Create a handle for the given path. Nothing is touched on disk.
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    /// Path of the snapshot file.
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Read every entry from the snapshot.
    ///
    /// A missing file yields an empty result. Malformed lines are skipped
    /// and counted; the remaining lines are still recovered.
    pub fn load(&self) -> Result<LoadedLog> {
        let file = match File::open(&self.path) {
            Ok(file) => file,
            Err(e) if e.kind() == ErrorKind::NotFound => {
                debug!(path = %self.path.display(), "no durable log present");
                return Ok(LoadedLog::default());
            }
            Err(e) => return Err(e.into()),
        };

        let mut loaded = LoadedLog::default();
        let mut reader = BufReader::new(file);
        let mut buf = Vec::new();
        let mut index = 0usize;
        loop {
            buf.clear();
            if reader.read_until(b'\n', &mut buf)? == 0 {
                break;
            }
            index += 1;

            // Undecodable bytes only cost their own line
            let decoded = match std::str::from_utf8(&buf) {
                Ok(text) => text.trim_end_matches(|c: char| c == '\n' || c == '\r'),
                Err(e) => {
                    let err = SessionStoreError::Parse {
                        line: index,
                        reason: format!("invalid UTF-8: {e}"),
                    };
                    warn!(path = %self.path.display(), error = %err, "skipping durable log line");
                    loaded.skipped += 1;
                    continue;
                }
            };
            if decoded.trim().is_empty() {
                continue;
            }

            match SessionEntry::parse_line(decoded) {
                Ok(entry) => loaded.entries.push(entry),
                Err(e) => {
                    let err = with_line_number(e, index);
                    warn!(path = %self.path.display(), error = %err, "skipping durable log line");
                    loaded.skipped += 1;
                }
            }
        }

        Ok(loaded)
    }

    /// Replace the snapshot with `entries`.
    ///
    /// Data goes to a sibling temporary file which is synced and then
    /// renamed over the snapshot, so readers never see a partial file.
    pub fn write_snapshot<'a, I>(&self, entries: I) -> Result<()>
    where
        I: IntoIterator<Item = &'a SessionEntry>,
    {
        if let Some(parent) = self.path.parent() {
            if !parent.as_os_str().is_empty() {
                fs::create_dir_all(parent)?;
            }
        }

        let tmp_path = self.tmp_path();
        let result = self
            .write_to(&tmp_path, entries)
            .and_then(|()| fs::rename(&tmp_path, &self.path).map_err(SessionStoreError::from));
        if result.is_err() {
            let _ = fs::remove_file(&tmp_path);
            return result;
        }

        self.sync_parent_dir();
        Ok(())
    }

    /// Flush the directory entry so the rename itself survives a crash.
    ///
    /// Only meaningful on unix; elsewhere the rename is as durable as the
    /// platform makes it. A failure here is logged, the data is already
    /// in place.
    #[cfg(unix)]
    fn sync_parent_dir(&self) {
        let dir = match self.path.parent() {
            Some(parent) if !parent.as_os_str().is_empty() => parent,
            _ => Path::new("."),
        };
        if let Err(e) = File::open(dir).and_then(|d| d.sync_all()) {
            warn!(dir = %dir.display(), error = %e, "failed to sync durable log directory");
        }
    }

    #[cfg(not(unix))]
    fn sync_parent_dir(&self) {}

    fn write_to<'a, I>(&self, tmp_path: &Path, entries: I) -> Result<()>
    where
        I: IntoIterator<Item = &'a SessionEntry>,
    {
        let file = File::create(tmp_path)?;
        let mut writer = BufWriter::new(file);
        let mut count = 0usize;
        for entry in entries {
            writeln!(writer, "{}", entry.to_line())?;
            count += 1;
        }

        let file = writer
            .into_inner()
            .map_err(|e| SessionStoreError::Io(e.into_error()))?;
        file.sync_all()?;

        debug!(path = %self.path.display(), entries = count, "durable log rewritten");
        Ok(())
    }

    fn tmp_path(&self) -> PathBuf {
        let mut name = self
            .path
            .file_name()
            .map(|n| n.to_os_string())
            .unwrap_or_else(|| "sessions.log".into());
        name.push(".tmp");
        self.path.with_file_name(name)
    }
}

fn with_line_number(err: SessionStoreError, line: usize) -> SessionStoreError {
    match err {
        SessionStoreError::Parse { reason, .. } => SessionStoreError::Parse { line, reason },
        other => SessionStoreError::Parse {
            line,
            reason: other.to_string(),
        },
    }
}
