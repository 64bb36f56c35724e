//! Filesystem port for project and storage I/O.

use std::path::{Path, PathBuf};

use chrono::{DateTime, Utc};

use crate::error::BoxError;

/// Provides the file operations the orchestrator needs.
///
/// The graph store, workspace, builder, and update policy all go through
/// this port so they can run against an in-memory tree in tests.
pub trait FileSystem: Send + Sync {
    /// Reads the entire contents of a file as a UTF-8 string.
    ///
    /// # Errors
    ///
    /// Returns an error if the file does not exist or is not valid UTF-8.
    fn read_to_string(&self, path: &Path) -> Result<String, BoxError>;

    /// Writes the given contents to a file, creating parent directories and
    /// overwriting any existing file.
    ///
    /// # Errors
    ///
    /// Returns an error if the write fails (permissions, disk full, etc.).
    fn write(&self, path: &Path, contents: &str) -> Result<(), BoxError>;

    /// Appends to a file, creating it (and its parents) if missing.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be opened or written.
    fn append(&self, path: &Path, contents: &str) -> Result<(), BoxError>;

    /// Renames `from` to `to`, replacing `to` if it exists.
    ///
    /// # Errors
    ///
    /// Returns an error if `from` is missing or the rename fails.
    fn rename(&self, from: &Path, to: &Path) -> Result<(), BoxError>;

    /// Returns `true` if the path exists.
    fn exists(&self, path: &Path) -> bool;

    /// Lists the entry names in a directory, sorted.
    ///
    /// # Errors
    ///
    /// Returns an error if the path is not a directory or cannot be read.
    fn list_dir(&self, path: &Path) -> Result<Vec<String>, BoxError>;

    /// Recursively lists regular files beneath `root`, sorted, descending at
    /// most `max_depth` levels (`None` for unbounded). Unreadable entries
    /// are skipped.
    fn walk_files(&self, root: &Path, max_depth: Option<usize>) -> Vec<PathBuf>;

    /// Returns the last-modified time of a file, if it can be determined.
    fn modified(&self, path: &Path) -> Option<DateTime<Utc>>;
}
