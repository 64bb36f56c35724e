//! In-memory filesystem.

use std::collections::{BTreeMap, BTreeSet};
use std::path::{Component, Path, PathBuf};
use std::sync::{Mutex, MutexGuard, PoisonError};

use chrono::{DateTime, Utc};

use crate::error::BoxError;
use crate::ports::filesystem::FileSystem;

#[derive(Debug, Clone)]
struct Entry {
    contents: String,
    modified: Option<DateTime<Utc>>,
}

/// A [`FileSystem`] held entirely in memory. Directories exist implicitly
/// whenever a file lives beneath them. Modification times are only known
/// once set with [`set_modified`](Self::set_modified).
#[derive(Default)]
pub struct MemoryFileSystem {
    files: Mutex<BTreeMap<PathBuf, Entry>>,
}

impl MemoryFileSystem {
    /// Creates an empty filesystem.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a filesystem holding the given files.
    #[must_use]
    pub fn with_files<P: Into<PathBuf>>(files: impl IntoIterator<Item = (P, &'static str)>) -> Self {
        let fs = Self::new();
        {
            let mut map = fs.lock();
            for (path, contents) in files {
                map.insert(path.into(), Entry { contents: contents.to_string(), modified: None });
            }
        }
        fs
    }

    /// Sets the modification time reported for `path`.
    pub fn set_modified(&self, path: &Path, at: DateTime<Utc>) {
        if let Some(entry) = self.lock().get_mut(path) {
            entry.modified = Some(at);
        }
    }

    /// Every file path currently stored, sorted.
    #[must_use]
    pub fn paths(&self) -> Vec<PathBuf> {
        self.lock().keys().cloned().collect()
    }

    fn lock(&self) -> MutexGuard<'_, BTreeMap<PathBuf, Entry>> {
        self.files.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

fn not_found(path: &Path) -> BoxError {
    format!("{}: no such file", path.display()).into()
}

impl FileSystem for MemoryFileSystem {
    fn read_to_string(&self, path: &Path) -> Result<String, BoxError> {
        self.lock().get(path).map(|e| e.contents.clone()).ok_or_else(|| not_found(path))
    }

    fn write(&self, path: &Path, contents: &str) -> Result<(), BoxError> {
        self.lock().insert(
            path.to_path_buf(),
            Entry { contents: contents.to_string(), modified: None },
        );
        Ok(())
    }

    fn append(&self, path: &Path, contents: &str) -> Result<(), BoxError> {
        self.lock()
            .entry(path.to_path_buf())
            .or_insert_with(|| Entry { contents: String::new(), modified: None })
            .contents
            .push_str(contents);
        Ok(())
    }

    fn rename(&self, from: &Path, to: &Path) -> Result<(), BoxError> {
        let mut files = self.lock();
        let entry = files.remove(from).ok_or_else(|| not_found(from))?;
        files.insert(to.to_path_buf(), entry);
        Ok(())
    }

    fn exists(&self, path: &Path) -> bool {
        let files = self.lock();
        files.contains_key(path) || files.keys().any(|p| p.starts_with(path))
    }

    fn list_dir(&self, path: &Path) -> Result<Vec<String>, BoxError> {
        let files = self.lock();
        let names: BTreeSet<String> = files
            .keys()
            .filter_map(|p| p.strip_prefix(path).ok())
            .filter_map(|rel| match rel.components().next() {
                Some(Component::Normal(name)) => Some(name.to_string_lossy().into_owned()),
                _ => None,
            })
            .collect();
        if names.is_empty() {
            return Err(format!("{}: not a directory", path.display()).into());
        }
        Ok(names.into_iter().collect())
    }

    fn walk_files(&self, root: &Path, max_depth: Option<usize>) -> Vec<PathBuf> {
        self.lock()
            .keys()
            .filter(|p| {
                p.strip_prefix(root).is_ok_and(|rel| {
                    let depth = rel.components().count();
                    depth > 0 && max_depth.is_none_or(|max| depth <= max)
                })
            })
            .cloned()
            .collect()
    }

    fn modified(&self, path: &Path) -> Option<DateTime<Utc>> {
        self.lock().get(path).and_then(|e| e.modified)
    }
}
