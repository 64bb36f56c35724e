//! Graph store: persistence for the test structure and its history.
//!
//! All I/O goes through the context's `FileSystem` port. Layout under the
//! storage directory:
//!
//! ```text
//! <storage>/
//!   ├── test-graph.json
//!   └── archives/
//!         └── test-graph-<timestamp>[-N].json
//! ```

use std::path::{Path, PathBuf};

use tracing::{debug, warn};

use crate::context::ServiceContext;
use crate::error::MendError;
use crate::graph::{TestMethodNode, TestTree};

/// File name of the canonical document.
pub const GRAPH_FILE: &str = "test-graph.json";

/// Directory, under storage, holding archived copies.
pub const ARCHIVE_DIR: &str = "archives";

/// Reads and writes the canonical test-graph document and its archives.
pub struct GraphStore<'a> {
    ctx: &'a ServiceContext,
    root: PathBuf,
}

impl<'a> GraphStore<'a> {
    /// Creates a store in `storage_dir`.
    #[must_use]
    pub fn new(ctx: &'a ServiceContext, storage_dir: &Path) -> Self {
        Self { ctx, root: storage_dir.to_path_buf() }
    }

    /// Path of the canonical document.
    #[must_use]
    pub fn graph_path(&self) -> PathBuf {
        self.root.join(GRAPH_FILE)
    }

    /// Writes `tree` to a temporary sibling and renames it over the
    /// canonical document.
    ///
    /// # Errors
    ///
    /// Returns [`MendError::Persistence`] if serialization or I/O fails.
    pub fn save(&self, tree: &TestTree) -> Result<(), MendError> {
        let json = to_json(tree)?;
        let target = self.graph_path();
        let tmp = target.with_extension("json.tmp");
        self.ctx
            .fs
            .write(&tmp, &json)
            .map_err(|e| MendError::Persistence(format!("cannot write {}: {e}", tmp.display())))?;
        self.ctx.fs.rename(&tmp, &target).map_err(|e| {
            MendError::Persistence(format!("cannot replace {}: {e}", target.display()))
        })?;
        debug!(path = %target.display(), methods = tree.method_count(), "test graph saved");
        Ok(())
    }

    /// Reads the canonical document. Missing, unreadable, or malformed
    /// documents all yield `None`; the latter two are logged.
    #[must_use]
    pub fn load(&self) -> Option<TestTree> {
        let path = self.graph_path();
        if !self.ctx.fs.exists(&path) {
            return None;
        }
        let text = match self.ctx.fs.read_to_string(&path) {
            Ok(text) => text,
            Err(e) => {
                warn!(path = %path.display(), error = %e, "test graph unreadable, rebuilding");
                return None;
            }
        };
        match serde_json::from_str(&text) {
            Ok(tree) => Some(tree),
            Err(e) => {
                warn!(path = %path.display(), error = %e, "test graph corrupt, rebuilding");
                None
            }
        }
    }

    /// Writes a copy of `tree` to `archives/`, named after the current time.
    /// An existing archive is never overwritten; a `-N` suffix is added.
    ///
    /// # Errors
    ///
    /// Returns [`MendError::Persistence`] if serialization or I/O fails.
    pub fn archive(&self, tree: &TestTree) -> Result<PathBuf, MendError> {
        let json = to_json(tree)?;
        let dir = self.root.join(ARCHIVE_DIR);
        let stamp = self.ctx.clock.now().format("%Y-%m-%dT%H-%M-%SZ").to_string();

        let mut path = dir.join(format!("test-graph-{stamp}.json"));
        let mut n = 1;
        while self.ctx.fs.exists(&path) {
            path = dir.join(format!("test-graph-{stamp}-{n}.json"));
            n += 1;
        }
        self.ctx
            .fs
            .write(&path, &json)
            .map_err(|e| MendError::Persistence(format!("cannot write {}: {e}", path.display())))?;
        debug!(path = %path.display(), "test graph archived");
        Ok(path)
    }

    /// Archive file names, oldest first.
    #[must_use]
    pub fn list_archives(&self) -> Vec<String> {
        let dir = self.root.join(ARCHIVE_DIR);
        if !self.ctx.fs.exists(&dir) {
            return Vec::new();
        }
        let mut names: Vec<String> = self
            .ctx
            .fs
            .list_dir(&dir)
            .unwrap_or_default()
            .into_iter()
            .filter(|name| name.starts_with("test-graph-") && name.ends_with(".json"))
            .collect();
        names.sort_by_cached_key(|name| archive_order(name));
        names
    }

    /// Loads an archived copy by file name.
    #[must_use]
    pub fn load_archive(&self, name: &str) -> Option<TestTree> {
        let path = self.root.join(ARCHIVE_DIR).join(name);
        let text = self.ctx.fs.read_to_string(&path).ok()?;
        serde_json::from_str(&text).ok()
    }
}

/// Sort key for archive names: timestamp, then collision suffix.
fn archive_order(name: &str) -> (String, u32) {
    let stem = name.trim_end_matches(".json");
    match stem.rsplit_once("Z-") {
        Some((stamp, n)) => (stamp.to_string(), n.parse().unwrap_or(0)),
        None => (stem.trim_end_matches('Z').to_string(), 0),
    }
}

/// Looks up a method in `tree` by its identifier path.
#[must_use]
pub fn find_method<'t>(
    tree: &'t TestTree,
    module_id: &str,
    class_id: &str,
    method_id: &str,
) -> Option<&'t TestMethodNode> {
    tree.find_method(module_id, class_id, method_id)
}

/// Applies `transform` to one method, returning the rebuilt tree.
#[must_use]
pub fn update_method<F>(
    tree: TestTree,
    module_id: &str,
    class_id: &str,
    method_id: &str,
    transform: F,
) -> TestTree
where
    F: FnOnce(TestMethodNode) -> TestMethodNode,
{
    tree.update_method(module_id, class_id, method_id, transform)
}

fn to_json(tree: &TestTree) -> Result<String, MendError> {
    serde_json::to_string_pretty(tree)
        .map_err(|e| MendError::Persistence(format!("cannot serialize test graph: {e}")))
}
