//! Scans a project into a fresh, history-free [`TestTree`].

use std::path::{Component, Path, PathBuf};

use tracing::{debug, info};

use super::{ModuleNode, TestClassNode, TestMethodNode, TestTree};
use crate::config::LayoutConfig;
use crate::ports::clock::Clock;
use crate::ports::discovery::TestDiscovery;
use crate::ports::filesystem::FileSystem;

/// Builds the module → class → method structure of a project.
///
/// Classes whose discovery yields no methods (typically not compiled yet)
/// and modules left without classes are omitted, not reported.
pub struct GraphBuilder<'a> {
    fs: &'a dyn FileSystem,
    clock: &'a dyn Clock,
    discovery: &'a dyn TestDiscovery,
    project_root: &'a Path,
    layout: &'a LayoutConfig,
}

impl<'a> GraphBuilder<'a> {
    /// Creates a builder for the project at `project_root`.
    pub fn new(
        fs: &'a dyn FileSystem,
        clock: &'a dyn Clock,
        discovery: &'a dyn TestDiscovery,
        project_root: &'a Path,
        layout: &'a LayoutConfig,
    ) -> Self {
        Self { fs, clock, discovery, project_root, layout }
    }

    /// Scans the project. `last_updated` is the current time and no node
    /// carries history.
    #[must_use]
    pub fn build(&self) -> TestTree {
        let mut modules: Vec<ModuleNode> = module_dirs(self.fs, self.project_root, self.layout)
            .into_iter()
            .filter_map(|dir| self.build_module(&dir))
            .collect();
        modules.sort_by(|a, b| a.id.cmp(&b.id));

        let tree = TestTree { modules, ..TestTree::empty(self.clock.now()) };
        info!(
            modules = tree.modules.len(),
            classes = tree.class_count(),
            methods = tree.method_count(),
            "test structure built"
        );
        tree
    }

    fn build_module(&self, dir: &Path) -> Option<ModuleNode> {
        let id = module_id(self.project_root, dir);
        let test_root = dir.join(&self.layout.test_source_dir);
        let mut test_classes: Vec<TestClassNode> = test_files(self.fs, dir, self.layout)
            .into_iter()
            .filter_map(|file| self.build_class(&id, &test_root, &file))
            .collect();
        if test_classes.is_empty() {
            debug!(module = %id, "no test classes, module omitted");
            return None;
        }
        test_classes.sort_by(|a, b| a.fully_qualified_name.cmp(&b.fully_qualified_name));

        let name = dir
            .file_name()
            .map_or_else(|| id.clone(), |n| n.to_string_lossy().into_owned());
        Some(ModuleNode {
            id,
            name,
            path: dir.display().to_string(),
            dependencies: Vec::new(),
            test_classes,
        })
    }

    fn build_class(&self, module_id: &str, test_root: &Path, file: &Path) -> Option<TestClassNode> {
        let fqn = fully_qualified_name(test_root, file)?;
        let test_methods: Vec<TestMethodNode> = self
            .discovery
            .discover_methods(&fqn)
            .into_iter()
            .map(|m| TestMethodNode::new(m.id, m.name, m.display_name))
            .collect();
        if test_methods.is_empty() {
            debug!(class = %fqn, "discovery found no methods, class omitted");
            return None;
        }
        Some(TestClassNode {
            id: format!("{module_id}/{fqn}"),
            fully_qualified_name: fqn,
            file_path: file.display().to_string(),
            test_methods,
            dependencies: Vec::new(),
        })
    }
}

/// Directories holding a build descriptor within the scan depth, sorted.
/// The project root counts only when the layout includes it.
pub(crate) fn module_dirs(fs: &dyn FileSystem, root: &Path, layout: &LayoutConfig) -> Vec<PathBuf> {
    let mut dirs: Vec<PathBuf> = descriptor_files(fs, root, layout)
        .into_iter()
        .filter_map(|descriptor| descriptor.parent().map(Path::to_path_buf))
        .filter(|dir| layout.include_root_module || dir.as_path() != root)
        .collect();
    dirs.dedup();
    dirs
}

/// Every build descriptor within the scan depth, the root's included.
pub(crate) fn descriptor_files(fs: &dyn FileSystem, root: &Path, layout: &LayoutConfig) -> Vec<PathBuf> {
    fs.walk_files(root, Some(layout.scan_depth))
        .into_iter()
        .filter(|p| p.file_name().is_some_and(|n| n == layout.build_descriptor.as_str()))
        .collect()
}

/// Test source files of the module at `module_dir`.
pub(crate) fn test_files(fs: &dyn FileSystem, module_dir: &Path, layout: &LayoutConfig) -> Vec<PathBuf> {
    let test_root = module_dir.join(&layout.test_source_dir);
    if !fs.exists(&test_root) {
        return Vec::new();
    }
    fs.walk_files(&test_root, None)
        .into_iter()
        .filter(|p| is_test_file(p, layout))
        .collect()
}

fn is_test_file(path: &Path, layout: &LayoutConfig) -> bool {
    let ext_matches = path.extension().is_some_and(|e| e == layout.test_file_extension.as_str());
    let name_matches = path
        .file_name()
        .and_then(|n| n.to_str())
        .is_some_and(|n| n.contains(&layout.test_name_marker));
    ext_matches && name_matches
}

/// `com/example/CalcTest.kt` under `test_root` becomes `com.example.CalcTest`.
fn fully_qualified_name(test_root: &Path, file: &Path) -> Option<String> {
    let relative = file.strip_prefix(test_root).ok()?.with_extension("");
    let parts: Vec<String> = relative
        .components()
        .filter_map(|c| match c {
            Component::Normal(part) => Some(part.to_string_lossy().into_owned()),
            _ => None,
        })
        .collect();
    (!parts.is_empty()).then(|| parts.join("."))
}

/// Project-relative module path with `/` separators; `.` for the root.
fn module_id(root: &Path, dir: &Path) -> String {
    let relative = dir.strip_prefix(root).unwrap_or(dir);
    let parts: Vec<String> = relative
        .components()
        .filter_map(|c| match c {
            Component::Normal(part) => Some(part.to_string_lossy().into_owned()),
            _ => None,
        })
        .collect();
    if parts.is_empty() {
        ".".to_string()
    } else {
        parts.join("/")
    }
}
