//! Live adapters for the `TestDiscovery` port.

use std::path::{Path, PathBuf};
use std::sync::LazyLock;

use regex::Regex;
use tracing::debug;
use walkdir::WalkDir;

use super::shell::render_template;
use crate::config::LayoutConfig;
use crate::ports::discovery::{DiscoveredMethod, TestDiscovery};
use crate::ports::shell::ShellExecutor;

/// `@Test`, optionally more annotations, then `fun name(`. Backticked names
/// keep their spaces.
static TEST_FUN: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"@Test\b(?:\s*@\w+(?:\([^)]*\))?)*\s*(?:(?:public|internal|open|override)\s+)*fun\s+(`[^`]+`|\w+)\s*\(")
        .expect("valid regex")
});

/// Directories never searched for test sources.
const SKIPPED_DIRS: &[&str] = &[".git", ".mend", "target", "build", "node_modules"];

/// Discovers methods by running a configured command that prints a JSON
/// array of `{id, name, display_name}` objects.
pub struct CommandTestDiscovery {
    shell: Box<dyn ShellExecutor>,
    template: String,
}

impl CommandTestDiscovery {
    /// Creates a discovery adapter from a `{class}` command template.
    pub fn new(shell: Box<dyn ShellExecutor>, template: impl Into<String>) -> Self {
        Self { shell, template: template.into() }
    }
}

impl TestDiscovery for CommandTestDiscovery {
    fn discover_methods(&self, class_name: &str) -> Vec<DiscoveredMethod> {
        let command = render_template(&self.template, "class", class_name);
        let output = match self.shell.run(&command) {
            Ok(output) if output.success() => output,
            Ok(output) => {
                debug!(class = class_name, exit_code = output.exit_code, "discovery failed");
                return Vec::new();
            }
            Err(e) => {
                debug!(class = class_name, error = %e, "discovery could not run");
                return Vec::new();
            }
        };
        serde_json::from_str(output.stdout.trim()).unwrap_or_else(|e| {
            debug!(class = class_name, error = %e, "discovery output is not a method list");
            Vec::new()
        })
    }
}

/// Discovers methods by reading the class's source file, for projects
/// without a discovery command.
///
/// The file is located under any `<test_source_dir>` below the project
/// root. Ids are `<class>#<method>`; display names are `<method>()`.
pub struct SourceScanDiscovery {
    project_root: PathBuf,
    layout: LayoutConfig,
}

impl SourceScanDiscovery {
    /// Scans sources below `project_root` laid out as `layout` describes.
    pub fn new(project_root: impl Into<PathBuf>, layout: LayoutConfig) -> Self {
        Self { project_root: project_root.into(), layout }
    }

    fn locate(&self, class_name: &str) -> Option<PathBuf> {
        let suffix = Path::new(&self.layout.test_source_dir)
            .join(class_name.replace('.', "/"))
            .with_extension(&self.layout.test_file_extension);
        WalkDir::new(&self.project_root)
            .sort_by_file_name()
            .into_iter()
            .filter_entry(|e| {
                !(e.file_type().is_dir()
                    && e.file_name().to_str().is_some_and(|n| SKIPPED_DIRS.contains(&n)))
            })
            .filter_map(Result::ok)
            .find(|e| e.file_type().is_file() && e.path().ends_with(&suffix))
            .map(walkdir::DirEntry::into_path)
    }
}

impl TestDiscovery for SourceScanDiscovery {
    fn discover_methods(&self, class_name: &str) -> Vec<DiscoveredMethod> {
        let Some(path) = self.locate(class_name) else {
            debug!(class = class_name, "no source file found");
            return Vec::new();
        };
        let Ok(source) = std::fs::read_to_string(&path) else {
            debug!(path = %path.display(), "source unreadable");
            return Vec::new();
        };
        scan_source(class_name, &source)
    }
}

fn scan_source(class_name: &str, source: &str) -> Vec<DiscoveredMethod> {
    TEST_FUN
        .captures_iter(source)
        .filter_map(|c| c.get(1))
        .map(|m| {
            let name = m.as_str().trim_matches('`').to_string();
            DiscoveredMethod {
                id: format!("{class_name}#{name}"),
                display_name: format!("{name}()"),
                name,
            }
        })
        .collect()
}
