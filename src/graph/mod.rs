//! Persistent structural model of a project's tests.
//!
//! The model is a strict three-level tree: module → class → method. Each
//! method carries its bounded execution and remediation history. Structure
//! is rebuilt wholesale by [`builder`] and history is carried across
//! rebuilds by [`merge`].

pub mod builder;
pub mod merge;
pub mod policy;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Format version written into every persisted tree.
pub const FORMAT_VERSION: &str = "1.0";

fn default_version() -> String {
    FORMAT_VERSION.to_string()
}

/// Root of the structural model.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TestTree {
    /// Modules in discovery order.
    pub modules: Vec<ModuleNode>,
    /// When the structure was last rebuilt.
    pub last_updated: DateTime<Utc>,
    /// Document format version.
    #[serde(default = "default_version")]
    pub version: String,
}

/// A build module containing test classes.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ModuleNode {
    /// Project-relative module path; unique across the tree.
    pub id: String,
    /// Directory name of the module.
    pub name: String,
    /// Filesystem path of the module directory.
    pub path: String,
    /// Reserved for dependency-aware scheduling; never populated.
    #[serde(default)]
    pub dependencies: Vec<String>,
    /// Test classes in the module.
    pub test_classes: Vec<TestClassNode>,
}

/// A test class within a module.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TestClassNode {
    /// `<module id>/<fully-qualified name>`.
    pub id: String,
    /// Fully-qualified class name.
    pub fully_qualified_name: String,
    /// Path of the class's source file.
    pub file_path: String,
    /// Test methods in the class.
    pub test_methods: Vec<TestMethodNode>,
    /// Reserved for dependency-aware scheduling; never populated.
    #[serde(default)]
    pub dependencies: Vec<String>,
}

/// A test method and its history.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TestMethodNode {
    /// Stable unique id from the discovery collaborator.
    pub id: String,
    /// Simple method name.
    pub name: String,
    /// Display name.
    pub display_name: String,
    /// Most recent execution, mirroring the head of `execution_history`.
    #[serde(default)]
    pub last_execution: Option<ExecutionRecord>,
    /// Most recent remediation, mirroring the head of `remediation_history`.
    #[serde(default)]
    pub last_remediation: Option<RemediationRecord>,
    /// Executions, newest first, capped.
    #[serde(default)]
    pub execution_history: Vec<ExecutionRecord>,
    /// Remediation attempts, newest first, capped.
    #[serde(default)]
    pub remediation_history: Vec<RemediationRecord>,
}

impl TestMethodNode {
    /// Creates a method node with no history.
    pub fn new(
        id: impl Into<String>,
        name: impl Into<String>,
        display_name: impl Into<String>,
    ) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            display_name: display_name.into(),
            last_execution: None,
            last_remediation: None,
            execution_history: Vec::new(),
            remediation_history: Vec::new(),
        }
    }

    /// Returns `true` if `reported` names this method, by simple or display name.
    #[must_use]
    pub fn answers_to(&self, reported: &str) -> bool {
        self.name == reported || self.display_name == reported
    }
}

/// Outcome of a single test execution.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ExecutionOutcome {
    /// The test passed.
    Success,
    /// An assertion failed.
    Failure,
    /// The test errored before reaching a verdict.
    Error,
    /// The test did not run.
    Skipped,
}

/// One recorded execution of a test method.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ExecutionRecord {
    /// When the execution was recorded.
    pub timestamp: DateTime<Utc>,
    /// Execution outcome.
    pub outcome: ExecutionOutcome,
    /// Wall time in milliseconds.
    pub duration_ms: u64,
    /// Failure message, if any.
    #[serde(default)]
    pub error_message: Option<String>,
    /// Stack trace, if any.
    #[serde(default)]
    pub stack_trace: Option<String>,
    /// Path to the runner's log for this execution.
    #[serde(default)]
    pub log_path: Option<String>,
    /// Path to the runner's report for this execution.
    #[serde(default)]
    pub report_path: Option<String>,
}

/// Outcome of a single remediation attempt.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RemediationOutcome {
    /// The re-execution after the patch passed.
    Success,
    /// The patch did not make the class pass, or was rejected.
    Failure,
    /// Some failures were fixed.
    Partial,
    /// The attempt was not made.
    Skipped,
}

/// One recorded remediation attempt on a test method.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RemediationRecord {
    /// When the attempt was recorded.
    pub timestamp: DateTime<Utc>,
    /// Attempt outcome.
    pub outcome: RemediationOutcome,
    /// Free-text diagnostic summary.
    pub diagnostic_report: String,
    /// Workspace directory holding the attempt's artifacts.
    pub workspace_path: String,
    /// Prompt sent to the oracle.
    pub prompt: String,
    /// Raw oracle response.
    pub response: String,
    /// Files modified by the attempt.
    #[serde(default)]
    pub changes_applied: Vec<String>,
    /// Wall time in milliseconds.
    pub duration_ms: u64,
}

/// Identifier path to a method inside a [`TestTree`].
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct MethodPath {
    /// Module id.
    pub module_id: String,
    /// Class id.
    pub class_id: String,
    /// Method id.
    pub method_id: String,
}

impl TestTree {
    /// Creates an empty tree stamped with `last_updated`.
    #[must_use]
    pub fn empty(last_updated: DateTime<Utc>) -> Self {
        Self { modules: Vec::new(), last_updated, version: default_version() }
    }

    /// Total number of test classes.
    #[must_use]
    pub fn class_count(&self) -> usize {
        self.modules.iter().map(|m| m.test_classes.len()).sum()
    }

    /// Total number of test methods.
    #[must_use]
    pub fn method_count(&self) -> usize {
        self.modules
            .iter()
            .flat_map(|m| &m.test_classes)
            .map(|c| c.test_methods.len())
            .sum()
    }

    /// Finds a method by its identifier path.
    #[must_use]
    pub fn find_method(
        &self,
        module_id: &str,
        class_id: &str,
        method_id: &str,
    ) -> Option<&TestMethodNode> {
        self.modules
            .iter()
            .find(|m| m.id == module_id)?
            .test_classes
            .iter()
            .find(|c| c.id == class_id)?
            .test_methods
            .iter()
            .find(|m| m.id == method_id)
    }

    /// Returns every class whose fully-qualified name is `fqn`, with its module id.
    #[must_use]
    pub fn classes_named<'a>(&'a self, fqn: &str) -> Vec<(&'a str, &'a TestClassNode)> {
        self.modules
            .iter()
            .flat_map(|m| m.test_classes.iter().map(move |c| (m.id.as_str(), c)))
            .filter(|(_, c)| c.fully_qualified_name == fqn)
            .collect()
    }

    /// Returns identifier paths of the methods of `fqn` selected by `select`.
    #[must_use]
    pub fn method_paths<F>(&self, fqn: &str, mut select: F) -> Vec<MethodPath>
    where
        F: FnMut(&TestMethodNode) -> bool,
    {
        let mut paths = Vec::new();
        for (module_id, class) in self.classes_named(fqn) {
            for method in &class.test_methods {
                if select(method) {
                    paths.push(MethodPath {
                        module_id: module_id.to_string(),
                        class_id: class.id.clone(),
                        method_id: method.id.clone(),
                    });
                }
            }
        }
        paths
    }

    /// Applies `transform` to the method at the given identifier path,
    /// returning the rebuilt tree.
    ///
    /// Every ancestor along the path is rebuilt, so the cost is linear in
    /// the size of the tree. The tree is returned unchanged if any
    /// identifier does not match.
    #[must_use]
    pub fn update_method<F>(
        self,
        module_id: &str,
        class_id: &str,
        method_id: &str,
        transform: F,
    ) -> Self
    where
        F: FnOnce(TestMethodNode) -> TestMethodNode,
    {
        let mut transform = Some(transform);
        let modules = self
            .modules
            .into_iter()
            .map(|module| {
                if module.id != module_id {
                    return module;
                }
                let test_classes = module
                    .test_classes
                    .into_iter()
                    .map(|class| {
                        if class.id != class_id {
                            return class;
                        }
                        let test_methods = class
                            .test_methods
                            .into_iter()
                            .map(|method| match transform.take() {
                                Some(f) if method.id == method_id => f(method),
                                pending => {
                                    transform = pending;
                                    method
                                }
                            })
                            .collect();
                        TestClassNode { test_methods, ..class }
                    })
                    .collect();
                ModuleNode { test_classes, ..module }
            })
            .collect();
        Self { modules, ..self }
    }
}


#[cfg(test)]
mod tests {
    use super::fixtures::*;
    use super::*;

    #[test]
    fn counts_classes_and_methods() {
        let tree = sample_tree();
        assert_eq!(tree.class_count(), 3);
        assert_eq!(tree.method_count(), 4);
    }

    #[test]
    fn find_method_follows_identifier_path() {
        let tree = sample_tree();
        let found = tree.find_method("core", "core/com.example.CalcTest", "divides");
        assert_eq!(found.map(|m| m.name.as_str()), Some("divides"));
        assert!(tree.find_method("web", "core/com.example.CalcTest", "divides").is_none());
    }

    #[test]
    fn update_method_touches_only_the_target() {
        let tree = sample_tree();
        let updated = tree.clone().update_method(
            "core",
            "core/com.example.CalcTest",
            "adds",
            |m| TestMethodNode { display_name: "renamed".into(), ..m },
        );

        let target = updated.find_method("core", "core/com.example.CalcTest", "adds").unwrap();
        assert_eq!(target.display_name, "renamed");

        let sibling = updated.find_method("core", "core/com.example.CalcTest", "divides").unwrap();
        assert_eq!(sibling.display_name, "divides()");
        assert_eq!(updated.modules[1], tree.modules[1]);
    }

    #[test]
    fn update_method_with_unknown_path_is_identity() {
        let tree = sample_tree();
        let updated = tree.clone().update_method("core", "missing", "adds", |_| unreachable!());
        assert_eq!(updated, tree);
    }

    #[test]
    fn method_paths_select_by_predicate() {
        let tree = sample_tree();
        let paths = tree.method_paths("com.example.CalcTest", |m| m.answers_to("divides()"));
        assert_eq!(
            paths,
            vec![MethodPath {
                module_id: "core".into(),
                class_id: "core/com.example.CalcTest".into(),
                method_id: "divides".into(),
            }]
        );
    }

    #[test]
    fn missing_version_defaults_on_load() {
        let json = r#"{"modules": [], "last_updated": "2025-01-01T00:00:00Z"}"#;
        let tree: TestTree = serde_json::from_str(json).unwrap();
        assert_eq!(tree.version, FORMAT_VERSION);
    }
}
