//! Carries history from a stored tree onto a freshly built one.

use std::collections::HashMap;

use super::{ModuleNode, TestClassNode, TestMethodNode, TestTree};

/// Returns `new` with each method's history copied from the method of the
/// same module, class, and method id in `old`.
///
/// Nodes only in `new` keep empty history; nodes only in `old` are dropped
/// along with their history.
#[must_use]
pub fn merge(new: TestTree, old: &TestTree) -> TestTree {
    let old_modules: HashMap<&str, &ModuleNode> =
        old.modules.iter().map(|m| (m.id.as_str(), m)).collect();

    let modules = new
        .modules
        .into_iter()
        .map(|module| match old_modules.get(module.id.as_str()) {
            Some(previous) => merge_module(module, previous),
            None => module,
        })
        .collect();
    TestTree { modules, ..new }
}

fn merge_module(module: ModuleNode, old: &ModuleNode) -> ModuleNode {
    let old_classes: HashMap<&str, &TestClassNode> =
        old.test_classes.iter().map(|c| (c.id.as_str(), c)).collect();
    let test_classes = module
        .test_classes
        .into_iter()
        .map(|class| match old_classes.get(class.id.as_str()) {
            Some(previous) => merge_class(class, previous),
            None => class,
        })
        .collect();
    ModuleNode { test_classes, ..module }
}

fn merge_class(class: TestClassNode, old: &TestClassNode) -> TestClassNode {
    let old_methods: HashMap<&str, &TestMethodNode> =
        old.test_methods.iter().map(|m| (m.id.as_str(), m)).collect();
    let test_methods = class
        .test_methods
        .into_iter()
        .map(|method| match old_methods.get(method.id.as_str()) {
            Some(previous) => TestMethodNode {
                last_execution: previous.last_execution.clone(),
                last_remediation: previous.last_remediation.clone(),
                execution_history: previous.execution_history.clone(),
                remediation_history: previous.remediation_history.clone(),
                ..method
            },
            None => method,
        })
        .collect();
    TestClassNode { test_methods, ..class }
}
