//! `mend status` command.

use std::path::Path;

use crate::config::MendConfig;
use crate::context::ServiceContext;
use crate::graph::{ExecutionOutcome, TestTree};
use crate::ledger::{execution, remediation, requires_remediation};
use crate::store::GraphStore;
use crate::workspace::RemediationWorkspace;

/// Execute the `status` command.
///
/// Displays a table of every stored test method with its run count,
/// success rate, last outcome, remediation count, and whether it still
/// needs repair.
///
/// # Errors
///
/// Infallible today; kept fallible to match the other handlers.
pub fn run(
    ctx: &ServiceContext,
    config: &MendConfig,
    project_root: &Path,
    class: Option<&str>,
) -> Result<(), String> {
    let storage = config.storage_path(project_root);
    let store = GraphStore::new(ctx, &storage);

    let Some(tree) = store.load() else {
        println!("No test structure stored. Run `mend rebuild` or `mend run <CLASS>`.");
        return Ok(());
    };

    print!("{}", table(&tree, class));

    let archives = store.list_archives().len();
    let workspaces = RemediationWorkspace::new(&*ctx.fs, &*ctx.clock, &storage).list().len();
    println!("{archives} archive(s), {workspaces} remediation workspace(s).");
    if let Some(latest) = latest_archive(&store) {
        println!("{latest}");
    }
    Ok(())
}

/// Describes the newest readable archive.
fn latest_archive(store: &GraphStore<'_>) -> Option<String> {
    let name = store.list_archives().pop()?;
    let tree = store.load_archive(&name)?;
    Some(format!(
        "Latest archive: {name} ({} method(s), built {}).",
        tree.method_count(),
        tree.last_updated.format("%Y-%m-%d %H:%M:%S UTC")
    ))
}

/// Renders one row per method, optionally limited to one class.
#[must_use]
pub fn table(tree: &TestTree, class: Option<&str>) -> String {
    let mut rows: Vec<[String; 6]> = Vec::new();
    for module in &tree.modules {
        for test_class in &module.test_classes {
            if class.is_some_and(|fqn| fqn != test_class.fully_qualified_name) {
                continue;
            }
            for method in &test_class.test_methods {
                let runs = execution::stats(method);
                let fixes = remediation::stats(method);
                let last = method.last_execution.as_ref().map_or("-", |r| match r.outcome {
                    ExecutionOutcome::Success => "success",
                    ExecutionOutcome::Failure => "failure",
                    ExecutionOutcome::Error => "error",
                    ExecutionOutcome::Skipped => "skipped",
                });
                rows.push([
                    format!("{}#{}", test_class.fully_qualified_name, method.name),
                    runs.total.to_string(),
                    format!("{:.0}%", runs.success_rate * 100.0),
                    last.to_string(),
                    fixes.total.to_string(),
                    if requires_remediation(method) { "yes" } else { "no" }.to_string(),
                ]);
            }
        }
    }

    if rows.is_empty() {
        return match class {
            Some(fqn) => format!("No stored methods for {fqn}.\n"),
            None => "No test methods stored.\n".to_string(),
        };
    }

    // Column widths.
    let headers = ["METHOD", "RUNS", "SUCCESS", "LAST", "REPAIRS", "NEEDS REPAIR"];
    let mut widths = headers.map(str::len);
    for row in &rows {
        for (width, cell) in widths.iter_mut().zip(row) {
            *width = (*width).max(cell.len());
        }
    }

    let line = |cells: [&str; 6]| {
        let padded: Vec<String> =
            cells.iter().zip(widths).map(|(cell, w)| format!("{cell:<w$}")).collect();
        format!("{}\n", padded.join("  ").trim_end())
    };

    let mut out = line(headers);
    let rule: Vec<String> = widths.iter().map(|w| "-".repeat(*w)).collect();
    out.push_str(&format!("{}\n", rule.join("  ")));
    for row in &rows {
        out.push_str(&line([&row[0], &row[1], &row[2], &row[3], &row[4], &row[5]]));
    }
    out.push_str(&format!("\n{} method(s) total.\n", rows.len()));
    out
}
