//! `mend run` command.

use std::path::Path;

use crate::config::MendConfig;
use crate::context::ServiceContext;
use crate::orchestrator::{Orchestrator, RunReport};

/// Execute the `run` command.
///
/// Drives the orchestrator on a single-threaded runtime and prints one
/// line per class. Returns whether every class ultimately passed.
///
/// # Errors
///
/// Returns an error string on any fatal orchestration error.
pub fn run(
    ctx: &ServiceContext,
    config: &MendConfig,
    project_root: &Path,
    classes: &[String],
) -> Result<bool, String> {
    let orchestrator = Orchestrator::new(ctx, config, project_root).map_err(|e| e.to_string())?;
    let runtime = tokio::runtime::Builder::new_current_thread()
        .enable_all()
        .build()
        .map_err(|e| format!("failed to start runtime: {e}"))?;

    let report = runtime.block_on(orchestrator.run(classes)).map_err(|e| e.to_string())?;
    print!("{}", render(&report));
    Ok(report.all_passed())
}

/// Formats a run report for the terminal.
#[must_use]
pub fn render(report: &RunReport) -> String {
    let mut out = String::new();
    for class in &report.classes {
        let verdict = match (class.passed, class.repaired, class.rolled_back) {
            (true, true, _) => format!("REPAIRED after {} attempt(s)", class.attempts),
            (true, false, _) => "PASSED".to_string(),
            (false, _, true) => format!("FAILED after {} attempt(s), rolled back", class.attempts),
            (false, _, false) => "FAILED".to_string(),
        };
        out.push_str(&format!("{}: {verdict}\n", class.class_name));
        for failure in &class.remaining_failures {
            out.push_str(&format!("  {}: {}\n", failure.method, failure.message));
        }
    }
    let failed = report.classes.iter().filter(|c| !c.passed).count();
    out.push_str(&format!(
        "\n{} class(es), {} repair attempt(s), {} repaired, {failed} still failing.\n",
        report.classes.len(),
        report.total_attempts,
        report.successful_repairs,
    ));
    out
}
