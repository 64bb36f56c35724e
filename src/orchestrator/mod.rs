//! The per-class execute, repair, and rollback state machine.
//!
//! Classes are processed one at a time in sorted order. A failing class
//! gets a checkpoint commit, then up to `max_retry_per_class` repair
//! attempts; if none succeeds every change since the checkpoint is
//! discarded. Every execution and attempt is written to the tree, which
//! is persisted at the end of the run (and on the way out of a fatal
//! error, without archiving).

mod record;

use std::path::{Path, PathBuf};
use std::time::Instant;

use tracing::{debug, error, info, warn};

use crate::config::{IntegrityViolationPolicy, MendConfig};
use crate::context::ServiceContext;
use crate::error::MendError;
use crate::graph::builder::GraphBuilder;
use crate::graph::merge::merge;
use crate::graph::policy::ProjectView;
use crate::graph::{RemediationOutcome, TestTree};
use crate::guard::IntegrityGuard;
use crate::ledger::{ExecutionLedger, RemediationDetails, RemediationLedger};
use crate::ports::oracle::RepairRequest;
use crate::ports::runner::{ExecutionReport, FailureDetail};
use crate::repair::build_prompt;
use crate::snapshot::SnapshotManager;
use crate::store::GraphStore;
use crate::workspace::{FailureContext, RemediationWorkspace};

use self::record::{record_execution, record_remediation};

/// Outcome for one requested class.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClassReport {
    /// Fully-qualified class name.
    pub class_name: String,
    /// Whether the class passed at the end of processing.
    pub passed: bool,
    /// Repair attempts made.
    pub attempts: u32,
    /// Whether a repair made the class pass.
    pub repaired: bool,
    /// Whether the working tree was reset to the checkpoint.
    pub rolled_back: bool,
    /// Failures from the last execution.
    pub remaining_failures: Vec<FailureDetail>,
}

/// Outcome of a whole run.
#[derive(Debug, Clone, PartialEq)]
pub struct RunReport {
    /// One entry per distinct requested class, in processing order.
    pub classes: Vec<ClassReport>,
    /// Repair attempts across all classes.
    pub total_attempts: u32,
    /// Classes that passed after a repair.
    pub successful_repairs: u32,
    /// The persisted tree.
    pub tree: TestTree,
}

impl RunReport {
    /// `true` if every class ultimately passed.
    #[must_use]
    pub fn all_passed(&self) -> bool {
        self.classes.iter().all(|c| c.passed)
    }
}

/// Drives execution and repair for a project.
pub struct Orchestrator<'a> {
    ctx: &'a ServiceContext,
    config: &'a MendConfig,
    project_root: PathBuf,
    storage: PathBuf,
    guard: IntegrityGuard,
}

impl<'a> Orchestrator<'a> {
    /// Creates an orchestrator for the project at `project_root`.
    ///
    /// # Errors
    ///
    /// Returns [`MendError::Config`] if the guard patterns do not compile.
    pub fn new(
        ctx: &'a ServiceContext,
        config: &'a MendConfig,
        project_root: &Path,
    ) -> Result<Self, MendError> {
        Ok(Self {
            ctx,
            config,
            project_root: project_root.to_path_buf(),
            storage: config.storage_path(project_root),
            guard: IntegrityGuard::from_config(&config.guard)?,
        })
    }

    /// Store for this project's storage directory.
    #[must_use]
    pub fn store(&self) -> GraphStore<'a> {
        GraphStore::new(self.ctx, &self.storage)
    }

    /// Loads the stored tree, rebuilding it when the update policy asks to.
    #[must_use]
    pub fn load_or_build(&self) -> TestTree {
        let existing = self.store().load();
        let project = ProjectView {
            fs: &*self.ctx.fs,
            clock: &*self.ctx.clock,
            project_root: &self.project_root,
            layout: &self.config.layout,
        };
        match existing {
            Some(tree) if !self.config.rebuild.should_rebuild(Some(&tree), &project) => {
                debug!("stored test structure is current");
                tree
            }
            existing => self.rebuild(existing.as_ref()),
        }
    }

    /// Scans the project and carries history over from `existing`.
    #[must_use]
    pub fn rebuild(&self, existing: Option<&TestTree>) -> TestTree {
        let fresh = GraphBuilder::new(
            &*self.ctx.fs,
            &*self.ctx.clock,
            &*self.ctx.discovery,
            &self.project_root,
            &self.config.layout,
        )
        .build();
        match existing {
            Some(old) => merge(fresh, old),
            None => fresh,
        }
    }

    /// Processes `classes` and persists the resulting tree.
    ///
    /// # Errors
    ///
    /// Returns the first fatal error. The tree recorded up to that point
    /// is still saved.
    pub async fn run(&self, classes: &[String]) -> Result<RunReport, MendError> {
        let mut requested: Vec<&str> = classes.iter().map(String::as_str).collect();
        requested.sort_unstable();
        requested.dedup();

        let store = self.store();
        let mut tree = self.load_or_build();
        let mut reports = Vec::with_capacity(requested.len());

        for class_name in requested {
            match self.process_class(&mut tree, class_name).await {
                Ok(report) => reports.push(report),
                Err(err) => {
                    error!(class = class_name, error = %err, "run aborted");
                    if let Err(save_err) = store.save(&tree) {
                        warn!(error = %save_err, "could not save partial results");
                    }
                    return Err(err);
                }
            }
        }

        store.save(&tree)?;
        store.archive(&tree)?;

        let total_attempts = reports.iter().map(|r| r.attempts).sum();
        let successful_repairs =
            u32::try_from(reports.iter().filter(|r| r.repaired).count()).unwrap_or(u32::MAX);
        info!(
            classes = reports.len(),
            attempts = total_attempts,
            repaired = successful_repairs,
            "run complete"
        );
        Ok(RunReport { classes: reports, total_attempts, successful_repairs, tree })
    }

    async fn process_class(
        &self,
        tree: &mut TestTree,
        class_name: &str,
    ) -> Result<ClassReport, MendError> {
        info!(class = class_name, "executing");
        let mut current = self.execute(tree, class_name)?;
        if current.passed() {
            return Ok(ClassReport {
                class_name: class_name.to_string(),
                passed: true,
                attempts: 0,
                repaired: false,
                rolled_back: false,
                remaining_failures: Vec::new(),
            });
        }

        let snapshots = SnapshotManager::new(&*self.ctx.git);
        let checkpoint =
            snapshots.snapshot(&format!("mend: checkpoint before repairing {class_name}"))?;
        let file_path = self.test_file(tree, class_name);
        let original = self
            .ctx
            .fs
            .read_to_string(&file_path)
            .map_err(|e| MendError::io(&file_path, e))?;
        let target = RepairTarget { class_name, file_path: &file_path, original: &original };
        let max = self.config.max_retry_per_class;

        let mut attempts = 0;
        while attempts < max && !current.passed() {
            attempts += 1;
            info!(class = class_name, attempt = attempts, max, "requesting repair");
            current = self.attempt(tree, &target, current, attempts, &snapshots).await?;
        }

        let passed = current.passed();
        if passed {
            info!(class = class_name, attempts, "repaired");
        } else {
            warn!(class = class_name, attempts, "repair budget exhausted");
            snapshots.rollback(&checkpoint)?;
        }
        Ok(ClassReport {
            class_name: class_name.to_string(),
            passed,
            attempts,
            repaired: passed,
            rolled_back: !passed,
            remaining_failures: current.failures,
        })
    }

    /// One repair attempt. Returns the report the next attempt starts from.
    ///
    /// Candidates are checked against the source from before the first
    /// attempt; the oracle sees the file as the previous attempt left it.
    async fn attempt(
        &self,
        tree: &mut TestTree,
        target: &RepairTarget<'_>,
        failing: ExecutionReport,
        attempt: u32,
        snapshots: &SnapshotManager<'_>,
    ) -> Result<ExecutionReport, MendError> {
        let RepairTarget { class_name, file_path, original } = *target;
        let started = Instant::now();
        let workspaces = RemediationWorkspace::new(&*self.ctx.fs, &*self.ctx.clock, &self.storage);

        let current_source = self
            .ctx
            .fs
            .read_to_string(file_path)
            .map_err(|e| MendError::io(file_path, e))?;
        let first = failing.failures.first().cloned().unwrap_or_else(|| FailureDetail {
            method: simple_name(class_name).to_string(),
            message: String::new(),
            stacktrace: String::new(),
        });
        let dir = workspaces.create(class_name, &first.method, self.ctx.clock.now())?;
        workspaces.save_failure_context(
            &dir,
            &FailureContext {
                class_name,
                method: &first.method,
                message: &first.message,
                stacktrace: &first.stacktrace,
                source: original,
            },
        )?;

        let request = RepairRequest {
            class_name: class_name.to_string(),
            file_path: file_path.to_path_buf(),
            current_source,
            failures: failing.failures.clone(),
        };
        let prompt = build_prompt(&request);
        workspaces.save_prompt(&dir, &prompt)?;
        workspaces.log_activity(&dir, &format!("attempt {attempt}: requesting repair"))?;

        let response = self
            .ctx
            .oracle
            .repair(&request)
            .await
            .map_err(|e| MendError::Oracle(e.to_string()))?;
        workspaces.save_response(&dir, &response.raw_output)?;

        let mut details = RemediationDetails {
            workspace_path: dir.display().to_string(),
            prompt,
            response: response.raw_output,
            ..RemediationDetails::default()
        };

        if let Err(violation) = self.guard.verify(original, &response.updated_source) {
            workspaces.log_activity(&dir, &format!("candidate rejected: {violation}"))?;
            details.diagnostic_report =
                diagnostic(class_name, attempt, &failing, None, Some(&violation.to_string()));
            workspaces.save_diagnostic(&dir, &details.diagnostic_report)?;
            details.duration_ms = elapsed_ms(started);
            *tree = record_remediation(
                take(tree),
                &RemediationLedger::new(&*self.ctx.clock),
                class_name,
                &failing.failures,
                RemediationOutcome::Failure,
                &details,
            );
            return match self.config.integrity_violation {
                IntegrityViolationPolicy::Abort => Err(violation.into()),
                IntegrityViolationPolicy::ConsumeAttempt => {
                    warn!(class = class_name, attempt, %violation, "candidate rejected");
                    Ok(failing)
                }
            };
        }

        self.ctx
            .fs
            .write(file_path, &response.updated_source)
            .map_err(|e| MendError::io(file_path, e))?;
        workspaces.save_modified_file(&dir, file_path, &response.updated_source)?;
        snapshots.stage(&file_path.display().to_string())?;
        workspaces.log_activity(&dir, &format!("applied candidate to {}", file_path.display()))?;
        details.changes_applied = vec![file_path.display().to_string()];

        let rerun = self.execute(tree, class_name)?;
        let outcome = if rerun.passed() {
            RemediationOutcome::Success
        } else {
            RemediationOutcome::Failure
        };
        details.diagnostic_report = diagnostic(class_name, attempt, &failing, Some(&rerun), None);
        workspaces.save_diagnostic(&dir, &details.diagnostic_report)?;
        workspaces.log_activity(
            &dir,
            &format!("re-execution finished with {} failure(s)", rerun.failures.len()),
        )?;
        details.duration_ms = elapsed_ms(started);

        *tree = record_remediation(
            take(tree),
            &RemediationLedger::new(&*self.ctx.clock),
            class_name,
            &failing.failures,
            outcome,
            &details,
        );
        Ok(rerun)
    }

    /// Runs `class_name` and records the result on every one of its methods.
    fn execute(&self, tree: &mut TestTree, class_name: &str) -> Result<ExecutionReport, MendError> {
        let started = Instant::now();
        let report = self.ctx.runner.execute(class_name).map_err(|e| MendError::Runner {
            class: class_name.to_string(),
            message: e.to_string(),
        })?;
        let duration_ms = elapsed_ms(started);
        debug!(class = class_name, failures = report.failures.len(), duration_ms, "executed");

        if tree.classes_named(class_name).is_empty() {
            debug!(class = class_name, "class not in test structure, execution not recorded");
        }
        *tree = record_execution(
            take(tree),
            &ExecutionLedger::new(&*self.ctx.clock),
            class_name,
            &report,
            duration_ms,
        );
        Ok(report)
    }

    /// The class's source file from the tree, or its conventional location.
    fn test_file(&self, tree: &TestTree, class_name: &str) -> PathBuf {
        if let Some((_, class)) = tree.classes_named(class_name).first() {
            return PathBuf::from(&class.file_path);
        }
        self.project_root
            .join(&self.config.layout.test_source_dir)
            .join(format!(
                "{}.{}",
                class_name.replace('.', "/"),
                self.config.layout.test_file_extension
            ))
    }
}

/// The class being repaired and its source from before the first attempt.
#[derive(Clone, Copy)]
struct RepairTarget<'t> {
    class_name: &'t str,
    file_path: &'t Path,
    original: &'t str,
}

fn take(tree: &mut TestTree) -> TestTree {
    let placeholder = TestTree::empty(tree.last_updated);
    std::mem::replace(tree, placeholder)
}

fn simple_name(class_name: &str) -> &str {
    class_name.rsplit('.').next().unwrap_or(class_name)
}

fn elapsed_ms(started: Instant) -> u64 {
    u64::try_from(started.elapsed().as_millis()).unwrap_or(u64::MAX)
}

fn diagnostic(
    class_name: &str,
    attempt: u32,
    before: &ExecutionReport,
    after: Option<&ExecutionReport>,
    rejection: Option<&str>,
) -> String {
    let mut report = format!(
        "# Diagnostic report\n\n- Class: {class_name}\n- Attempt: {attempt}\n- Failures before: {}\n",
        before.failures.len()
    );
    for failure in &before.failures {
        report.push_str(&format!("  - {}: {}\n", failure.method, failure.message));
    }
    match (after, rejection) {
        (_, Some(reason)) => report.push_str(&format!("- Outcome: rejected ({reason})\n")),
        (Some(after), None) if after.passed() => report.push_str("- Outcome: success\n"),
        (Some(after), None) => {
            report.push_str(&format!(
                "- Outcome: failure\n- Failures after: {}\n",
                after.failures.len()
            ));
            for failure in &after.failures {
                report.push_str(&format!("  - {}: {}\n", failure.method, failure.message));
            }
        }
        (None, None) => report.push_str("- Outcome: not executed\n"),
    }
    report
}
