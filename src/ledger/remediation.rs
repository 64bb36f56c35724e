//! Remediation history ledger and the "needs repair" rule.

use chrono::{DateTime, Utc};

use super::{cons_capped, mean_duration};
use crate::graph::{ExecutionOutcome, RemediationOutcome, RemediationRecord, TestMethodNode};
use crate::ports::Clock;

/// Maximum number of remediation attempts kept per method.
pub const REMEDIATION_HISTORY_CAP: usize = 20;

/// Metadata attached to a remediation record.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RemediationDetails {
    /// Diagnostic summary of the attempt.
    pub diagnostic_report: String,
    /// Workspace directory for the attempt.
    pub workspace_path: String,
    /// Prompt sent to the oracle.
    pub prompt: String,
    /// Raw oracle response.
    pub response: String,
    /// Files modified by the attempt.
    pub changes_applied: Vec<String>,
    /// Wall time in milliseconds.
    pub duration_ms: u64,
}

/// Aggregates over a method's remediation history.
#[derive(Debug, Clone, PartialEq)]
pub struct RemediationStats {
    /// Number of attempts in the history.
    pub total: usize,
    /// Successful attempts.
    pub success_count: usize,
    /// Failed attempts.
    pub failure_count: usize,
    /// Partially successful attempts.
    pub partial_count: usize,
    /// Skipped attempts.
    pub skipped_count: usize,
    /// `success_count / total`, or `0.0` for an empty history.
    pub success_rate: f64,
    /// Mean duration in milliseconds.
    pub mean_duration_ms: u64,
    /// Timestamp of the most recent success.
    pub last_success: Option<DateTime<Utc>>,
    /// Timestamp of the most recent failure.
    pub last_failure: Option<DateTime<Utc>>,
}

/// Records remediation attempts onto method nodes.
pub struct RemediationLedger<'a> {
    clock: &'a dyn Clock,
}

impl<'a> RemediationLedger<'a> {
    /// Creates a ledger that stamps records with `clock`.
    #[must_use]
    pub fn new(clock: &'a dyn Clock) -> Self {
        Self { clock }
    }

    /// Returns `method` with a new remediation record at the head of its history.
    #[must_use]
    pub fn record(
        &self,
        method: TestMethodNode,
        outcome: RemediationOutcome,
        details: RemediationDetails,
    ) -> TestMethodNode {
        let record = RemediationRecord {
            timestamp: self.clock.now(),
            outcome,
            diagnostic_report: details.diagnostic_report,
            workspace_path: details.workspace_path,
            prompt: details.prompt,
            response: details.response,
            changes_applied: details.changes_applied,
            duration_ms: details.duration_ms,
        };
        let remediation_history =
            cons_capped(record.clone(), method.remediation_history, REMEDIATION_HISTORY_CAP);
        TestMethodNode { last_remediation: Some(record), remediation_history, ..method }
    }
}

/// Computes remediation statistics by scanning the history.
#[must_use]
pub fn stats(method: &TestMethodNode) -> RemediationStats {
    let history = &method.remediation_history;
    let count = |outcome| history.iter().filter(|r| r.outcome == outcome).count();
    let success_count = count(RemediationOutcome::Success);
    let latest = |outcome| history.iter().find(|r| r.outcome == outcome).map(|r| r.timestamp);

    #[allow(clippy::cast_precision_loss)]
    let success_rate =
        if history.is_empty() { 0.0 } else { success_count as f64 / history.len() as f64 };

    RemediationStats {
        total: history.len(),
        success_count,
        failure_count: count(RemediationOutcome::Failure),
        partial_count: count(RemediationOutcome::Partial),
        skipped_count: count(RemediationOutcome::Skipped),
        success_rate,
        mean_duration_ms: mean_duration(history.iter().map(|r| r.duration_ms)),
        last_success: latest(RemediationOutcome::Success),
        last_failure: latest(RemediationOutcome::Failure),
    }
}

/// Returns `true` if the method's latest execution failed and no later
/// successful remediation covers it.
#[must_use]
pub fn requires_remediation(method: &TestMethodNode) -> bool {
    let Some(execution) = &method.last_execution else {
        return false;
    };
    if !matches!(execution.outcome, ExecutionOutcome::Failure | ExecutionOutcome::Error) {
        return false;
    }
    match &method.last_remediation {
        None => true,
        Some(remediation) => {
            remediation.outcome != RemediationOutcome::Success
                || remediation.timestamp < execution.timestamp
        }
    }
}
