//! Execution history ledger.

use chrono::{DateTime, Utc};

use super::{cons_capped, mean_duration};
use crate::graph::{ExecutionOutcome, ExecutionRecord, TestMethodNode};
use crate::ports::Clock;

/// Maximum number of executions kept per method.
pub const EXECUTION_HISTORY_CAP: usize = 50;

/// Optional metadata attached to an execution record.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ExecutionDetails {
    /// Wall time in milliseconds.
    pub duration_ms: u64,
    /// Failure message.
    pub error_message: Option<String>,
    /// Stack trace.
    pub stack_trace: Option<String>,
    /// Runner log artifact.
    pub log_path: Option<String>,
    /// Runner report artifact.
    pub report_path: Option<String>,
}

/// Aggregates over a method's execution history.
#[derive(Debug, Clone, PartialEq)]
pub struct ExecutionStats {
    /// Number of executions in the history.
    pub total: usize,
    /// Successful executions.
    pub success_count: usize,
    /// Failed executions.
    pub failure_count: usize,
    /// Errored executions.
    pub error_count: usize,
    /// Skipped executions.
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

/// Records executions onto method nodes.
pub struct ExecutionLedger<'a> {
    clock: &'a dyn Clock,
}

impl<'a> ExecutionLedger<'a> {
    /// Creates a ledger that stamps records with `clock`.
    #[must_use]
    pub fn new(clock: &'a dyn Clock) -> Self {
        Self { clock }
    }

    /// Returns `method` with a new execution record at the head of its history.
    #[must_use]
    pub fn record(
        &self,
        method: TestMethodNode,
        outcome: ExecutionOutcome,
        details: ExecutionDetails,
    ) -> TestMethodNode {
        let record = ExecutionRecord {
            timestamp: self.clock.now(),
            outcome,
            duration_ms: details.duration_ms,
            error_message: details.error_message,
            stack_trace: details.stack_trace,
            log_path: details.log_path,
            report_path: details.report_path,
        };
        let execution_history =
            cons_capped(record.clone(), method.execution_history, EXECUTION_HISTORY_CAP);
        TestMethodNode { last_execution: Some(record), execution_history, ..method }
    }
}

/// Computes execution statistics by scanning the history.
#[must_use]
pub fn stats(method: &TestMethodNode) -> ExecutionStats {
    let history = &method.execution_history;
    let count = |outcome| history.iter().filter(|r| r.outcome == outcome).count();
    let success_count = count(ExecutionOutcome::Success);
    let latest = |outcome| history.iter().find(|r| r.outcome == outcome).map(|r| r.timestamp);

    #[allow(clippy::cast_precision_loss)]
    let success_rate =
        if history.is_empty() { 0.0 } else { success_count as f64 / history.len() as f64 };

    ExecutionStats {
        total: history.len(),
        success_count,
        failure_count: count(ExecutionOutcome::Failure),
        error_count: count(ExecutionOutcome::Error),
        skipped_count: count(ExecutionOutcome::Skipped),
        success_rate,
        mean_duration_ms: mean_duration(history.iter().map(|r| r.duration_ms)),
        last_success: latest(ExecutionOutcome::Success),
        last_failure: latest(ExecutionOutcome::Failure),
    }
}
