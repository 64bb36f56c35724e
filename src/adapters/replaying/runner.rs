//! Replaying adapter for the `TestRunner` port.

use super::{next_output, replay_result, SharedReplayer};
use crate::error::BoxError;
use crate::ports::runner::{ExecutionReport, TestRunner};

/// Serves recorded execution reports.
pub struct ReplayingTestRunner {
    replayer: SharedReplayer,
}

impl ReplayingTestRunner {
    /// Creates a runner backed by `replayer`.
    #[must_use]
    pub fn new(replayer: SharedReplayer) -> Self {
        Self { replayer }
    }
}

impl TestRunner for ReplayingTestRunner {
    fn execute(&self, _class_name: &str) -> Result<ExecutionReport, BoxError> {
        replay_result(next_output(&self.replayer, "runner", "execute"))
    }
}
