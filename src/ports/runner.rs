//! Test-execution port.

use serde::{Deserialize, Serialize};

use crate::error::BoxError;

/// One failing test method reported by the runner.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FailureDetail {
    /// Method name as reported by the engine (simple or display name).
    pub method: String,
    /// Failure message.
    #[serde(default)]
    pub message: String,
    /// Stack trace text.
    #[serde(default)]
    pub stacktrace: String,
}

/// Result of executing one test class.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExecutionReport {
    /// Fully-qualified class name that was executed.
    pub class_name: String,
    /// Failing methods; empty means the class passed.
    #[serde(default)]
    pub failures: Vec<FailureDetail>,
}

impl ExecutionReport {
    /// Returns `true` when no method failed.
    #[must_use]
    pub fn passed(&self) -> bool {
        self.failures.is_empty()
    }
}

/// Runs a named test class and reports per-method failures.
pub trait TestRunner: Send + Sync {
    /// Executes every test in `class_name`, blocking until it finishes.
    ///
    /// # Errors
    ///
    /// Returns an error only when the engine cannot be invoked at all. Test
    /// failures are reported in the [`ExecutionReport`].
    fn execute(&self, class_name: &str) -> Result<ExecutionReport, BoxError>;
}
