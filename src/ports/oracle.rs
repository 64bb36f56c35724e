//! Repair-oracle port.

use std::future::Future;
use std::path::PathBuf;
use std::pin::Pin;

use serde::{Deserialize, Serialize};

use super::runner::FailureDetail;
use crate::error::BoxError;

/// Boxed future returned by [`RepairOracle::repair`].
pub type RepairFuture<'a> =
    Pin<Box<dyn Future<Output = Result<RepairResponse, BoxError>> + Send + 'a>>;

/// Everything the oracle is told about a failing class.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RepairRequest {
    /// Fully-qualified class name.
    pub class_name: String,
    /// Path of the test source file.
    pub file_path: PathBuf,
    /// Current contents of the test source file.
    pub current_source: String,
    /// Failures from the most recent execution.
    pub failures: Vec<FailureDetail>,
}

/// The oracle's proposed replacement source.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RepairResponse {
    /// Full replacement contents for the test file.
    pub updated_source: String,
    /// Unprocessed oracle output, kept for the audit trail.
    pub raw_output: String,
}

/// Proposes a fix for a failing test class.
///
/// Treated as an opaque black box. Implementations fail when the oracle
/// exits non-zero or returns nothing usable.
pub trait RepairOracle: Send + Sync {
    /// Asks the oracle for replacement source.
    ///
    /// # Errors
    ///
    /// Returns an error if the oracle fails or its output is empty.
    fn repair(&self, request: &RepairRequest) -> RepairFuture<'_>;
}
