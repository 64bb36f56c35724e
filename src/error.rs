//! Error taxonomy for orchestration runs.
//!
//! Port traits return boxed errors; core components map them into
//! [`MendError`] so callers can tell fatal categories apart. Discovery gaps
//! and corrupt persisted documents are recovered where they happen and
//! never show up here.

use std::path::PathBuf;

use thiserror::Error;

use crate::guard::IntegrityViolation;

/// Boxed error type returned by port traits.
pub type BoxError = Box<dyn std::error::Error + Send + Sync>;

/// Fatal errors that abort an orchestration run.
#[derive(Debug, Error)]
pub enum MendError {
    /// Configuration could not be loaded or failed validation.
    #[error("configuration error: {0}")]
    Config(String),

    /// The structure document could not be written.
    #[error("persistence error: {0}")]
    Persistence(String),

    /// A remediation workspace artifact could not be written.
    #[error("workspace error: {0}")]
    Workspace(String),

    /// A project file could not be read or written.
    #[error("i/o error on {}: {message}", path.display())]
    Io {
        /// Path that was being accessed.
        path: PathBuf,
        /// Underlying error text.
        message: String,
    },

    /// The test-execution collaborator could not be invoked.
    #[error("test runner failed for {class}: {message}")]
    Runner {
        /// Fully-qualified class name being executed.
        class: String,
        /// Underlying error text.
        message: String,
    },

    /// The repair oracle exited non-zero or returned no usable source.
    #[error("repair oracle failed: {0}")]
    Oracle(String),

    /// A candidate patch would weaken the test suite.
    #[error(transparent)]
    Integrity(#[from] IntegrityViolation),

    /// A version-control command failed.
    #[error("version control command failed: {0}")]
    VersionControl(String),
}

impl MendError {
    /// Builds an [`MendError::Io`] from a path and any displayable error.
    pub fn io(path: impl Into<PathBuf>, err: impl std::fmt::Display) -> Self {
        Self::Io { path: path.into(), message: err.to_string() }
    }
}
