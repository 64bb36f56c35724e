//! Git port used as a transactional log around repair attempts.

use crate::error::BoxError;

/// Version-control primitives needed for checkpoint and rollback.
///
/// Every method maps onto one git invocation in the project root. A
/// failing invocation is an error; callers treat it as fatal.
pub trait GitRepo: Send + Sync {
    /// Returns the hash of the current HEAD commit.
    ///
    /// # Errors
    ///
    /// Returns an error if the repository has no commits or is invalid.
    fn current_commit(&self) -> Result<String, BoxError>;

    /// Stages every pending change (`git add -A`).
    ///
    /// # Errors
    ///
    /// Returns an error if the command fails.
    fn add_all(&self) -> Result<(), BoxError>;

    /// Stages a single path.
    ///
    /// # Errors
    ///
    /// Returns an error if the command fails.
    fn add(&self, path: &str) -> Result<(), BoxError>;

    /// Returns `git status --porcelain` output; empty means nothing to commit.
    ///
    /// # Errors
    ///
    /// Returns an error if the command fails.
    fn status_porcelain(&self) -> Result<String, BoxError>;

    /// Commits the staged changes with the given message.
    ///
    /// # Errors
    ///
    /// Returns an error if the command fails.
    fn commit(&self, message: &str) -> Result<(), BoxError>;

    /// Hard-resets the working tree and index to `target` (e.g. `HEAD~1`).
    ///
    /// # Errors
    ///
    /// Returns an error if the command fails.
    fn reset_hard(&self, target: &str) -> Result<(), BoxError>;
}
