//! Recording adapter for the `GitRepo` port.

use serde_json::json;

use super::record_result;
use crate::cassette::session::SharedRecorder;
use crate::error::BoxError;
use crate::ports::git::GitRepo;

/// Records git calls while delegating to an inner repo.
pub struct RecordingGitRepo {
    inner: Box<dyn GitRepo>,
    recorder: SharedRecorder,
}

impl RecordingGitRepo {
    /// Wraps `inner`.
    pub fn new(inner: Box<dyn GitRepo>, recorder: SharedRecorder) -> Self {
        Self { inner, recorder }
    }
}

impl GitRepo for RecordingGitRepo {
    fn current_commit(&self) -> Result<String, BoxError> {
        let result = self.inner.current_commit();
        record_result(&self.recorder, "git", "current_commit", &(), &result);
        result
    }

    fn add_all(&self) -> Result<(), BoxError> {
        let result = self.inner.add_all();
        record_result(&self.recorder, "git", "add_all", &(), &result);
        result
    }

    fn add(&self, path: &str) -> Result<(), BoxError> {
        let result = self.inner.add(path);
        record_result(&self.recorder, "git", "add", &json!({ "path": path }), &result);
        result
    }

    fn status_porcelain(&self) -> Result<String, BoxError> {
        let result = self.inner.status_porcelain();
        record_result(&self.recorder, "git", "status_porcelain", &(), &result);
        result
    }

    fn commit(&self, message: &str) -> Result<(), BoxError> {
        let result = self.inner.commit(message);
        record_result(&self.recorder, "git", "commit", &json!({ "message": message }), &result);
        result
    }

    fn reset_hard(&self, target: &str) -> Result<(), BoxError> {
        let result = self.inner.reset_hard(target);
        record_result(&self.recorder, "git", "reset_hard", &json!({ "target": target }), &result);
        result
    }
}
