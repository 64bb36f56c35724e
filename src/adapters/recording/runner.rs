//! Recording adapter for the `TestRunner` port.

use serde_json::json;

use super::record_result;
use crate::cassette::session::SharedRecorder;
use crate::error::BoxError;
use crate::ports::runner::{ExecutionReport, TestRunner};

/// Records execution reports while delegating to an inner runner.
pub struct RecordingTestRunner {
    inner: Box<dyn TestRunner>,
    recorder: SharedRecorder,
}

impl RecordingTestRunner {
    /// Wraps `inner`.
    pub fn new(inner: Box<dyn TestRunner>, recorder: SharedRecorder) -> Self {
        Self { inner, recorder }
    }
}

impl TestRunner for RecordingTestRunner {
    fn execute(&self, class_name: &str) -> Result<ExecutionReport, BoxError> {
        let result = self.inner.execute(class_name);
        let input = json!({ "class_name": class_name });
        record_result(&self.recorder, "runner", "execute", &input, &result);
        result
    }
}
