//! Recording adapter for the `RepairOracle` port.

use std::sync::Arc;

use serde_json::json;

use super::record_result;
use crate::cassette::session::SharedRecorder;
use crate::ports::oracle::{RepairFuture, RepairOracle, RepairRequest};

/// Records repair proposals while delegating to an inner oracle.
pub struct RecordingRepairOracle {
    inner: Box<dyn RepairOracle>,
    recorder: SharedRecorder,
}

impl RecordingRepairOracle {
    /// Wraps `inner`.
    pub fn new(inner: Box<dyn RepairOracle>, recorder: SharedRecorder) -> Self {
        Self { inner, recorder }
    }
}

impl RepairOracle for RecordingRepairOracle {
    fn repair(&self, request: &RepairRequest) -> RepairFuture<'_> {
        let input = json!({
            "class_name": request.class_name,
            "file_path": request.file_path,
            "failures": request.failures,
        });
        let recorder = Arc::clone(&self.recorder);
        let pending = self.inner.repair(request);

        Box::pin(async move {
            let result = pending.await;
            record_result(&recorder, "oracle", "repair", &input, &result);
            result
        })
    }
}
