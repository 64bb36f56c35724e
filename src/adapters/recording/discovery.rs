//! Recording adapter for the `TestDiscovery` port.

use serde_json::json;

use super::record_interaction;
use crate::cassette::session::SharedRecorder;
use crate::ports::discovery::{DiscoveredMethod, TestDiscovery};

/// Records discovered method lists while delegating to an inner adapter.
pub struct RecordingTestDiscovery {
    inner: Box<dyn TestDiscovery>,
    recorder: SharedRecorder,
}

impl RecordingTestDiscovery {
    /// Wraps `inner`.
    pub fn new(inner: Box<dyn TestDiscovery>, recorder: SharedRecorder) -> Self {
        Self { inner, recorder }
    }
}

impl TestDiscovery for RecordingTestDiscovery {
    fn discover_methods(&self, class_name: &str) -> Vec<DiscoveredMethod> {
        let methods = self.inner.discover_methods(class_name);
        let input = json!({ "class_name": class_name });
        record_interaction(&self.recorder, "discovery", "discover_methods", &input, &methods);
        methods
    }
}
