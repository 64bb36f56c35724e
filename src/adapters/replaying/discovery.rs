//! Replaying adapter for the `TestDiscovery` port.

use super::{next_output, replay_value, SharedReplayer};
use crate::ports::discovery::{DiscoveredMethod, TestDiscovery};

/// Serves recorded method listings.
pub struct ReplayingTestDiscovery {
    replayer: SharedReplayer,
}

impl ReplayingTestDiscovery {
    /// Creates a discovery adapter backed by `replayer`.
    #[must_use]
    pub fn new(replayer: SharedReplayer) -> Self {
        Self { replayer }
    }
}

impl TestDiscovery for ReplayingTestDiscovery {
    fn discover_methods(&self, _class_name: &str) -> Vec<DiscoveredMethod> {
        replay_value(
            next_output(&self.replayer, "discovery", "discover_methods"),
            "discovery::discover_methods",
        )
    }
}
