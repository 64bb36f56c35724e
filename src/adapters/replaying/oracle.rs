//! Replaying adapter for the `RepairOracle` port.

use super::{next_output, replay_result, SharedReplayer};
use crate::ports::oracle::{RepairFuture, RepairOracle, RepairRequest};

/// Serves recorded repair proposals.
pub struct ReplayingRepairOracle {
    replayer: SharedReplayer,
}

impl ReplayingRepairOracle {
    /// Creates an oracle backed by `replayer`.
    #[must_use]
    pub fn new(replayer: SharedReplayer) -> Self {
        Self { replayer }
    }
}

impl RepairOracle for ReplayingRepairOracle {
    fn repair(&self, _request: &RepairRequest) -> RepairFuture<'_> {
        let output = next_output(&self.replayer, "oracle", "repair");
        Box::pin(async move { replay_result(output) })
    }
}
