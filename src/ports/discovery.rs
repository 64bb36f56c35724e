//! Test-discovery port.

use serde::{Deserialize, Serialize};

/// A test method found by the discovery collaborator.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DiscoveredMethod {
    /// Stable unique id assigned by the test engine.
    pub id: String,
    /// Simple method name.
    pub name: String,
    /// Human-readable display name.
    pub display_name: String,
}

/// Lists the test methods of a class.
pub trait TestDiscovery: Send + Sync {
    /// Returns the methods in `class_name`.
    ///
    /// A class that cannot be loaded (e.g. not yet compiled) yields an empty
    /// list rather than an error.
    fn discover_methods(&self, class_name: &str) -> Vec<DiscoveredMethod>;
}
