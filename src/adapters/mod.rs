//! Adapter implementations of the port traits.
//!
//! - `live`: real processes, disk, clock, and network.
//! - `replaying`: serve recorded interactions from cassettes.
//! - `recording`: wrap live adapters and capture their interactions.
//! - `memory` and `fixed`: in-process stand-ins for tests and dry runs.

pub mod fixed;
pub mod live;
pub mod memory;
pub mod recording;
pub mod replaying;
