//! Cassettes: YAML transcripts of port interactions used to record a live
//! run and replay it deterministically.

pub mod config;
pub mod format;
pub mod recorder;
pub mod replayer;
pub mod session;
