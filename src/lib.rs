//! Core library entry for the `mend` CLI.
//!
//! `mend` keeps a persistent model of a project's tests (module → class →
//! method, each method with bounded execution and remediation history),
//! runs requested test classes, and sends failing ones to a repair oracle
//! inside a commit-before, reset-after safety net.

pub mod adapters;
pub mod cassette;
pub mod cli;
pub mod commands;
pub mod config;
pub mod context;
pub mod error;
pub mod graph;
pub mod guard;
pub mod ledger;
pub mod logging;
pub mod orchestrator;
pub mod ports;
pub mod repair;
pub mod snapshot;
pub mod store;
pub mod workspace;

use clap::Parser;

/// Run the CLI with the provided arguments.
///
/// Returns `Ok(true)` when every requested class passed (or the command
/// does not execute tests), `Ok(false)` when some class still fails.
///
/// # Errors
///
/// Returns an error string when argument parsing fails or command execution fails.
pub fn run<I, T>(args: I) -> Result<bool, String>
where
    I: IntoIterator<Item = T>,
    T: Into<std::ffi::OsString> + Clone,
{
    let cli = cli::Cli::try_parse_from(args).map_err(|err| err.to_string())?;
    commands::dispatch(&cli)
}
