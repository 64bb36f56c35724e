//! Command dispatch and handlers.

pub mod rebuild;
pub mod run;
pub mod status;

use std::env;
use std::path::PathBuf;

use crate::cassette::session::{commit_hash, RecordingSession, RECORD_ENV};
use crate::cli::{Cli, Command};
use crate::config::MendConfig;
use crate::context::ServiceContext;
use crate::logging::init_logging;

/// Environment variable naming a cassette directory to replay instead of
/// touching git, the test engine, discovery, or the oracle.
pub const REPLAY_ENV: &str = "MEND_REPLAY";

/// Dispatch a parsed command to its handler.
///
/// When `MEND_RECORD` is set, all port interactions except file I/O are
/// recorded to per-port cassette files in the named directory, or under
/// `.mend/cassettes/<timestamp>/` when the value is empty. When `MEND_REPLAY` is set, they are served from one.
///
/// Returns `Ok(false)` when the command ran but some class still fails.
///
/// # Errors
///
/// Returns an error string if configuration fails or the handler fails.
pub fn dispatch(cli: &Cli) -> Result<bool, String> {
    let mut config =
        MendConfig::load(&cli.project_root, cli.config.as_deref()).map_err(|e| e.to_string())?;
    if let Command::Run { max_retries: Some(n), .. } = &cli.command {
        config.max_retry_per_class = *n;
        config.validate().map_err(|e| e.to_string())?;
    }
    init_logging(&config.logging).map_err(|e| e.to_string())?;

    let (ctx, session) = if let Ok(path) = env::var(REPLAY_ENV) {
        (ServiceContext::replaying(&PathBuf::from(path))?, None)
    } else if let Ok(path) = env::var(RECORD_ENV) {
        let session = if path.trim().is_empty() {
            RecordingSession::new(&cli.project_root)?
        } else {
            RecordingSession::at(PathBuf::from(path), &commit_hash(&cli.project_root))?
        };
        (ServiceContext::recording(&cli.project_root, &config, &session), Some(session))
    } else {
        (ServiceContext::live(&cli.project_root, &config), None)
    };

    let result = dispatch_with_context(cli, &config, &ctx);

    // Finish recording after command completes (even on error)
    if let Some(session) = session {
        // Drop context first to release Arc references
        drop(ctx);
        finish_recording(session)?;
    }

    result
}

/// Dispatch a command with the given service context.
fn dispatch_with_context(
    cli: &Cli,
    config: &MendConfig,
    ctx: &ServiceContext,
) -> Result<bool, String> {
    match &cli.command {
        Command::Run { classes, .. } => run::run(ctx, config, &cli.project_root, classes),
        Command::Status { class } => {
            status::run(ctx, config, &cli.project_root, class.as_deref()).map(|()| true)
        }
        Command::Rebuild => rebuild::run(ctx, config, &cli.project_root).map(|()| true),
    }
}

/// Finish a recording session and print the output directory.
fn finish_recording(session: RecordingSession) -> Result<(), String> {
    let output_dir = session.finish()?;
    eprintln!("Recording saved to: {}", output_dir.display());
    Ok(())
}
