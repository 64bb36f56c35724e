//! Binary entrypoint for the `mend` CLI.

use std::process::ExitCode;

fn main() -> ExitCode {
    let _ = dotenvy::dotenv(); // Load .env from current directory

    // Recording and replay are handled in commands::dispatch via
    // MEND_RECORD=<dir> and MEND_REPLAY=<dir>.
    match mend::run(std::env::args()) {
        Ok(true) => ExitCode::SUCCESS,
        Ok(false) => ExitCode::FAILURE,
        Err(err) => {
            eprintln!("{err}");
            ExitCode::FAILURE
        }
    }
}
