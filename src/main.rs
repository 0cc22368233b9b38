//! Binary entrypoint for the `converge` CLI.

use std::process::ExitCode;

fn main() -> ExitCode {
    match converge::run(std::env::args()) {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            eprintln!("{err}");
            ExitCode::FAILURE
        }
    }
}
