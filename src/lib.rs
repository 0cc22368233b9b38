//! Event-triggered configuration reconciliation for network devices.
//!
//! Change events from an inventory are filtered for relevance, the affected
//! target is validated, its intended configuration is rendered, and a driver
//! session converges the device: load, diff, then commit or discard.
//!
//! The core lives in [`reconcile`]; [`trigger`] builds requests for the
//! manual, pre-bound, and event-driven entry points; [`ports`] defines the
//! collaborator boundaries and [`adapters`] implements them.

pub mod adapters;
pub mod cli;
pub mod commands;
pub mod context;
pub mod error;
pub mod logging;
pub mod model;
pub mod ports;
pub mod reconcile;
pub mod settings;
pub mod trigger;

pub use context::ServiceContext;
pub use error::{Error, Result};
pub use reconcile::Engine;
pub use settings::Settings;
pub use trigger::{Dispatch, Triggers};

use clap::error::ErrorKind;
use clap::Parser;

/// Run the CLI with the provided arguments.
///
/// Loads `.env` if present, installs logging, then dispatches.
///
/// # Errors
///
/// Returns an error string when argument parsing fails or command execution fails.
pub fn run<I, T>(args: I) -> std::result::Result<(), String>
where
    I: IntoIterator<Item = T>,
    T: Into<std::ffi::OsString> + Clone,
{
    let cli = match cli::Cli::try_parse_from(args) {
        Ok(cli) => cli,
        Err(err) if matches!(err.kind(), ErrorKind::DisplayHelp | ErrorKind::DisplayVersion) => {
            print!("{err}");
            return Ok(());
        }
        Err(err) => return Err(err.to_string()),
    };
    // Read before logging starts so `.env` can set the log filter.
    let dotenv = dotenvy::dotenv();
    logging::init(cli.verbose);
    if let Err(e) = dotenv {
        if !e.not_found() {
            tracing::warn!("ignoring .env: {e}");
        }
    }
    commands::dispatch(&cli)
}
