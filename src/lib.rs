//! Core library entry for the `gitward` CLI.
//!
//! `gitward` keeps a fixed set of git working trees on a server in view:
//! whether each is clean, whether it is behind or ahead of its upstream,
//! and, on request, pulls or pushes the ones that can be synced without a
//! merge. Every repository's commands run as the repository's owner.

pub mod adapters;
pub mod batch;
pub mod bootstrap;
pub mod cli;
pub mod commands;
pub mod config;
pub mod context;
pub mod error;
pub mod identity;
pub mod inspect;
pub mod logging;
pub mod ports;
pub mod prompt;
pub mod reconcile;
pub mod registry;
pub mod render;
pub mod repo;
pub mod status;

use clap::error::ErrorKind;
use clap::Parser;

pub use error::{Error, Result};

/// Run the CLI with the provided arguments.
///
/// # Errors
///
/// Returns [`Error::Usage`] when argument parsing fails, or the error of the
/// selected command.
pub fn run<I, T>(args: I) -> Result<()>
where
    I: IntoIterator<Item = T>,
    T: Into<std::ffi::OsString> + Clone,
{
    let cli = match cli::Cli::try_parse_from(args) {
        Ok(cli) => cli,
        Err(err) if matches!(err.kind(), ErrorKind::DisplayHelp | ErrorKind::DisplayVersion) => {
            let _ = err.print();
            return Ok(());
        }
        Err(err) => return Err(Error::Usage(err.to_string())),
    };
    commands::dispatch(&cli)
}
