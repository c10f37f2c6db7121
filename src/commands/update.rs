//! `gitward update` command.

use std::io::Write;

use tracing::warn;

use crate::batch::run_batch;
use crate::cli::BatchArgs;
use crate::commands::Invocation;
use crate::error::{Error, Result};
use crate::inspect::FetchMode;
use crate::reconcile::{update_entry, UpdatePolicy};

/// Execute the `update` command.
///
/// Applies the update policy to every selected repository in parallel and
/// prints one `name: outcome` line per repository, in selection order.
///
/// # Errors
///
/// Returns an error for unknown repository names (before any work starts),
/// and with `--strict` when any repository failed.
pub fn run(invocation: &Invocation, args: &BatchArgs) -> Result<()> {
    let (lines, failures) = collect(invocation, args)?;
    let stdout = std::io::stdout();
    let mut out = stdout.lock();
    for line in &lines {
        writeln!(out, "{line}")?;
    }
    if args.strict && failures > 0 {
        return Err(Error::BatchFailed(failures));
    }
    Ok(())
}

/// Updates the selected repositories and formats one line per repository.
/// Returns the lines and the number of failures.
///
/// # Errors
///
/// Returns an error for unknown repository names or if the worker pool
/// cannot be built.
pub fn collect(invocation: &Invocation, args: &BatchArgs) -> Result<(Vec<String>, usize)> {
    let entries = invocation.registry.select(&args.names)?;
    let settings = &invocation.config.settings;
    let fetch =
        if args.no_fetch { FetchMode::Skip } else { FetchMode::Fetch(settings.fetch_timeout) };
    let policy = UpdatePolicy { fetch, sync_timeout: Some(settings.sync_timeout) };

    let results = run_batch(&entries, settings.jobs, |entry| {
        update_entry(&invocation.ctx, entry, invocation.current_uid, &policy)
    })?;

    let mut failures = 0;
    let lines = entries
        .iter()
        .zip(results)
        .map(|(entry, result)| match result {
            Ok(outcome) => format!("{}: {outcome}", entry.name),
            Err(err) => {
                warn!(repo = %entry.name, "update failed: {err}");
                failures += 1;
                format!("{}: error: {err}", entry.name)
            }
        })
        .collect();
    Ok((lines, failures))
}
