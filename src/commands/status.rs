//! `gitward status` command.

use std::io::Write;

use tracing::warn;

use crate::batch::run_batch;
use crate::cli::BatchArgs;
use crate::commands::Invocation;
use crate::error::{Error, Result};
use crate::inspect::FetchMode;
use crate::render::Table;
use crate::status::{inspect_entry, StatusRow};

/// Execute the `status` command.
///
/// Inspects every selected repository in parallel and prints one row per
/// repository, in selection order. A failing repository shows its error in
/// place of its state.
///
/// # Errors
///
/// Returns an error for unknown repository names (before any work starts),
/// and with `--strict` when any repository failed.
pub fn run(invocation: &Invocation, args: &BatchArgs, json: bool) -> Result<()> {
    let (rows, failures) = collect(invocation, args)?;
    let stdout = std::io::stdout();
    let mut out = stdout.lock();
    if json {
        let json = serde_json::to_string_pretty(&rows).map_err(std::io::Error::from)?;
        writeln!(out, "{json}")?;
    } else {
        write!(out, "{}", render(&rows))?;
    }
    if args.strict && failures > 0 {
        return Err(Error::BatchFailed(failures));
    }
    Ok(())
}

/// Inspects the selected repositories, turning per-repository failures into
/// error rows. Returns the rows and the number of failures.
///
/// # Errors
///
/// Returns an error for unknown repository names or if the worker pool
/// cannot be built.
pub fn collect(invocation: &Invocation, args: &BatchArgs) -> Result<(Vec<StatusRow>, usize)> {
    let entries = invocation.registry.select(&args.names)?;
    let fetch = if args.no_fetch {
        FetchMode::Skip
    } else {
        FetchMode::Fetch(invocation.config.settings.fetch_timeout)
    };

    let results = run_batch(&entries, invocation.config.settings.jobs, |entry| {
        inspect_entry(&invocation.ctx, entry, invocation.current_uid, fetch)
    })?;

    let mut failures = 0;
    let rows = entries
        .iter()
        .zip(results)
        .map(|(entry, result)| {
            result.unwrap_or_else(|err| {
                warn!(repo = %entry.name, "status failed: {err}");
                failures += 1;
                StatusRow {
                    path: entry.path.display().to_string(),
                    name: entry.name.clone(),
                    cleanliness: "-".to_string(),
                    remote: format!("error: {err}"),
                }
            })
        })
        .collect();
    Ok((rows, failures))
}

fn render(rows: &[StatusRow]) -> String {
    if rows.is_empty() {
        return "No repositories configured.\n".to_string();
    }
    let mut table = Table::new(["PATH", "NAME", "TREE", "REMOTE"]);
    for row in rows {
        table.push([
            row.path.as_str(),
            row.name.as_str(),
            row.cleanliness.as_str(),
            row.remote.as_str(),
        ]);
    }
    format!("{}\n{} repositories.\n", table.render(), table.len())
}
