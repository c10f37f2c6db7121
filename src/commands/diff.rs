//! `gitward diff` command.

use crate::commands::Invocation;
use crate::error::Result;
use crate::prompt::wait_for_enter;
use crate::repo::RepoHandle;

/// Execute the `diff` command.
///
/// Shows the short status, waits for Enter, then pages through the diff
/// against `HEAD`. Aborting at the prompt is not an error.
///
/// # Errors
///
/// Returns an error for an unknown repository, an unresolvable owner, or a
/// failing git command.
pub fn run(invocation: &Invocation, name: &str) -> Result<()> {
    let entry = invocation.registry.select_one(name)?;
    let repo = RepoHandle::open(&invocation.ctx, &entry, invocation.current_uid)?;
    review(&repo, || wait_for_enter("Press Enter to view the diff (Ctrl-C to abort) "))
}

/// Status, confirmation, diff.
///
/// # Errors
///
/// Returns the first failing git command or a terminal error from `confirm`.
pub fn review(
    repo: &RepoHandle<'_>,
    confirm: impl FnOnce() -> std::io::Result<bool>,
) -> Result<()> {
    repo.interactive(&["status", "--short"])?;
    if !confirm()? {
        return Ok(());
    }
    repo.interactive(&["diff", "HEAD"])?;
    Ok(())
}
