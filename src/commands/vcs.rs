//! `gitward vcs` command.

use crate::commands::Invocation;
use crate::error::Result;
use crate::repo::RepoHandle;

/// Execute the `vcs` command.
///
/// Runs `git <args>` in the repository, as its owner, attached to the
/// terminal.
///
/// # Errors
///
/// Returns an error for an unknown repository, an unresolvable owner, or a
/// failing git command (whose exit code becomes the process exit code).
pub fn run(invocation: &Invocation, name: &str, args: &[String]) -> Result<()> {
    let entry = invocation.registry.select_one(name)?;
    let repo = RepoHandle::open(&invocation.ctx, &entry, invocation.current_uid)?;
    repo.interactive(args)?;
    Ok(())
}
