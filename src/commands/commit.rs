//! `gitward commit` command.

use std::path::PathBuf;

use crate::bootstrap::{self, identity_path, UserIdentity};
use crate::commands::Invocation;
use crate::error::{ConfigError, Result};
use crate::inspect::working_tree_status;
use crate::repo::RepoHandle;

/// Execute the `commit` command.
///
/// Stages every change in the repository and commits it as the repository's
/// owner, with the caller's bootstrap identity as author. An editor opens
/// when no message is given.
///
/// # Errors
///
/// Returns an error for an unknown repository, an unresolvable owner, a
/// missing identity, or a failing git command.
pub fn run(invocation: &Invocation, name: &str, message: Option<&str>) -> Result<()> {
    let entry = invocation.registry.select_one(name)?;
    let repo = RepoHandle::open(&invocation.ctx, &entry, invocation.current_uid)?;

    if working_tree_status(&repo)?.is_clean() {
        println!("{}: nothing to commit", entry.name);
        return Ok(());
    }

    let path = identity_path().ok_or_else(|| ConfigError::IdentityFile {
        path: PathBuf::from("identity.yaml"),
        message: "no configuration directory; set GITWARD_IDENTITY".to_string(),
    })?;
    let identity =
        bootstrap::load_or_prompt(&path, &mut std::io::stdin().lock(), &mut std::io::stderr())?;
    commit_as(&repo, &identity, message)
}

/// Shows the short status, stages everything and commits with `identity`.
///
/// # Errors
///
/// Returns the first failing git command.
pub fn commit_as(
    repo: &RepoHandle<'_>,
    identity: &UserIdentity,
    message: Option<&str>,
) -> Result<()> {
    repo.interactive(&["status", "--short"])?;
    repo.git(&["add", "--all"])?;

    let mut args = identity.config_args();
    args.push("commit".to_string());
    if let Some(message) = message {
        args.push("-m".to_string());
        args.push(message.to_string());
    }
    repo.interactive(&args)?;
    Ok(())
}
