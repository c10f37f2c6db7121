//! Read-only status inspection of one repository.

use serde::Serialize;

use crate::context::ServiceContext;
use crate::error::Result;
use crate::inspect::{classify, remote_kind, working_tree_status, FetchMode, RemoteKind};
use crate::registry::RepositoryEntry;
use crate::repo::RepoHandle;

/// One line of the status listing.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct StatusRow {
    /// Working tree location.
    pub path: String,
    /// Repository name.
    pub name: String,
    /// `clean`, or counts of modified and untracked entries.
    pub cleanliness: String,
    /// Divergence from upstream, or `no remote`.
    pub remote: String,
}

/// Inspects `entry` without changing anything (apart from an optional fetch).
///
/// # Errors
///
/// Returns an error if the acting user cannot be resolved or any git
/// command fails.
pub fn inspect_entry(
    ctx: &ServiceContext,
    entry: &RepositoryEntry,
    current_uid: u32,
    fetch: FetchMode,
) -> Result<StatusRow> {
    let repo = RepoHandle::open(ctx, entry, current_uid)?;
    let tree = working_tree_status(&repo)?;
    let remote = match remote_kind(&repo, false)? {
        RemoteKind::None => "no remote".to_string(),
        _ => classify(&repo, fetch)?.to_string(),
    };
    Ok(StatusRow {
        path: entry.path.display().to_string(),
        name: entry.name.clone(),
        cleanliness: tree.to_string(),
        remote,
    })
}
