//! Repository state inspection.
//!
//! Three independent probes feed both the status listing and the update
//! policy: working-tree cleanliness, the kind of the first remote, and the
//! relationship between `HEAD`, its upstream and their merge base.

use std::fmt;
use std::time::Duration;

use serde::Serialize;

use crate::error::CommandError;
use crate::repo::RepoHandle;

/// Relationship between local `HEAD` and its upstream.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum DivergenceState {
    /// Both point at the same commit.
    UpToDate,
    /// Local is an ancestor of upstream; a fast-forward pull catches up.
    NeedsPull,
    /// Upstream is an ancestor of local; a push publishes local work.
    NeedsPush,
    /// Both sides have commits the other lacks.
    Diverged,
}

impl DivergenceState {
    /// Classifies a (local, remote, merge base) commit triple.
    ///
    /// Total over all inputs: equal local and remote always win, whatever
    /// the base says.
    #[must_use]
    pub fn classify(local: &str, remote: &str, base: &str) -> Self {
        if local == remote {
            Self::UpToDate
        } else if local == base {
            Self::NeedsPull
        } else if remote == base {
            Self::NeedsPush
        } else {
            Self::Diverged
        }
    }
}

impl fmt::Display for DivergenceState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let text = match self {
            Self::UpToDate => "up to date",
            Self::NeedsPull => "needs pull",
            Self::NeedsPush => "needs push",
            Self::Diverged => "diverged",
        };
        f.write_str(text)
    }
}

/// Transport of a remote, as far as the push policy cares.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum RemoteKind {
    /// No remote configured.
    None,
    /// `http://` or `https://`; pushing would need interactive credentials.
    Http,
    /// `user@host:path` or `ssh://`; pushes use a key.
    Ssh,
    /// Anything else (local paths, `file://`, `git://`).
    Unknown,
}

impl RemoteKind {
    /// Classifies a remote URL.
    #[must_use]
    pub fn from_url(url: &str) -> Self {
        let url = url.trim();
        if url.is_empty() {
            return Self::None;
        }
        let lower = url.to_ascii_lowercase();
        if lower.starts_with("http://") || lower.starts_with("https://") {
            return Self::Http;
        }
        if lower.starts_with("ssh://") || lower.starts_with("git+ssh://") || is_scp_like(url) {
            return Self::Ssh;
        }
        Self::Unknown
    }
}

/// Matches the `user@host:path` shorthand.
fn is_scp_like(url: &str) -> bool {
    let Some((user, rest)) = url.split_once('@') else {
        return false;
    };
    let Some((host, _)) = rest.split_once(':') else {
        return false;
    };
    !user.is_empty() && !user.contains('/') && !host.is_empty() && !host.contains('/')
}

impl fmt::Display for RemoteKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let text = match self {
            Self::None => "none",
            Self::Http => "http",
            Self::Ssh => "ssh",
            Self::Unknown => "unknown",
        };
        f.write_str(text)
    }
}

/// Counts from `git status --porcelain=v1`.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct TreeStatus {
    /// Entries marked `??`.
    pub untracked: usize,
    /// Every other entry: staged, modified, deleted, renamed, conflicted.
    pub changed: usize,
}

impl TreeStatus {
    /// Parses porcelain v1 output. Blank lines are ignored.
    #[must_use]
    pub fn parse(porcelain: &str) -> Self {
        porcelain.lines().filter(|line| !line.trim().is_empty()).fold(
            Self::default(),
            |mut status, line| {
                if line.starts_with("??") {
                    status.untracked += 1;
                } else {
                    status.changed += 1;
                }
                status
            },
        )
    }

    /// True when nothing is untracked or changed.
    #[must_use]
    pub fn is_clean(&self) -> bool {
        self.untracked == 0 && self.changed == 0
    }
}

impl fmt::Display for TreeStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.is_clean() {
            return f.write_str("clean");
        }
        let mut parts = Vec::with_capacity(2);
        if self.changed > 0 {
            parts.push(format!("{} modified", self.changed));
        }
        if self.untracked > 0 {
            parts.push(format!("{} untracked", self.untracked));
        }
        f.write_str(&parts.join(", "))
    }
}

/// Whether [`classify`] refreshes remote-tracking refs first.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FetchMode {
    /// Compare against whatever the remote-tracking refs already hold.
    Skip,
    /// Fetch first, killing the fetch after the given time.
    Fetch(Duration),
}

/// Counts untracked and staged-or-modified entries.
///
/// # Errors
///
/// Returns a [`CommandError`] if `git status` fails.
pub fn working_tree_status(repo: &RepoHandle<'_>) -> Result<TreeStatus, CommandError> {
    repo.git(&["status", "--porcelain=v1"]).map(|out| TreeStatus::parse(&out))
}

/// Classifies the first configured remote.
///
/// Looks at the push URL when `for_push` is set, the fetch URL otherwise.
/// Repositories with several remotes are judged by the first one listed.
///
/// # Errors
///
/// Returns a [`CommandError`] if listing remotes or reading the URL fails.
pub fn remote_kind(repo: &RepoHandle<'_>, for_push: bool) -> Result<RemoteKind, CommandError> {
    let remotes = repo.git(&["remote"])?;
    let Some(name) = remotes.lines().map(str::trim).find(|l| !l.is_empty()) else {
        return Ok(RemoteKind::None);
    };
    let url = if for_push {
        repo.git(&["remote", "get-url", "--push", name])?
    } else {
        repo.git(&["remote", "get-url", name])?
    };
    Ok(RemoteKind::from_url(&url))
}

/// Compares `HEAD` with its upstream.
///
/// # Errors
///
/// Returns a [`CommandError`] if the fetch fails or times out, if the branch
/// has no upstream, or if the refs cannot be read.
pub fn classify(repo: &RepoHandle<'_>, fetch: FetchMode) -> Result<DivergenceState, CommandError> {
    if let FetchMode::Fetch(timeout) = fetch {
        repo.git_with_timeout(&["fetch"], Some(timeout))?;
    }
    let local = repo.git(&["rev-parse", "HEAD"])?;
    let remote = repo.git(&["rev-parse", "@{u}"])?;
    let base = repo.git(&["merge-base", "HEAD", "@{u}"])?;
    Ok(DivergenceState::classify(local.trim(), remote.trim(), base.trim()))
}
