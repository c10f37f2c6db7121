//! Update policy: bring each repository in line with its upstream.

use std::fmt;
use std::time::Duration;

use serde::Serialize;
use tracing::info;

use crate::context::ServiceContext;
use crate::error::CommandError;
use crate::inspect::{classify, remote_kind, DivergenceState, FetchMode, RemoteKind};
use crate::registry::RepositoryEntry;
use crate::repo::RepoHandle;

/// What [`update`] did for one repository.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum UpdateOutcome {
    /// No remote is configured; nothing was contacted.
    NoRemote,
    /// Already in sync.
    UpToDate,
    /// Fast-forwarded and refreshed submodules.
    Pulled,
    /// Published local commits.
    Pushed,
    /// Push needed but the push URL is HTTP(S).
    SkippedHttp,
    /// Push needed but the push URL is not recognised.
    SkippedUnknownRemote,
    /// Both sides moved; a human has to merge.
    ManualIntervention,
}

impl UpdateOutcome {
    /// True when a mutating git command ran.
    #[must_use]
    pub fn changed_repository(self) -> bool {
        matches!(self, Self::Pulled | Self::Pushed)
    }
}

impl fmt::Display for UpdateOutcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let text = match self {
            Self::NoRemote => "no remote",
            Self::UpToDate => "up to date",
            Self::Pulled => "pulled",
            Self::Pushed => "pushed",
            Self::SkippedHttp => "skipped: HTTP remote",
            Self::SkippedUnknownRemote => "skipped: unrecognized remote",
            Self::ManualIntervention => "diverged: requires manual intervention",
        };
        f.write_str(text)
    }
}

/// Knobs for [`update`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct UpdatePolicy {
    /// Whether to fetch before classifying.
    pub fetch: FetchMode,
    /// Hard limit on `pull` and `push`.
    pub sync_timeout: Option<Duration>,
}

/// Classifies `repo` and runs the corrective action.
///
/// Diverged histories are never merged automatically, and pushes are only
/// attempted over SSH so an unattended run never blocks on a credential
/// prompt.
///
/// # Errors
///
/// Returns the first [`CommandError`] from inspection, pull, submodule update
/// or push.
pub fn update(repo: &RepoHandle<'_>, policy: &UpdatePolicy) -> Result<UpdateOutcome, CommandError> {
    if remote_kind(repo, false)? == RemoteKind::None {
        return Ok(UpdateOutcome::NoRemote);
    }

    match classify(repo, policy.fetch)? {
        DivergenceState::UpToDate => Ok(UpdateOutcome::UpToDate),
        DivergenceState::NeedsPull => {
            info!(repo = %repo.path().display(), "pulling");
            repo.git_with_timeout(&["pull", "--ff-only"], policy.sync_timeout)?;
            repo.git_with_timeout(
                &["submodule", "update", "--init", "--recursive"],
                policy.sync_timeout,
            )?;
            Ok(UpdateOutcome::Pulled)
        }
        DivergenceState::NeedsPush => match remote_kind(repo, true)? {
            RemoteKind::Http => Ok(UpdateOutcome::SkippedHttp),
            RemoteKind::Ssh => {
                info!(repo = %repo.path().display(), "pushing");
                repo.git_with_timeout(&["push"], policy.sync_timeout)?;
                Ok(UpdateOutcome::Pushed)
            }
            RemoteKind::Unknown | RemoteKind::None => Ok(UpdateOutcome::SkippedUnknownRemote),
        },
        DivergenceState::Diverged => Ok(UpdateOutcome::ManualIntervention),
    }
}

/// Resolves the acting user for `entry` and applies [`update`].
///
/// # Errors
///
/// Returns an error if the acting user cannot be resolved or any git
/// command fails.
pub fn update_entry(
    ctx: &ServiceContext,
    entry: &RepositoryEntry,
    current_uid: u32,
    policy: &UpdatePolicy,
) -> crate::Result<UpdateOutcome> {
    let repo = RepoHandle::open(ctx, entry, current_uid)?;
    Ok(update(&repo, policy)?)
}

#[cfg(test)]
mod tests {
    use std::path::Path;
    use std::sync::Arc;

    use super::*;
    use crate::adapters::scripted::{ScriptedVcs, StaticAccounts};

    const REPO: &str = "/srv/app";

    const POLICY: UpdatePolicy = UpdatePolicy { fetch: FetchMode::Skip, sync_timeout: None };

    fn with_refs(vcs: ScriptedVcs, local: &str, remote: &str, base: &str) -> ScriptedVcs {
        vcs.ok(REPO, "rev-parse HEAD", local)
            .ok(REPO, "rev-parse @{u}", remote)
            .ok(REPO, "merge-base HEAD @{u}", base)
    }

    fn with_remote(vcs: ScriptedVcs, fetch_url: &str, push_url: &str) -> ScriptedVcs {
        vcs.ok(REPO, "remote", "origin\n")
            .ok(REPO, "remote get-url origin", fetch_url)
            .ok(REPO, "remote get-url --push origin", push_url)
    }

    fn run(vcs: &ScriptedVcs) -> Result<UpdateOutcome, CommandError> {
        update(&RepoHandle::new(vcs, Path::new(REPO), None), &POLICY)
    }

    fn ran(vcs: &ScriptedVcs, args: &str) -> bool {
        vcs.args_for(Path::new(REPO)).iter().any(|a| a == args)
    }

    #[test]
    fn no_remote_does_nothing_over_the_network() {
        let vcs = ScriptedVcs::new().ok(REPO, "remote", "");
        assert_eq!(run(&vcs).unwrap(), UpdateOutcome::NoRemote);
        assert_eq!(vcs.args_for(Path::new(REPO)), ["remote"]);
    }

    #[test]
    fn needs_pull_pulls_then_updates_submodules() {
        let vcs = with_refs(with_remote(ScriptedVcs::new(), "git@h:r", "git@h:r"), "A", "B", "A")
            .ok(REPO, "pull --ff-only", "")
            .ok(REPO, "submodule update --init --recursive", "");

        assert_eq!(run(&vcs).unwrap(), UpdateOutcome::Pulled);
        let args = vcs.args_for(Path::new(REPO));
        let pull = args.iter().position(|a| a == "pull --ff-only").unwrap();
        let submodules =
            args.iter().position(|a| a == "submodule update --init --recursive").unwrap();
        assert!(pull < submodules);
    }

    #[test]
    fn needs_push_over_ssh_pushes() {
        let vcs = with_refs(with_remote(ScriptedVcs::new(), "git@h:r", "git@h:r"), "B", "A", "A")
            .ok(REPO, "push", "");
        assert_eq!(run(&vcs).unwrap(), UpdateOutcome::Pushed);
        assert!(ran(&vcs, "push"));
    }

    #[test]
    fn needs_push_over_http_is_skipped_without_pushing() {
        let vcs = with_refs(
            with_remote(ScriptedVcs::new(), "https://h/r", "https://h/r"),
            "B",
            "A",
            "A",
        );
        let outcome = run(&vcs).unwrap();
        assert_eq!(outcome, UpdateOutcome::SkippedHttp);
        assert!(outcome.to_string().contains("skipped"));
        assert!(!ran(&vcs, "push"));
    }

    #[test]
    fn push_url_decides_not_fetch_url() {
        let remote = with_remote(ScriptedVcs::new(), "https://h/r", "git@h:r");
        let vcs = with_refs(remote, "B", "A", "A").ok(REPO, "push", "");
        assert_eq!(run(&vcs).unwrap(), UpdateOutcome::Pushed);
    }

    #[test]
    fn unknown_push_remote_is_skipped() {
        let vcs = with_refs(with_remote(ScriptedVcs::new(), "/mnt/r", "/mnt/r"), "B", "A", "A");
        assert_eq!(run(&vcs).unwrap(), UpdateOutcome::SkippedUnknownRemote);
        assert!(!ran(&vcs, "push"));
    }

    #[test]
    fn diverged_requires_manual_intervention() {
        let vcs = with_refs(with_remote(ScriptedVcs::new(), "git@h:r", "git@h:r"), "B", "C", "A");
        let outcome = run(&vcs).unwrap();
        assert_eq!(outcome, UpdateOutcome::ManualIntervention);
        assert!(outcome.to_string().contains("manual intervention"));
        assert!(!ran(&vcs, "push") && !ran(&vcs, "pull --ff-only"));
    }

    #[test]
    fn up_to_date_twice_runs_no_mutating_command() {
        let vcs = with_refs(
            with_remote(ScriptedVcs::new(), "git@h:r", "git@h:r"),
            "abc123",
            "abc123",
            "abc123",
        );
        assert_eq!(run(&vcs).unwrap(), UpdateOutcome::UpToDate);
        assert_eq!(run(&vcs).unwrap(), UpdateOutcome::UpToDate);
        for args in vcs.args_for(Path::new(REPO)) {
            assert!(!["pull --ff-only", "push", "submodule update --init --recursive"]
                .contains(&args.as_str()));
        }
    }

    #[test]
    fn pull_failure_is_returned() {
        let vcs = with_refs(with_remote(ScriptedVcs::new(), "git@h:r", "git@h:r"), "A", "B", "A")
            .err(
                REPO,
                "pull --ff-only",
                CommandError::new("fatal: Not possible to fast-forward", 128),
            );
        assert_eq!(run(&vcs).unwrap_err().code, 128);
        assert!(!ran(&vcs, "submodule update --init --recursive"));
    }

    #[test]
    fn fetch_mode_uses_timeout() {
        let vcs = with_refs(with_remote(ScriptedVcs::new(), "git@h:r", "git@h:r"), "A", "A", "A")
            .ok(REPO, "fetch", "");
        let policy = UpdatePolicy {
            fetch: FetchMode::Fetch(Duration::from_secs(30)),
            sync_timeout: Some(Duration::from_secs(120)),
        };
        let outcome = update(&RepoHandle::new(&vcs, Path::new(REPO), None), &policy).unwrap();
        assert_eq!(outcome, UpdateOutcome::UpToDate);
        assert!(!outcome.changed_repository());
        assert!(vcs.calls().iter().any(|c| c.args == "fetch" && c.timeout.is_some()));
    }

    #[test]
    fn update_entry_runs_as_owner_and_reports_identity_failures() {
        let vcs = Arc::new(ScriptedVcs::new().ok(REPO, "remote", ""));
        let accounts = StaticAccounts::new(0).user("deploy", 1001).owner(REPO, 1001);
        let ctx = ServiceContext::new(Box::new(Arc::clone(&vcs)), Box::new(accounts));
        let entry = RepositoryEntry { name: "app".into(), path: REPO.into(), owning_user: None };

        assert_eq!(update_entry(&ctx, &entry, 0, &POLICY).unwrap(), UpdateOutcome::NoRemote);
        assert_eq!(vcs.calls()[0].user.as_deref(), Some("deploy"));

        let missing = RepositoryEntry { path: "/srv/missing".into(), ..entry };
        let err = update_entry(&ctx, &missing, 0, &POLICY).unwrap_err();
        assert!(matches!(err, crate::Error::Identity(_)));
    }
}
