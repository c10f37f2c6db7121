//! A repository bound to the identity its commands run as.

use std::path::Path;
use std::time::Duration;

use crate::context::ServiceContext;
use crate::error::{CommandError, IdentityError};
use crate::identity::resolve_acting_user;
use crate::ports::accounts::Account;
use crate::ports::vcs::{VcsCommand, VcsExecutor};
use crate::registry::RepositoryEntry;

/// Runs git in one working tree, always as the same acting user.
pub struct RepoHandle<'a> {
    vcs: &'a dyn VcsExecutor,
    path: &'a Path,
    acting_user: Option<Account>,
}

impl<'a> RepoHandle<'a> {
    /// Binds `path` to an explicit acting user.
    #[must_use]
    pub fn new(vcs: &'a dyn VcsExecutor, path: &'a Path, acting_user: Option<Account>) -> Self {
        Self { vcs, path, acting_user }
    }

    /// Resolves the acting user for `entry` and binds it.
    ///
    /// # Errors
    ///
    /// Returns an [`IdentityError`] if the owner cannot be resolved.
    pub fn open(
        ctx: &'a ServiceContext,
        entry: &'a RepositoryEntry,
        current_uid: u32,
    ) -> Result<Self, IdentityError> {
        let acting_user = resolve_acting_user(ctx.accounts.as_ref(), entry, current_uid)?;
        Ok(Self::new(ctx.vcs.as_ref(), &entry.path, acting_user))
    }

    /// Working tree location.
    #[must_use]
    pub fn path(&self) -> &Path {
        self.path
    }

    /// Account commands run as, if not the caller.
    #[must_use]
    pub fn acting_user(&self) -> Option<&Account> {
        self.acting_user.as_ref()
    }

    /// Runs `git <args>` and returns its stdout.
    ///
    /// # Errors
    ///
    /// Returns a [`CommandError`] if git fails.
    pub fn git(&self, args: &[&str]) -> Result<String, CommandError> {
        self.git_with_timeout(args, None)
    }

    /// Runs `git <args>`, killing it after `timeout`.
    ///
    /// # Errors
    ///
    /// Returns a [`CommandError`] if git fails or times out.
    pub fn git_with_timeout(
        &self,
        args: &[&str],
        timeout: Option<Duration>,
    ) -> Result<String, CommandError> {
        let command = VcsCommand::new(self.path, args.iter().copied())
            .as_user(self.acting_user.as_ref())
            .with_timeout(timeout);
        self.vcs.capture(&command)
    }

    /// Runs `git <args>` attached to the terminal.
    ///
    /// # Errors
    ///
    /// Returns a [`CommandError`] if git fails.
    pub fn interactive<S: AsRef<str>>(&self, args: &[S]) -> Result<(), CommandError> {
        let command = VcsCommand::new(self.path, args.iter().map(|a| a.as_ref().to_string()))
            .as_user(self.acting_user.as_ref());
        self.vcs.interactive(&command)
    }
}
