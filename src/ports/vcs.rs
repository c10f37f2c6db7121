//! Version-control executor port.

use std::path::Path;
use std::sync::Arc;
use std::time::Duration;

use super::accounts::Account;
use crate::error::CommandError;

/// One git invocation: where it runs, its arguments, and who runs it.
#[derive(Debug, Clone)]
pub struct VcsCommand<'a> {
    /// Working tree the command runs in.
    pub repo: &'a Path,
    /// Arguments passed after the executable name.
    pub args: Vec<String>,
    /// Account to switch to before running, if any.
    pub acting_user: Option<&'a Account>,
    /// Hard limit on wall-clock time.
    pub timeout: Option<Duration>,
}

impl<'a> VcsCommand<'a> {
    /// Creates a command running as the current identity with no timeout.
    pub fn new<I, S>(repo: &'a Path, args: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            repo,
            args: args.into_iter().map(Into::into).collect(),
            acting_user: None,
            timeout: None,
        }
    }

    /// Runs the command as `user` instead of the current identity.
    #[must_use]
    pub fn as_user(mut self, user: Option<&'a Account>) -> Self {
        self.acting_user = user;
        self
    }

    /// Kills the command if it runs longer than `timeout`.
    #[must_use]
    pub fn with_timeout(mut self, timeout: Option<Duration>) -> Self {
        self.timeout = timeout;
        self
    }

    /// Space-joined argument list, used for messages and logs.
    #[must_use]
    pub fn display_args(&self) -> String {
        self.args.join(" ")
    }
}

/// Runs git.
///
/// This is the only boundary through which the crate spawns processes, so
/// inspection and reconciliation can be driven by a scripted executor in
/// tests.
pub trait VcsExecutor: Send + Sync {
    /// Runs a command with stdout captured and decoded as UTF-8.
    ///
    /// # Errors
    ///
    /// Returns a [`CommandError`] when the process exits non-zero, is killed
    /// by a signal other than `SIGPIPE`, times out, or cannot be spawned.
    fn capture(&self, command: &VcsCommand<'_>) -> Result<String, CommandError>;

    /// Runs a command attached to the caller's terminal.
    ///
    /// # Errors
    ///
    /// Same failure classification as [`VcsExecutor::capture`].
    fn interactive(&self, command: &VcsCommand<'_>) -> Result<(), CommandError>;
}

impl<T: VcsExecutor + ?Sized> VcsExecutor for Arc<T> {
    fn capture(&self, command: &VcsCommand<'_>) -> Result<String, CommandError> {
        (**self).capture(command)
    }

    fn interactive(&self, command: &VcsCommand<'_>) -> Result<(), CommandError> {
        (**self).interactive(command)
    }
}
