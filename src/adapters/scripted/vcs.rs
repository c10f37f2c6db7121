//! Scripted adapter for the `VcsExecutor` port.

use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::Mutex;
use std::time::Duration;

use crate::error::CommandError;
use crate::ports::vcs::{VcsCommand, VcsExecutor};

/// A git invocation observed by [`ScriptedVcs`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RecordedCall {
    /// Working tree the command targeted.
    pub repo: PathBuf,
    /// Space-joined arguments.
    pub args: String,
    /// Acting user name, if the command switched identity.
    pub user: Option<String>,
    /// Timeout requested by the caller.
    pub timeout: Option<Duration>,
    /// Whether the command ran attached to the terminal.
    pub interactive: bool,
}

/// Answers git invocations from a table keyed by repository and arguments.
///
/// Every call is recorded, so tests can assert which commands ran. Captured
/// commands with no scripted answer fail with status 1; interactive commands
/// with no scripted answer succeed.
#[derive(Default)]
pub struct ScriptedVcs {
    responses: Mutex<HashMap<(PathBuf, String), Result<String, CommandError>>>,
    calls: Mutex<Vec<RecordedCall>>,
}

impl ScriptedVcs {
    /// Creates an executor with no scripted answers.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Answers `git <args>` in `repo` with `stdout`.
    #[must_use]
    pub fn ok(self, repo: impl Into<PathBuf>, args: &str, stdout: &str) -> Self {
        self.insert(repo.into(), args, Ok(stdout.to_string()));
        self
    }

    /// Fails `git <args>` in `repo` with `error`.
    #[must_use]
    pub fn err(self, repo: impl Into<PathBuf>, args: &str, error: CommandError) -> Self {
        self.insert(repo.into(), args, Err(error));
        self
    }

    fn insert(&self, repo: PathBuf, args: &str, response: Result<String, CommandError>) {
        let mut responses = self.responses.lock().expect("responses lock poisoned");
        responses.insert((repo, args.to_string()), response);
    }

    /// Every call seen so far, in order.
    #[must_use]
    pub fn calls(&self) -> Vec<RecordedCall> {
        self.calls.lock().expect("calls lock poisoned").clone()
    }

    /// Arguments of every call made in `repo`, in order.
    #[must_use]
    pub fn args_for(&self, repo: &Path) -> Vec<String> {
        self.calls().into_iter().filter(|c| c.repo == repo).map(|c| c.args).collect()
    }

    fn record(
        &self,
        command: &VcsCommand<'_>,
        interactive: bool,
    ) -> Option<Result<String, CommandError>> {
        let args = command.display_args();
        self.calls.lock().expect("calls lock poisoned").push(RecordedCall {
            repo: command.repo.to_path_buf(),
            args: args.clone(),
            user: command.acting_user.map(|u| u.name.clone()),
            timeout: command.timeout,
            interactive,
        });
        let responses = self.responses.lock().expect("responses lock poisoned");
        responses.get(&(command.repo.to_path_buf(), args)).cloned()
    }
}

impl VcsExecutor for ScriptedVcs {
    fn capture(&self, command: &VcsCommand<'_>) -> Result<String, CommandError> {
        self.record(command, false).unwrap_or_else(|| {
            Err(CommandError::new(format!("unscripted call: git {}", command.display_args()), 1))
        })
    }

    fn interactive(&self, command: &VcsCommand<'_>) -> Result<(), CommandError> {
        match self.record(command, true) {
            Some(Err(err)) => Err(err),
            _ => Ok(()),
        }
    }
}
