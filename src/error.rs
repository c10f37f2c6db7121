//! Error taxonomy shared by every layer.

use std::path::PathBuf;

use thiserror::Error;

/// Exit code reported for a child that was killed after running past its timeout.
pub const KILLED_BY_SIGNAL: i32 = -9;

/// Convenience alias used throughout the crate.
pub type Result<T> = std::result::Result<T, Error>;

/// A git invocation exited non-zero, was signalled, or could not be spawned.
///
/// Negative codes mean the process was terminated by a signal (the code is
/// the negated signal number); [`KILLED_BY_SIGNAL`] also covers timeouts.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
#[error("{message} (status {code})")]
pub struct CommandError {
    /// Human-readable description, usually the child's trimmed stderr.
    pub message: String,
    /// Exit status, or the negated signal number.
    pub code: i32,
}

impl CommandError {
    /// Builds a command error from a message and status code.
    #[must_use]
    pub fn new(message: impl Into<String>, code: i32) -> Self {
        Self { message: message.into(), code }
    }

    /// Returns true when the process was terminated by a signal.
    #[must_use]
    pub fn is_signal(&self) -> bool {
        self.code < 0
    }
}

/// Failure to work out which account should run a repository's commands.
#[derive(Debug, Error)]
pub enum IdentityError {
    /// No account carries the configured user name.
    #[error("unknown user: {0}")]
    UnknownUser(String),

    /// The owning uid of a path has no account entry.
    #[error("no user owns uid {0}")]
    UnknownUid(u32),

    /// The repository path could not be inspected.
    #[error("cannot stat {}: {source}", path.display())]
    Inaccessible {
        /// Path that failed to stat.
        path: PathBuf,
        /// Underlying IO failure.
        #[source]
        source: std::io::Error,
    },

    /// The account database itself failed.
    #[error("account lookup failed: {0}")]
    Lookup(String),
}

/// Problems with the configuration or with the repositories requested from it.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// A requested name is not configured.
    #[error("unknown repository: {0}")]
    UnknownRepository(String),

    /// A section is literally named `.`.
    #[error("the name '.' is reserved and cannot be used as a repository section")]
    ReservedName,

    /// A repository section lacks `path`.
    #[error("repository '{0}' has no path")]
    MissingPath(String),

    /// A setting could not be parsed.
    #[error("invalid value for '{key}': {value}")]
    InvalidValue {
        /// Setting name.
        key: String,
        /// Offending raw value.
        value: String,
    },

    /// The configuration file could not be read or parsed.
    #[error("cannot read configuration {}: {message}", path.display())]
    Unreadable {
        /// Configuration file location.
        path: PathBuf,
        /// Parser or IO message.
        message: String,
    },

    /// The bootstrap identity file could not be read or written.
    #[error("identity file {}: {message}", path.display())]
    IdentityFile {
        /// Identity file location.
        path: PathBuf,
        /// Underlying failure.
        message: String,
    },
}

/// Top-level error type.
#[derive(Debug, Error)]
pub enum Error {
    /// See [`CommandError`].
    #[error(transparent)]
    Command(#[from] CommandError),

    /// See [`IdentityError`].
    #[error(transparent)]
    Identity(#[from] IdentityError),

    /// See [`ConfigError`].
    #[error(transparent)]
    Config(#[from] ConfigError),

    /// Local IO failure outside a git invocation.
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// A batch worker panicked while handling one entry.
    #[error("worker panicked: {0}")]
    Panicked(String),

    /// The worker pool could not be built.
    #[error("worker pool: {0}")]
    Pool(String),

    /// Invalid command-line arguments; holds clap's rendered message.
    #[error("{0}")]
    Usage(String),

    /// Some repositories in a strict batch failed.
    #[error("{0} repositories failed")]
    BatchFailed(usize),
}

impl Error {
    /// Process exit status for an invocation that failed with this error.
    ///
    /// A git failure with a positive code passes that code through; everything
    /// else maps to 1.
    #[must_use]
    pub fn exit_code(&self) -> u8 {
        match self {
            Self::Command(err) if err.code > 0 => u8::try_from(err.code).unwrap_or(1),
            Self::Usage(_) => 2,
            _ => 1,
        }
    }
}
