//! CLI argument definitions.

use std::path::PathBuf;

use clap::{Args, Parser, Subcommand};

use crate::registry::CURRENT_REPOSITORY;

/// Top-level CLI parser for `gitward`.
#[derive(Debug, Parser)]
#[command(
    name = "gitward",
    version,
    about = "Track and reconcile the sync state of server git repositories"
)]
pub struct Cli {
    /// Configuration file (defaults to $GITWARD_CONFIG or /etc/gitward/repos.conf).
    #[arg(long, global = true, value_name = "PATH")]
    pub config: Option<PathBuf>,

    /// Number of repositories processed in parallel.
    #[arg(short, long, global = true, value_name = "N")]
    pub jobs: Option<usize>,

    /// The command to execute.
    #[command(subcommand)]
    pub command: Command,
}

/// Options shared by the batch commands.
#[derive(Debug, Clone, Args)]
pub struct BatchArgs {
    /// Repositories to process (all when omitted; `.` is the current one).
    pub names: Vec<String>,

    /// Compare against remote-tracking refs without fetching first.
    #[arg(long)]
    pub no_fetch: bool,

    /// Exit non-zero when any repository fails.
    #[arg(long)]
    pub strict: bool,
}

/// Supported top-level subcommands.
#[derive(Debug, Subcommand)]
pub enum Command {
    /// Show cleanliness and upstream state of repositories.
    Status {
        /// Shared batch options.
        #[command(flatten)]
        batch: BatchArgs,

        /// Print rows as JSON instead of a table.
        #[arg(long)]
        json: bool,
    },
    /// Pull or push repositories that can be synced without a merge.
    Update {
        /// Shared batch options.
        #[command(flatten)]
        batch: BatchArgs,
    },
    /// Stage everything and commit as yourself.
    Commit {
        /// Repository name.
        name: String,

        /// Commit message; an editor opens when omitted.
        #[arg(short, long)]
        message: Option<String>,
    },
    /// Show status, then page through the diff.
    Diff {
        /// Repository name.
        name: String,
    },
    /// Run an arbitrary git command in a repository as its owner.
    Vcs {
        /// Repository name.
        name: String,

        /// Arguments passed to git.
        #[arg(required = true, trailing_var_arg = true, allow_hyphen_values = true)]
        args: Vec<String>,
    },
    /// List configured repositories.
    List,
}

impl Command {
    /// True when the command has to know which repository contains the
    /// current directory: it names `.`, or it is `list`, which marks it.
    #[must_use]
    pub fn uses_current_repository(&self) -> bool {
        match self {
            Self::Status { batch, .. } | Self::Update { batch } => {
                batch.names.iter().any(|n| n == CURRENT_REPOSITORY)
            }
            Self::Commit { name, .. } | Self::Diff { name } | Self::Vcs { name, .. } => {
                name == CURRENT_REPOSITORY
            }
            Self::List => true,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::{Cli, Command};
    use clap::Parser;

    #[test]
    fn parses_status_with_names_and_flags() {
        let cli = Cli::parse_from(["gitward", "status", "etc", ".", "--no-fetch"]);
        match cli.command {
            Command::Status { batch, json } => {
                assert_eq!(batch.names, ["etc", "."]);
                assert!(batch.no_fetch);
                assert!(!batch.strict);
                assert!(!json);
            }
            other => panic!("unexpected command: {other:?}"),
        }
    }

    #[test]
    fn parses_global_options_after_subcommand() {
        let cli = Cli::parse_from(["gitward", "update", "--jobs", "2", "--config", "/tmp/r.conf"]);
        assert_eq!(cli.jobs, Some(2));
        assert_eq!(cli.config.as_deref(), Some(std::path::Path::new("/tmp/r.conf")));
        assert!(matches!(cli.command, Command::Update { .. }));
    }

    #[test]
    fn vcs_passes_hyphenated_arguments_through() {
        let cli = Cli::parse_from(["gitward", "vcs", "etc", "log", "--oneline", "-n", "3"]);
        match cli.command {
            Command::Vcs { name, args } => {
                assert_eq!(name, "etc");
                assert_eq!(args, ["log", "--oneline", "-n", "3"]);
            }
            other => panic!("unexpected command: {other:?}"),
        }
    }

    #[test]
    fn vcs_requires_arguments() {
        assert!(Cli::try_parse_from(["gitward", "vcs", "etc"]).is_err());
    }

    #[test]
    fn only_commands_naming_dot_or_listing_need_the_current_repository() {
        let needs = |args: &[&str]| Cli::parse_from(args).command.uses_current_repository();
        assert!(needs(&["gitward", "status", "etc", "."]));
        assert!(needs(&["gitward", "diff", "."]));
        assert!(needs(&["gitward", "list"]));
        assert!(!needs(&["gitward", "status"]));
        assert!(!needs(&["gitward", "update", "etc"]));
        assert!(!needs(&["gitward", "vcs", "etc", "log", "."]));
    }

    #[test]
    fn commit_takes_message() {
        let cli = Cli::parse_from(["gitward", "commit", "etc", "-m", "rotate keys"]);
        assert!(matches!(
            cli.command,
            Command::Commit { name, message: Some(m) } if name == "etc" && m == "rotate keys"
        ));
    }
}
