//! Command dispatch and handlers.

pub mod commit;
pub mod diff;
pub mod list;
pub mod status;
pub mod update;
pub mod vcs;

use crate::cli::{Cli, Command};
use crate::config::{config_path, Config};
use crate::context::ServiceContext;
use crate::error::Result;
use crate::registry::{working_tree_root, Registry};

/// Everything a command needs: configuration, resolved repositories, ports,
/// and the caller's identity.
pub struct Invocation {
    /// Parsed configuration, with `--jobs` already applied.
    pub config: Config,
    /// Repository lookup, with `.` resolved against the current directory.
    pub registry: Registry,
    /// Ports used to reach git and the account database.
    pub ctx: ServiceContext,
    /// Effective uid of this process.
    pub current_uid: u32,
}

impl Invocation {
    /// Builds an invocation from configuration and a context.
    ///
    /// `.` stays unresolved until [`Invocation::resolve_current`] is called.
    #[must_use]
    pub fn new(config: Config, ctx: ServiceContext) -> Self {
        let registry = Registry::new(config.repositories.clone());
        let current_uid = ctx.accounts.effective_uid();
        Self { config, registry, ctx, current_uid }
    }

    /// Resolves `.` by asking git for the working tree containing the
    /// current directory.
    pub fn resolve_current(&mut self) {
        let toplevel = std::env::current_dir()
            .ok()
            .and_then(|cwd| working_tree_root(self.ctx.vcs.as_ref(), &cwd));
        self.registry.resolve_current(toplevel.as_deref());
    }
}

/// Dispatch a parsed command to its handler.
///
/// # Errors
///
/// Returns an error if the configuration cannot be loaded or the selected
/// command handler fails.
pub fn dispatch(cli: &Cli) -> Result<()> {
    let path = config_path(cli.config.as_deref());
    let mut config = Config::load(&path)?;
    if let Some(jobs) = cli.jobs {
        config.settings.jobs = jobs.max(1);
    }
    let ctx = ServiceContext::live(&config.settings);
    let mut invocation = Invocation::new(config, ctx);
    if cli.command.uses_current_repository() {
        invocation.resolve_current();
    }
    dispatch_with_invocation(&cli.command, &invocation)
}

/// Dispatch a command against a prepared invocation.
///
/// # Errors
///
/// Returns an error if the selected command handler fails.
pub fn dispatch_with_invocation(command: &Command, invocation: &Invocation) -> Result<()> {
    match command {
        Command::Status { batch, json } => status::run(invocation, batch, *json),
        Command::Update { batch } => update::run(invocation, batch),
        Command::Commit { name, message } => commit::run(invocation, name, message.as_deref()),
        Command::Diff { name } => diff::run(invocation, name),
        Command::Vcs { name, args } => vcs::run(invocation, name, args),
        Command::List => list::run(invocation),
    }
}
