//! Service context bundling all port trait objects.

use crate::adapters::live::accounts::LiveAccounts;
use crate::adapters::live::vcs::LiveVcsExecutor;
use crate::config::Settings;
use crate::ports::accounts::Accounts;
use crate::ports::vcs::VcsExecutor;

/// Bundles the ports every operation goes through.
///
/// Constructors wire up different adapter implementations: live adapters
/// for real runs, scripted ones in tests.
pub struct ServiceContext {
    /// git executor.
    pub vcs: Box<dyn VcsExecutor>,
    /// Account database.
    pub accounts: Box<dyn Accounts>,
}

impl ServiceContext {
    /// Creates a live context from configured settings.
    #[must_use]
    pub fn live(settings: &Settings) -> Self {
        Self {
            vcs: Box::new(LiveVcsExecutor::from_settings(settings)),
            accounts: Box::new(LiveAccounts),
        }
    }

    /// Creates a context from explicit adapters.
    #[must_use]
    pub fn new(vcs: Box<dyn VcsExecutor>, accounts: Box<dyn Accounts>) -> Self {
        Self { vcs, accounts }
    }
}

#[cfg(test)]
mod tests {
    use std::path::Path;
    use std::sync::Arc;

    use super::*;
    use crate::adapters::scripted::{ScriptedVcs, StaticAccounts};
    use crate::ports::vcs::VcsCommand;

    #[test]
    fn scripted_context_shares_call_log() {
        let vcs = Arc::new(ScriptedVcs::new().ok("/srv/a", "remote", ""));
        let ctx = ServiceContext::new(Box::new(Arc::clone(&vcs)), Box::new(StaticAccounts::new(0)));

        let command = VcsCommand::new(Path::new("/srv/a"), ["remote"]);
        assert_eq!(ctx.vcs.capture(&command).unwrap(), "");
        assert_eq!(vcs.calls().len(), 1);
        assert_eq!(ctx.accounts.effective_uid(), 0);
    }
}
