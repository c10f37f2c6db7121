//! Acting-identity resolution.
//!
//! Commands for a repository run as the repository's owner. The owner is the
//! configured `user`, or whoever owns the working tree on disk. When that is
//! already the caller no identity switch happens.

use crate::error::IdentityError;
use crate::ports::accounts::{Account, Accounts};
use crate::registry::RepositoryEntry;

/// Decides which account, if any, git must be run as for `entry`.
///
/// Returns `None` when the owner is the caller (`current_uid`).
///
/// # Errors
///
/// Returns [`IdentityError`] when the configured user does not exist, the
/// path cannot be stat'ed, or its owning uid has no account.
pub fn resolve_acting_user(
    accounts: &dyn Accounts,
    entry: &RepositoryEntry,
    current_uid: u32,
) -> Result<Option<Account>, IdentityError> {
    let account = match &entry.owning_user {
        Some(name) => {
            accounts.by_name(name)?.ok_or_else(|| IdentityError::UnknownUser(name.clone()))?
        }
        None => {
            let uid = accounts.owner_uid(&entry.path)?;
            if uid == current_uid {
                return Ok(None);
            }
            accounts.by_uid(uid)?.ok_or(IdentityError::UnknownUid(uid))?
        }
    };
    Ok((account.uid != current_uid).then_some(account))
}

#[cfg(test)]
mod tests {
    use std::path::PathBuf;

    use super::*;
    use crate::adapters::scripted::StaticAccounts;

    fn entry(path: &str, user: Option<&str>) -> RepositoryEntry {
        RepositoryEntry {
            name: "repo".into(),
            path: PathBuf::from(path),
            owning_user: user.map(String::from),
        }
    }

    fn accounts() -> StaticAccounts {
        StaticAccounts::new(0)
            .user("root", 0)
            .user("deploy", 1001)
            .owner("/srv/app", 1001)
            .owner("/etc", 0)
            .owner("/srv/orphan", 4242)
    }

    #[test]
    fn configured_user_other_than_caller_is_returned() {
        let acting = resolve_acting_user(&accounts(), &entry("/etc", Some("deploy")), 0).unwrap();
        assert_eq!(acting.map(|a| a.name), Some("deploy".to_string()));
    }

    #[test]
    fn configured_user_equal_to_caller_is_none() {
        let acting = resolve_acting_user(&accounts(), &entry("/srv/app", Some("deploy")), 1001);
        assert!(acting.unwrap().is_none());
    }

    #[test]
    fn inferred_owner_is_used_when_no_user_configured() {
        let acting = resolve_acting_user(&accounts(), &entry("/srv/app", None), 0).unwrap();
        let acting = acting.unwrap();
        assert_eq!(acting.name, "deploy");
        assert_eq!(acting.home, Some(PathBuf::from("/home/deploy")));
    }

    #[test]
    fn inferred_owner_equal_to_caller_is_none() {
        assert!(resolve_acting_user(&accounts(), &entry("/etc", None), 0).unwrap().is_none());
    }

    #[test]
    fn unknown_configured_user_fails() {
        let err = resolve_acting_user(&accounts(), &entry("/etc", Some("ghost")), 0).unwrap_err();
        assert!(matches!(err, IdentityError::UnknownUser(name) if name == "ghost"));
    }

    #[test]
    fn inaccessible_path_fails() {
        let err = resolve_acting_user(&accounts(), &entry("/missing", None), 0).unwrap_err();
        assert!(matches!(err, IdentityError::Inaccessible { .. }));
    }

    #[test]
    fn owner_without_account_fails() {
        let err = resolve_acting_user(&accounts(), &entry("/srv/orphan", None), 0).unwrap_err();
        assert!(matches!(err, IdentityError::UnknownUid(4242)));
    }
}
