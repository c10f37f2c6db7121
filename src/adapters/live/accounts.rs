//! Live account lookups through the system user database.

use std::os::unix::fs::MetadataExt;
use std::path::Path;

use nix::unistd::{geteuid, Uid, User};

use crate::error::IdentityError;
use crate::ports::accounts::{Account, Accounts};

/// Reads accounts from `getpwnam`/`getpwuid` and ownership from `stat`.
pub struct LiveAccounts;

impl From<User> for Account {
    fn from(user: User) -> Self {
        Self { name: user.name, uid: user.uid.as_raw(), home: Some(user.dir) }
    }
}

impl Accounts for LiveAccounts {
    fn effective_uid(&self) -> u32 {
        geteuid().as_raw()
    }

    fn by_name(&self, name: &str) -> Result<Option<Account>, IdentityError> {
        User::from_name(name)
            .map(|user| user.map(Account::from))
            .map_err(|e| IdentityError::Lookup(format!("{name}: {e}")))
    }

    fn by_uid(&self, uid: u32) -> Result<Option<Account>, IdentityError> {
        User::from_uid(Uid::from_raw(uid))
            .map(|user| user.map(Account::from))
            .map_err(|e| IdentityError::Lookup(format!("uid {uid}: {e}")))
    }

    fn owner_uid(&self, path: &Path) -> Result<u32, IdentityError> {
        std::fs::metadata(path)
            .map(|meta| meta.uid())
            .map_err(|source| IdentityError::Inaccessible { path: path.to_path_buf(), source })
    }
}
