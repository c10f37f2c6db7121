//! Account database port.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use crate::error::IdentityError;

/// A system account that git commands may be run as.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Account {
    /// Login name.
    pub name: String,
    /// Numeric user id.
    pub uid: u32,
    /// Home directory, when known.
    pub home: Option<PathBuf>,
}

/// Looks up accounts and file ownership.
pub trait Accounts: Send + Sync {
    /// Effective uid of the running process.
    fn effective_uid(&self) -> u32;

    /// Finds an account by login name.
    ///
    /// # Errors
    ///
    /// Returns an error if the account database cannot be queried.
    fn by_name(&self, name: &str) -> Result<Option<Account>, IdentityError>;

    /// Finds an account by uid.
    ///
    /// # Errors
    ///
    /// Returns an error if the account database cannot be queried.
    fn by_uid(&self, uid: u32) -> Result<Option<Account>, IdentityError>;

    /// Uid owning `path`.
    ///
    /// # Errors
    ///
    /// Returns [`IdentityError::Inaccessible`] if the path cannot be stat'ed.
    fn owner_uid(&self, path: &Path) -> Result<u32, IdentityError>;
}

impl<T: Accounts + ?Sized> Accounts for Arc<T> {
    fn effective_uid(&self) -> u32 {
        (**self).effective_uid()
    }

    fn by_name(&self, name: &str) -> Result<Option<Account>, IdentityError> {
        (**self).by_name(name)
    }

    fn by_uid(&self, uid: u32) -> Result<Option<Account>, IdentityError> {
        (**self).by_uid(uid)
    }

    fn owner_uid(&self, path: &Path) -> Result<u32, IdentityError> {
        (**self).owner_uid(path)
    }
}
