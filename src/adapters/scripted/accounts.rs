//! Fixed account table for tests.

use std::collections::HashMap;
use std::io;
use std::path::{Path, PathBuf};

use crate::error::IdentityError;
use crate::ports::accounts::{Account, Accounts};

/// An in-memory account database with fixed path ownership.
#[derive(Debug, Clone)]
pub struct StaticAccounts {
    euid: u32,
    users: Vec<Account>,
    owners: HashMap<PathBuf, u32>,
}

impl StaticAccounts {
    /// Creates a table where the running process has effective uid `euid`.
    #[must_use]
    pub fn new(euid: u32) -> Self {
        Self { euid, users: Vec::new(), owners: HashMap::new() }
    }

    /// Adds an account whose home is `/home/<name>`.
    #[must_use]
    pub fn user(mut self, name: &str, uid: u32) -> Self {
        let home = Some(PathBuf::from("/home").join(name));
        self.users.push(Account { name: name.to_string(), uid, home });
        self
    }

    /// Declares `path` as owned by `uid`.
    #[must_use]
    pub fn owner(mut self, path: impl Into<PathBuf>, uid: u32) -> Self {
        self.owners.insert(path.into(), uid);
        self
    }
}

impl Accounts for StaticAccounts {
    fn effective_uid(&self) -> u32 {
        self.euid
    }

    fn by_name(&self, name: &str) -> Result<Option<Account>, IdentityError> {
        Ok(self.users.iter().find(|a| a.name == name).cloned())
    }

    fn by_uid(&self, uid: u32) -> Result<Option<Account>, IdentityError> {
        Ok(self.users.iter().find(|a| a.uid == uid).cloned())
    }

    fn owner_uid(&self, path: &Path) -> Result<u32, IdentityError> {
        self.owners.get(path).copied().ok_or_else(|| IdentityError::Inaccessible {
            path: path.to_path_buf(),
            source: io::Error::new(io::ErrorKind::NotFound, "no such file or directory"),
        })
    }
}
