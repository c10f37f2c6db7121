//! Configured repositories and name resolution.

use std::path::{Path, PathBuf};

use serde::Serialize;
use tracing::debug;

use crate::error::ConfigError;
use crate::ports::vcs::{VcsCommand, VcsExecutor};

/// Name that selects the repository containing the current directory.
pub const CURRENT_REPOSITORY: &str = ".";

/// One tracked repository.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RepositoryEntry {
    /// Unique name (the configuration section).
    pub name: String,
    /// Working tree location.
    pub path: PathBuf,
    /// Account to run git as; inferred from ownership of `path` when absent.
    pub owning_user: Option<String>,
}

/// The configured repositories, in configuration order.
#[derive(Debug, Clone, Default)]
pub struct Registry {
    entries: Vec<RepositoryEntry>,
    current: Option<RepositoryEntry>,
}

impl Registry {
    /// Creates a registry over `entries`.
    #[must_use]
    pub fn new(entries: Vec<RepositoryEntry>) -> Self {
        Self { entries, current: None }
    }

    /// All configured entries.
    #[must_use]
    pub fn entries(&self) -> &[RepositoryEntry] {
        &self.entries
    }

    /// The entry registered for the current directory, if any.
    #[must_use]
    pub fn current(&self) -> Option<&RepositoryEntry> {
        self.current.as_ref()
    }

    /// Looks up an entry by name, including `.` once resolved.
    #[must_use]
    pub fn get(&self, name: &str) -> Option<&RepositoryEntry> {
        if name == CURRENT_REPOSITORY {
            return self.current.as_ref();
        }
        self.entries.iter().find(|e| e.name == name)
    }

    /// Registers the `.` entry for the repository rooted at `toplevel`.
    ///
    /// The configured entry whose canonical path equals the canonical
    /// `toplevel` is aliased; nothing is registered when none matches.
    pub fn resolve_current(&mut self, toplevel: Option<&Path>) {
        let Some(toplevel) = toplevel else {
            self.current = None;
            return;
        };
        let root = canonical(toplevel);
        self.current = self.entries.iter().find(|e| canonical(&e.path) == root).cloned();
        debug!(
            root = %root.display(),
            matched = self.current.as_ref().map(|e| e.name.as_str()),
            "resolved current repository"
        );
    }

    /// Selects the entries named in `names`.
    ///
    /// An empty list selects every entry. Every name is checked before any is
    /// returned, so an unknown name rejects the whole request. Duplicates
    /// (including `.` aliasing an explicitly named entry) are dropped.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::UnknownRepository`] for the first unknown name.
    pub fn select(&self, names: &[String]) -> Result<Vec<RepositoryEntry>, ConfigError> {
        if names.is_empty() {
            return Ok(self.entries.clone());
        }
        let mut selected: Vec<RepositoryEntry> = Vec::with_capacity(names.len());
        for name in names {
            let entry =
                self.get(name).ok_or_else(|| ConfigError::UnknownRepository(name.clone()))?;
            if !selected.iter().any(|e| e.name == entry.name) {
                selected.push(entry.clone());
            }
        }
        Ok(selected)
    }

    /// Selects exactly one entry.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::UnknownRepository`] if `name` is not configured.
    pub fn select_one(&self, name: &str) -> Result<RepositoryEntry, ConfigError> {
        self.get(name).cloned().ok_or_else(|| ConfigError::UnknownRepository(name.to_string()))
    }
}

/// Finds the root of the working tree containing `cwd`.
///
/// Asks git first; when git refuses (for example over ownership of a tree
/// belonging to another user) falls back to the nearest ancestor holding a
/// `.git` entry.
pub fn working_tree_root(vcs: &dyn VcsExecutor, cwd: &Path) -> Option<PathBuf> {
    let command = VcsCommand::new(cwd, ["rev-parse", "--show-toplevel"]);
    match vcs.capture(&command) {
        Ok(out) if !out.trim().is_empty() => Some(PathBuf::from(out.trim())),
        Ok(_) => None,
        Err(e) => {
            debug!("rev-parse --show-toplevel failed in {}: {e}", cwd.display());
            cwd.ancestors().find(|dir| dir.join(".git").exists()).map(Path::to_path_buf)
        }
    }
}

fn canonical(path: &Path) -> PathBuf {
    std::fs::canonicalize(path).unwrap_or_else(|_| path.to_path_buf())
}
