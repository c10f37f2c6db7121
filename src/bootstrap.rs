//! Per-user commit identity, created on first use.
//!
//! Commits made through `gitward` are attributed to the human running it,
//! not to the account owning the repository. The identity lives in a small
//! YAML file; if it is missing the user is asked for an email once.

use std::io::{BufRead, Write};
use std::path::{Path, PathBuf};

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tracing::info;

use crate::error::{ConfigError, Error, Result};

/// Name and email used as commit author.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UserIdentity {
    /// Author email.
    pub email: String,
    /// Author name; git falls back to its own configuration when absent.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    /// When the file was first written.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub created_at: Option<DateTime<Utc>>,
}

impl UserIdentity {
    /// `-c` options that make git use this identity.
    #[must_use]
    pub fn config_args(&self) -> Vec<String> {
        let mut args = vec!["-c".to_string(), format!("user.email={}", self.email)];
        if let Some(name) = &self.name {
            args.push("-c".to_string());
            args.push(format!("user.name={name}"));
        }
        args
    }
}

/// Location of the identity file.
///
/// `GITWARD_IDENTITY` wins; otherwise `<config dir>/gitward/identity.yaml`.
#[must_use]
pub fn identity_path() -> Option<PathBuf> {
    std::env::var_os("GITWARD_IDENTITY")
        .map(PathBuf::from)
        .or_else(|| dirs::config_dir().map(|dir| dir.join("gitward").join("identity.yaml")))
}

/// Reads the identity file, returning `None` if it does not exist.
///
/// # Errors
///
/// Returns an error if the file exists but cannot be read or parsed.
pub fn load(path: &Path) -> Result<Option<UserIdentity>> {
    if !path.exists() {
        return Ok(None);
    }
    let contents = std::fs::read_to_string(path).map_err(|e| identity_error(path, &e))?;
    let identity: UserIdentity =
        serde_yaml::from_str(&contents).map_err(|e| identity_error(path, &e))?;
    if identity.email.trim().is_empty() {
        return Err(identity_error(path, &"email is empty").into());
    }
    Ok(Some(identity))
}

/// Writes the identity file, creating parent directories.
///
/// # Errors
///
/// Returns an error if serialization or writing fails.
pub fn save(path: &Path, identity: &UserIdentity) -> Result<()> {
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent).map_err(|e| identity_error(path, &e))?;
    }
    let yaml = serde_yaml::to_string(identity).map_err(|e| identity_error(path, &e))?;
    std::fs::write(path, yaml).map_err(|e| identity_error(path, &e))?;
    info!("saved commit identity to {}", path.display());
    Ok(())
}

/// Loads the identity, prompting for an email and saving it when absent.
///
/// # Errors
///
/// Returns an error if the file is unreadable, the prompt gets no answer, or
/// saving fails.
pub fn load_or_prompt(
    path: &Path,
    input: &mut impl BufRead,
    output: &mut impl Write,
) -> Result<UserIdentity> {
    if let Some(identity) = load(path)? {
        return Ok(identity);
    }

    write!(output, "No commit identity found. Email address: ")?;
    output.flush()?;
    let mut line = String::new();
    input.read_line(&mut line)?;
    let email = line.trim();
    if email.is_empty() {
        return Err(Error::from(identity_error(path, &"no email given")));
    }

    let identity =
        UserIdentity { email: email.to_string(), name: None, created_at: Some(Utc::now()) };
    save(path, &identity)?;
    Ok(identity)
}

fn identity_error(path: &Path, err: &dyn std::fmt::Display) -> ConfigError {
    ConfigError::IdentityFile { path: path.to_path_buf(), message: err.to_string() }
}
