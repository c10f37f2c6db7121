//! Configuration loading.
//!
//! The configuration is an INI file. Keys outside any section are global
//! settings; every named section describes one repository:
//!
//! ```text
//! jobs = 8
//! fetch_timeout = 30
//!
//! [etc]
//! path = /etc
//!
//! [website]
//! path = /srv/www
//! user = www-data
//! ```

use std::path::{Path, PathBuf};
use std::str::FromStr;
use std::time::Duration;

use ini::{Ini, Properties};

use crate::batch::DEFAULT_WORKERS;
use crate::error::ConfigError;
use crate::registry::{RepositoryEntry, CURRENT_REPOSITORY};

/// Default configuration location.
pub const DEFAULT_CONFIG_PATH: &str = "/etc/gitward/repos.conf";

/// Environment defaults file, loaded before anything else reads the environment.
pub const ENV_DEFAULTS_PATH: &str = "/etc/default/gitward";

/// Global settings from the section-less part of the configuration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Settings {
    /// Worker pool width for batch commands.
    pub jobs: usize,
    /// Hard limit on `git fetch`.
    pub fetch_timeout: Duration,
    /// Hard limit on `git pull` and `git push` during update.
    pub sync_timeout: Duration,
    /// git executable.
    pub git: String,
    /// Privilege wrapper used to run commands as another user.
    pub wrapper: String,
    /// Whether to point `GIT_CONFIG_GLOBAL` at the acting user's home.
    pub inject_global_config: bool,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            jobs: DEFAULT_WORKERS,
            fetch_timeout: Duration::from_secs(30),
            sync_timeout: Duration::from_secs(120),
            git: "git".to_string(),
            wrapper: "sudo".to_string(),
            inject_global_config: true,
        }
    }
}

/// Parsed configuration: settings plus repositories in file order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Config {
    /// Global settings.
    pub settings: Settings,
    /// Configured repositories, in the order they appear.
    pub repositories: Vec<RepositoryEntry>,
}

impl Config {
    /// Loads the configuration file at `path`.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be read or parsed, or if any
    /// repository section is malformed.
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let ini = Ini::load_from_file(path).map_err(|e| ConfigError::Unreadable {
            path: path.to_path_buf(),
            message: e.to_string(),
        })?;
        Self::from_ini(&ini)
    }

    /// Parses configuration text.
    ///
    /// # Errors
    ///
    /// Returns an error if the text is not valid INI or a section is malformed.
    pub fn parse(text: &str) -> Result<Self, ConfigError> {
        let ini = Ini::load_from_str(text).map_err(|e| ConfigError::Unreadable {
            path: PathBuf::from("<inline>"),
            message: e.to_string(),
        })?;
        Self::from_ini(&ini)
    }

    fn from_ini(ini: &Ini) -> Result<Self, ConfigError> {
        let settings = parse_settings(ini.general_section())?;
        let mut repositories: Vec<RepositoryEntry> = Vec::new();
        for (section, props) in ini {
            let Some(name) = section else { continue };
            if name == CURRENT_REPOSITORY {
                return Err(ConfigError::ReservedName);
            }
            let path = props
                .get("path")
                .map(str::trim)
                .filter(|p| !p.is_empty())
                .ok_or_else(|| ConfigError::MissingPath(name.to_string()))?;
            let owning_user =
                props.get("user").map(str::trim).filter(|u| !u.is_empty()).map(String::from);
            let entry =
                RepositoryEntry { name: name.to_string(), path: PathBuf::from(path), owning_user };
            // A repeated section overrides the earlier one but keeps its position.
            match repositories.iter_mut().find(|r| r.name == entry.name) {
                Some(existing) => *existing = entry,
                None => repositories.push(entry),
            }
        }
        Ok(Self { settings, repositories })
    }
}

fn parse_settings(props: &Properties) -> Result<Settings, ConfigError> {
    let mut settings = Settings::default();
    if let Some(jobs) = parse_value::<usize>(props, "jobs")? {
        if jobs == 0 {
            return Err(invalid("jobs", "0"));
        }
        settings.jobs = jobs;
    }
    if let Some(secs) = parse_value::<u64>(props, "fetch_timeout")? {
        settings.fetch_timeout = Duration::from_secs(secs);
    }
    if let Some(secs) = parse_value::<u64>(props, "sync_timeout")? {
        settings.sync_timeout = Duration::from_secs(secs);
    }
    if let Some(git) = props.get("git") {
        settings.git = git.trim().to_string();
    }
    if let Some(wrapper) = props.get("wrapper") {
        settings.wrapper = wrapper.trim().to_string();
    }
    if let Some(raw) = props.get("inject_global_config") {
        settings.inject_global_config =
            parse_bool(raw).ok_or_else(|| invalid("inject_global_config", raw))?;
    }
    Ok(settings)
}

fn parse_value<T: FromStr>(props: &Properties, key: &str) -> Result<Option<T>, ConfigError> {
    props.get(key).map(|raw| raw.trim().parse::<T>().map_err(|_| invalid(key, raw))).transpose()
}

fn parse_bool(raw: &str) -> Option<bool> {
    match raw.trim().to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Some(true),
        "0" | "false" | "no" | "off" => Some(false),
        _ => None,
    }
}

fn invalid(key: &str, value: &str) -> ConfigError {
    ConfigError::InvalidValue { key: key.to_string(), value: value.to_string() }
}

/// Resolves the configuration file location.
///
/// An explicit path wins, then `GITWARD_CONFIG`, then [`DEFAULT_CONFIG_PATH`].
#[must_use]
pub fn config_path(explicit: Option<&Path>) -> PathBuf {
    explicit.map(Path::to_path_buf).unwrap_or_else(|| {
        std::env::var_os("GITWARD_CONFIG")
            .map_or_else(|| PathBuf::from(DEFAULT_CONFIG_PATH), PathBuf::from)
    })
}

/// Loads [`ENV_DEFAULTS_PATH`] into the environment when it exists.
///
/// Variables already set in the real environment are left untouched.
pub fn load_env_defaults() {
    let path = Path::new(ENV_DEFAULTS_PATH);
    if path.exists() {
        if let Err(e) = dotenvy::from_path(path) {
            eprintln!("warning: ignoring {}: {e}", path.display());
        }
    }
}
