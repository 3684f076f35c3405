//! core::config
//!
//! Configuration loading and resolution.
//!
//! # Overview
//!
//! Three values are required to talk to a repository: the account name,
//! an access token, and the repository API base URL. They come from a
//! TOML file and may be overridden by environment variables.
//!
//! # Precedence
//!
//! Configuration values are resolved in this order (later overrides earlier):
//! 1. Default values
//! 2. Config file
//! 3. Environment (`TREESMITH_USERNAME`, `TREESMITH_TOKEN`, `TREESMITH_REPO_URL`)
//!
//! # Config Locations
//!
//! Unless a path is given explicitly, searched in order:
//! 1. `$TREESMITH_CONFIG` if set
//! 2. `$XDG_CONFIG_HOME/treesmith/config.toml`
//! 3. `~/.treesmith/config.toml`
//!
//! # Example
//!
//! ```no_run
//! use treesmith::core::config::Config;
//!
//! let config = Config::load(None).unwrap();
//! println!("Repository: {}", config.repo_url());
//! ```

pub mod schema;

pub use schema::{CommitDefaults, FileConfig};

use std::fs;
use std::path::{Path, PathBuf};
use thiserror::Error;

use crate::gitdata::github::repo_api_url_from_remote;

/// Default number of concurrent blob fetch/transform tasks.
pub const DEFAULT_CONCURRENCY: usize = 8;

/// Environment variable naming an explicit config file.
pub const CONFIG_ENV: &str = "TREESMITH_CONFIG";

const USERNAME_ENV: &str = "TREESMITH_USERNAME";
const TOKEN_ENV: &str = "TREESMITH_TOKEN";
const REPO_URL_ENV: &str = "TREESMITH_REPO_URL";

/// Errors from configuration operations.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read config file '{path}': {source}")]
    ReadError {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("failed to parse config file '{path}': {message}")]
    ParseError { path: PathBuf, message: String },

    #[error("missing required config value '{0}'")]
    Missing(&'static str),

    #[error("invalid config value: {0}")]
    InvalidValue(String),
}

/// Fully resolved configuration.
#[derive(Clone)]
pub struct Config {
    username: String,
    token: String,
    repo_url: String,
    concurrency: usize,
    author_name: Option<String>,
    author_email: Option<String>,
    /// File the configuration was read from, if any
    path: Option<PathBuf>,
}

// Custom Debug to avoid exposing the token
impl std::fmt::Debug for Config {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Config")
            .field("username", &self.username)
            .field("repo_url", &self.repo_url)
            .field("concurrency", &self.concurrency)
            .field("author_name", &self.author_name)
            .field("author_email", &self.author_email)
            .field("path", &self.path)
            .finish_non_exhaustive()
    }
}

impl Config {
    /// Load configuration from `explicit` or the default locations, then
    /// apply environment overrides.
    ///
    /// A missing config file is not an error as long as the environment
    /// supplies every required value.
    ///
    /// # Errors
    ///
    /// Returns an error if a config file exists but cannot be read or
    /// parsed, or if a required value is missing or invalid.
    pub fn load(explicit: Option<&Path>) -> Result<Self, ConfigError> {
        let path = match explicit {
            Some(path) => Some(path.to_path_buf()),
            None => Self::find_config_file(),
        };
        let file = match &path {
            Some(path) => Self::read_file(path)?,
            None => FileConfig::default(),
        };
        Self::resolve(file, path, |key| std::env::var(key).ok())
    }

    /// Resolve a parsed file against an environment lookup.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError::Missing` for absent required values and
    /// `ConfigError::InvalidValue` for values that fail validation.
    pub fn resolve(
        file: FileConfig,
        path: Option<PathBuf>,
        env: impl Fn(&str) -> Option<String>,
    ) -> Result<Self, ConfigError> {
        file.validate()?;

        let non_empty = |value: Option<String>| value.filter(|v| !v.trim().is_empty());

        let username = non_empty(env(USERNAME_ENV))
            .or(non_empty(file.username))
            .ok_or(ConfigError::Missing("username"))?;
        let token = non_empty(env(TOKEN_ENV))
            .or(non_empty(file.token))
            .ok_or(ConfigError::Missing("token"))?;

        let repo_url = match non_empty(env(REPO_URL_ENV)).or(non_empty(file.repo_url)) {
            Some(url) => url,
            None => {
                let remote = non_empty(file.remote).ok_or(ConfigError::Missing("repo_url"))?;
                repo_api_url_from_remote(&remote).ok_or_else(|| {
                    ConfigError::InvalidValue(format!("unrecognized GitHub remote '{remote}'"))
                })?
            }
        };
        if !(repo_url.starts_with("https://") || repo_url.starts_with("http://")) {
            return Err(ConfigError::InvalidValue(format!(
                "repo_url must be an http(s) URL, got '{repo_url}'"
            )));
        }

        let commit = file.commit.unwrap_or_default();

        Ok(Self {
            username,
            token,
            repo_url: repo_url.trim_end_matches('/').to_string(),
            concurrency: commit.concurrency.unwrap_or(DEFAULT_CONCURRENCY),
            author_name: commit.author_name,
            author_email: commit.author_email,
            path,
        })
    }

    fn find_config_file() -> Option<PathBuf> {
        if let Ok(path) = std::env::var(CONFIG_ENV) {
            let path = PathBuf::from(path);
            if path.exists() {
                return Some(path);
            }
        }

        if let Ok(xdg_home) = std::env::var("XDG_CONFIG_HOME") {
            let path = PathBuf::from(xdg_home).join("treesmith/config.toml");
            if path.exists() {
                return Some(path);
            }
        }

        dirs::home_dir()
            .map(|home| home.join(".treesmith/config.toml"))
            .filter(|path| path.exists())
    }

    fn read_file(path: &Path) -> Result<FileConfig, ConfigError> {
        let contents = fs::read_to_string(path).map_err(|e| ConfigError::ReadError {
            path: path.to_path_buf(),
            source: e,
        })?;

        toml::from_str(&contents).map_err(|e| ConfigError::ParseError {
            path: path.to_path_buf(),
            message: e.to_string(),
        })
    }

    /// Account name for Basic authentication.
    pub fn username(&self) -> &str {
        &self.username
    }

    /// Access token for Basic authentication.
    pub fn token(&self) -> &str {
        &self.token
    }

    /// Repository API base URL, without a trailing slash.
    pub fn repo_url(&self) -> &str {
        &self.repo_url
    }

    /// Concurrency limit for the batch item updater.
    ///
    /// Defaults to [`DEFAULT_CONCURRENCY`].
    pub fn concurrency(&self) -> usize {
        self.concurrency
    }

    /// Configured commit author name, if any.
    pub fn author_name(&self) -> Option<&str> {
        self.author_name.as_deref()
    }

    /// Configured commit author email, if any.
    pub fn author_email(&self) -> Option<&str> {
        self.author_email.as_deref()
    }

    /// Path of the file the configuration was loaded from.
    pub fn path(&self) -> Option<&Path> {
        self.path.as_deref()
    }
}
