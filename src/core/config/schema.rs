//! core::config::schema
//!
//! Configuration file schema.
//!
//! # Example
//!
//! ```toml
//! username = "octocat"
//! token = "ghp_xxx"
//! repo_url = "https://api.github.com/repos/octocat/hello-world"
//!
//! [commit]
//! concurrency = 8
//! author_name = "Release Bot"
//! author_email = "release-bot@example.com"
//! ```
//!
//! Instead of `repo_url`, a git `remote` URL may be given
//! (`git@github.com:octocat/hello-world.git`); it is converted to the
//! repository API URL when the configuration is resolved.

use serde::{Deserialize, Serialize};

use super::ConfigError;

/// On-disk configuration. Every field is optional here; required values
/// are checked once environment overrides have been applied.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(default, deny_unknown_fields)]
pub struct FileConfig {
    /// Account used for Basic authentication
    pub username: Option<String>,

    /// Personal access token (needs repository contents write access)
    pub token: Option<String>,

    /// Repository API base URL, e.g. `https://api.github.com/repos/{owner}/{repo}`
    pub repo_url: Option<String>,

    /// Git remote URL, used when `repo_url` is absent
    pub remote: Option<String>,

    /// Commit defaults
    pub commit: Option<CommitDefaults>,
}

impl FileConfig {
    /// Validate the values present in the file.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError::InvalidValue` if any value is invalid.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if let Some(commit) = &self.commit {
            commit.validate()?;
        }
        if self.repo_url.is_some() && self.remote.is_some() {
            return Err(ConfigError::InvalidValue(
                "set either 'repo_url' or 'remote', not both".into(),
            ));
        }
        Ok(())
    }
}

/// Defaults applied to generated commits.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(default, deny_unknown_fields)]
pub struct CommitDefaults {
    /// Maximum number of blobs fetched/transformed concurrently
    pub concurrency: Option<usize>,

    /// Author name for generated commits
    pub author_name: Option<String>,

    /// Author email for generated commits
    pub author_email: Option<String>,
}

impl CommitDefaults {
    fn validate(&self) -> Result<(), ConfigError> {
        if self.concurrency == Some(0) {
            return Err(ConfigError::InvalidValue(
                "commit.concurrency must be at least 1".into(),
            ));
        }
        Ok(())
    }
}
