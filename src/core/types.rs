//! core::types
//!
//! Strong types for object-graph concepts.
//!
//! # Types
//!
//! - [`BranchName`] - Validated Git branch name
//! - [`Sha`] - Content hash assigned by the remote object store
//! - [`Author`] - Identity stamped onto generated commits
//!
//! # Validation
//!
//! These types enforce validity at construction time. A value decoded
//! from a response body goes through the same checks, so a malformed
//! sha from the remote surfaces as a decoding failure instead of
//! flowing into a later request.
//!
//! # Examples
//!
//! ```
//! use treesmith::core::types::{BranchName, Sha};
//!
//! let branch = BranchName::new("feature/my-branch").unwrap();
//! let sha = Sha::new("abc123def4567890abc123def4567890abc12345").unwrap();
//! assert_eq!(sha.short(7), "abc123d");
//!
//! assert!(BranchName::new("invalid..name").is_err());
//! assert!(Sha::new("not-a-sha").is_err());
//! ```

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Errors from type validation.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum TypeError {
    #[error("invalid branch name: {0}")]
    InvalidBranchName(String),

    #[error("invalid sha: {0}")]
    InvalidSha(String),
}

/// A validated Git branch name.
///
/// Branch names must conform to Git's refname rules (see `git check-ref-format`):
/// - Cannot be empty
/// - Cannot start with `.` or `-`
/// - Cannot end with `.lock` or `/`
/// - Cannot contain `..`, `@{`, `//`, or ASCII control characters
/// - Cannot contain spaces, `~`, `^`, `:`, `\`, `?`, `*`, `[`
/// - Cannot be exactly `@`
///
/// A valid name says nothing about whether the branch exists on the
/// remote; that is checked by resolving it.
///
/// # Example
///
/// ```
/// use treesmith::core::types::BranchName;
///
/// let name = BranchName::new("release/2.1").unwrap();
/// assert_eq!(name.as_str(), "release/2.1");
///
/// assert!(BranchName::new("").is_err());
/// assert!(BranchName::new("has space").is_err());
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct BranchName(String);

impl BranchName {
    /// Create a new validated branch name.
    ///
    /// # Errors
    ///
    /// Returns `TypeError::InvalidBranchName` if the name violates Git's refname rules.
    pub fn new(name: impl Into<String>) -> Result<Self, TypeError> {
        let name = name.into();
        Self::validate(&name)?;
        Ok(Self(name))
    }

    fn validate(name: &str) -> Result<(), TypeError> {
        let invalid = |reason: &str| Err(TypeError::InvalidBranchName(reason.to_string()));

        if name.is_empty() {
            return invalid("branch name cannot be empty");
        }
        if name == "@" {
            return invalid("branch name cannot be '@' (reserved)");
        }
        if name.starts_with('.') || name.starts_with('-') {
            return invalid("branch name cannot start with '.' or '-'");
        }
        if name.ends_with(".lock") || name.ends_with('/') {
            return invalid("branch name cannot end with '.lock' or '/'");
        }
        for sequence in ["..", "@{", "//"] {
            if name.contains(sequence) {
                return Err(TypeError::InvalidBranchName(format!(
                    "branch name cannot contain '{sequence}'"
                )));
            }
        }

        const INVALID_CHARS: [char; 8] = [' ', '~', '^', ':', '\\', '?', '*', '['];
        if let Some(c) = name.chars().find(|c| INVALID_CHARS.contains(c)) {
            return Err(TypeError::InvalidBranchName(format!(
                "branch name cannot contain '{c}'"
            )));
        }
        if name.chars().any(|c| c.is_ascii_control()) {
            return invalid("branch name cannot contain control characters");
        }

        for component in name.split('/') {
            if component.starts_with('.') {
                return invalid("path component cannot start with '.'");
            }
            if component.ends_with(".lock") {
                return invalid("path component cannot end with '.lock'");
            }
        }

        Ok(())
    }

    /// Get the branch name as a string slice.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl TryFrom<String> for BranchName {
    type Error = TypeError;

    fn try_from(s: String) -> Result<Self, Self::Error> {
        Self::new(s)
    }
}

impl From<BranchName> for String {
    fn from(name: BranchName) -> Self {
        name.0
    }
}

impl AsRef<str> for BranchName {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for BranchName {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// A content hash identifying a blob, tree, or commit.
///
/// Shas are only ever produced by the object store (or read back from
/// it); the client never computes one for an object it sends. Both
/// SHA-1 (40 hex) and SHA-256 (64 hex) repositories are accepted, and
/// the value is normalized to lowercase.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct Sha(String);

impl Sha {
    /// Create a new validated sha.
    ///
    /// # Errors
    ///
    /// Returns `TypeError::InvalidSha` if the string is not a 40 or 64
    /// character hex digest.
    pub fn new(sha: impl Into<String>) -> Result<Self, TypeError> {
        let sha = sha.into().to_ascii_lowercase();
        if sha.len() != 40 && sha.len() != 64 {
            return Err(TypeError::InvalidSha(format!(
                "expected 40 or 64 hex characters, got {}",
                sha.len()
            )));
        }
        if !sha.chars().all(|c| c.is_ascii_hexdigit()) {
            return Err(TypeError::InvalidSha("sha must be hexadecimal".into()));
        }
        Ok(Self(sha))
    }

    /// Get an abbreviated form of the sha.
    ///
    /// Returns the first `len` characters, or the full sha if shorter.
    pub fn short(&self, len: usize) -> &str {
        &self.0[..len.min(self.0.len())]
    }

    /// Get the sha as a string slice.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl TryFrom<String> for Sha {
    type Error = TypeError;

    fn try_from(s: String) -> Result<Self, Self::Error> {
        Self::new(s)
    }
}

impl From<Sha> for String {
    fn from(sha: Sha) -> Self {
        sha.0
    }
}

impl AsRef<str> for Sha {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for Sha {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Commit author, also used as committer for generated commits.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Author {
    pub name: String,
    pub email: String,
    pub date: DateTime<Utc>,
}

impl Author {
    /// Create an author stamped with the given time.
    pub fn new(name: impl Into<String>, email: impl Into<String>, date: DateTime<Utc>) -> Self {
        Self {
            name: name.into(),
            email: email.into(),
            date,
        }
    }

    /// Create an author stamped with the current time.
    pub fn now(name: impl Into<String>, email: impl Into<String>) -> Self {
        Self::new(name, email, Utc::now())
    }
}
