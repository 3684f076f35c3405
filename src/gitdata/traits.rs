//! gitdata::traits
//!
//! The object-client trait and the records it exchanges.
//!
//! # Design
//!
//! Each method of [`GitData`] is exactly one request/response round trip
//! against the remote object store. `get_*`, `resolve_*` and the listing
//! methods are read-only and safe to repeat; `create_*` and `update_ref`
//! mutate remote state. Nothing here retries: a failure is returned to
//! the caller as soon as it is observed.
//!
//! Objects are content-addressed. A [`Sha`] is only ever obtained from
//! the store, never computed by the client.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use super::codec::{CodecError, DirectoryEntry};
use crate::core::types::{Author, BranchName, Sha};

/// Largest page size the listing endpoints accept.
pub const MAX_PER_PAGE: u32 = 100;

/// Errors from object-client operations.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum GitDataError {
    /// The requested branch does not exist.
    #[error("the branch '{0}' does not exist")]
    InvalidBranch(String),

    /// The caller supplied a request that cannot be constructed.
    #[error("invalid parameter: {0}")]
    InvalidParameter(String),

    /// The remote answered with a non-success status not otherwise classified.
    #[error("unexpected response status {status}: {body}")]
    UnexpectedStatus {
        /// HTTP status code
        status: u16,
        /// Raw response body (may be empty)
        body: String,
    },

    /// The response body did not match the expected shape or encoding.
    #[error("decoding error: {0}")]
    Decoding(String),

    /// The terminal ref update was rejected as not a fast-forward.
    #[error("update of branch '{0}' rejected: the branch moved since it was read")]
    RefUpdateConflict(String),

    /// The request never produced a response.
    #[error("network error: {0}")]
    Network(String),

    /// The caller's transform rejected an item's content.
    #[error("update of '{path}' failed: {message}")]
    Transform {
        /// Path of the item whose transform failed
        path: String,
        /// Message from the transform
        message: String,
    },
}

impl From<CodecError> for GitDataError {
    fn from(err: CodecError) -> Self {
        GitDataError::Decoding(err.to_string())
    }
}

/// Kind of object a tree entry points at.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ObjectKind {
    /// File content
    Blob,
    /// Subdirectory
    Tree,
    /// Submodule commit
    Commit,
}

impl std::fmt::Display for ObjectKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ObjectKind::Blob => write!(f, "blob"),
            ObjectKind::Tree => write!(f, "tree"),
            ObjectKind::Commit => write!(f, "commit"),
        }
    }
}

/// A directory entry inside a tree.
///
/// Serializes to the wire shape `{path, mode, type, sha}` used both when
/// reading a tree and when submitting a tree delta.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct TreeItem {
    /// Path relative to the tree root
    pub path: String,
    /// Git file mode, e.g. `100644`
    pub mode: String,
    /// Kind of the referenced object
    #[serde(rename = "type")]
    pub kind: ObjectKind,
    /// Sha of the referenced object
    pub sha: Sha,
}

impl TreeItem {
    /// Create a tree item.
    pub fn new(
        path: impl Into<String>,
        mode: impl Into<String>,
        kind: ObjectKind,
        sha: Sha,
    ) -> Self {
        Self {
            path: path.into(),
            mode: mode.into(),
            kind,
            sha,
        }
    }

    /// A copy of this item pointing at a different object.
    ///
    /// Path, mode and kind are preserved.
    pub fn with_sha(&self, sha: Sha) -> Self {
        Self {
            sha,
            ..self.clone()
        }
    }

    /// Whether this item is file content.
    pub fn is_blob(&self) -> bool {
        self.kind == ObjectKind::Blob
    }
}

/// A tree snapshot.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Tree {
    pub sha: Sha,
    /// Entries; order is not significant, paths are unique
    pub items: Vec<TreeItem>,
    /// Set when the store cut a recursive listing short
    pub truncated: bool,
}

/// A commit as stored remotely.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CommitRef {
    pub sha: Sha,
    pub tree_sha: Sha,
    pub parent_shas: Vec<Sha>,
    pub author: Author,
    pub committer: Author,
    pub message: String,
}

/// A branch and the commit it points at.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BranchHead {
    pub name: BranchName,
    pub commit_sha: Sha,
}

/// A branch from the branch listing.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Branch {
    pub name: BranchName,
    pub commit_sha: Sha,
    pub protected: bool,
}

/// A tag from the tag listing.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Tag {
    pub name: String,
    pub commit_sha: Sha,
}

/// Filters for the commit listing.
///
/// All fields are optional; unset fields are not sent.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CommitQuery {
    /// Sha or branch name to start listing from
    pub sha: Option<String>,
    /// 1-based page index
    pub page: Option<u32>,
    /// Commits per page (1..=100)
    pub per_page: Option<u32>,
    /// Only commits touching this path
    pub path: Option<String>,
}

impl CommitQuery {
    /// Check that the query can be sent.
    ///
    /// # Errors
    ///
    /// Returns `GitDataError::InvalidParameter` for a zero page, a page
    /// size outside `1..=100`, or an empty `sha`/`path` filter.
    pub fn validate(&self) -> Result<(), GitDataError> {
        if self.page == Some(0) {
            return Err(GitDataError::InvalidParameter(
                "page is 1-based, got 0".into(),
            ));
        }
        if let Some(per_page) = self.per_page {
            if per_page == 0 || per_page > MAX_PER_PAGE {
                return Err(GitDataError::InvalidParameter(format!(
                    "per_page must be between 1 and {MAX_PER_PAGE}, got {per_page}"
                )));
            }
        }
        if self.sha.as_deref().is_some_and(str::is_empty) {
            return Err(GitDataError::InvalidParameter("sha filter is empty".into()));
        }
        if self.path.as_deref().is_some_and(str::is_empty) {
            return Err(GitDataError::InvalidParameter("path filter is empty".into()));
        }
        Ok(())
    }

    /// Query parameters in wire form, skipping unset fields.
    pub fn to_pairs(&self) -> Vec<(&'static str, String)> {
        let mut pairs = Vec::new();
        if let Some(sha) = &self.sha {
            pairs.push(("sha", sha.clone()));
        }
        if let Some(page) = self.page {
            pairs.push(("page", page.to_string()));
        }
        if let Some(per_page) = self.per_page {
            pairs.push(("per_page", per_page.to_string()));
        }
        if let Some(path) = &self.path {
            pairs.push(("path", path.clone()));
        }
        pairs
    }
}

/// Object-graph primitives of a remote repository.
///
/// # Thread Safety
///
/// Implementations must be `Send + Sync`; the batch item updater issues
/// blob reads and writes from concurrent tasks.
///
/// # Errors
///
/// Every method returns `Result<T, GitDataError>`:
/// - `InvalidBranch` when a named branch does not exist
/// - `InvalidParameter` when the request cannot be built
/// - `UnexpectedStatus` for unclassified non-2xx responses
/// - `Decoding` for malformed bodies or payloads
/// - `RefUpdateConflict` when `update_ref` is not a fast-forward
/// - `Network` when no response was received
#[async_trait]
pub trait GitData: Send + Sync {
    /// Backend name (e.g. "github", "mock").
    fn name(&self) -> &'static str;

    /// List branches (first page of up to 100).
    async fn branches(&self) -> Result<Vec<Branch>, GitDataError>;

    /// Resolve a branch to its head commit.
    ///
    /// # Errors
    ///
    /// - `InvalidBranch` if the branch does not exist
    async fn resolve_branch(&self, name: &BranchName) -> Result<BranchHead, GitDataError>;

    /// List the entries of a directory on a branch.
    async fn contents(
        &self,
        path: &str,
        branch: &BranchName,
    ) -> Result<Vec<DirectoryEntry>, GitDataError>;

    /// Fetch a single entry (typically a file with inline content) on a branch.
    async fn content(&self, path: &str, branch: &BranchName)
        -> Result<DirectoryEntry, GitDataError>;

    /// List tags.
    async fn tags(&self) -> Result<Vec<Tag>, GitDataError>;

    /// List commits, newest first.
    ///
    /// # Errors
    ///
    /// - `InvalidParameter` if the query fails [`CommitQuery::validate`]
    async fn commits(&self, query: &CommitQuery) -> Result<Vec<CommitRef>, GitDataError>;

    /// Fetch a commit.
    async fn get_commit(&self, sha: &Sha) -> Result<CommitRef, GitDataError>;

    /// Fetch a tree; with `recursive` every nested entry is listed by full path.
    async fn get_tree(&self, sha: &Sha, recursive: bool) -> Result<Tree, GitDataError>;

    /// Fetch and decode a blob's content.
    ///
    /// # Errors
    ///
    /// - `Decoding` if the payload is not valid base64
    async fn get_blob_content(&self, sha: &Sha) -> Result<Vec<u8>, GitDataError>;

    /// Store content as a blob. Identical content yields the identical sha.
    async fn create_blob(&self, content: &[u8]) -> Result<Sha, GitDataError>;

    /// Create a tree from `base` plus a delta of changed entries.
    ///
    /// Entries of `base` not named in `items` are inherited by the store;
    /// callers never resend them.
    async fn create_tree(&self, base: &Sha, items: &[TreeItem]) -> Result<Sha, GitDataError>;

    /// Create a commit with a single parent. `author` is also used as
    /// committer.
    async fn create_commit(
        &self,
        author: &Author,
        message: &str,
        parent: &Sha,
        tree: &Sha,
    ) -> Result<Sha, GitDataError>;

    /// Move a branch to `sha`. Never forced.
    ///
    /// # Errors
    ///
    /// - `RefUpdateConflict` if the update is not a fast-forward
    async fn update_ref(&self, branch: &BranchName, sha: &Sha) -> Result<(), GitDataError>;
}
