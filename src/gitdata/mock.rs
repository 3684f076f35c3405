//! gitdata::mock
//!
//! In-memory object store implementing [`GitData`] for deterministic testing.
//!
//! # Design
//!
//! The mock behaves like the remote store where it matters to callers:
//! - Object ids are SHA-256 digests of a canonical serialization, so
//!   identical content always yields the identical id.
//! - `create_tree` merges the delta with the base tree by path.
//! - `update_ref` only accepts fast-forwards (the new commit's parent
//!   must be the current head).
//! - Tree entries must reference objects of the matching kind that
//!   exist in the store.
//!
//! Every call is recorded as a [`MockOperation`] so tests can assert
//! which writes happened, and [`FailOn`] injects a failure into one
//! operation.
//!
//! # Example
//!
//! ```
//! use treesmith::core::types::BranchName;
//! use treesmith::gitdata::mock::MockRepository;
//! use treesmith::gitdata::GitData;
//!
//! # tokio_test::block_on(async {
//! let repo = MockRepository::new();
//! let main = BranchName::new("main").unwrap();
//! let head = repo.seed_branch(&main, &[("a.txt", b"hello".as_slice())]);
//!
//! let resolved = repo.resolve_branch(&main).await.unwrap();
//! assert_eq!(resolved.commit_sha, head);
//! # });
//! ```

use std::collections::{BTreeMap, BTreeSet, HashMap};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sha2::{Digest, Sha256};

use super::codec::DirectoryEntry;
use super::traits::{
    Branch, BranchHead, CommitQuery, CommitRef, GitData, GitDataError, ObjectKind, Tag, Tree,
    TreeItem,
};
use crate::core::types::{Author, BranchName, Sha};

/// Mode used for seeded files.
const FILE_MODE: &str = "100644";
/// Mode used for directory entries.
const DIR_MODE: &str = "040000";
/// Mode marking a symbolic link.
const SYMLINK_MODE: &str = "120000";
/// Page size of the commit listing when none is requested.
const DEFAULT_PER_PAGE: usize = 30;

/// Mock object store for testing.
///
/// Thread-safe via internal `Arc<Mutex<...>>` wrapping; clones share state.
#[derive(Debug, Clone)]
pub struct MockRepository {
    inner: Arc<Mutex<MockRepositoryInner>>,
}

/// Leaf entries of a tree, keyed by path relative to that tree.
type Leaves = BTreeMap<String, TreeItem>;

#[derive(Debug, Default)]
struct MockRepositoryInner {
    blobs: HashMap<Sha, Vec<u8>>,
    trees: HashMap<Sha, Leaves>,
    commits: HashMap<Sha, CommitRef>,
    branches: BTreeMap<BranchName, Sha>,
    tags: BTreeMap<String, Sha>,
    default_branch: Option<BranchName>,
    fail_on: Option<FailOn>,
    operations: Vec<MockOperation>,
}

/// Configuration for which operation should fail.
#[derive(Debug, Clone)]
pub enum FailOn {
    ResolveBranch(GitDataError),
    GetCommit(GitDataError),
    GetTree(GitDataError),
    GetBlob(GitDataError),
    CreateBlob(GitDataError),
    CreateTree(GitDataError),
    CreateCommit(GitDataError),
    UpdateRef(GitDataError),
}

/// Recorded operation for test verification.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MockOperation {
    Branches,
    ResolveBranch {
        branch: BranchName,
    },
    Contents {
        path: String,
        branch: BranchName,
    },
    Content {
        path: String,
        branch: BranchName,
    },
    Tags,
    Commits {
        query: CommitQuery,
    },
    GetCommit {
        sha: Sha,
    },
    GetTree {
        sha: Sha,
        recursive: bool,
    },
    GetBlob {
        sha: Sha,
    },
    CreateBlob {
        content: Vec<u8>,
    },
    CreateTree {
        base: Sha,
        items: Vec<TreeItem>,
    },
    CreateCommit {
        tree: Sha,
        parent: Sha,
        message: String,
    },
    UpdateRef {
        branch: BranchName,
        sha: Sha,
    },
}

impl MockOperation {
    /// Whether the operation mutates the store.
    pub fn is_write(&self) -> bool {
        matches!(
            self,
            MockOperation::CreateBlob { .. }
                | MockOperation::CreateTree { .. }
                | MockOperation::CreateCommit { .. }
                | MockOperation::UpdateRef { .. }
        )
    }
}

/// Fixed author of seeded commits.
fn seed_author() -> Author {
    Author::new("Mock Seeder", "seeder@example.com", DateTime::<Utc>::default())
}

fn digest(bytes: &[u8]) -> Sha {
    let hex = hex::encode(Sha256::digest(bytes));
    // a hex-encoded SHA-256 digest is always a valid sha
    Sha::new(hex).unwrap_or_else(|_| unreachable!())
}

fn blob_id(content: &[u8]) -> Sha {
    let mut bytes = format!("blob {}\0", content.len()).into_bytes();
    bytes.extend_from_slice(content);
    digest(&bytes)
}

fn not_found(what: impl std::fmt::Display) -> GitDataError {
    GitDataError::UnexpectedStatus {
        status: 404,
        body: format!("{{\"message\":\"Not Found: {what}\"}}"),
    }
}

fn unprocessable(message: impl std::fmt::Display) -> GitDataError {
    GitDataError::UnexpectedStatus {
        status: 422,
        body: format!("{{\"message\":\"{message}\"}}"),
    }
}

/// Parent directory and file name of a path.
fn split_path(path: &str) -> (&str, &str) {
    path.rsplit_once('/').unwrap_or(("", path))
}

impl MockRepositoryInner {
    fn store_blob(&mut self, content: &[u8]) -> Sha {
        let sha = blob_id(content);
        self.blobs.entry(sha.clone()).or_insert_with(|| content.to_vec());
        sha
    }

    /// Store a tree from its leaves; every subtree is stored too.
    fn store_tree(&mut self, leaves: Leaves) -> Sha {
        let mut canonical = String::from("tree\n");
        for item in leaves.values() {
            canonical.push_str(&format!(
                "{} {} {}\t{}\n",
                item.mode, item.kind, item.sha, item.path
            ));
        }
        let sha = digest(canonical.as_bytes());

        for dir in Self::directories(&leaves) {
            let prefix = format!("{dir}/");
            let subtree: Leaves = leaves
                .range(prefix.clone()..)
                .take_while(|(path, _)| path.starts_with(&prefix))
                .map(|(path, item)| {
                    let relative = path[prefix.len()..].to_string();
                    (
                        relative.clone(),
                        TreeItem {
                            path: relative,
                            ..item.clone()
                        },
                    )
                })
                .collect();
            self.store_tree(subtree);
        }

        self.trees.entry(sha.clone()).or_insert(leaves);
        sha
    }

    /// Top-level directory names implied by the leaves.
    fn directories(leaves: &Leaves) -> BTreeSet<String> {
        leaves
            .keys()
            .filter_map(|path| path.split_once('/').map(|(dir, _)| dir.to_string()))
            .collect()
    }

    /// All directory paths (at any depth) implied by the leaves.
    fn all_directories(leaves: &Leaves) -> BTreeSet<String> {
        let mut dirs = BTreeSet::new();
        for path in leaves.keys() {
            let mut end = 0;
            while let Some(pos) = path[end..].find('/') {
                end += pos;
                dirs.insert(path[..end].to_string());
                end += 1;
            }
        }
        dirs
    }

    /// Leaves of the subtree rooted at `dir` (relative paths).
    fn subtree(leaves: &Leaves, dir: &str) -> Leaves {
        let prefix = format!("{dir}/");
        leaves
            .iter()
            .filter_map(|(path, item)| {
                path.strip_prefix(&prefix).map(|relative| {
                    (
                        relative.to_string(),
                        TreeItem {
                            path: relative.to_string(),
                            ..item.clone()
                        },
                    )
                })
            })
            .collect()
    }

    /// Listing of a stored tree as the remote returns it.
    fn listing(&mut self, leaves: &Leaves, recursive: bool) -> Vec<TreeItem> {
        let dirs = if recursive {
            Self::all_directories(leaves)
        } else {
            Self::directories(leaves)
        };

        let mut items: Vec<TreeItem> = dirs
            .into_iter()
            .map(|dir| {
                let sha = self.store_tree(Self::subtree(leaves, &dir));
                TreeItem::new(dir, DIR_MODE, ObjectKind::Tree, sha)
            })
            .collect();
        items.extend(
            leaves
                .values()
                .filter(|item| recursive || !item.path.contains('/'))
                .cloned(),
        );
        items.sort_by(|a, b| a.path.cmp(&b.path));
        items
    }

    fn store_commit(
        &mut self,
        tree: &Sha,
        parents: Vec<Sha>,
        author: &Author,
        message: &str,
    ) -> Sha {
        let mut canonical = format!("commit\ntree {tree}\n");
        for parent in &parents {
            canonical.push_str(&format!("parent {parent}\n"));
        }
        canonical.push_str(&format!(
            "author {} <{}> {}\n\n{}",
            author.name,
            author.email,
            author.date.to_rfc3339(),
            message
        ));
        let sha = digest(canonical.as_bytes());

        self.commits.entry(sha.clone()).or_insert_with(|| CommitRef {
            sha: sha.clone(),
            tree_sha: tree.clone(),
            parent_shas: parents,
            author: author.clone(),
            committer: author.clone(),
            message: message.to_string(),
        });
        sha
    }

    fn head_leaves(&self, branch: &BranchName) -> Result<Leaves, GitDataError> {
        let head = self
            .branches
            .get(branch)
            .ok_or_else(|| not_found(format!("branch {branch}")))?;
        let commit = self
            .commits
            .get(head)
            .ok_or_else(|| not_found(format!("commit {head}")))?;
        self.trees
            .get(&commit.tree_sha)
            .cloned()
            .ok_or_else(|| not_found(format!("tree {}", commit.tree_sha)))
    }

    /// Check a delta item references an existing object of its kind.
    fn check_reference(&self, item: &TreeItem) -> Result<(), GitDataError> {
        let exists = match item.kind {
            ObjectKind::Blob => self.blobs.contains_key(&item.sha),
            ObjectKind::Tree => self.trees.contains_key(&item.sha),
            ObjectKind::Commit => true,
        };
        if exists {
            Ok(())
        } else {
            Err(unprocessable(format!(
                "tree.sha {} is not a valid {}",
                item.sha, item.kind
            )))
        }
    }

    /// Whether `commit` changed anything under `path` relative to its first parent.
    fn touches(&self, commit: &CommitRef, path: &str) -> bool {
        let snapshot = |sha: Option<&Sha>| -> Leaves {
            sha.and_then(|sha| self.commits.get(sha))
                .and_then(|c| self.trees.get(&c.tree_sha))
                .map(|leaves| {
                    leaves
                        .iter()
                        .filter(|(p, _)| {
                            p.as_str() == path || p.starts_with(&format!("{path}/"))
                        })
                        .map(|(p, item)| (p.clone(), item.clone()))
                        .collect()
                })
                .unwrap_or_default()
        };
        snapshot(Some(&commit.sha)) != snapshot(commit.parent_shas.first())
    }

    fn entry_for(&self, name: &str, item: &TreeItem, with_content: bool) -> DirectoryEntry {
        let content = self.blobs.get(&item.sha);
        match item.kind {
            ObjectKind::Commit => DirectoryEntry::Submodule {
                name: name.to_string(),
                url: format!("mock://submodules/{}", item.sha),
            },
            ObjectKind::Blob if item.mode == SYMLINK_MODE => DirectoryEntry::Symlink {
                name: name.to_string(),
                target_path: content
                    .map(|bytes| String::from_utf8_lossy(bytes).into_owned())
                    .unwrap_or_default(),
            },
            ObjectKind::Blob => DirectoryEntry::File {
                name: name.to_string(),
                content: if with_content { content.cloned() } else { None },
            },
            ObjectKind::Tree => DirectoryEntry::Directory {
                name: name.to_string(),
            },
        }
    }
}

impl MockRepository {
    /// Create an empty mock store.
    pub fn new() -> Self {
        Self {
            inner: Arc::new(Mutex::new(MockRepositoryInner::default())),
        }
    }

    fn lock(&self) -> MutexGuard<'_, MockRepositoryInner> {
        self.inner.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Create `branch` with a single root commit holding `files`.
    ///
    /// The first seeded branch becomes the default branch of the commit
    /// listing. Returns the commit sha.
    pub fn seed_branch(&self, branch: &BranchName, files: &[(&str, &[u8])]) -> Sha {
        let mut inner = self.lock();
        let mut leaves = Leaves::new();
        for (path, content) in files {
            let sha = inner.store_blob(content);
            leaves.insert(
                path.to_string(),
                TreeItem::new(*path, FILE_MODE, ObjectKind::Blob, sha),
            );
        }
        let tree = inner.store_tree(leaves);
        let commit = inner.store_commit(&tree, Vec::new(), &seed_author(), "Initial commit");
        inner.branches.insert(branch.clone(), commit.clone());
        if inner.default_branch.is_none() {
            inner.default_branch = Some(branch.clone());
        }
        commit
    }

    /// Commit `files` on top of `branch` and move it, as another writer would.
    ///
    /// Returns the new head, or `None` if the branch does not exist.
    pub fn move_branch(
        &self,
        branch: &BranchName,
        files: &[(&str, &[u8])],
        message: &str,
    ) -> Option<Sha> {
        let mut inner = self.lock();
        let head = inner.branches.get(branch)?.clone();
        let mut leaves = inner.head_leaves(branch).ok()?;
        for (path, content) in files {
            let sha = inner.store_blob(content);
            leaves.insert(
                path.to_string(),
                TreeItem::new(*path, FILE_MODE, ObjectKind::Blob, sha),
            );
        }
        let tree = inner.store_tree(leaves);
        let commit = inner.store_commit(&tree, vec![head], &seed_author(), message);
        inner.branches.insert(branch.clone(), commit.clone());
        Some(commit)
    }

    /// Tag the current head of `branch`.
    pub fn seed_tag(&self, name: &str, branch: &BranchName) -> Option<Sha> {
        let mut inner = self.lock();
        let head = inner.branches.get(branch)?.clone();
        inner.tags.insert(name.to_string(), head.clone());
        Some(head)
    }

    /// Current head of a branch.
    pub fn head(&self, branch: &BranchName) -> Option<Sha> {
        self.lock().branches.get(branch).cloned()
    }

    /// Content of the file at `path` on `branch`.
    pub fn file(&self, branch: &BranchName, path: &str) -> Option<Vec<u8>> {
        let inner = self.lock();
        let leaves = inner.head_leaves(branch).ok()?;
        let item = leaves.get(path)?;
        inner.blobs.get(&item.sha).cloned()
    }

    /// Commit by sha.
    pub fn commit(&self, sha: &Sha) -> Option<CommitRef> {
        self.lock().commits.get(sha).cloned()
    }

    /// Number of blobs in the store.
    pub fn blob_count(&self) -> usize {
        self.lock().blobs.len()
    }

    /// Configure the mock to fail on a specific operation.
    pub fn fail_on(self, fail_on: FailOn) -> Self {
        self.lock().fail_on = Some(fail_on);
        self
    }

    /// Clear the failure configuration.
    pub fn clear_fail_on(&self) {
        self.lock().fail_on = None;
    }

    /// Get all recorded operations.
    pub fn operations(&self) -> Vec<MockOperation> {
        self.lock().operations.clone()
    }

    /// Recorded operations that mutate the store.
    pub fn writes(&self) -> Vec<MockOperation> {
        self.lock()
            .operations
            .iter()
            .filter(|op| op.is_write())
            .cloned()
            .collect()
    }

    /// Clear recorded operations.
    pub fn clear_operations(&self) {
        self.lock().operations.clear();
    }

    fn record(&self, op: MockOperation) {
        self.lock().operations.push(op);
    }

    /// Check if we should fail and return the error if so.
    fn check_fail(&self, op: &MockOperation) -> Result<(), GitDataError> {
        let inner = self.lock();
        let error = match (&inner.fail_on, op) {
            (Some(FailOn::ResolveBranch(e)), MockOperation::ResolveBranch { .. })
            | (Some(FailOn::GetCommit(e)), MockOperation::GetCommit { .. })
            | (Some(FailOn::GetTree(e)), MockOperation::GetTree { .. })
            | (Some(FailOn::GetBlob(e)), MockOperation::GetBlob { .. })
            | (Some(FailOn::CreateBlob(e)), MockOperation::CreateBlob { .. })
            | (Some(FailOn::CreateTree(e)), MockOperation::CreateTree { .. })
            | (Some(FailOn::CreateCommit(e)), MockOperation::CreateCommit { .. })
            | (Some(FailOn::UpdateRef(e)), MockOperation::UpdateRef { .. }) => e.clone(),
            _ => return Ok(()),
        };
        Err(error)
    }

    /// Record `op`, then apply any configured failure.
    fn begin(&self, op: MockOperation) -> Result<(), GitDataError> {
        self.record(op.clone());
        self.check_fail(&op)
    }
}

impl Default for MockRepository {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl GitData for MockRepository {
    fn name(&self) -> &'static str {
        "mock"
    }

    async fn branches(&self) -> Result<Vec<Branch>, GitDataError> {
        self.begin(MockOperation::Branches)?;
        let inner = self.lock();
        Ok(inner
            .branches
            .iter()
            .map(|(name, sha)| Branch {
                name: name.clone(),
                commit_sha: sha.clone(),
                protected: false,
            })
            .collect())
    }

    async fn resolve_branch(&self, name: &BranchName) -> Result<BranchHead, GitDataError> {
        self.begin(MockOperation::ResolveBranch {
            branch: name.clone(),
        })?;
        let inner = self.lock();
        inner
            .branches
            .get(name)
            .map(|sha| BranchHead {
                name: name.clone(),
                commit_sha: sha.clone(),
            })
            .ok_or_else(|| GitDataError::InvalidBranch(name.to_string()))
    }

    async fn contents(
        &self,
        path: &str,
        branch: &BranchName,
    ) -> Result<Vec<DirectoryEntry>, GitDataError> {
        self.begin(MockOperation::Contents {
            path: path.to_string(),
            branch: branch.clone(),
        })?;
        let inner = self.lock();
        let path = path.trim_matches('/');
        let mut leaves = inner.head_leaves(branch)?;
        if !path.is_empty() {
            if leaves.contains_key(path) {
                return Err(GitDataError::Decoding(format!(
                    "'{path}' is a file, expected a directory listing"
                )));
            }
            leaves = MockRepositoryInner::subtree(&leaves, path);
            if leaves.is_empty() {
                return Err(not_found(path));
            }
        }

        let mut entries: Vec<DirectoryEntry> = MockRepositoryInner::directories(&leaves)
            .into_iter()
            .map(|name| DirectoryEntry::Directory { name })
            .collect();
        entries.extend(
            leaves
                .values()
                .filter(|item| !item.path.contains('/'))
                .map(|item| inner.entry_for(&item.path, item, false)),
        );
        Ok(entries)
    }

    async fn content(
        &self,
        path: &str,
        branch: &BranchName,
    ) -> Result<DirectoryEntry, GitDataError> {
        self.begin(MockOperation::Content {
            path: path.to_string(),
            branch: branch.clone(),
        })?;
        let inner = self.lock();
        let path = path.trim_matches('/');
        let leaves = inner.head_leaves(branch)?;
        match leaves.get(path) {
            Some(item) => Ok(inner.entry_for(split_path(path).1, item, true)),
            None if !MockRepositoryInner::subtree(&leaves, path).is_empty() => Err(
                GitDataError::Decoding(format!("'{path}' is a directory, expected a single entry")),
            ),
            None => Err(not_found(path)),
        }
    }

    async fn tags(&self) -> Result<Vec<Tag>, GitDataError> {
        self.begin(MockOperation::Tags)?;
        let inner = self.lock();
        Ok(inner
            .tags
            .iter()
            .map(|(name, sha)| Tag {
                name: name.clone(),
                commit_sha: sha.clone(),
            })
            .collect())
    }

    async fn commits(&self, query: &CommitQuery) -> Result<Vec<CommitRef>, GitDataError> {
        self.begin(MockOperation::Commits {
            query: query.clone(),
        })?;
        query.validate()?;
        let inner = self.lock();

        let start = match &query.sha {
            Some(reference) => BranchName::new(reference.as_str())
                .ok()
                .and_then(|b| inner.branches.get(&b).cloned())
                .or_else(|| Sha::new(reference.as_str()).ok())
                .ok_or_else(|| not_found(reference))?,
            None => inner
                .default_branch
                .as_ref()
                .and_then(|b| inner.branches.get(b).cloned())
                .ok_or_else(|| not_found("default branch"))?,
        };

        let mut history = Vec::new();
        let mut cursor = Some(start);
        while let Some(sha) = cursor {
            let commit = inner
                .commits
                .get(&sha)
                .ok_or_else(|| not_found(format!("commit {sha}")))?;
            if query.path.as_deref().map_or(true, |p| inner.touches(commit, p)) {
                history.push(commit.clone());
            }
            cursor = commit.parent_shas.first().cloned();
        }

        let per_page = query.per_page.map_or(DEFAULT_PER_PAGE, |n| n as usize);
        let page = query.page.unwrap_or(1) as usize;
        Ok(history
            .into_iter()
            .skip((page - 1) * per_page)
            .take(per_page)
            .collect())
    }

    async fn get_commit(&self, sha: &Sha) -> Result<CommitRef, GitDataError> {
        self.begin(MockOperation::GetCommit { sha: sha.clone() })?;
        self.lock()
            .commits
            .get(sha)
            .cloned()
            .ok_or_else(|| not_found(format!("commit {sha}")))
    }

    async fn get_tree(&self, sha: &Sha, recursive: bool) -> Result<Tree, GitDataError> {
        self.begin(MockOperation::GetTree {
            sha: sha.clone(),
            recursive,
        })?;
        let mut inner = self.lock();
        let leaves = inner
            .trees
            .get(sha)
            .cloned()
            .ok_or_else(|| not_found(format!("tree {sha}")))?;
        Ok(Tree {
            sha: sha.clone(),
            items: inner.listing(&leaves, recursive),
            truncated: false,
        })
    }

    async fn get_blob_content(&self, sha: &Sha) -> Result<Vec<u8>, GitDataError> {
        self.begin(MockOperation::GetBlob { sha: sha.clone() })?;
        self.lock()
            .blobs
            .get(sha)
            .cloned()
            .ok_or_else(|| not_found(format!("blob {sha}")))
    }

    async fn create_blob(&self, content: &[u8]) -> Result<Sha, GitDataError> {
        self.begin(MockOperation::CreateBlob {
            content: content.to_vec(),
        })?;
        Ok(self.lock().store_blob(content))
    }

    async fn create_tree(&self, base: &Sha, items: &[TreeItem]) -> Result<Sha, GitDataError> {
        self.begin(MockOperation::CreateTree {
            base: base.clone(),
            items: items.to_vec(),
        })?;
        let mut inner = self.lock();
        let mut leaves = inner
            .trees
            .get(base)
            .cloned()
            .ok_or_else(|| unprocessable(format!("base_tree {base} does not exist")))?;

        for item in items {
            inner.check_reference(item)?;
            let path = item.path.trim_matches('/').to_string();
            let prefix = format!("{path}/");
            leaves.retain(|p, _| !p.starts_with(&prefix));
            match item.kind {
                ObjectKind::Tree => {
                    leaves.remove(&path);
                    let subtree = inner.trees.get(&item.sha).cloned().unwrap_or_default();
                    for (relative, sub) in subtree {
                        let full = format!("{prefix}{relative}");
                        leaves.insert(
                            full.clone(),
                            TreeItem {
                                path: full,
                                ..sub
                            },
                        );
                    }
                }
                ObjectKind::Blob | ObjectKind::Commit => {
                    leaves.insert(
                        path.clone(),
                        TreeItem {
                            path,
                            ..item.clone()
                        },
                    );
                }
            }
        }

        Ok(inner.store_tree(leaves))
    }

    async fn create_commit(
        &self,
        author: &Author,
        message: &str,
        parent: &Sha,
        tree: &Sha,
    ) -> Result<Sha, GitDataError> {
        self.begin(MockOperation::CreateCommit {
            tree: tree.clone(),
            parent: parent.clone(),
            message: message.to_string(),
        })?;
        let mut inner = self.lock();
        if !inner.trees.contains_key(tree) {
            return Err(unprocessable(format!("tree {tree} does not exist")));
        }
        if !inner.commits.contains_key(parent) {
            return Err(unprocessable(format!("parent {parent} does not exist")));
        }
        Ok(inner.store_commit(tree, vec![parent.clone()], author, message))
    }

    async fn update_ref(&self, branch: &BranchName, sha: &Sha) -> Result<(), GitDataError> {
        self.begin(MockOperation::UpdateRef {
            branch: branch.clone(),
            sha: sha.clone(),
        })?;
        let mut inner = self.lock();
        let current = inner
            .branches
            .get(branch)
            .cloned()
            .ok_or_else(|| GitDataError::RefUpdateConflict(branch.to_string()))?;
        let commit = inner
            .commits
            .get(sha)
            .ok_or_else(|| unprocessable(format!("object {sha} does not exist")))?;
        if commit.parent_shas.first() != Some(&current) {
            return Err(GitDataError::RefUpdateConflict(branch.to_string()));
        }
        inner.branches.insert(branch.clone(), sha.clone());
        Ok(())
    }
}
