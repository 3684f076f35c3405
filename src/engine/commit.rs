//! engine::commit
//!
//! The commit orchestrator: turn a content transform into one new commit.
//!
//! # Protocol
//!
//! ```text
//! Start -> BranchResolved -> CommitResolved -> TreeResolved -> ItemsUpdated
//!       -> TreeCreated -> CommitCreated -> RefUpdated
//!
//! ItemsUpdated -> Unchanged (nothing selected)
//! ```
//!
//! Each transition is one call to [`CommitOrchestrator::advance`] and at
//! most one kind of remote request. The first error aborts the run and
//! is returned unchanged; nothing is rolled back.
//!
//! # Commit Point
//!
//! Blobs, the tree and the commit created on the way are unreachable from
//! the branch until the final non-forced ref update succeeds. A run that
//! fails earlier, or whose ref update is rejected because the branch
//! moved, leaves the branch exactly where it was. The objects it created
//! are left to the store's garbage collection.
//!
//! # Example
//!
//! ```
//! use treesmith::batch::Substitution;
//! use treesmith::core::types::{Author, BranchName};
//! use treesmith::engine::{CommitOrchestrator, CommitOutcome, CommitRequest};
//! use treesmith::gitdata::mock::MockRepository;
//!
//! # tokio_test::block_on(async {
//! let repo = MockRepository::new();
//! let main = BranchName::new("main").unwrap();
//! repo.seed_branch(&main, &[("a.txt", b"hello".as_slice())]);
//!
//! let request = CommitRequest::new(
//!     main.clone(),
//!     Author::now("Octo Cat", "octocat@example.com"),
//!     "Greet loudly",
//! );
//! let updater = Substitution::new("*.txt", "hello", "HELLO").unwrap();
//! let outcome = CommitOrchestrator::new(&repo)
//!     .run(&request, &updater)
//!     .await
//!     .unwrap();
//!
//! assert!(outcome.is_committed());
//! assert_eq!(repo.file(&main, "a.txt").unwrap(), b"HELLO");
//! # });
//! ```

use std::fmt;

use tracing::{info, instrument, warn};

use crate::batch::{BatchItemUpdater, ItemUpdater};
use crate::core::config::DEFAULT_CONCURRENCY;
use crate::core::types::{Author, BranchName, Sha};
use crate::gitdata::{GitData, GitDataError, TreeItem};

/// What to commit and where.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CommitRequest {
    pub branch: BranchName,
    /// Used as both author and committer
    pub author: Author,
    pub message: String,
}

impl CommitRequest {
    pub fn new(branch: BranchName, author: Author, message: impl Into<String>) -> Self {
        Self {
            branch,
            author,
            message: message.into(),
        }
    }
}

/// Result of a completed run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CommitOutcome {
    /// The branch now points at `commit`.
    Committed {
        commit: Sha,
        tree: Sha,
        /// Previous head of the branch
        parent: Sha,
        /// Paths of the rewritten items, sorted
        updated_paths: Vec<String>,
    },

    /// The updater selected nothing; nothing was written.
    Unchanged {
        /// Head of the branch, untouched
        head: Sha,
    },
}

impl CommitOutcome {
    /// Check if a new commit was published.
    pub fn is_committed(&self) -> bool {
        matches!(self, CommitOutcome::Committed { .. })
    }

    /// Head of the branch after the run.
    pub fn head(&self) -> &Sha {
        match self {
            CommitOutcome::Committed { commit, .. } => commit,
            CommitOutcome::Unchanged { head } => head,
        }
    }
}

/// Name of a [`CommitState`], for logging.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CommitPhase {
    Start,
    BranchResolved,
    CommitResolved,
    TreeResolved,
    ItemsUpdated,
    TreeCreated,
    CommitCreated,
    RefUpdated,
    Unchanged,
}

impl fmt::Display for CommitPhase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            CommitPhase::Start => "start",
            CommitPhase::BranchResolved => "branch-resolved",
            CommitPhase::CommitResolved => "commit-resolved",
            CommitPhase::TreeResolved => "tree-resolved",
            CommitPhase::ItemsUpdated => "items-updated",
            CommitPhase::TreeCreated => "tree-created",
            CommitPhase::CommitCreated => "commit-created",
            CommitPhase::RefUpdated => "ref-updated",
            CommitPhase::Unchanged => "unchanged",
        };
        f.write_str(name)
    }
}

/// State of an orchestrator run. Each variant carries what later steps need.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CommitState {
    Start,
    BranchResolved {
        head: Sha,
    },
    CommitResolved {
        head: Sha,
        base_tree: Sha,
    },
    TreeResolved {
        head: Sha,
        base_tree: Sha,
        items: Vec<TreeItem>,
    },
    ItemsUpdated {
        head: Sha,
        base_tree: Sha,
        replacements: Vec<TreeItem>,
    },
    TreeCreated {
        head: Sha,
        tree: Sha,
        updated_paths: Vec<String>,
    },
    CommitCreated {
        head: Sha,
        tree: Sha,
        commit: Sha,
        updated_paths: Vec<String>,
    },
    /// Terminal: the branch points at `commit`.
    RefUpdated {
        head: Sha,
        tree: Sha,
        commit: Sha,
        updated_paths: Vec<String>,
    },
    /// Terminal: nothing to commit.
    Unchanged {
        head: Sha,
    },
}

impl CommitState {
    pub fn phase(&self) -> CommitPhase {
        match self {
            CommitState::Start => CommitPhase::Start,
            CommitState::BranchResolved { .. } => CommitPhase::BranchResolved,
            CommitState::CommitResolved { .. } => CommitPhase::CommitResolved,
            CommitState::TreeResolved { .. } => CommitPhase::TreeResolved,
            CommitState::ItemsUpdated { .. } => CommitPhase::ItemsUpdated,
            CommitState::TreeCreated { .. } => CommitPhase::TreeCreated,
            CommitState::CommitCreated { .. } => CommitPhase::CommitCreated,
            CommitState::RefUpdated { .. } => CommitPhase::RefUpdated,
            CommitState::Unchanged { .. } => CommitPhase::Unchanged,
        }
    }

    pub fn is_terminal(&self) -> bool {
        matches!(
            self,
            CommitState::RefUpdated { .. } | CommitState::Unchanged { .. }
        )
    }

    /// The outcome of a terminal state, or the state itself if the run
    /// has not finished.
    pub fn into_outcome(self) -> Result<CommitOutcome, CommitState> {
        match self {
            CommitState::RefUpdated {
                head,
                tree,
                commit,
                updated_paths,
            } => Ok(CommitOutcome::Committed {
                commit,
                tree,
                parent: head,
                updated_paths,
            }),
            CommitState::Unchanged { head } => Ok(CommitOutcome::Unchanged { head }),
            pending => Err(pending),
        }
    }
}

/// Drives a [`CommitState`] from `Start` to a terminal state.
pub struct CommitOrchestrator<'a> {
    client: &'a dyn GitData,
    concurrency: usize,
}

impl<'a> CommitOrchestrator<'a> {
    pub fn new(client: &'a dyn GitData) -> Self {
        Self {
            client,
            concurrency: DEFAULT_CONCURRENCY,
        }
    }

    /// Set the batch updater's concurrency limit.
    pub fn with_concurrency(mut self, concurrency: usize) -> Self {
        self.concurrency = concurrency.max(1);
        self
    }

    /// Run the whole protocol.
    ///
    /// # Errors
    ///
    /// Returns the first error of any step unchanged. In particular
    /// `InvalidBranch` when the branch does not exist and
    /// `RefUpdateConflict` when the branch moved during the run. The
    /// branch is untouched in every error case.
    #[instrument(skip_all, fields(branch = %request.branch))]
    pub async fn run(
        &self,
        request: &CommitRequest,
        updater: &dyn ItemUpdater,
    ) -> Result<CommitOutcome, GitDataError> {
        let mut state = CommitState::Start;
        loop {
            state = match state.into_outcome() {
                Ok(outcome) => return Ok(outcome),
                Err(pending) => {
                    let phase = pending.phase();
                    match self.advance(pending, request, updater).await {
                        Ok(next) => next,
                        Err(e) => {
                            warn!(after = %phase, error = %e, "commit aborted");
                            return Err(e);
                        }
                    }
                }
            };
        }
    }

    /// Perform the single step leading out of `state`.
    ///
    /// Terminal states are returned as they are.
    pub async fn advance(
        &self,
        state: CommitState,
        request: &CommitRequest,
        updater: &dyn ItemUpdater,
    ) -> Result<CommitState, GitDataError> {
        let next = match state {
            CommitState::Start => {
                let head = self.client.resolve_branch(&request.branch).await?;
                info!(head = %head.commit_sha, "branch resolved");
                CommitState::BranchResolved {
                    head: head.commit_sha,
                }
            }

            CommitState::BranchResolved { head } => {
                let commit = self.client.get_commit(&head).await?;
                info!(tree = %commit.tree_sha, "commit resolved");
                CommitState::CommitResolved {
                    head,
                    base_tree: commit.tree_sha,
                }
            }

            CommitState::CommitResolved { head, base_tree } => {
                let tree = self.client.get_tree(&base_tree, true).await?;
                info!(items = tree.items.len(), truncated = tree.truncated, "tree resolved");
                CommitState::TreeResolved {
                    head,
                    base_tree,
                    items: tree.items,
                }
            }

            CommitState::TreeResolved {
                head,
                base_tree,
                items,
            } => {
                let replacements = BatchItemUpdater::new(self.client)
                    .with_concurrency(self.concurrency)
                    .run(&items, updater)
                    .await?;
                info!(replaced = replacements.len(), "items updated");
                CommitState::ItemsUpdated {
                    head,
                    base_tree,
                    replacements,
                }
            }

            CommitState::ItemsUpdated {
                head,
                replacements,
                ..
            } if replacements.is_empty() => {
                info!("nothing to commit");
                CommitState::Unchanged { head }
            }

            CommitState::ItemsUpdated {
                head,
                base_tree,
                replacements,
            } => {
                let tree = self.client.create_tree(&base_tree, &replacements).await?;
                info!(%tree, "tree created");
                let mut updated_paths: Vec<String> =
                    replacements.into_iter().map(|item| item.path).collect();
                updated_paths.sort();
                CommitState::TreeCreated {
                    head,
                    tree,
                    updated_paths,
                }
            }

            CommitState::TreeCreated {
                head,
                tree,
                updated_paths,
            } => {
                let commit = self
                    .client
                    .create_commit(&request.author, &request.message, &head, &tree)
                    .await?;
                info!(%commit, "commit created");
                CommitState::CommitCreated {
                    head,
                    tree,
                    commit,
                    updated_paths,
                }
            }

            CommitState::CommitCreated {
                head,
                tree,
                commit,
                updated_paths,
            } => {
                self.client.update_ref(&request.branch, &commit).await?;
                info!(%commit, "ref updated");
                CommitState::RefUpdated {
                    head,
                    tree,
                    commit,
                    updated_paths,
                }
            }

            terminal @ (CommitState::RefUpdated { .. } | CommitState::Unchanged { .. }) => terminal,
        };
        Ok(next)
    }
}
