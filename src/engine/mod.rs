//! engine
//!
//! Orchestrates the atomic multi-file commit.
//!
//! # Architecture
//!
//! The engine composes the independent, non-transactional primitives of
//! [`crate::gitdata::GitData`] into a single linear state machine (see
//! [`commit`]). The batch item updater runs inside one of its steps.
//!
//! # Invariants
//!
//! - Steps run strictly in sequence; each consumes the previous result
//! - The ref update is the only write visible to readers of the branch
//! - The created commit has exactly one parent, the head read at the start
//! - Errors abort the run unchanged; nothing is retried or compensated

pub mod commit;

pub use commit::{CommitOrchestrator, CommitOutcome, CommitPhase, CommitRequest, CommitState};
