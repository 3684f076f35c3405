//! Treesmith - atomic multi-file commits over the GitHub Git Data API
//!
//! The Git Data API only offers independent primitives: create a blob,
//! create a tree, create a commit, move a ref. Treesmith composes them so
//! that a transform over many files lands as exactly one commit, and the
//! branch changes only when the final ref update succeeds.
//!
//! # Architecture
//!
//! The codebase follows a layered architecture:
//!
//! - [`cli`] - Command-line interface layer (parses args, delegates to handlers)
//! - [`engine`] - Commit orchestrator state machine
//! - [`batch`] - Applies a selection and transform to a tree snapshot
//! - [`gitdata`] - Object client trait, GitHub client, codec and in-memory store
//! - [`core`] - Domain types and configuration
//!
//! # Correctness Invariants
//!
//! 1. The branch moves only through a non-forced ref update
//! 2. Every generated commit has exactly one parent, the head read at the start
//! 3. Tree writes are deltas against the original tree; unselected entries are never resent
//! 4. A failure at any step leaves the branch where it was

pub mod batch;
pub mod cli;
pub mod core;
pub mod engine;
pub mod gitdata;
