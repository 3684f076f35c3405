//! gitdata
//!
//! Client for the object-graph primitives of a remote Git repository.
//!
//! # Architecture
//!
//! The [`GitData`] trait exposes one method per remote round trip: read a
//! branch head, commit, tree or blob, and write a blob, tree, commit or
//! ref. Higher layers ([`crate::batch`], [`crate::engine`]) are written
//! against the trait only.
//!
//! # Modules
//!
//! - `traits`: The `GitData` trait, its records and `GitDataError`
//! - [`codec`]: Base64 payloads and directory entry decoding
//! - [`github`]: GitHub Git Data API implementation
//! - [`mock`]: In-memory implementation for deterministic testing
//!
//! # Example
//!
//! ```no_run
//! use treesmith::core::types::BranchName;
//! use treesmith::gitdata::github::GitHubDataClient;
//! use treesmith::gitdata::GitData;
//!
//! # async fn run() -> Result<(), treesmith::gitdata::GitDataError> {
//! let client = GitHubDataClient::new(
//!     "octocat",
//!     "token",
//!     "https://api.github.com/repos/octocat/hello-world",
//! );
//! let head = client
//!     .resolve_branch(&BranchName::new("main").unwrap())
//!     .await?;
//! println!("main is at {}", head.commit_sha);
//! # Ok(())
//! # }
//! ```

pub mod codec;
pub mod github;
pub mod mock;
mod traits;

pub use codec::DirectoryEntry;
pub use traits::*;
