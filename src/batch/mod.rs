//! batch
//!
//! Apply a caller-supplied transform to a subset of a tree snapshot.
//!
//! # Overview
//!
//! The caller provides an [`ItemUpdater`]: a selection over the full item
//! listing and a text transform for a single item. [`BatchItemUpdater`]
//! turns its output into replacement tree items backed by new blobs.
//!
//! # Phases
//!
//! 1. Every selected blob is fetched and transformed. These are reads
//!    only and run concurrently, bounded by the concurrency limit.
//! 2. Only when every transform succeeded are the new blobs created,
//!    again concurrently.
//!
//! A failing transform therefore writes nothing. Processing order is not
//! significant; the returned items are keyed by path, not by position.
//! Every selected item yields exactly one replacement. An item whose
//! content comes back unchanged is stored again, which the store answers
//! with the sha it already had.

pub mod updaters;

pub use updaters::{FnUpdater, Substitution};

use std::collections::HashSet;

use futures::stream::{self, StreamExt, TryStreamExt};
use thiserror::Error;
use tracing::debug;

use crate::core::config::DEFAULT_CONCURRENCY;
use crate::gitdata::{GitData, GitDataError, TreeItem};

/// Failure reported by an [`ItemUpdater`] transform.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("{message}")]
pub struct UpdateError {
    message: String,
}

impl UpdateError {
    /// Create an update error with a message.
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
        }
    }

    /// The error message.
    pub fn message(&self) -> &str {
        &self.message
    }
}

/// Selection and transform supplied by the caller.
///
/// # Example
///
/// ```
/// use treesmith::batch::{ItemUpdater, UpdateError};
/// use treesmith::gitdata::TreeItem;
///
/// struct Uppercase;
///
/// impl ItemUpdater for Uppercase {
///     fn select(&self, items: &[TreeItem]) -> Vec<TreeItem> {
///         items.iter().filter(|i| i.path.ends_with(".txt")).cloned().collect()
///     }
///
///     fn update(&self, _item: &TreeItem, content: &str) -> Result<String, UpdateError> {
///         Ok(content.to_uppercase())
///     }
/// }
/// ```
pub trait ItemUpdater: Send + Sync {
    /// Pick the items that need to change from the full listing.
    fn select(&self, items: &[TreeItem]) -> Vec<TreeItem>;

    /// Produce the new content of `item` from its current content.
    fn update(&self, item: &TreeItem, content: &str) -> Result<String, UpdateError>;
}

/// Runs an [`ItemUpdater`] against a tree listing.
pub struct BatchItemUpdater<'a> {
    client: &'a dyn GitData,
    concurrency: usize,
}

impl<'a> BatchItemUpdater<'a> {
    /// Create an updater issuing requests through `client`.
    pub fn new(client: &'a dyn GitData) -> Self {
        Self {
            client,
            concurrency: DEFAULT_CONCURRENCY,
        }
    }

    /// Set the number of items processed concurrently (at least 1).
    pub fn with_concurrency(mut self, concurrency: usize) -> Self {
        self.concurrency = concurrency.max(1);
        self
    }

    /// Concurrency limit in effect.
    pub fn concurrency(&self) -> usize {
        self.concurrency
    }

    /// Select, transform and store the selected items of `items`.
    ///
    /// Returns one replacement per selected item, carrying the source
    /// item's path, mode and kind with the new blob's sha. An empty
    /// selection returns no replacements and issues no request.
    ///
    /// # Errors
    ///
    /// - `InvalidParameter` if the selection contains a non-blob item
    /// - `Decoding` if a selected blob is not UTF-8 text
    /// - `Transform` if the transform rejects an item
    /// - any client error from fetching or creating blobs
    pub async fn run(
        &self,
        items: &[TreeItem],
        updater: &dyn ItemUpdater,
    ) -> Result<Vec<TreeItem>, GitDataError> {
        let selected = dedup_by_path(updater.select(items));
        if let Some(item) = selected.iter().find(|item| !item.is_blob()) {
            return Err(GitDataError::InvalidParameter(format!(
                "'{}' is a {}, only blobs can be updated",
                item.path, item.kind
            )));
        }
        debug!(
            listed = items.len(),
            selected = selected.len(),
            "selected items"
        );
        if selected.is_empty() {
            return Ok(Vec::new());
        }

        let rewritten: Vec<(TreeItem, String)> = stream::iter(selected)
            .map(|item| async move {
                let content = self.rewrite(&item, updater).await?;
                Ok::<_, GitDataError>((item, content))
            })
            .buffer_unordered(self.concurrency)
            .try_collect()
            .await?;
        debug!(transformed = rewritten.len(), "transformed items");

        stream::iter(rewritten)
            .map(|(item, content)| async move {
                let sha = self.client.create_blob(content.as_bytes()).await?;
                debug!(path = %item.path, sha = %sha.short(7), "created blob");
                Ok::<_, GitDataError>(item.with_sha(sha))
            })
            .buffer_unordered(self.concurrency)
            .try_collect()
            .await
    }

    /// Fetch and transform one item.
    async fn rewrite(
        &self,
        item: &TreeItem,
        updater: &dyn ItemUpdater,
    ) -> Result<String, GitDataError> {
        let bytes = self.client.get_blob_content(&item.sha).await?;
        let current = String::from_utf8(bytes).map_err(|_| {
            GitDataError::Decoding(format!("content of '{}' is not UTF-8 text", item.path))
        })?;
        updater
            .update(item, &current)
            .map_err(|e| GitDataError::Transform {
                path: item.path.clone(),
                message: e.to_string(),
            })
    }
}

/// Keep the first occurrence of each path.
fn dedup_by_path(items: Vec<TreeItem>) -> Vec<TreeItem> {
    let mut seen = HashSet::new();
    items
        .into_iter()
        .filter(|item| seen.insert(item.path.clone()))
        .collect()
}
