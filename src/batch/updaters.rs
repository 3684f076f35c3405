//! batch::updaters
//!
//! Ready-made [`ItemUpdater`] implementations.

use glob::{MatchOptions, Pattern};

use super::{ItemUpdater, UpdateError};
use crate::gitdata::{GitDataError, TreeItem};

/// An updater built from a per-item predicate and a transform closure.
///
/// # Example
///
/// ```
/// use treesmith::batch::FnUpdater;
/// use treesmith::gitdata::TreeItem;
///
/// let updater = FnUpdater::new(
///     |item: &TreeItem| item.path.ends_with(".md"),
///     |_: &TreeItem, content: &str| Ok(content.trim_end().to_string() + "\n"),
/// );
/// # let _ = updater;
/// ```
pub struct FnUpdater<S, U> {
    select: S,
    update: U,
}

impl<S, U> FnUpdater<S, U>
where
    S: Fn(&TreeItem) -> bool + Send + Sync,
    U: Fn(&TreeItem, &str) -> Result<String, UpdateError> + Send + Sync,
{
    pub fn new(select: S, update: U) -> Self {
        Self { select, update }
    }
}

impl<S, U> ItemUpdater for FnUpdater<S, U>
where
    S: Fn(&TreeItem) -> bool + Send + Sync,
    U: Fn(&TreeItem, &str) -> Result<String, UpdateError> + Send + Sync,
{
    fn select(&self, items: &[TreeItem]) -> Vec<TreeItem> {
        items
            .iter()
            .filter(|item| (self.select)(item))
            .cloned()
            .collect()
    }

    fn update(&self, item: &TreeItem, content: &str) -> Result<String, UpdateError> {
        (self.update)(item, content)
    }
}

/// Literal find/replace over the blobs whose path matches a glob.
///
/// `*` does not cross `/`; use `**` to match nested paths
/// (`**/*.md`). Selection sees only paths, so a matching file without
/// the needle is still rewritten, to the blob it already had.
#[derive(Debug, Clone)]
pub struct Substitution {
    pattern: Pattern,
    find: String,
    replace: String,
}

const MATCH_OPTIONS: MatchOptions = MatchOptions {
    case_sensitive: true,
    require_literal_separator: true,
    require_literal_leading_dot: false,
};

impl Substitution {
    /// Create a substitution of `find` by `replace` in files matching `glob`.
    ///
    /// # Errors
    ///
    /// Returns `GitDataError::InvalidParameter` for an invalid glob or an
    /// empty `find` string.
    pub fn new(
        glob: &str,
        find: impl Into<String>,
        replace: impl Into<String>,
    ) -> Result<Self, GitDataError> {
        let pattern = Pattern::new(glob)
            .map_err(|e| GitDataError::InvalidParameter(format!("invalid glob '{glob}': {e}")))?;
        let find = find.into();
        if find.is_empty() {
            return Err(GitDataError::InvalidParameter(
                "search string must not be empty".into(),
            ));
        }
        Ok(Self {
            pattern,
            find,
            replace: replace.into(),
        })
    }

    /// Whether `path` is covered by the glob.
    pub fn matches(&self, path: &str) -> bool {
        self.pattern.matches_with(path, MATCH_OPTIONS)
    }
}

impl ItemUpdater for Substitution {
    fn select(&self, items: &[TreeItem]) -> Vec<TreeItem> {
        items
            .iter()
            .filter(|item| item.is_blob() && self.matches(&item.path))
            .cloned()
            .collect()
    }

    fn update(&self, _item: &TreeItem, content: &str) -> Result<String, UpdateError> {
        Ok(content.replace(&self.find, &self.replace))
    }
}
