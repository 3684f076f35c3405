//! gitdata::github
//!
//! [`GitData`] over the GitHub REST API (repository and Git Data endpoints).
//!
//! # Design
//!
//! Each trait method maps to one HTTP request against the repository API
//! base URL (`https://api.github.com/repos/{owner}/{repo}`, or the GitHub
//! Enterprise equivalent):
//!
//! | method             | request                                  |
//! |--------------------|------------------------------------------|
//! | `branches`         | `GET /branches?per_page=100`             |
//! | `resolve_branch`   | `GET /branches/{name}`                   |
//! | `contents/content` | `GET /contents/{path}?ref={branch}`      |
//! | `tags`             | `GET /tags`                              |
//! | `commits`          | `GET /commits[?sha&page&per_page&path]`  |
//! | `get_commit`       | `GET /git/commits/{sha}`                 |
//! | `get_tree`         | `GET /git/trees/{sha}[?recursive=1]`     |
//! | `get_blob_content` | `GET /git/blobs/{sha}`                   |
//! | `create_blob`      | `POST /git/blobs`                        |
//! | `create_tree`      | `POST /git/trees`                        |
//! | `create_commit`    | `POST /git/commits`                      |
//! | `update_ref`       | `PATCH /git/refs/heads/{branch}`         |
//!
//! # Authentication
//!
//! Basic authentication with an account name and a personal access
//! token, both fixed at construction.
//!
//! # Status Mapping
//!
//! - 404 from `resolve_branch` → `InvalidBranch`
//! - 409/422 from `update_ref` → `RefUpdateConflict`
//! - any other non-2xx → `UnexpectedStatus { status, body }`
//!
//! Requests are never retried here.
//!
//! # Example
//!
//! ```no_run
//! use treesmith::core::types::BranchName;
//! use treesmith::gitdata::github::GitHubDataClient;
//! use treesmith::gitdata::GitData;
//!
//! # tokio_test::block_on(async {
//! let client = GitHubDataClient::new(
//!     "octocat",
//!     "ghp_xxx",
//!     "https://api.github.com/repos/octocat/hello-world",
//! );
//! let head = client
//!     .resolve_branch(&BranchName::new("main").unwrap())
//!     .await
//!     .unwrap();
//! println!("main is at {}", head.commit_sha);
//! # });
//! ```

use async_trait::async_trait;
use reqwest::header::{HeaderMap, HeaderValue, ACCEPT, USER_AGENT};
use reqwest::{Client, Method, Response, StatusCode, Url};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use super::codec::{decode_blob_content, encode_base64, DirectoryEntry};
use super::traits::{
    Branch, BranchHead, CommitQuery, CommitRef, GitData, GitDataError, Tag, Tree, TreeItem,
    MAX_PER_PAGE,
};
use crate::core::config::Config;
use crate::core::types::{Author, BranchName, Sha};

/// Default GitHub API base URL.
const DEFAULT_API_BASE: &str = "https://api.github.com";

/// User-Agent header value for API requests.
const USER_AGENT_VALUE: &str = "treesmith";

/// GitHub Git Data API client.
pub struct GitHubDataClient {
    /// HTTP client for making requests
    client: Client,
    /// Account name for Basic authentication
    username: String,
    /// Personal access token
    token: String,
    /// Repository API base URL, without trailing slash
    repo_url: String,
}

// Custom Debug to avoid exposing the token
impl std::fmt::Debug for GitHubDataClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("GitHubDataClient")
            .field("username", &self.username)
            .field("repo_url", &self.repo_url)
            .finish_non_exhaustive()
    }
}

impl GitHubDataClient {
    /// Create a client for the repository at `repo_url`.
    ///
    /// # Arguments
    ///
    /// * `username` - Account name
    /// * `token` - Personal access token with contents read/write access
    /// * `repo_url` - e.g. `https://api.github.com/repos/{owner}/{repo}`
    pub fn new(
        username: impl Into<String>,
        token: impl Into<String>,
        repo_url: impl Into<String>,
    ) -> Self {
        let repo_url: String = repo_url.into();
        Self {
            client: Client::new(),
            username: username.into(),
            token: token.into(),
            repo_url: repo_url.trim_end_matches('/').to_string(),
        }
    }

    /// Create a client from resolved configuration.
    pub fn from_config(config: &Config) -> Self {
        Self::new(config.username(), config.token(), config.repo_url())
    }

    /// Get the repository API base URL.
    pub fn repo_url(&self) -> &str {
        &self.repo_url
    }

    /// Build common headers for API requests.
    fn headers() -> HeaderMap {
        let mut headers = HeaderMap::new();
        headers.insert(
            ACCEPT,
            HeaderValue::from_static("application/vnd.github+json"),
        );
        headers.insert(USER_AGENT, HeaderValue::from_static(USER_AGENT_VALUE));
        headers.insert(
            "X-GitHub-Api-Version",
            HeaderValue::from_static("2022-11-28"),
        );
        headers
    }

    /// Build a parsed URL for a repository endpoint.
    fn url(&self, path: &str) -> Result<Url, GitDataError> {
        self.endpoint_with_query(path, &[])
    }

    /// Build a parsed URL with query parameters.
    ///
    /// `path` is split on `/` and each segment is percent-encoded, so a
    /// file or branch name containing `?`, `#` or `%` stays in the path.
    fn endpoint_with_query(
        &self,
        path: &str,
        pairs: &[(&str, String)],
    ) -> Result<Url, GitDataError> {
        let mut url = Url::parse(&self.repo_url).map_err(|e| {
            GitDataError::InvalidParameter(format!("invalid repository URL '{}': {e}", self.repo_url))
        })?;
        url.path_segments_mut()
            .map_err(|_| {
                GitDataError::InvalidParameter(format!(
                    "repository URL '{}' cannot have a path",
                    self.repo_url
                ))
            })?
            .pop_if_empty()
            .extend(path.split('/').filter(|segment| !segment.is_empty()));
        if !pairs.is_empty() {
            url.query_pairs_mut().extend_pairs(pairs);
        }
        Ok(url)
    }

    /// Send a request and decode a successful JSON response.
    async fn request<T, B>(&self, method: Method, url: Url, body: Option<&B>) -> Result<T, GitDataError>
    where
        T: DeserializeOwned,
        B: Serialize + ?Sized,
    {
        debug!(%method, %url, "git data request");

        let mut builder = self
            .client
            .request(method, url)
            .headers(Self::headers())
            .basic_auth(&self.username, Some(&self.token));
        if let Some(body) = body {
            builder = builder.json(body);
        }

        let response = builder
            .send()
            .await
            .map_err(|e| GitDataError::Network(e.to_string()))?;
        Self::handle_response(response).await
    }

    async fn get<T: DeserializeOwned>(&self, url: Url) -> Result<T, GitDataError> {
        self.request::<T, ()>(Method::GET, url, None).await
    }

    /// Handle API response, mapping errors to the taxonomy.
    async fn handle_response<T: DeserializeOwned>(response: Response) -> Result<T, GitDataError> {
        let status = response.status();
        let bytes = response
            .bytes()
            .await
            .map_err(|e| GitDataError::Network(e.to_string()))?;

        if status.is_success() {
            serde_json::from_slice(&bytes)
                .map_err(|e| GitDataError::Decoding(format!("failed to parse response: {e}")))
        } else {
            debug!(status = status.as_u16(), "git data request failed");
            Err(GitDataError::UnexpectedStatus {
                status: status.as_u16(),
                body: String::from_utf8_lossy(&bytes).into_owned(),
            })
        }
    }

    fn contents_url(&self, path: &str, branch: &BranchName) -> Result<Url, GitDataError> {
        self.endpoint_with_query(
            &format!("contents/{path}"),
            &[("ref", branch.as_str().to_string())],
        )
    }
}

/// Whether a failed status on a ref update means the branch moved.
fn is_conflict_status(status: u16) -> bool {
    status == StatusCode::CONFLICT.as_u16() || status == StatusCode::UNPROCESSABLE_ENTITY.as_u16()
}

#[async_trait]
impl GitData for GitHubDataClient {
    fn name(&self) -> &'static str {
        "github"
    }

    async fn branches(&self) -> Result<Vec<Branch>, GitDataError> {
        let url = self.endpoint_with_query("branches", &[("per_page", MAX_PER_PAGE.to_string())])?;
        let branches: Vec<GitHubBranch> = self.get(url).await?;
        Ok(branches.into_iter().map(Into::into).collect())
    }

    async fn resolve_branch(&self, name: &BranchName) -> Result<BranchHead, GitDataError> {
        let url = self.url(&format!("branches/{name}"))?;
        match self.get::<GitHubBranch>(url).await {
            Ok(branch) => Ok(BranchHead {
                name: branch.name,
                commit_sha: branch.commit.sha,
            }),
            Err(GitDataError::UnexpectedStatus { status: 404, .. }) => {
                Err(GitDataError::InvalidBranch(name.to_string()))
            }
            Err(e) => Err(e),
        }
    }

    async fn contents(
        &self,
        path: &str,
        branch: &BranchName,
    ) -> Result<Vec<DirectoryEntry>, GitDataError> {
        let url = self.contents_url(path, branch)?;
        self.get(url).await
    }

    async fn content(
        &self,
        path: &str,
        branch: &BranchName,
    ) -> Result<DirectoryEntry, GitDataError> {
        let url = self.contents_url(path, branch)?;
        self.get(url).await
    }

    async fn tags(&self) -> Result<Vec<Tag>, GitDataError> {
        let tags: Vec<GitHubTag> = self.get(self.url("tags")?).await?;
        Ok(tags.into_iter().map(Into::into).collect())
    }

    async fn commits(&self, query: &CommitQuery) -> Result<Vec<CommitRef>, GitDataError> {
        query.validate()?;
        let url = self.endpoint_with_query("commits", &query.to_pairs())?;
        let commits: Vec<GitHubRepoCommit> = self.get(url).await?;
        Ok(commits.into_iter().map(Into::into).collect())
    }

    async fn get_commit(&self, sha: &Sha) -> Result<CommitRef, GitDataError> {
        let commit: GitHubGitCommit = self.get(self.url(&format!("git/commits/{sha}"))?).await?;
        Ok(commit.into())
    }

    async fn get_tree(&self, sha: &Sha, recursive: bool) -> Result<Tree, GitDataError> {
        let path = format!("git/trees/{sha}");
        let url = if recursive {
            self.endpoint_with_query(&path, &[("recursive", "1".to_string())])?
        } else {
            self.url(&path)?
        };

        let tree: GitHubTree = self.get(url).await?;
        if tree.truncated {
            warn!(%sha, entries = tree.tree.len(), "tree listing was truncated by the server");
        }
        Ok(Tree {
            sha: tree.sha,
            items: tree.tree,
            truncated: tree.truncated,
        })
    }

    async fn get_blob_content(&self, sha: &Sha) -> Result<Vec<u8>, GitDataError> {
        let blob: GitHubBlob = self.get(self.url(&format!("git/blobs/{sha}"))?).await?;
        Ok(decode_blob_content(&blob.content, &blob.encoding)?)
    }

    async fn create_blob(&self, content: &[u8]) -> Result<Sha, GitDataError> {
        let body = NewBlobBody {
            content: encode_base64(content),
            encoding: "base64",
        };
        let created: GitHubCreated = self
            .request(Method::POST, self.url("git/blobs")?, Some(&body))
            .await?;
        Ok(created.sha)
    }

    async fn create_tree(&self, base: &Sha, items: &[TreeItem]) -> Result<Sha, GitDataError> {
        let body = NewTreeBody {
            base_tree: base,
            tree: items,
        };
        let created: GitHubCreated = self
            .request(Method::POST, self.url("git/trees")?, Some(&body))
            .await?;
        Ok(created.sha)
    }

    async fn create_commit(
        &self,
        author: &Author,
        message: &str,
        parent: &Sha,
        tree: &Sha,
    ) -> Result<Sha, GitDataError> {
        let body = NewCommitBody {
            message,
            tree,
            parents: [parent],
            author,
            committer: author,
        };
        let created: GitHubCreated = self
            .request(Method::POST, self.url("git/commits")?, Some(&body))
            .await?;
        Ok(created.sha)
    }

    async fn update_ref(&self, branch: &BranchName, sha: &Sha) -> Result<(), GitDataError> {
        let body = UpdateRefBody { sha, force: false };
        let url = self.url(&format!("git/refs/heads/{branch}"))?;
        match self
            .request::<GitHubReference, _>(Method::PATCH, url, Some(&body))
            .await
        {
            Ok(reference) if reference.object.sha == *sha => Ok(()),
            Ok(reference) => Err(GitDataError::Decoding(format!(
                "ref update answered with {} instead of {sha}",
                reference.object.sha
            ))),
            Err(GitDataError::UnexpectedStatus { status, .. }) if is_conflict_status(status) => {
                Err(GitDataError::RefUpdateConflict(branch.to_string()))
            }
            Err(e) => Err(e),
        }
    }
}

// --------------------------------------------------------------------------
// API Request/Response Types
// --------------------------------------------------------------------------

/// Request body for creating a blob.
#[derive(Serialize)]
struct NewBlobBody {
    content: String,
    encoding: &'static str,
}

/// Request body for creating a tree from a base plus a delta.
#[derive(Serialize)]
struct NewTreeBody<'a> {
    base_tree: &'a Sha,
    tree: &'a [TreeItem],
}

/// Request body for creating a commit.
#[derive(Serialize)]
struct NewCommitBody<'a> {
    message: &'a str,
    tree: &'a Sha,
    parents: [&'a Sha; 1],
    author: &'a Author,
    committer: &'a Author,
}

/// Request body for moving a branch.
#[derive(Serialize)]
struct UpdateRefBody<'a> {
    sha: &'a Sha,
    force: bool,
}

/// Any object reference carrying a sha.
#[derive(Deserialize)]
struct GitHubShaPointer {
    sha: Sha,
}

/// Response to blob/tree/commit creation.
type GitHubCreated = GitHubShaPointer;

/// Branch listing item and branch detail response.
#[derive(Deserialize)]
struct GitHubBranch {
    name: BranchName,
    commit: GitHubShaPointer,
    #[serde(default)]
    protected: bool,
}

impl From<GitHubBranch> for Branch {
    fn from(gh: GitHubBranch) -> Self {
        Branch {
            name: gh.name,
            commit_sha: gh.commit.sha,
            protected: gh.protected,
        }
    }
}

/// Tag listing item.
#[derive(Deserialize)]
struct GitHubTag {
    name: String,
    commit: GitHubShaPointer,
}

impl From<GitHubTag> for Tag {
    fn from(gh: GitHubTag) -> Self {
        Tag {
            name: gh.name,
            commit_sha: gh.commit.sha,
        }
    }
}

/// `GET /git/commits/{sha}` response.
#[derive(Deserialize)]
struct GitHubGitCommit {
    sha: Sha,
    tree: GitHubShaPointer,
    parents: Vec<GitHubShaPointer>,
    author: Author,
    committer: Author,
    message: String,
}

impl From<GitHubGitCommit> for CommitRef {
    fn from(gh: GitHubGitCommit) -> Self {
        CommitRef {
            sha: gh.sha,
            tree_sha: gh.tree.sha,
            parent_shas: gh.parents.into_iter().map(|p| p.sha).collect(),
            author: gh.author,
            committer: gh.committer,
            message: gh.message,
        }
    }
}

/// `GET /commits` listing item; the git commit is nested.
#[derive(Deserialize)]
struct GitHubRepoCommit {
    sha: Sha,
    commit: GitHubRepoCommitDetail,
    parents: Vec<GitHubShaPointer>,
}

#[derive(Deserialize)]
struct GitHubRepoCommitDetail {
    tree: GitHubShaPointer,
    author: Author,
    committer: Author,
    message: String,
}

impl From<GitHubRepoCommit> for CommitRef {
    fn from(gh: GitHubRepoCommit) -> Self {
        CommitRef {
            sha: gh.sha,
            tree_sha: gh.commit.tree.sha,
            parent_shas: gh.parents.into_iter().map(|p| p.sha).collect(),
            author: gh.commit.author,
            committer: gh.commit.committer,
            message: gh.commit.message,
        }
    }
}

/// `GET /git/trees/{sha}` response.
#[derive(Deserialize)]
struct GitHubTree {
    sha: Sha,
    tree: Vec<TreeItem>,
    #[serde(default)]
    truncated: bool,
}

/// `GET /git/blobs/{sha}` response.
#[derive(Deserialize)]
struct GitHubBlob {
    content: String,
    encoding: String,
}

/// `PATCH /git/refs/...` response.
#[derive(Deserialize)]
struct GitHubReference {
    object: GitHubShaPointer,
}

// --------------------------------------------------------------------------
// URL Parsing
// --------------------------------------------------------------------------

/// Parse a GitHub remote URL to extract owner and repo.
///
/// Supports both SSH and HTTPS formats:
/// - `git@github.com:owner/repo.git`
/// - `https://github.com/owner/repo.git`
/// - `https://github.com/owner/repo`
///
/// # Example
///
/// ```
/// use treesmith::gitdata::github::parse_github_url;
///
/// let (owner, repo) = parse_github_url("git@github.com:octocat/hello-world.git").unwrap();
/// assert_eq!(owner, "octocat");
/// assert_eq!(repo, "hello-world");
/// ```
pub fn parse_github_url(url: &str) -> Option<(String, String)> {
    let rest = url
        .strip_prefix("git@github.com:")
        .or_else(|| url.strip_prefix("https://github.com/"))
        .or_else(|| url.strip_prefix("http://github.com/"))?;
    let rest = rest.strip_suffix(".git").unwrap_or(rest);

    let (owner, repo) = rest.split_once('/')?;
    if owner.is_empty() || repo.is_empty() || repo.contains('/') {
        return None;
    }
    Some((owner.to_string(), repo.to_string()))
}

/// Convert a GitHub remote URL to the repository API base URL.
///
/// # Example
///
/// ```
/// use treesmith::gitdata::github::repo_api_url_from_remote;
///
/// assert_eq!(
///     repo_api_url_from_remote("https://github.com/octocat/hello-world.git").as_deref(),
///     Some("https://api.github.com/repos/octocat/hello-world"),
/// );
/// ```
pub fn repo_api_url_from_remote(remote: &str) -> Option<String> {
    let (owner, repo) = parse_github_url(remote)?;
    Some(format!("{DEFAULT_API_BASE}/repos/{owner}/{repo}"))
}
