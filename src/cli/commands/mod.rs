//! cli::commands
//!
//! Command dispatch and handlers.
//!
//! # Architecture
//!
//! Each command handler:
//! 1. Loads configuration and builds the client
//! 2. Calls the object client or the commit orchestrator
//! 3. Formats and displays output
//!
//! Handlers do NOT issue write requests themselves; every write flows
//! through [`crate::engine::CommitOrchestrator`].
//!
//! # Async Commands
//!
//! Commands that talk to the remote are async. [`dispatch`] stays
//! synchronous and runs them on a tokio runtime created per invocation.

mod browse;
mod completion;
mod listing;
mod substitute;

pub use browse::{cat_blob, ls};
pub use completion::completion;
pub use listing::{branch, branches, commits, tags};
pub use substitute::{substitute, SubstituteArgs};

use std::future::Future;
use std::path::PathBuf;

use anyhow::{Context as _, Result};

use super::args::Command;
use crate::core::config::Config;
use crate::core::types::BranchName;
use crate::gitdata::github::GitHubDataClient;
use crate::gitdata::CommitQuery;

/// Settings shared by every command.
#[derive(Debug, Clone, Default)]
pub struct Context {
    /// Explicit config file (`--config`)
    pub config_path: Option<PathBuf>,
    pub quiet: bool,
}

impl Context {
    /// Load the configuration for this invocation.
    pub fn config(&self) -> Result<Config> {
        Config::load(self.config_path.as_deref()).context("failed to load configuration")
    }

    /// Build a client from the configuration.
    pub fn client(&self) -> Result<(Config, GitHubDataClient)> {
        let config = self.config()?;
        let client = GitHubDataClient::from_config(&config);
        Ok((config, client))
    }
}

/// Dispatch a parsed command to its handler.
pub fn dispatch(command: Command, ctx: &Context) -> Result<()> {
    match command {
        Command::Branches => block_on(branches(ctx)),
        Command::Branch { name } => block_on(branch(ctx, &parse_branch(&name)?)),
        Command::Tags => block_on(tags(ctx)),
        Command::Commits {
            sha,
            page,
            per_page,
            path,
        } => {
            let query = CommitQuery {
                sha,
                page,
                per_page,
                path,
            };
            block_on(commits(ctx, &query))
        }
        Command::Ls { path, branch } => block_on(ls(ctx, &path, &parse_branch(&branch)?)),
        Command::CatBlob { sha } => block_on(cat_blob(ctx, &sha)),
        Command::Substitute {
            branch,
            glob,
            find,
            replace,
            message,
            author_name,
            author_email,
        } => {
            let args = SubstituteArgs {
                branch: parse_branch(&branch)?,
                glob,
                find,
                replace,
                message,
                author_name,
                author_email,
            };
            block_on(substitute(ctx, args))
        }
        Command::Completion { shell } => completion(shell),
    }
}

/// Run an async command to completion.
fn block_on<F: Future<Output = Result<()>>>(future: F) -> Result<()> {
    let rt = tokio::runtime::Runtime::new().context("failed to start async runtime")?;
    rt.block_on(future)
}

fn parse_branch(name: &str) -> Result<BranchName> {
    BranchName::new(name).with_context(|| format!("invalid branch name '{name}'"))
}
