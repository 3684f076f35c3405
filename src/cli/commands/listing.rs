//! cli::commands::listing
//!
//! Read-only listings: branches, tags and commit history.

use anyhow::{Context as _, Result};

use super::Context;
use crate::core::types::BranchName;
use crate::gitdata::{CommitQuery, GitData};

/// Width of abbreviated shas in listings.
pub(super) const SHORT_SHA: usize = 7;

/// List branches with their head commits.
pub async fn branches(ctx: &Context) -> Result<()> {
    let (_, client) = ctx.client()?;
    let branches = client.branches().await.context("failed to list branches")?;

    if branches.is_empty() && !ctx.quiet {
        println!("No branches.");
    }
    for branch in branches {
        let marker = if branch.protected { " (protected)" } else { "" };
        println!(
            "{}  {}{}",
            branch.commit_sha.short(SHORT_SHA),
            branch.name,
            marker
        );
    }
    Ok(())
}

/// Print the head commit of one branch.
pub async fn branch(ctx: &Context, name: &BranchName) -> Result<()> {
    let (_, client) = ctx.client()?;
    let head = client.resolve_branch(name).await?;
    println!("{}", head.commit_sha);
    Ok(())
}

/// List tags with the commits they point at.
pub async fn tags(ctx: &Context) -> Result<()> {
    let (_, client) = ctx.client()?;
    let tags = client.tags().await.context("failed to list tags")?;

    if tags.is_empty() && !ctx.quiet {
        println!("No tags.");
    }
    for tag in tags {
        println!("{}  {}", tag.commit_sha.short(SHORT_SHA), tag.name);
    }
    Ok(())
}

/// List commits matching `query`, newest first.
pub async fn commits(ctx: &Context, query: &CommitQuery) -> Result<()> {
    let (_, client) = ctx.client()?;
    let commits = client
        .commits(query)
        .await
        .context("failed to list commits")?;

    for commit in commits {
        let subject = commit.message.lines().next().unwrap_or_default();
        println!(
            "{}  {}  {} <{}>  {}",
            commit.sha.short(SHORT_SHA),
            commit.author.date.format("%Y-%m-%d"),
            commit.author.name,
            commit.author.email,
            subject
        );
    }
    Ok(())
}
