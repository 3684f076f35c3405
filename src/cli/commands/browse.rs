//! cli::commands::browse
//!
//! Inspect repository content: directory listings and raw blobs.

use std::io::Write;

use anyhow::{Context as _, Result};

use super::Context;
use crate::core::types::{BranchName, Sha};
use crate::gitdata::{DirectoryEntry, GitData};

/// List the entries of a directory on a branch.
pub async fn ls(ctx: &Context, path: &str, branch: &BranchName) -> Result<()> {
    let (_, client) = ctx.client()?;
    let entries = client
        .contents(path, branch)
        .await
        .with_context(|| format!("failed to list '{path}' on {branch}"))?;

    for entry in &entries {
        println!("{}", format_entry(entry));
    }
    Ok(())
}

/// Write a blob's raw content to stdout.
pub async fn cat_blob(ctx: &Context, sha: &str) -> Result<()> {
    let sha = Sha::new(sha).with_context(|| format!("invalid sha '{sha}'"))?;
    let (_, client) = ctx.client()?;
    let content = client
        .get_blob_content(&sha)
        .await
        .with_context(|| format!("failed to read blob {sha}"))?;

    let mut stdout = std::io::stdout().lock();
    stdout.write_all(&content)?;
    stdout.flush()?;
    Ok(())
}

/// One line per entry: kind, name and (for links) the target.
fn format_entry(entry: &DirectoryEntry) -> String {
    match entry {
        DirectoryEntry::File { name, .. } => format!("file       {name}"),
        DirectoryEntry::Directory { name } => format!("dir        {name}/"),
        DirectoryEntry::Symlink { name, target_path } => {
            format!("symlink    {name} -> {target_path}")
        }
        DirectoryEntry::Submodule { name, url } => format!("submodule  {name} ({url})"),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn formats_every_entry_kind() {
        let lines: Vec<String> = [
            DirectoryEntry::File {
                name: "a.txt".into(),
                content: None,
            },
            DirectoryEntry::Directory { name: "src".into() },
            DirectoryEntry::Symlink {
                name: "latest".into(),
                target_path: "v2".into(),
            },
            DirectoryEntry::Submodule {
                name: "vendor".into(),
                url: "https://example.com/v.git".into(),
            },
        ]
        .iter()
        .map(format_entry)
        .collect();

        assert_eq!(
            lines,
            vec![
                "file       a.txt",
                "dir        src/",
                "symlink    latest -> v2",
                "submodule  vendor (https://example.com/v.git)",
            ]
        );
    }
}
