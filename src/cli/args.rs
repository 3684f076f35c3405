//! cli::args
//!
//! Command-line argument definitions using clap derive.
//!
//! # Global Flags
//!
//! These flags are available on all commands:
//! - `--help` / `-h`: Show help
//! - `--version`: Show version
//! - `--config <path>`: Read configuration from this file
//! - `--debug`: Enable debug logging
//! - `--quiet` / `-q`: Only log warnings and errors

use clap::{Parser, Subcommand, ValueEnum};
use std::path::PathBuf;

/// Treesmith - atomic multi-file commits over the GitHub Git Data API
#[derive(Parser, Debug)]
#[command(name = "treesmith")]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    /// Read configuration from this file instead of the default locations
    #[arg(long, global = true, value_name = "PATH")]
    pub config: Option<PathBuf>,

    /// Enable debug logging
    #[arg(long, global = true, conflicts_with = "quiet")]
    pub debug: bool,

    /// Only log warnings and errors
    #[arg(short, long, global = true)]
    pub quiet: bool,

    #[command(subcommand)]
    pub command: Command,
}

impl Cli {
    /// Parse command-line arguments.
    pub fn parse_args() -> Self {
        Parser::parse()
    }

    /// Default log filter implied by the verbosity flags.
    pub fn log_level(&self) -> &'static str {
        if self.debug {
            "debug"
        } else if self.quiet {
            "warn"
        } else {
            "info"
        }
    }
}

/// Available commands.
#[derive(Subcommand, Debug)]
pub enum Command {
    /// List branches of the repository
    Branches,

    /// Print the head commit of a branch
    Branch {
        /// Branch name
        name: String,
    },

    /// List tags of the repository
    Tags,

    /// List commits, newest first
    Commits {
        /// Branch name or sha to start from (defaults to the default branch)
        #[arg(long)]
        sha: Option<String>,

        /// 1-based page index
        #[arg(long)]
        page: Option<u32>,

        /// Commits per page (1-100)
        #[arg(long)]
        per_page: Option<u32>,

        /// Only commits touching this path
        #[arg(long)]
        path: Option<String>,
    },

    /// List a directory on a branch
    Ls {
        /// Directory path (defaults to the repository root)
        #[arg(default_value = "")]
        path: String,

        /// Branch to read from
        #[arg(short, long)]
        branch: String,
    },

    /// Write the content of a blob to stdout
    #[command(name = "cat-blob")]
    CatBlob {
        /// Blob sha
        sha: String,
    },

    /// Replace text in matching files and commit the result atomically
    #[command(
        name = "substitute",
        long_about = "Replace text in every file matching a glob and publish the result \
            as one commit on top of the branch.\n\n\
            The branch only moves once every file has been rewritten and the new \
            commit exists. If another writer moved the branch in the meantime the \
            update is rejected and the branch is left untouched; run the command again.",
        after_help = "\
EXAMPLES:
    # Bump a version string in every manifest
    treesmith substitute -b main -g '**/Cargo.toml' \\
        --find 'version = \"1.2.0\"' --replace 'version = \"1.3.0\"' \\
        -m 'Release 1.3.0'

    # Fix a typo in top-level markdown files only
    treesmith substitute -b docs -g '*.md' --find recieve --replace receive -m 'Fix typo'"
    )]
    Substitute {
        /// Branch to commit on
        #[arg(short, long)]
        branch: String,

        /// Glob selecting the files to rewrite (`*` stays within a directory)
        #[arg(short, long)]
        glob: String,

        /// Literal text to search for
        #[arg(long)]
        find: String,

        /// Replacement text
        #[arg(long)]
        replace: String,

        /// Commit message
        #[arg(short, long)]
        message: String,

        /// Commit author name (overrides the config file)
        #[arg(long)]
        author_name: Option<String>,

        /// Commit author email (overrides the config file)
        #[arg(long)]
        author_email: Option<String>,
    },

    /// Generate shell completion scripts
    Completion {
        /// Shell to generate completions for
        #[arg(value_enum)]
        shell: Shell,
    },
}

/// Supported shells for completion generation.
#[derive(ValueEnum, Clone, Copy, Debug, PartialEq, Eq)]
pub enum Shell {
    Bash,
    Zsh,
    Fish,
    PowerShell,
}
