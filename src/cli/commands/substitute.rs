//! cli::commands::substitute
//!
//! Find/replace across matching files, published as one commit.
//!
//! # Example
//!
//! ```bash
//! treesmith substitute -b main -g 'docs/**/*.md' \
//!     --find 'http://' --replace 'https://' -m 'Use https links'
//! ```

use anyhow::{anyhow, Result};
use tracing::debug;

use super::listing::SHORT_SHA;
use super::Context;
use crate::batch::Substitution;
use crate::core::config::Config;
use crate::core::types::{Author, BranchName};
use crate::engine::{CommitOrchestrator, CommitOutcome, CommitRequest};

/// Arguments of the substitute command.
#[derive(Debug, Clone)]
pub struct SubstituteArgs {
    pub branch: BranchName,
    pub glob: String,
    pub find: String,
    pub replace: String,
    pub message: String,
    pub author_name: Option<String>,
    pub author_email: Option<String>,
}

/// Run the substitution and commit the result.
pub async fn substitute(ctx: &Context, args: SubstituteArgs) -> Result<()> {
    let updater = Substitution::new(&args.glob, args.find.as_str(), args.replace.as_str())?;
    let (config, client) = ctx.client()?;
    let author = resolve_author(&args, &config)?;
    debug!(author = %author.name, concurrency = config.concurrency(), "starting substitution");

    let request = CommitRequest::new(args.branch.clone(), author, args.message);
    let outcome = CommitOrchestrator::new(&client)
        .with_concurrency(config.concurrency())
        .run(&request, &updater)
        .await?;

    if ctx.quiet {
        return Ok(());
    }
    match outcome {
        CommitOutcome::Committed {
            commit,
            parent,
            updated_paths,
            ..
        } => {
            println!(
                "Committed {} on {} (parent {})",
                commit.short(SHORT_SHA),
                args.branch,
                parent.short(SHORT_SHA)
            );
            for path in updated_paths {
                println!("  M {path}");
            }
        }
        CommitOutcome::Unchanged { head } => {
            println!(
                "No files selected; {} left at {}",
                args.branch,
                head.short(SHORT_SHA)
            );
        }
    }
    Ok(())
}

/// Author from the command line, falling back to the config file.
fn resolve_author(args: &SubstituteArgs, config: &Config) -> Result<Author> {
    let name = args
        .author_name
        .as_deref()
        .or(config.author_name())
        .ok_or_else(|| {
            anyhow!("no commit author name; pass --author-name or set [commit] author_name")
        })?;
    let email = args
        .author_email
        .as_deref()
        .or(config.author_email())
        .ok_or_else(|| {
            anyhow!("no commit author email; pass --author-email or set [commit] author_email")
        })?;
    Ok(Author::now(name, email))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::config::{CommitDefaults, FileConfig};

    fn args(name: Option<&str>, email: Option<&str>) -> SubstituteArgs {
        SubstituteArgs {
            branch: BranchName::new("main").unwrap(),
            glob: "*".into(),
            find: "a".into(),
            replace: "b".into(),
            message: "m".into(),
            author_name: name.map(String::from),
            author_email: email.map(String::from),
        }
    }

    fn config(name: Option<&str>, email: Option<&str>) -> Config {
        let file = FileConfig {
            username: Some("u".into()),
            token: Some("t".into()),
            repo_url: Some("https://api.github.com/repos/o/r".into()),
            commit: Some(CommitDefaults {
                author_name: name.map(String::from),
                author_email: email.map(String::from),
                ..Default::default()
            }),
            ..Default::default()
        };
        Config::resolve(file, None, |_| None).unwrap()
    }

    #[test]
    fn flags_override_config_author() {
        let author = resolve_author(
            &args(Some("Flag"), None),
            &config(Some("File"), Some("file@example.com")),
        )
        .unwrap();
        assert_eq!(author.name, "Flag");
        assert_eq!(author.email, "file@example.com");
    }

    #[test]
    fn missing_author_is_an_error() {
        let err = resolve_author(&args(None, None), &config(None, None)).unwrap_err();
        assert!(err.to_string().contains("--author-name"));
    }
}
