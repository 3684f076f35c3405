//! cli
//!
//! Command-line interface layer for treesmith.
//!
//! # Responsibilities
//!
//! - Parse command-line arguments and global flags
//! - Install the log subscriber
//! - Delegate to command handlers
//!
//! # Architecture
//!
//! The CLI layer is thin. It parses arguments via clap and dispatches to
//! handlers that call [`crate::gitdata`] for reads and
//! [`crate::engine`] for the commit protocol.

pub mod args;
pub mod commands;

pub use args::{Cli, Shell};

use std::io::IsTerminal;

use anyhow::Result;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

/// Run the CLI application.
///
/// This is the main entry point called from `main.rs`.
pub fn run() -> Result<()> {
    let cli = Cli::parse_args();
    init_logging(cli.log_level());

    let ctx = commands::Context {
        config_path: cli.config.clone(),
        quiet: cli.quiet,
    };

    commands::dispatch(cli.command, &ctx)
}

/// Log to stderr. `RUST_LOG` wins over the level implied by the flags.
fn init_logging(default_level: &str) {
    let layer = fmt::layer()
        .compact()
        .with_ansi(std::io::stderr().is_terminal())
        .with_writer(std::io::stderr);
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(format!("treesmith={default_level}")));
    // a subscriber may already be installed when run from tests
    let _ = tracing_subscriber::registry()
        .with(layer)
        .with(filter)
        .try_init();
}
