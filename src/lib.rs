//! notedupe - Duplicate Document Assistant
//!
//! A CLI companion for SiYuan-style note servers that finds documents with
//! duplicate titles, files with duplicate content, and empty documents, then
//! merges or deletes them through the server's own API so references and
//! exports stay intact.

pub mod actions;
pub mod cli;
pub mod commands;
pub mod config;
pub mod dedupe;
pub mod error;
pub mod host;
pub mod logging;
pub mod output;
pub mod scan;

use std::time::Duration;

use anyhow::Result;

use crate::cli::{Cli, Commands};
use crate::config::Config;
use crate::error::ExitCode;
use crate::host::RestHost;

/// Run the application and return the exit code to use.
///
/// `init` runs before configuration loading so it works on a fresh machine;
/// every other command loads the configuration, connects to the host and
/// dispatches to its handler.
pub async fn run_app(cli: Cli) -> Result<ExitCode> {
    logging::init_logging(cli.verbose, cli.quiet);
    if cli.no_color {
        yansi::disable();
    }

    if let Commands::Init(args) = &cli.command {
        return commands::run_init(args);
    }

    let config = Config::load(cli.config.as_deref())?;
    let host = RestHost::new(
        &config.host.base_url,
        &config.host.token,
        Duration::from_secs(config.host.timeout_secs),
    )?;

    match &cli.command {
        Commands::Init(_) => unreachable!(), // handled above, before config loading
        Commands::Docs(args) => commands::run_docs(&host, &config, args, cli.quiet).await,
        Commands::Merge(args) => commands::run_merge(&host, &config, args, cli.quiet).await,
        Commands::Empty(args) => commands::run_empty(&host, &config, args, cli.quiet).await,
        Commands::DeleteEmpty(args) => {
            commands::run_delete_empty(&host, &config, args, cli.quiet).await
        }
        Commands::Files(args) => commands::run_files(&host, &config, args, cli.quiet).await,
        Commands::Clean(args) => commands::run_clean(&host, &config, args, cli.quiet).await,
    }
}
