// src/main.rs

use clap::Parser;
use color_eyre::eyre::{Result, WrapErr};
use std::sync::Arc;
use tracing::info;

mod cli;
mod core;
mod logging;
mod prepare;

use cli::{Cli, Command, ScanArgs};
use crate::core::config::ScanConfig;
use crate::core::events::TracingSink;
use crate::core::plugins::PluginRegistry;
use crate::core::scanner::fetcher::HttpFetcher;
use crate::core::scanner::Scanner;

#[tokio::main]
async fn main() -> Result<()> {
    color_eyre::install()?;
    logging::initialize_logging()?;

    match Cli::parse().command {
        Command::Scan(args) => scan(args).await,
        Command::Prepare(args) => {
            prepare::prepare_files(&args.files).await;
            Ok(())
        }
    }
}

/// Builds the configuration from the command line and scans every input.
///
/// Invalid settings abort here, before any worker is started.
async fn scan(args: ScanArgs) -> Result<()> {
    let mut config = ScanConfig::default()
        .with_test_failure_policy(args.on_test_error)
        .with_flush_each_line(args.flush);
    if let Some(timeout) = args.timeout {
        config.set_timeout(timeout).wrap_err("invalid --timeout")?;
    }
    if let Some(retries) = args.retries {
        config.set_retries(retries).wrap_err("invalid --retries")?;
    }
    if let Some(threads) = args.threads {
        config.set_thread_count(threads).wrap_err("invalid --threads")?;
    }
    config.set_separator(args.separator).wrap_err("invalid --separator")?;
    if let Some(user_agent) = args.user_agent {
        config = config.with_user_agent(user_agent);
    }

    let fetcher = Arc::new(HttpFetcher::new(config.user_agent()));
    let scanner = Scanner::new(config, PluginRegistry::builtin(), fetcher, Arc::new(TracingSink));

    let reports = scanner.scan(&args.files).await;
    info!(sources = reports.len(), "Scan complete.");
    Ok(())
}
