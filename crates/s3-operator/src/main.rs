//! S3 operator - provisions storage users and buckets from annotated secrets
//!
//! This is the main entry point of the operator binary.

mod cli;
mod commands;
mod server;
mod signal;

use anyhow::Result;
use clap::Parser;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

use cli::{Cli, Commands};

#[tokio::main]
async fn main() -> Result<()> {
    // Initialize rustls crypto provider (required for rustls 0.23+)
    // This must be done before any TLS operations
    let _ = rustls::crypto::aws_lc_rs::default_provider().install_default();

    // A missing .env file is fine
    dotenvy::dotenv().ok();

    let cli = Cli::parse();

    init_tracing(cli.verbose, cli.quiet, cli.log_level.as_deref());

    match cli.command.unwrap_or(Commands::Run) {
        Commands::Run => commands::run::run(&cli.operator).await,
        Commands::Check => commands::check::run(&cli.operator).await,
        Commands::Sync => commands::sync::run(&cli.operator).await,
    }
}

/// Initialize tracing with appropriate verbosity
fn init_tracing(verbose: u8, quiet: bool, log_level: Option<&str>) {
    let filter = if quiet {
        EnvFilter::new("error")
    } else {
        match verbose {
            0 => EnvFilter::new(level_directive(log_level)),
            1 => EnvFilter::new("debug"),
            _ => EnvFilter::new("trace"),
        }
    };

    tracing_subscriber::registry()
        .with(fmt::layer().with_target(false))
        .with(filter)
        .init();
}

/// Map a LOG_LEVEL value to a filter directive; unknown values mean info
fn level_directive(log_level: Option<&str>) -> &'static str {
    match log_level.map(|level| level.trim().to_uppercase()).as_deref() {
        Some("TRACE") => "trace",
        Some("DEBUG") => "debug",
        Some("WARNING") | Some("WARN") => "warn",
        Some("ERROR") => "error",
        _ => "info",
    }
}
