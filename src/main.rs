//! cem-mcp: MCP server exposing Custom Elements Manifest metadata to AI assistants
//!
//! This tool discovers `custom-elements.json` files across a workspace and
//! makes the web-component metadata they describe queryable by AI assistants.

use std::path::PathBuf;
use std::process::ExitCode;
use std::sync::Arc;

use clap::Parser;
use tracing::{error, info, Level};
use tracing_subscriber::EnvFilter;

use cem_mcp::cem::{LocateOptions, ManifestLocationProvider, ManifestsProvider};
use cem_mcp::config::{self, Settings};
use cem_mcp::mcp::server::McpServer;

/// MCP server exposing Custom Elements Manifest metadata to AI assistants.
///
/// Discovers custom-elements.json files in a workspace and its installed
/// dependencies and serves component queries over MCP.
#[derive(Parser, Debug)]
#[command(name = "cem-mcp")]
#[command(author, version, about, long_about = None)]
struct Args {
    /// Path to configuration file
    #[arg(value_name = "CONFIG_FILE")]
    config: Option<PathBuf>,

    /// Workspace root to scan (overrides the configuration file)
    #[arg(short, long, value_name = "DIR")]
    workspace: Option<PathBuf>,

    /// Increase logging verbosity (-v for info, -vv for debug, -vvv for trace)
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,

    /// Decrease logging verbosity (only show errors)
    #[arg(short, long)]
    quiet: bool,
}

/// Determines the log level from CLI arguments.
#[allow(clippy::match_same_arms)] // Explicit "warn" arm for clarity
fn get_log_level(verbose: u8, quiet: bool, config_level: &str) -> Level {
    if quiet {
        return Level::ERROR;
    }

    match verbose {
        0 => match config_level.to_lowercase().as_str() {
            "trace" => Level::TRACE,
            "debug" => Level::DEBUG,
            "info" => Level::INFO,
            "warn" => Level::WARN,
            "error" => Level::ERROR,
            _ => Level::WARN, // Default to warn for unknown levels
        },
        1 => Level::INFO,
        2 => Level::DEBUG,
        _ => Level::TRACE,
    }
}

/// Initialises the tracing subscriber for logging.
fn init_tracing(level: Level) {
    let filter = EnvFilter::from_default_env().add_directive(level.into());

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();
}

/// Entry point for the cem-mcp server.
fn main() -> ExitCode {
    let args = Args::parse();

    // Load configuration
    let config_path = args.config.as_deref();
    let cfg = match config::load_config(config_path) {
        Ok(cfg) => cfg,
        Err(e) => {
            eprintln!("Configuration error: {e}");
            return ExitCode::FAILURE;
        }
    };

    // Initialise logging
    let log_level = get_log_level(args.verbose, args.quiet, &cfg.logging.level);
    init_tracing(log_level);

    // Display GPL license notice (required by GPLv3 Section 5d)
    eprintln!(
        "cem-mcp {}  Copyright (C) 2026  The cem-mcp Contributors",
        env!("CARGO_PKG_VERSION")
    );
    eprintln!("This program comes with ABSOLUTELY NO WARRANTY.");
    eprintln!("This is free software, licensed under GPL-3.0-or-later.");
    eprintln!("Source: {}", env!("CARGO_PKG_REPOSITORY"));
    eprintln!();

    info!(
        version = env!("CARGO_PKG_VERSION"),
        "Starting cem-mcp server"
    );

    // CLI flag wins over the configuration file; default to the current
    // directory.
    let workspace = args
        .workspace
        .or(cfg.workspace.clone())
        .unwrap_or_else(|| PathBuf::from("."));

    info!(workspace = %workspace.display(), "Workspace root configured");

    let settings = Arc::new(Settings::new(&cfg.manifests));
    let locator = Arc::new(ManifestLocationProvider::new(workspace));
    let provider = Arc::new(ManifestsProvider::new(
        Arc::clone(&locator),
        Arc::clone(&settings),
    ));

    let mut server = McpServer::new(Arc::clone(&locator), provider, settings);

    // Run the server
    let runtime = match tokio::runtime::Builder::new_current_thread()
        .enable_all()
        .build()
    {
        Ok(runtime) => runtime,
        Err(e) => {
            error!(error = %e, "Failed to create Tokio runtime");
            return ExitCode::FAILURE;
        }
    };

    let result = runtime.block_on(async {
        // Warm the manifest cache before the first client request.
        let manifests = locator.locate(LocateOptions::default()).await;
        info!(
            manifest_count = manifests.len(),
            "Initial manifest discovery complete"
        );

        info!("MCP server ready, waiting for client connection...");
        server.run().await
    });

    match result {
        Ok(()) => {
            info!("Server shut down gracefully");
            ExitCode::SUCCESS
        }
        Err(e) => {
            error!(error = %e, "Server error");
            ExitCode::FAILURE
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn verify_cli() {
        use clap::CommandFactory;
        Args::command().debug_assert();
    }

    #[test]
    fn quiet_wins_over_config_level() {
        assert_eq!(get_log_level(0, true, "trace"), Level::ERROR);
    }

    #[test]
    fn verbosity_overrides_config_level() {
        assert_eq!(get_log_level(0, false, "debug"), Level::DEBUG);
        assert_eq!(get_log_level(1, false, "error"), Level::INFO);
        assert_eq!(get_log_level(3, false, "warn"), Level::TRACE);
    }
}
