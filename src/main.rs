//! cmdpager binary entry point.

use std::sync::Arc;

use anyhow::{Context, Result};
use clap::Parser;
use cmdpager::cli::{self, Cli, Commands};
use cmdpager::server;
use cmdpager_config::DebugConfig;
use cmdpager_core::{OutputSession, SessionSettings};

#[tokio::main]
async fn main() -> Result<()> {
    let args = Cli::parse();

    let manager = cmdpager::load_config(args.config.as_deref())?;
    initialize_tracing(&manager.config().debug).ok();

    match args.command.unwrap_or(Commands::Serve) {
        Commands::Serve => {
            let session = Arc::new(OutputSession::with_process_executor(
                SessionSettings::from(manager.config()),
            ));
            server::serve_stdio(session).await?;
        }
        Commands::Page { file, page } => {
            cli::handle_page_command(manager.config(), &file, page)?;
        }
        Commands::Config => {
            cli::handle_config_command(&manager)?;
        }
    }

    Ok(())
}

/// Install the global subscriber. `RUST_LOG` takes precedence over the
/// `[debug]` section; output goes to stderr since stdout carries the protocol.
fn initialize_tracing(debug_cfg: &DebugConfig) -> Result<()> {
    let env_filter = match tracing_subscriber::EnvFilter::try_from_default_env() {
        Ok(filter) => filter,
        Err(_) if debug_cfg.enable_tracing => {
            tracing_subscriber::EnvFilter::try_new(debug_cfg.filter_directive())
                .context("invalid [debug] trace filter")?
        }
        Err(_) => return Ok(()),
    };

    tracing_subscriber::fmt()
        .with_env_filter(env_filter)
        .with_writer(std::io::stderr)
        .with_target(true)
        .try_init()
        .map_err(|err| anyhow::anyhow!("failed to install tracing subscriber: {err}"))?;

    tracing::debug!(
        level = %debug_cfg.trace_level,
        "tracing initialized"
    );
    Ok(())
}
