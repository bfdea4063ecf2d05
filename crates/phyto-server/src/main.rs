use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::Parser;
use phyto_infrastructure::{ConfigService, LogOutput, init_logging};
use phyto_server::{AppBootstrap, routes};

/// Plant leaf diagnosis gateway.
#[derive(Parser, Debug)]
#[command(name = "phyto-server", version, about)]
struct Args {
    /// Configuration file (defaults to ~/.config/phyto/config.toml when present)
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Override the bind address, e.g. 0.0.0.0:3000
    #[arg(short, long)]
    bind: Option<String>,

    /// Write the default configuration file and exit
    #[arg(long)]
    init_config: bool,
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();

    if args.init_config {
        let path = ConfigService::ensure_config_file()?;
        println!("Configuration file: {}", path.display());
        return Ok(());
    }

    let config_service = ConfigService::from_cli(args.config);
    let mut config = config_service
        .get_config()
        .context("failed to load configuration")?;
    if let Some(bind) = args.bind {
        config.server.bind = bind;
    }

    let _log_guard = init_logging(&config.logging, "phyto-server", LogOutput::Console)?;

    let bootstrap = AppBootstrap::from_config(&config)?;
    let (addr, server) = warp::serve(routes(bootstrap.app_state))
        .try_bind_with_graceful_shutdown(bootstrap.bind, async {
            if let Err(e) = tokio::signal::ctrl_c().await {
                tracing::error!(error = %e, "Failed to listen for shutdown signal");
            }
        })
        .with_context(|| format!("failed to bind {}", bootstrap.bind))?;

    tracing::info!(%addr, "phyto-server listening");
    server.await;
    tracing::info!("phyto-server shut down");
    Ok(())
}
