use std::path::PathBuf;
use std::sync::Arc;

use anyhow::Result;
use clap::{Parser, Subcommand};
use phyto_application::{DiagnosisGateway, HttpGateway, LocalGateway};
use phyto_infrastructure::{ConfigService, LogOutput, init_logging};
use phyto_interaction::{OllamaAdvisor, SubprocessClassifier};

mod commands;
mod render;
mod repl;

#[derive(Parser)]
#[command(name = "phyto")]
#[command(about = "Phyto CLI - diagnose plant leaves and ask for treatment advice", long_about = None)]
struct Cli {
    /// Gateway server URL
    #[arg(long, global = true, default_value = "http://127.0.0.1:3000")]
    server: String,

    /// Run the engine and the language model in-process instead of over HTTP
    #[arg(long, global = true)]
    local: bool,

    /// Configuration file, used for logging and with --local
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand)]
enum Commands {
    /// Start the interactive dashboard (default)
    Repl {
        /// Seed the history with two example diagnoses
        #[arg(long)]
        demo: bool,
    },
    /// Classify one image and print the diagnosis
    Classify {
        /// Path to a leaf image
        image: PathBuf,
    },
    /// Ask a single treatment question
    Ask {
        /// Diagnosis label, e.g. "Tomato Late Blight"
        #[arg(long)]
        disease: String,
        /// Diagnosis confidence in percent
        #[arg(long, default_value_t = 100.0)]
        confidence: f64,
        question: String,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    let config = ConfigService::from_cli(cli.config.clone()).get_config()?;
    let _log_guard = init_logging(&config.logging, "phyto-cli", LogOutput::FileOnly)?;

    let gateway: Arc<dyn DiagnosisGateway> = if cli.local {
        Arc::new(LocalGateway::new(
            Arc::new(SubprocessClassifier::from_config(&config.classifier)?),
            Arc::new(OllamaAdvisor::from_config(&config.advisor)),
        ))
    } else {
        Arc::new(HttpGateway::new(&cli.server))
    };

    match cli.command.unwrap_or(Commands::Repl { demo: false }) {
        Commands::Repl { demo } => repl::run(gateway, demo).await?,
        Commands::Classify { image } => commands::classify::run(gateway, &image).await?,
        Commands::Ask {
            disease,
            confidence,
            question,
        } => commands::ask::run(gateway, &disease, confidence, &question).await?,
    }

    Ok(())
}
