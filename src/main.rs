use anyhow::Result;
use clap::{Parser, Subcommand};
use colored::Colorize;
use tracing::info;

use sieve::config::Config;
use sieve::pipeline::{CompletionRequest, ModeratedCompletion};

/// Sieve: moderation-gated completion proxy for Claude.
///
/// Screens every prompt with Azure AI Content Safety before it reaches
/// Claude, and screens every completion before it reaches the caller.
#[derive(Parser)]
#[command(name = "sieve", version, about)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Run the HTTP proxy
    Serve {
        /// Port to listen on (default: 8080)
        #[arg(long, default_value = "8080")]
        port: u16,

        /// Address to bind (default: 0.0.0.0)
        #[arg(long, default_value = "0.0.0.0")]
        bind: String,
    },

    /// Run a single prompt through the full pipeline and print the outcome
    Check {
        /// The prompt to send
        prompt: String,

        /// Optional system message
        #[arg(long, default_value = "")]
        system: String,
    },

    /// Validate configuration and print it with secrets masked
    Config,
}

#[tokio::main]
async fn main() -> Result<()> {
    // Load .env file if present (silently ignore if missing)
    let _ = dotenvy::dotenv();

    // Set up structured logging
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env().unwrap_or_else(|_| {
                tracing_subscriber::EnvFilter::new("sieve=info,tower_http=info")
            }),
        )
        .init();

    let cli = Cli::parse();

    // Missing configuration is fatal before any command runs.
    let config = Config::load()?;

    match cli.command {
        Commands::Serve { port, bind } => {
            info!("Starting Sieve proxy...");
            sieve::web::run_server(config, port, &bind).await?;
        }

        Commands::Check { prompt, system } => {
            let pipeline = ModeratedCompletion::from_config(&config)?;
            let request = CompletionRequest::new(prompt, system);

            println!("Checking prompt with model {}...", config.claude_model.bold());
            let outcome = pipeline.execute(&request).await;
            sieve::output::terminal::display_outcome(&outcome);

            if !outcome.is_success() {
                anyhow::bail!("Prompt did not pass the pipeline: {}", outcome.label());
            }
        }

        Commands::Config => {
            sieve::output::terminal::display_config(&config.redacted_summary());
            println!("\n{}", "Configuration is valid.".bold());
        }
    }

    Ok(())
}
