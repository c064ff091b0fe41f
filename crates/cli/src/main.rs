//! Chainwright CLI, the main entry point.
//!
//! Commands:
//! - `ask`       Send one prompt to the model
//! - `extract`   Pull structured fields out of a product review
//! - `pipeline`  Run a sequential pipeline
//! - `route`     Route a question to the best-suited specialist
//! - `chat`      Interactive conversation with memory
//! - `config`    Show the effective configuration

use std::path::PathBuf;

use chainwright_config::MemoryStrategy;
use clap::{Parser, Subcommand};

mod commands;
mod presets;

#[derive(Parser)]
#[command(
    name = "chainwright",
    about = "Chainwright: LLM pipelines, routing, and conversation memory",
    version,
    author
)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Enable verbose logging
    #[arg(short, long, global = true)]
    verbose: bool,
}

#[derive(Subcommand)]
enum Commands {
    /// Send one prompt to the model
    Ask {
        prompt: String,

        /// Override the configured temperature
        #[arg(short, long)]
        temperature: Option<f32>,
    },

    /// Extract gift, delivery and price fields from a review
    Extract {
        /// Review text (defaults to a built-in sample)
        text: Option<String>,

        /// Read the review from a file
        #[arg(short, long, conflicts_with = "text")]
        file: Option<PathBuf>,
    },

    /// Run a configured or built-in pipeline
    Pipeline {
        /// Pipeline name ("review" is built in)
        name: String,

        /// Pipeline input, repeatable
        #[arg(
            short,
            long = "set",
            value_name = "KEY=VALUE",
            value_parser = commands::pipeline::parse_key_val
        )]
        set: Vec<(String, String)>,

        /// Print every step's output, not just the declared outputs
        #[arg(long)]
        intermediates: bool,
    },

    /// Route a question to the best-suited destination
    Route { input: String },

    /// Chat with conversation memory
    Chat {
        /// buffer, window, token or summary
        #[arg(short, long)]
        memory: Option<MemoryStrategy>,

        /// Turns kept by the window strategy
        #[arg(long)]
        window: Option<usize>,

        /// Token ceiling for the token and summary strategies
        #[arg(long)]
        max_tokens: Option<usize>,
    },

    /// Show the effective configuration
    Config {
        /// Print a starter config.toml instead
        #[arg(long)]
        starter: bool,
    },
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();

    // Initialize tracing
    let filter = if cli.verbose { "debug" } else { "info" };
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(filter)),
        )
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();

    match cli.command {
        Commands::Ask {
            prompt,
            temperature,
        } => commands::ask::run(prompt, temperature).await?,
        Commands::Extract { text, file } => commands::extract::run(text, file).await?,
        Commands::Pipeline {
            name,
            set,
            intermediates,
        } => commands::pipeline::run(name, set, intermediates).await?,
        Commands::Route { input } => commands::route::run(input).await?,
        Commands::Chat {
            memory,
            window,
            max_tokens,
        } => commands::chat::run(memory, window, max_tokens).await?,
        Commands::Config { starter } => commands::config_cmd::run(starter).await?,
    }

    Ok(())
}
