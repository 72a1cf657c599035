//! Teidaishu CLI, the main entry point.
//!
//! Commands:
//! - `serve`   Start the HTTP gateway
//! - `ask`     Answer a question from retrieved context
//! - `query`   Show raw similarity matches
//! - `init`    Write a default config file
//! - `doctor`  Diagnose configuration

use clap::{Parser, Subcommand};
use std::path::PathBuf;

mod commands;

#[derive(Parser)]
#[command(
    name = "teidaishu",
    about = "Teidaishu: retrieval-grounded answers over a pre-indexed corpus",
    version
)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Enable verbose logging
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Emit logs as JSON lines
    #[arg(long, global = true)]
    log_json: bool,

    /// Config file (default: ~/.teidaishu/config.toml)
    #[arg(short, long, global = true, env = "TEIDAISHU_CONFIG")]
    config: Option<PathBuf>,
}

#[derive(Subcommand)]
enum Commands {
    /// Start the HTTP gateway server
    Serve {
        /// Override the port
        #[arg(short, long)]
        port: Option<u16>,

        /// Override the bind host
        #[arg(long)]
        host: Option<String>,
    },

    /// Answer a question using retrieved context
    Ask(commands::ask::AskArgs),

    /// Run a similarity query and print the matches
    Query(commands::query::QueryArgs),

    /// Write a default configuration file
    Init {
        /// Overwrite an existing file
        #[arg(long)]
        force: bool,
    },

    /// Diagnose configuration and collaborators
    Doctor,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();

    // Logs go to stderr so command output stays pipeable.
    let filter = if cli.verbose { "debug" } else { "info" };
    let subscriber = tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(filter)),
        )
        .with_target(false)
        .with_writer(std::io::stderr);
    if cli.log_json {
        subscriber.json().init();
    } else {
        subscriber.init();
    }

    let config_path = cli.config.as_deref();
    match cli.command {
        Commands::Serve { port, host } => commands::serve::run(config_path, port, host).await?,
        Commands::Ask(args) => commands::ask::run(config_path, args).await?,
        Commands::Query(args) => commands::query::run(config_path, args).await?,
        Commands::Init { force } => commands::init::run(config_path, force).await?,
        Commands::Doctor => commands::doctor::run(config_path).await?,
    }

    Ok(())
}
