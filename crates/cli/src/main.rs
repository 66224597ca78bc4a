//! PageState CLI - Main Entry Point

use clap::{Parser, Subcommand};
use std::path::PathBuf;

use pagestate_cli::commands::{check, consensus, distinct, sessions};
use pagestate_cli::config::{CliConfig, DEFAULT_CONFIG_FILE};
use pagestate_cli::output::{self, OutputFormat};

/// PageState CLI - cross-session page state signatures
#[derive(Parser)]
#[command(name = "pagestate")]
#[command(author, version, about, long_about = None)]
#[command(propagate_version = true)]
struct Cli {
    /// Configuration file path
    #[arg(short, long, env = "PAGESTATE_CONFIG", default_value = DEFAULT_CONFIG_FILE, global = true)]
    config: PathBuf,

    /// Output format (defaults to the configured one)
    #[arg(long, global = true)]
    format: Option<OutputFormat>,

    /// Enable verbose output
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// List recorded sessions
    Sessions(sessions::SessionsArgs),

    /// Compute the state a set of sessions agrees on
    Consensus(consensus::ConsensusArgs),

    /// Strip assertions shared between states
    Distinct(distinct::DistinctArgs),

    /// Check an observed page against an expected state
    Check(check::CheckArgs),

    /// Show the effective configuration
    Config {
        /// Write the effective configuration to the config path
        #[arg(long)]
        init: bool,
    },

    /// Show version information
    Version,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    let config = CliConfig::load(&cli.config)?;

    // Initialize logging
    let log_level = if cli.verbose { "debug" } else { config.log_level.as_str() };
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(log_level)),
        )
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();

    let format = cli.format.unwrap_or(config.output_format);
    let recordings_dir = config.recordings_dir.clone();

    match cli.command {
        Commands::Sessions(args) => sessions::execute(args, recordings_dir, format).await?,
        Commands::Consensus(args) => consensus::execute(args, recordings_dir, format).await?,
        Commands::Distinct(args) => distinct::execute(args, format)?,
        Commands::Check(args) => {
            let matched = check::execute(args, config.matcher.min_valid_assertions, format)?;
            if !matched {
                std::process::exit(1);
            }
        }
        Commands::Config { init } => {
            if init {
                config.save(&cli.config)?;
                output::print_success(&format!("Configuration written to {}", cli.config.display()));
            }
            println!("{}", toml::to_string_pretty(&config)?);
        }
        Commands::Version => {
            println!("PageState CLI v{}", env!("CARGO_PKG_VERSION"));
            println!("Assertions library v{}", pagestate_assertions::VERSION);
        }
    }

    Ok(())
}
