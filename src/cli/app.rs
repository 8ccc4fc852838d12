//! Main CLI application structure

use std::path::PathBuf;

use anyhow::Result;
use clap::{Parser, Subcommand};
use tracing_subscriber::EnvFilter;

use super::output::{Output, OutputFormat};
use super::resolve;

/// Environment variable holding the log filter
pub const LOG_ENV: &str = "SMAKE_LOG";

#[derive(Parser)]
#[command(name = "smake")]
#[command(author, version, about = "Resolves build projects into resource dependency graphs")]
#[command(propagate_version = true)]
pub struct Cli {
    /// Output format
    #[arg(long, short = 'f', global = true, default_value = "text")]
    pub format: OutputFormat,

    /// Enable debug logging on stderr
    #[arg(long, short = 'v', global = true)]
    pub verbose: bool,

    /// Additional configuration file, read after the global and project ones
    #[arg(long, short = 'c', global = true)]
    pub config: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Resolve a project and show its resources and dependencies
    Resolve {
        /// Project manifest
        #[arg(default_value = "smake.toml")]
        manifest: PathBuf,
    },

    /// Show the resources of a project in build order
    Order {
        /// Project manifest
        #[arg(default_value = "smake.toml")]
        manifest: PathBuf,

        /// Only order what this resource needs (`type@path`, or a target path)
        #[arg(long = "target", short = 't')]
        targets: Vec<String>,
    },
}

/// Installs the stderr log subscriber
///
/// `SMAKE_LOG` takes precedence; otherwise only warnings are shown, or
/// debug events with `--verbose`.
fn init_logging(verbose: bool) {
    let default = if verbose { "debug" } else { "warn" };
    let filter = EnvFilter::try_from_env(LOG_ENV).unwrap_or_else(|_| EnvFilter::new(default));

    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .try_init();
}

/// Main entry point for the CLI
pub fn run() -> Result<()> {
    let cli = Cli::parse();
    init_logging(cli.verbose);
    let output = Output::new(cli.format);

    match cli.command {
        Commands::Resolve { manifest } => resolve::resolve(&output, &manifest, cli.config.as_deref())?,
        Commands::Order { manifest, targets } => {
            resolve::order(&output, &manifest, cli.config.as_deref(), &targets)?
        }
    }

    Ok(())
}
