//! typewire CLI - TypeScript client generator
//!
//! Commands:
//! - `typewire generate` - Generate the HTTP, socket, and shared artifacts
//! - `typewire check` - Validate a typewire.toml manifest without writing

use clap::{ArgAction, Parser, Subcommand};
use std::path::PathBuf;
use tracing_subscriber::EnvFilter;

mod generate;
mod manifest;

#[derive(Parser)]
#[command(name = "typewire")]
#[command(author, version, about = "TypeScript client generator for typed endpoints", long_about = None)]
struct Cli {
    /// Increase log output (-v info, -vv debug, -vvv trace); RUST_LOG wins
    #[arg(short, long, action = ArgAction::Count, global = true)]
    verbose: u8,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Generate TypeScript client artifacts
    Generate {
        /// Path to typewire.toml (default: ./typewire.toml)
        #[arg(short, long)]
        manifest: Option<PathBuf>,

        /// Output directory (default: `output` from the manifest, else ./generated)
        #[arg(short, long)]
        output: Option<PathBuf>,

        /// Skip the external formatter
        #[arg(long)]
        no_format: bool,
    },

    /// Validate a typewire.toml manifest
    Check {
        /// Path to typewire.toml (default: ./typewire.toml)
        #[arg(short, long)]
        manifest: Option<PathBuf>,
    },
}

fn init_logging(verbose: u8) {
    let default = match verbose {
        0 => "warn",
        1 => "info",
        2 => "debug",
        _ => "trace",
    };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();
}

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    init_logging(cli.verbose);

    match cli.command {
        Commands::Generate {
            manifest,
            output,
            no_format,
        } => {
            generate::run(&generate::GenerateOptions {
                manifest,
                output,
                no_format,
            })?;
        }
        Commands::Check { manifest } => {
            manifest::check(manifest)?;
        }
    }

    Ok(())
}
