//! Mini-Plutus CLI Application
//!
//! A command-line interface for building and inspecting validator scripts.

use clap::{Parser, Subcommand};
use mini_plutus::cli;
use mini_plutus::config::BuildConfig;
use mini_plutus::ledger::Network;
use mini_plutus::script::ScriptType;
use std::path::PathBuf;

#[derive(Parser)]
#[command(name = "plutus")]
#[command(author = "Darshan")]
#[command(version = "0.1.0")]
#[command(about = "Compile, inspect and benchmark tiny Plutus validators", long_about = None)]
struct Cli {
    /// Ledger language (v1, v2, v3)
    #[arg(short = 't', long, global = true)]
    script_type: Option<ScriptType>,

    /// Network for script addresses (mainnet, testnet)
    #[arg(short, long, global = true)]
    network: Option<Network>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Compile a built-in validator to a .plutus file
    Build {
        /// Validator name (always-succeeds, gift)
        validator: String,

        /// Output file (defaults to <output-dir>/<validator>/script.plutus)
        #[arg(short, long)]
        out: Option<PathBuf>,

        /// Print the envelope instead of writing it
        #[arg(long)]
        stdout: bool,

        /// Envelope description
        #[arg(short, long)]
        description: Option<String>,

        /// JSON build configuration
        #[arg(short, long)]
        config: Option<PathBuf>,
    },

    /// Show type, hash, address and program of a script
    Inspect {
        /// Script file or directory
        #[arg(short, long)]
        file: PathBuf,
    },

    /// Print the enterprise address of a script
    Address {
        /// Script file or directory
        #[arg(short, long)]
        file: PathBuf,
    },

    /// Run benchmark scenarios and print CSV rows
    Bench {
        /// Script file or directory
        #[arg(short, long)]
        file: PathBuf,

        /// Validator whose scenarios to run
        #[arg(short, long)]
        validator: String,
    },
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Initialize logger
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let cli = Cli::parse();
    let script_type = cli.script_type.unwrap_or_default();
    let network = cli.network.unwrap_or_default();

    match cli.command {
        Commands::Build {
            validator,
            out,
            stdout,
            description,
            config,
        } => {
            let mut build_config = match config {
                Some(path) => BuildConfig::from_file(&path)?,
                None => BuildConfig::default(),
            };
            if let Some(t) = cli.script_type {
                build_config.script_type = t;
            }
            if let Some(n) = cli.network {
                build_config.network = n;
            }
            if let Some(d) = description {
                build_config.description = d;
            }
            cli::cmd_build(&build_config, &validator, out.as_deref(), stdout)?;
        }

        Commands::Inspect { file } => {
            cli::cmd_inspect(&file, script_type, network)?;
        }

        Commands::Address { file } => {
            cli::cmd_address(&file, script_type, network)?;
        }

        Commands::Bench { file, validator } => {
            cli::cmd_bench(&file, script_type, &validator)?;
        }
    }

    Ok(())
}
