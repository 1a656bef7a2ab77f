//! # anoncast CLI entry point
//!
//! Parses command-line arguments and dispatches to subcommand handlers.

use std::process::ExitCode;

use clap::{Parser, Subcommand};
use tracing_subscriber::EnvFilter;

use anoncast_cli::decode::{run_decode, DecodeArgs};
use anoncast_cli::encode::{run_encode, EncodeArgs};
use anoncast_cli::roots::{run_roots, RootsArgs};
use anoncast_cli::verify::{run_verify, VerifyArgs};

/// anoncast operator tooling
///
/// Encode, decode and check anonymous submissions and root files offline.
#[derive(Parser, Debug)]
#[command(name = "anoncast", version, about, long_about = None)]
struct Cli {
    /// Enable verbose output. Repeat for more verbosity (-v, -vv, -vvv).
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    verbose: u8,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Show the message content a submission commits to.
    Decode(DecodeArgs),

    /// Build public inputs for a message, optionally with a development proof.
    Encode(EncodeArgs),

    /// Validate a roots file.
    Roots(RootsArgs),

    /// Check a submission offline against the development backend.
    Verify(VerifyArgs),
}

fn main() -> ExitCode {
    let cli = Cli::parse();

    let filter = match cli.verbose {
        0 => EnvFilter::new("warn"),
        1 => EnvFilter::new("info"),
        2 => EnvFilter::new("debug"),
        _ => EnvFilter::new("trace"),
    };

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();

    let result = match &cli.command {
        Commands::Decode(args) => run_decode(args),
        Commands::Encode(args) => run_encode(args),
        Commands::Roots(args) => run_roots(args),
        Commands::Verify(args) => run_verify(args),
    };

    match result {
        Ok(code) => ExitCode::from(code),
        Err(e) => {
            tracing::error!("{e:#}");
            eprintln!("error: {e:#}");
            ExitCode::from(1)
        }
    }
}
