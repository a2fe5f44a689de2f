//! Operator tasks for the reelgate server
//!
//! This binary provides development utilities using the cargo-xtask pattern.
//! Run with: `cargo xtask <command>`

mod commands;
mod dirs;

use anyhow::Result;
use clap::Parser;
use commands::{BlobFetch, BlobUpload, Keygen, TailLogs};

/// Operator tasks for the reelgate server
#[derive(Parser)]
#[command(name = "xtask")]
#[command(about = "Operator tools for reelgate", long_about = None)]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Parser)]
enum Command {
    /// Monitor server logs in real-time
    TailLogs(TailLogs),

    /// Generate a sponsor key in a Sui keystore
    Keygen(Keygen),

    /// Walrus blob pool commands
    #[command(subcommand)]
    Blob(BlobCommand),
}

#[derive(Parser)]
enum BlobCommand {
    /// Upload a file through the publisher pool
    Upload(BlobUpload),

    /// Fetch a blob through the aggregator pool
    Fetch(BlobFetch),
}

fn main() -> Result<()> {
    // Load .env file if it exists (for WALRUS_* and SUI_* env vars)
    let _ = dotenvy::dotenv();

    let cli = Cli::parse();

    match cli.command {
        Command::TailLogs(cmd) => cmd.execute(),
        Command::Keygen(cmd) => cmd.execute(),
        Command::Blob(blob_cmd) => match blob_cmd {
            BlobCommand::Upload(cmd) => cmd.execute(),
            BlobCommand::Fetch(cmd) => cmd.execute(),
        },
    }
}
