//! Feedsync CLI
//!
//! Command-line tools for inspecting recorded feed sessions.
//!
//! # Commands
//!
//! - `replay` - Apply a recorded event log to a feed snapshot and print the result
//! - `dump-events` - List the frames of an event log

mod commands;

use clap::{Parser, Subcommand};
use std::path::PathBuf;
use tracing_subscriber::EnvFilter;

/// Feedsync command-line tools.
#[derive(Parser)]
#[command(name = "feedsync")]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// Enable verbose output
    #[arg(global = true, short, long)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Apply an event log to a feed snapshot and print the resulting state
    Replay {
        /// Path to a get-or-create-feed response (JSON)
        #[arg(short, long)]
        snapshot: PathBuf,

        /// Path to the event log (one JSON frame per line)
        #[arg(short, long)]
        events: PathBuf,

        /// Current user (defaults to the feed's creator)
        #[arg(short, long)]
        user: Option<String>,

        /// Output format (text, json)
        #[arg(short, long, default_value = "text")]
        format: String,
    },

    /// List the frames of an event log
    DumpEvents {
        /// Path to the event log (one JSON frame per line)
        #[arg(short, long)]
        events: PathBuf,

        /// Maximum number of frames to dump
        #[arg(short, long)]
        limit: Option<usize>,

        /// Output format (text, json)
        #[arg(short, long, default_value = "text")]
        format: String,
    },

    /// Show version information
    Version,
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();

    let default_level = if cli.verbose { "debug" } else { "info" };
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();

    match cli.command {
        Commands::Replay {
            snapshot,
            events,
            user,
            format,
        } => {
            commands::replay::run(&snapshot, &events, user.as_deref(), &format)?;
        }
        Commands::DumpEvents {
            events,
            limit,
            format,
        } => {
            commands::dump_events::run(&events, limit, &format)?;
        }
        Commands::Version => {
            println!("feedsync CLI v{}", env!("CARGO_PKG_VERSION"));
        }
    }

    Ok(())
}
