//! LocalDB CLI
//!
//! Command-line tools for inspecting LocalDB stores.
//!
//! # Commands
//!
//! - `tree` - Print the group and instance hierarchy
//! - `inspect` - Display the meta, payload and blobs of one instance
//! - `verify` - Report leftovers of interrupted commits and broken records

mod commands;

use clap::{Parser, Subcommand};
use std::path::PathBuf;
use tracing_subscriber::EnvFilter;

/// LocalDB command-line store tools.
#[derive(Parser)]
#[command(name = "localdb")]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// Path to the store root directory
    #[arg(global = true, short, long)]
    path: Option<PathBuf>,

    /// Enable verbose output
    #[arg(global = true, short, long)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Print the group and instance hierarchy
    Tree {
        /// Maximum depth to descend (unlimited if omitted)
        #[arg(short, long)]
        depth: Option<usize>,

        /// Output format (text, json)
        #[arg(short, long, default_value = "text")]
        format: String,
    },

    /// Display the meta, payload and blobs of one instance
    Inspect {
        /// Instance path relative to the root, e.g. `Levels/One/Player`
        instance: String,

        /// Output format (text, json)
        #[arg(short, long, default_value = "text")]
        format: String,
    },

    /// Report leftover backups, temp files and broken records
    Verify {
        /// Output format (text, json)
        #[arg(short, long, default_value = "text")]
        format: String,
    },

    /// Show version information
    Version,
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();

    // Initialize logging
    let filter = if cli.verbose {
        EnvFilter::new("debug")
    } else {
        EnvFilter::new("info")
    };
    tracing_subscriber::fmt().with_env_filter(filter).init();

    match cli.command {
        Commands::Tree { depth, format } => {
            let path = cli.path.ok_or("Store path required for tree")?;
            commands::tree::run(&path, depth, &format)?;
        }
        Commands::Inspect { instance, format } => {
            let path = cli.path.ok_or("Store path required for inspect")?;
            commands::inspect::run(&path, &instance, &format)?;
        }
        Commands::Verify { format } => {
            let path = cli.path.ok_or("Store path required for verify")?;
            commands::verify::run(&path, &format)?;
        }
        Commands::Version => {
            println!("LocalDB CLI v{}", env!("CARGO_PKG_VERSION"));
            println!("LocalDB Core v{}", localdb_core::VERSION);
        }
    }

    Ok(())
}
