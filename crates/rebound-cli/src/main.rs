// Copyright 2019-2026 Maravilla Labs, operated by SOLUTAS GmbH, Switzerland
// SPDX-License-Identifier: Apache-2.0
// SPDX-License-Identifier: MIT

use clap::{Parser, Subcommand};
use rebound_cli::commands;
use std::path::PathBuf;
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "rebound")]
#[command(author = "Maravilla Labs")]
#[command(version)]
#[command(about = "Watch directories and redeploy once changes settle", long_about = None)]
struct Cli {
    /// Log level: error, warn, info, debug, trace
    #[arg(long, global = true, default_value = "warn")]
    log_level: String,

    /// Quiet mode: only show errors (useful for CI)
    #[arg(short, long, global = true)]
    quiet: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Watch directories and report each settled burst of changes
    Watch {
        /// Directory to watch (repeatable, replaces [watch].roots)
        #[arg(short, long = "dir")]
        dirs: Vec<PathBuf>,
        /// Debounce interval in milliseconds (0 disables watching)
        #[arg(short, long)]
        bouncing: Option<u64>,
    },
    /// Run a command and restart it when watched directories change
    Run {
        /// Directory to watch (repeatable, replaces [watch].roots)
        #[arg(short, long = "dir")]
        dirs: Vec<PathBuf>,
        /// Debounce interval in milliseconds (0 disables watching)
        #[arg(short, long)]
        bouncing: Option<u64>,
        /// Command to supervise (replaces [run].command)
        #[arg(last = true)]
        command: Vec<String>,
    },
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    // Initialize tracing with the specified log level
    let filter = EnvFilter::try_new(&cli.log_level)
        .unwrap_or_else(|_| EnvFilter::new("warn"));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_thread_names(true)
        .init();

    match cli.command {
        Commands::Watch { dirs, bouncing } => {
            commands::watch::run(dirs, bouncing, cli.quiet).await
        }
        Commands::Run {
            dirs,
            bouncing,
            command,
        } => commands::run::run(dirs, bouncing, command, cli.quiet).await,
    }
}
