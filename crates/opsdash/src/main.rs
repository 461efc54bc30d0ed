// SPDX-FileCopyrightText: 2026 Opsdash Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Opsdash - operations dashboard backend.
//!
//! Binary entry point: runs the write queue server, reports queue snapshots,
//! and drains queues offline.

#[cfg(not(target_env = "msvc"))]
use tikv_jemallocator::Jemalloc;

#[cfg(not(target_env = "msvc"))]
#[global_allocator]
static GLOBAL: Jemalloc = Jemalloc;

mod flush;
mod serve;
mod shutdown;
mod status;

use std::path::PathBuf;

use clap::{Parser, Subcommand};

/// Opsdash - operations dashboard backend.
#[derive(Parser, Debug)]
#[command(name = "opsdash", version, about, long_about = None)]
struct Cli {
    /// Load configuration from this file instead of the standard locations.
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Option<Commands>,
}

/// Available subcommands.
#[derive(Subcommand, Debug)]
enum Commands {
    /// Run the write queue server and its flush scheduler.
    Serve,
    /// Show how many statements each queue snapshot holds.
    Status {
        /// Output as JSON.
        #[arg(long)]
        json: bool,
    },
    /// Run one flush cycle per queue and save the snapshots, then exit.
    ///
    /// Do not run while `opsdash serve` is up: both would own the snapshots.
    Flush {
        /// Only flush this queue.
        #[arg(long)]
        queue: Option<String>,
    },
}

#[tokio::main]
async fn main() {
    let cli = Cli::parse();

    let loaded = match &cli.config {
        Some(path) => opsdash_config::load_and_validate_path(path),
        None => opsdash_config::load_and_validate(),
    };
    let config = match loaded {
        Ok(config) => config,
        Err(errors) => {
            opsdash_config::render_errors(&errors);
            std::process::exit(1);
        }
    };

    let result = match cli.command {
        Some(Commands::Serve) => serve::run_serve(config).await,
        Some(Commands::Status { json }) => status::run_status(&config, json).await,
        Some(Commands::Flush { queue }) => flush::run_flush(&config, queue.as_deref()).await,
        None => {
            println!("opsdash: use --help for available commands");
            Ok(())
        }
    };

    if let Err(e) = result {
        eprintln!("opsdash: {e}");
        std::process::exit(1);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    #[cfg(not(target_env = "msvc"))]
    fn jemalloc_is_active() {
        // Only jemalloc supports epoch advance; the system allocator would fail.
        use tikv_jemalloc_ctl::{epoch, stats};
        epoch::advance().unwrap();
        let allocated = stats::allocated::read().unwrap();
        assert!(allocated > 0, "jemalloc should report non-zero allocation");
    }

    #[test]
    fn flush_accepts_a_queue_filter() {
        let cli = Cli::try_parse_from(["opsdash", "flush", "--queue", "dashboard"]).unwrap();
        match cli.command {
            Some(Commands::Flush { queue }) => assert_eq!(queue.as_deref(), Some("dashboard")),
            other => panic!("unexpected command: {other:?}"),
        }
    }

    #[test]
    fn config_flag_is_global() {
        let cli = Cli::try_parse_from(["opsdash", "status", "--config", "/etc/dash.toml", "--json"])
            .unwrap();
        assert_eq!(cli.config, Some(PathBuf::from("/etc/dash.toml")));
        assert!(matches!(cli.command, Some(Commands::Status { json: true })));
    }
}
