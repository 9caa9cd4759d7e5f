// SPDX-FileCopyrightText: 2026 Lumo Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Lumo - interview trainer with rubric-based evaluation.
//!
//! Binary entry point: the HTTP server plus operator commands that work
//! directly against the configured database.

#[cfg(not(target_env = "msvc"))]
use tikv_jemallocator::Jemalloc;

#[cfg(not(target_env = "msvc"))]
#[global_allocator]
static GLOBAL: Jemalloc = Jemalloc;

mod commands;
mod serve;

use std::path::PathBuf;

use clap::{Parser, Subcommand};
use lumo_config::LumoConfig;

/// Lumo - interview trainer with rubric-based evaluation.
#[derive(Parser, Debug)]
#[command(name = "lumo", version, about, long_about = None)]
struct Cli {
    /// Load configuration from this file instead of the default search path.
    #[arg(long, global = true, value_name = "PATH")]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Start the HTTP API.
    Serve,
    /// List recent sessions with their evaluation eligibility.
    Sessions {
        /// Only show sessions owned by this user.
        #[arg(long)]
        user: Option<String>,
        /// Maximum number of sessions to show.
        #[arg(long, default_value_t = 20)]
        limit: usize,
    },
    /// Evaluate one session and print the report.
    Evaluate {
        /// Session id.
        session_id: String,
    },
    /// Recompute and print a user's analytics rollup.
    Analytics {
        /// User id.
        user_id: String,
    },
}

fn load_config(path: Option<&PathBuf>) -> LumoConfig {
    let loaded = match path {
        Some(path) => lumo_config::load_and_validate_path(path),
        None => lumo_config::load_and_validate(),
    };
    match loaded {
        Ok(config) => config,
        Err(errors) => {
            lumo_config::render_errors(&errors);
            std::process::exit(1);
        }
    }
}

#[tokio::main]
async fn main() {
    let cli = Cli::parse();
    let config = load_config(cli.config.as_ref());
    init_tracing(&config.app.log_level);

    let result = match cli.command {
        Some(Commands::Serve) => serve::run_serve(config).await,
        Some(Commands::Sessions { user, limit }) => {
            commands::run_sessions(&config, user.as_deref(), limit).await
        }
        Some(Commands::Evaluate { session_id }) => {
            commands::run_evaluate(config, &session_id).await
        }
        Some(Commands::Analytics { user_id }) => commands::run_analytics(&config, &user_id).await,
        None => {
            println!("lumo: use --help for available commands");
            Ok(())
        }
    };

    if let Err(e) = result {
        eprintln!("error: {e}");
        std::process::exit(1);
    }
}

/// Installs the global subscriber. `RUST_LOG` takes precedence over `[app] log_level`.
fn init_tracing(log_level: &str) {
    use tracing_subscriber::EnvFilter;

    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(format!("lumo={log_level},warn")));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(true)
        .with_thread_names(false)
        .init();
}
