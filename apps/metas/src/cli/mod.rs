//! # Metas CLI Module
//!
//! This module implements the CLI interface for Metas.
//!
//! ## Available Commands
//!
//! - `server` - Start the HTTP server
//! - `init` - Initialize a database with a bootstrap admin
//! - `status` - Show store counts
//! - `rollup` - Print a team's per-KR progress and weighted rollup
//! - `provision` - Provision a user as an admin actor

mod commands;

use clap::{Parser, Subcommand};
use metas_core::MetasError;
use std::path::PathBuf;

pub use commands::*;

// =============================================================================
// CLI STRUCTURE
// =============================================================================

/// Metas - OKR Tracking Server
///
/// Team-scoped Key Results with checkpoint history, on-track/bonus
/// classification, and weighted rollups. Progress is derived on read,
/// never stored.
#[derive(Parser, Debug)]
#[command(name = "metas")]
#[command(version, about, long_about = None)]
pub struct Cli {
    /// Enable verbose output
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Suppress banner output
    #[arg(short, long, global = true)]
    pub quiet: bool,

    /// Path to the document database
    #[arg(short = 'D', long, global = true, default_value = "metas.db")]
    pub database: PathBuf,

    /// Storage backend: "redb" (ACID database) or "memory" (volatile)
    #[arg(short = 'B', long, global = true, default_value = "redb")]
    pub backend: String,

    /// Output in JSON format (for programmatic access)
    #[arg(long, global = true)]
    pub json_mode: bool,

    /// Subcommand to execute
    #[command(subcommand)]
    pub command: Option<Commands>,
}

/// Available CLI commands.
#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Start HTTP server
    Server {
        /// Host to bind to
        #[arg(short = 'H', long, default_value = "127.0.0.1")]
        host: String,

        /// Port to bind to
        #[arg(short, long, default_value = "8080")]
        port: u16,
    },

    /// Initialize a new database with a bootstrap admin
    Init {
        /// Bootstrap admin email
        #[arg(long)]
        admin_email: String,

        /// Bootstrap admin password
        #[arg(long)]
        admin_password: String,

        /// Bootstrap admin display name
        #[arg(long, default_value = "Administrator")]
        admin_name: String,

        /// Force initialization even if the database exists
        #[arg(short, long)]
        force: bool,
    },

    /// Show store counts
    Status,

    /// Print a team's per-KR progress and weighted rollup
    Rollup {
        /// Team id
        #[arg(short, long)]
        team: String,
    },

    /// Provision a user (the actor must be an admin)
    Provision {
        /// Email of the admin performing the operation
        #[arg(long)]
        actor: String,

        /// New user's email
        #[arg(long)]
        email: String,

        /// New user's password
        #[arg(long)]
        password: String,

        /// New user's display name
        #[arg(long)]
        name: String,

        /// New user's role (colaborador, gestor, admin)
        #[arg(long)]
        role: String,

        /// New user's job title
        #[arg(long)]
        job_title: String,

        /// Team to assign the new user to
        #[arg(long)]
        team: Option<String>,
    },
}

// =============================================================================
// COMMAND EXECUTION
// =============================================================================

/// Execute the CLI with parsed arguments.
pub async fn execute(cli: Cli) -> Result<(), MetasError> {
    let backend = cli.backend.as_str();
    let json_mode = cli.json_mode;

    match cli.command {
        Some(Commands::Server { host, port }) => {
            cmd_server(&cli.database, backend, &host, port).await
        }
        Some(Commands::Init { admin_email, admin_password, admin_name, force }) => cmd_init(
            &cli.database,
            backend,
            json_mode,
            &admin_email,
            &admin_password,
            &admin_name,
            force,
        ),
        Some(Commands::Status) => cmd_status(&cli.database, backend, json_mode),
        Some(Commands::Rollup { team }) => cmd_rollup(&cli.database, backend, json_mode, &team),
        Some(Commands::Provision { actor, email, password, name, role, job_title, team }) => {
            cmd_provision(
                &cli.database,
                backend,
                json_mode,
                &actor,
                ProvisionArgs { email, password, name, role, job_title, team },
            )
        }
        None => {
            // No subcommand - show status by default
            cmd_status(&cli.database, backend, json_mode)
        }
    }
}
