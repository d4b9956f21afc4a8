//! # Metas - OKR Tracking Server
//!
//! The main binary for the Metas OKR tracker.
//!
//! This application provides:
//! - HTTP REST API server (axum-based)
//! - CLI interface for store operations
//!
//! ## Architecture
//!
//! ```text
//! ┌────────────────────────────────────────────────────────┐
//! │                  apps/metas (THE BINARY)               │
//! │                                                        │
//! │   ┌─────────────┐              ┌─────────────┐         │
//! │   │   CLI       │              │   HTTP API  │         │
//! │   │  (clap)     │              │   (axum)    │         │
//! │   └──────┬──────┘              └──────┬──────┘         │
//! │          │                            │                │
//! │          └─────────────┬──────────────┘                │
//! │                        ▼                               │
//! │                ┌───────────────┐                       │
//! │                │  metas-core   │                       │
//! │                │  (THE LOGIC)  │                       │
//! │                └───────────────┘                       │
//! └────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Usage
//!
//! ```bash
//! # Create the database and bootstrap admin
//! metas init --admin-email root@example.com --admin-password changeme123
//!
//! # Start the HTTP server
//! metas server --host 0.0.0.0 --port 8080
//!
//! # CLI operations
//! metas status
//! metas rollup --team growth
//! ```

use clap::Parser;
use metas::cli;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

// =============================================================================
// APPLICATION ENTRY POINT
// =============================================================================

#[tokio::main]
async fn main() {
    // Initialize tracing — METAS_LOG_FORMAT=json enables machine-parseable output.
    let log_format = std::env::var("METAS_LOG_FORMAT").unwrap_or_else(|_| "text".to_string());

    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| "metas=info,tower_http=debug".into());

    match log_format.as_str() {
        "json" => {
            tracing_subscriber::registry()
                .with(filter)
                .with(tracing_subscriber::fmt::layer().json())
                .init();
        }
        _ => {
            tracing_subscriber::registry()
                .with(filter)
                .with(tracing_subscriber::fmt::layer())
                .init();
        }
    }

    // Parse CLI arguments
    let cli = cli::Cli::parse();

    // Display startup banner
    if !cli.quiet {
        print_banner();
    }

    // Execute command
    if let Err(e) = cli::execute(cli).await {
        tracing::error!("Error: {}", e);
        std::process::exit(1);
    }
}

/// Print the Metas startup banner.
fn print_banner() {
    println!(
        r#"
  ███╗   ███╗███████╗████████╗ █████╗ ███████╗
  ████╗ ████║██╔════╝╚══██╔══╝██╔══██╗██╔════╝
  ██╔████╔██║█████╗     ██║   ███████║███████╗
  ██║╚██╔╝██║██╔══╝     ██║   ██╔══██║╚════██║
  ██║ ╚═╝ ██║███████╗   ██║   ██║  ██║███████║
  ╚═╝     ╚═╝╚══════╝   ╚═╝   ╚═╝  ╚═╝╚══════╝

  OKR Tracking Server v{}

  Team goals • Checkpoints • Weighted rollups
"#,
        env!("CARGO_PKG_VERSION")
    );
}
