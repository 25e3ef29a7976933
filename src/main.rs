//! # Crosscut Website Entry Point
//!
//! This is the executable serving the Crosscut website. It parses command-line
//! arguments, initializes tracing, starts the server and shuts it down when
//! the process receives Ctrl-C.
//!
//! The application can be launched with optional command-line arguments:
//!
//! - First argument: Port number (defaults to 3000)
//! - Second argument: Path to configuration file (defaults to "config.json5" if it exists)
//!
//! ## Example Usage
//!
//! ```bash
//! # Run with default settings (port 3000, built-in or local config)
//! cargo run
//!
//! # Run on a specific port
//! cargo run 8080
//!
//! # Run with a specific port and configuration file
//! cargo run 8080 my-config.json5
//! ```
//!
//! Log levels can be controlled through the `RUST_LOG` environment variable.

use crosscut_website::error::WebsiteError;
use crosscut_website::server;
use std::env;
use std::path::PathBuf;
use tokio_util::sync::CancellationToken;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

#[tokio::main]
async fn main() -> Result<(), WebsiteError> {
    tracing_subscriber::registry()
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| "info".into()))
        .with(tracing_subscriber::fmt::layer())
        .init();

    let port = env::args()
        .nth(1)
        .and_then(|s| s.parse().ok())
        .unwrap_or(3000);

    let config_file_path = env::args().nth(2).map(PathBuf::from);

    tracing::info!("Starting Crosscut website");

    let cancel_token = CancellationToken::new();
    tokio::spawn({
        let cancel_token = cancel_token.clone();
        async move {
            match tokio::signal::ctrl_c().await {
                Ok(()) => {
                    tracing::info!("Received Ctrl-C, shutting down");
                    cancel_token.cancel();
                }
                Err(e) => tracing::error!("Failed to listen for Ctrl-C: {e}"),
            }
        }
    });

    server::run(port, config_file_path, cancel_token).await?;

    tracing::info!("Crosscut website shutting down");
    Ok(())
}
