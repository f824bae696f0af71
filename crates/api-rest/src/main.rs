//! Standalone REST API server binary.
//!
//! ## Purpose
//! Runs the REST API server on its own.
//!
//! ## Intended use
//! This binary is useful for development and debugging when you only want the REST server
//! (with OpenAPI/Swagger UI). The workspace's main `mhr-run` binary is the deployment
//! entry point and serves the same routes.

use std::path::Path;
use std::sync::Arc;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use mhr_core::{constants::DEFAULT_RECORD_DATA_DIR, CoreConfig};

/// Main entry point for the MHR REST API server
///
/// Starts the REST API server on the configured address (default: 0.0.0.0:3000).
/// Provides HTTP endpoints for record operations with OpenAPI/Swagger documentation.
///
/// # Environment Variables
/// - `MHR_REST_ADDR`: Server address (default: "0.0.0.0:3000")
/// - `RECORD_DATA_DIR`: Directory for record storage (default: "record_data")
///
/// # Errors
/// Returns an error if:
/// - the logging/tracing configuration cannot be initialised,
/// - the record data directory does not exist,
/// - the server address cannot be bound, or
/// - the HTTP server fails while running.
#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive("api_rest=info".parse()?),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let addr = std::env::var("MHR_REST_ADDR").unwrap_or_else(|_| "0.0.0.0:3000".into());

    tracing::info!("-- Starting MHR REST API on {}", addr);

    let record_data_dir =
        std::env::var("RECORD_DATA_DIR").unwrap_or_else(|_| DEFAULT_RECORD_DATA_DIR.into());
    let record_data_path = Path::new(&record_data_dir);
    if !record_data_path.exists() {
        anyhow::bail!(
            "Record data directory does not exist: {}",
            record_data_path.display()
        );
    }

    let cfg = Arc::new(CoreConfig::new(record_data_path.to_path_buf()));
    let app = api_rest::app(cfg);

    let listener = tokio::net::TcpListener::bind(&addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}
