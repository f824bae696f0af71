//! Workspace entry point: runs the MHR REST server.
//!
//! Loads `.env`, initialises tracing, resolves the record data directory once into a
//! `CoreConfig`, and serves the REST API built by the `api-rest` crate.

use std::path::Path;
use std::sync::Arc;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use mhr_core::{constants::DEFAULT_RECORD_DATA_DIR, CoreConfig};

/// Main entry point for the MHR application
///
/// Starts the REST server on port 3000 (configurable via MHR_REST_ADDR) and serves the
/// maternal-health record endpoints with Swagger documentation.
///
/// # Environment Variables
/// - `MHR_REST_ADDR`: REST server address (default: "0.0.0.0:3000")
/// - `RECORD_DATA_DIR`: Directory for record storage (default: "record_data"),
///   created on startup when missing
///
/// # Returns
/// * `Ok(())` - If the server starts and runs successfully
/// * `Err(anyhow::Error)` - If server startup or runtime fails
#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();

    tracing_subscriber::registry()
        .with(tracing_subscriber::EnvFilter::from_default_env().add_directive("mhr=info".parse()?))
        .with(tracing_subscriber::fmt::layer())
        .init();

    let rest_addr = std::env::var("MHR_REST_ADDR").unwrap_or_else(|_| "0.0.0.0:3000".into());

    tracing::info!("++ Starting MHR REST on {}", rest_addr);

    let record_data_dir =
        std::env::var("RECORD_DATA_DIR").unwrap_or_else(|_| DEFAULT_RECORD_DATA_DIR.into());
    let record_data_path = Path::new(&record_data_dir);
    if !record_data_path.exists() {
        std::fs::create_dir_all(record_data_path).map_err(|e| {
            anyhow::anyhow!(
                "failed to create record data directory {}: {}",
                record_data_path.display(),
                e
            )
        })?;
    }

    let cfg = Arc::new(CoreConfig::new(record_data_path.to_path_buf()));
    let app = api_rest::app(cfg);

    let listener = tokio::net::TcpListener::bind(&rest_addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}
