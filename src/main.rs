use std::path::PathBuf;
use std::sync::Arc;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use api_rest::AppState;
use clinic_core::{
    config::{clinic_time_from_env_value, resolve_access_level_map},
    CoreConfig, FileExaminationSource, DEFAULT_DATA_DIR,
};

/// Main entry point for the clinic back-office service
///
/// Resolves configuration once, then serves the REST API (with Swagger UI at `/swagger-ui`).
///
/// # Environment Variables
/// - `CLINIC_REST_ADDR`: REST server address (default: "0.0.0.0:3000")
/// - `CLINIC_DATA_DIR`: Directory holding `examinations/<id>.yaml` (default: "clinic_data")
/// - `CLINIC_ACCESS_MAP`: YAML access-level map (default: built-in clinic map)
/// - `CLINIC_UTC_OFFSET_HOURS`: Clinic civil time offset (default: 7)
/// - `API_KEY`: Shared API key; when unset, requests are not key-checked
///
/// # Errors
/// Returns an error if:
/// - the logging/tracing configuration cannot be initialised,
/// - any configuration value is invalid,
/// - the server address cannot be bound, or
/// - the HTTP server fails while running.
#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive("clinic_run=info".parse()?)
                .add_directive("api_rest=info".parse()?)
                .add_directive("clinic_core=info".parse()?),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let addr = std::env::var("CLINIC_REST_ADDR").unwrap_or_else(|_| "0.0.0.0:3000".into());

    let data_dir =
        PathBuf::from(std::env::var("CLINIC_DATA_DIR").unwrap_or_else(|_| DEFAULT_DATA_DIR.into()));
    if !data_dir.is_dir() {
        anyhow::bail!("Clinic data directory does not exist: {}", data_dir.display());
    }

    let access_levels =
        resolve_access_level_map(std::env::var("CLINIC_ACCESS_MAP").ok().map(PathBuf::from))?;
    let clinic_time = clinic_time_from_env_value(std::env::var("CLINIC_UTC_OFFSET_HOURS").ok())?;
    let api_key = std::env::var("API_KEY").ok().filter(|k| !k.is_empty());
    if api_key.is_none() {
        tracing::warn!("API_KEY not set; requests will not be key-checked");
    }

    let cfg = Arc::new(CoreConfig::new(data_dir, access_levels, clinic_time)?);
    let examinations = Arc::new(FileExaminationSource::new(cfg.data_dir()));
    let app = api_rest::router(AppState::new(cfg, examinations, api_key));

    tracing::info!("++ Starting clinic REST API on {}", addr);

    let listener = tokio::net::TcpListener::bind(&addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}
