//! epds-service server binary.
//!
//! Reads `config.toml` (or the path given with `--config`) layered under
//! `EPDS_*` environment variables, then serves the submission API over HTTP.

use std::{path::PathBuf, sync::Arc};

use anyhow::Context as _;
use clap::Parser;
use epds_fhir::{FhirClient, TokenCache};
use epds_service::{AppState, ServiceConfig};
use tokio::net::TcpListener;
use tower_http::trace::TraceLayer;
use tracing::level_filters::LevelFilter;
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(author, version, about = "EPDS questionnaire submission service")]
struct Cli {
  /// Path to the TOML configuration file.
  #[arg(short, long, default_value = "config.toml")]
  config: PathBuf,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
  // Initialise tracing.
  tracing_subscriber::fmt()
    .with_env_filter(
      EnvFilter::builder()
        .with_default_directive(LevelFilter::INFO.into())
        .from_env_lossy(),
    )
    .init();

  let cli = Cli::parse();

  // Load configuration.
  let settings = config::Config::builder()
    .add_source(config::File::from(cli.config).required(false))
    .add_source(epds_service::config::environment())
    .build()
    .context("failed to read configuration")?;

  let service_cfg: ServiceConfig = settings
    .try_deserialize()
    .context("failed to deserialise ServiceConfig")?;
  service_cfg.validate()?;

  let tokens = TokenCache::new(service_cfg.auth_config())
    .context("failed to build identity-service client")?;
  let store = FhirClient::new(service_cfg.fhir_config())
    .context("failed to build FHIR client")?;

  let state = AppState {
    tokens: Arc::new(tokens),
    store:  Arc::new(store),
    config: Arc::new(service_cfg.clone()),
  };

  let app = epds_service::router(state).layer(TraceLayer::new_for_http());
  let address = format!("{}:{}", service_cfg.host, service_cfg.port);

  tracing::info!("Listening on http://{address}");
  let listener = TcpListener::bind(&address)
    .await
    .with_context(|| format!("failed to bind {address}"))?;

  axum::serve(listener, app).await.context("server error")?;

  Ok(())
}
