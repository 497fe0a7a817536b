//! covid-dashboard server binary.
//!
//! Reads `dashboard.toml` (or the path given with `--config`), loads the
//! static geometry, runs one refresh and serves the resulting snapshot as a
//! read-only JSON API.
//!
//! ```text
//! cargo run -p covid-dashboard -- --check
//! ```

use std::path::PathBuf;

use anyhow::Context as _;
use clap::Parser;
use covid_dashboard::{DashboardConfig, Source};
use covid_source::{Dashboard, GeometrySet};
use tokio::net::TcpListener;
use tracing::level_filters::LevelFilter;
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(author, version, about = "India COVID-19 dashboard data server")]
struct Cli {
  /// Path to the TOML configuration file.
  #[arg(short, long, default_value = "dashboard.toml")]
  config: PathBuf,

  /// Refresh once, print a summary of the snapshot and exit.
  #[arg(long)]
  check: bool,
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

  let config = DashboardConfig::load(&cli.config)
    .with_context(|| format!("failed to load config from {:?}", cli.config))?;

  let geometry = GeometrySet::load(&config.geometry)
    .await
    .context("failed to load geometry")?;
  let source = Source::open(&config)
    .await
    .context("failed to open feed source")?;

  let mut dashboard = Dashboard::new(source, geometry, config.build);
  let snapshot = dashboard.refresh().await.context("initial refresh failed")?;

  if cli.check {
    println!("{}", covid_dashboard::summary(&snapshot));
    return Ok(());
  }

  let app = covid_dashboard::router(snapshot);
  let address = config.address();

  tracing::info!("Listening on http://{address}");
  let listener = TcpListener::bind(&address)
    .await
    .with_context(|| format!("failed to bind {address}"))?;

  axum::serve(listener, app).await.context("server error")?;

  Ok(())
}
