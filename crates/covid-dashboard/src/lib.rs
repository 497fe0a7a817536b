//! Server assembly for the dashboard: configuration, source selection and
//! the top-level router.

use std::{
  path::{Path, PathBuf},
  sync::Arc,
};

use axum::Router;
use covid_feeds::BuildOptions;
use covid_source::{
  Feed, FeedSource, FeedUrls, GeometryConfig, HttpSource, MemorySource,
  Snapshot,
};
use serde::Deserialize;
use serde_json::Value;

// ─── Configuration ────────────────────────────────────────────────────────────

/// Runtime configuration, deserialised from `dashboard.toml` and `COVID_*`
/// environment variables (nested keys joined with `__`, e.g.
/// `COVID_FEEDS__DATA`).
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct DashboardConfig {
  pub host:      String,
  pub port:      u16,
  pub feeds:     FeedUrls,
  /// Serve feeds from local files instead of `feeds`.
  pub feeds_dir: Option<PathBuf>,
  pub geometry:  GeometryConfig,
  pub build:     BuildOptions,
}

impl Default for DashboardConfig {
  fn default() -> Self {
    Self {
      host:      "127.0.0.1".into(),
      port:      8080,
      feeds:     FeedUrls::default(),
      feeds_dir: None,
      geometry:  GeometryConfig::default(),
      build:     BuildOptions::default(),
    }
  }
}

impl DashboardConfig {
  /// Layer the (optional) file at `path` and the environment over the
  /// defaults.
  pub fn load(path: &Path) -> Result<Self, config::ConfigError> {
    Self::load_with(path, environment())
  }

  fn load_with(
    path: &Path,
    env: config::Environment,
  ) -> Result<Self, config::ConfigError> {
    config::Config::builder()
      .add_source(config::File::from(path).required(false))
      .add_source(env)
      .build()?
      .try_deserialize()
  }

  pub fn address(&self) -> String { format!("{}:{}", self.host, self.port) }
}

/// `COVID_PORT`, `COVID_FEEDS__DATA`: one underscore after the prefix, two
/// between nested keys.
fn environment() -> config::Environment {
  config::Environment::with_prefix("COVID")
    .prefix_separator("_")
    .separator("__")
    .try_parsing(true)
}

// ─── Source ──────────────────────────────────────────────────────────────────

/// The live endpoints, or a directory of previously downloaded feeds.
pub enum Source {
  Http(HttpSource),
  Local(MemorySource),
}

impl Source {
  pub async fn open(config: &DashboardConfig) -> covid_source::Result<Self> {
    match &config.feeds_dir {
      Some(dir) => Ok(Self::Local(MemorySource::load_dir(dir).await?)),
      None => Ok(Self::Http(HttpSource::new(config.feeds.clone())?)),
    }
  }
}

impl FeedSource for Source {
  fn provides(&self, feed: Feed) -> bool {
    match self {
      Self::Http(s) => s.provides(feed),
      Self::Local(s) => s.provides(feed),
    }
  }

  async fn fetch_json(&self, feed: Feed) -> covid_source::Result<Value> {
    match self {
      Self::Http(s) => s.fetch_json(feed).await,
      Self::Local(s) => s.fetch_json(feed).await,
    }
  }

  async fn fetch_text(&self, feed: Feed) -> covid_source::Result<String> {
    match self {
      Self::Http(s) => s.fetch_text(feed).await,
      Self::Local(s) => s.fetch_text(feed).await,
    }
  }
}

// ─── Router ──────────────────────────────────────────────────────────────────

/// The application router: the JSON API under `/api`.
pub fn router(snapshot: Arc<Snapshot>) -> Router {
  Router::new().nest("/api", covid_api::api_router(snapshot))
}

/// A short human-readable description of a snapshot, for `--check`.
pub fn summary(snapshot: &Snapshot) -> String {
  let series = &snapshot.national;
  let national = match (series.first_date(), series.last_date()) {
    (Some(first), Some(last)) => {
      format!("{} days ({first} .. {last})", series.len())
    }
    _ => "empty".into(),
  };
  let states = format!(
    "{} regions, last date {}",
    snapshot.states.regions().len(),
    snapshot
      .states
      .last_date()
      .map_or_else(|| "-".to_string(), |d| d.to_string())
  );
  let districts = snapshot.district_snapshot.regions().count();
  let tested = snapshot.tested.latest().map_or_else(
    || "-".to_string(),
    |p| format!("{} on {}", p.samples_tested, p.date),
  );

  format!(
    "national: {national}\nstates: {states}\ndistricts: {districts} regions\n\
     tested: {tested}\nstate totals: {}",
    if snapshot.state_totals.is_some() { "loaded" } else { "not configured" }
  )
}
