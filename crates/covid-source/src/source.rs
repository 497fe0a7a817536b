//! The [`FeedSource`] trait and the set of feeds a refresh reads.
//!
//! The session depends on this abstraction rather than on HTTP, so a refresh
//! can run against fixtures as well as the live endpoints.

use std::{
  collections::BTreeMap,
  future::Future,
  io::ErrorKind,
  path::Path,
  sync::{Mutex, MutexGuard, PoisonError},
};

use serde_json::Value;
use strum::{Display, EnumIter, IntoEnumIterator};
use tracing::{debug, warn};

use crate::{Error, Result};

/// A raw document the dashboard reads.
#[derive(
  Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Display, EnumIter,
)]
#[strum(serialize_all = "snake_case")]
pub enum Feed {
  /// `data.json`: the national time series and the test-count log.
  Data,
  /// `states_daily.json`: wide per-state daily deltas.
  StatesDaily,
  /// `districts_daily.json`: nested district records.
  DistrictsDaily,
  /// `case_time_series.csv`: the national series as CSV. Optional; when
  /// provided it replaces the series from [`Feed::Data`].
  CaseTimeSeries,
  /// `states.csv`: long-format per-state totals. Optional.
  StateTotals,
}

impl Feed {
  /// Feeds a refresh cannot do without.
  pub fn is_required(self) -> bool {
    matches!(self, Self::Data | Self::StatesDaily | Self::DistrictsDaily)
  }

  /// The file name the feed is published under.
  pub fn file_name(self) -> &'static str {
    match self {
      Self::Data => "data.json",
      Self::StatesDaily => "states_daily.json",
      Self::DistrictsDaily => "districts_daily.json",
      Self::CaseTimeSeries => "case_time_series.csv",
      Self::StateTotals => "states.csv",
    }
  }
}

/// Something that can hand over the raw feed documents.
///
/// Methods return `Send` futures so a source can be driven from a
/// multi-threaded runtime.
pub trait FeedSource: Send + Sync {
  /// Whether `feed` is available from this source at all. Optional feeds
  /// that are not provided are skipped by the refresh.
  fn provides(&self, feed: Feed) -> bool;

  /// Fetch `feed` and decode it as JSON.
  fn fetch_json(
    &self,
    feed: Feed,
  ) -> impl Future<Output = Result<Value>> + Send + '_;

  /// Fetch `feed` as text (the CSV feeds).
  fn fetch_text(
    &self,
    feed: Feed,
  ) -> impl Future<Output = Result<String>> + Send + '_;
}

// ─── In-memory source ────────────────────────────────────────────────────────

/// A source that serves documents held in memory. Feeds that were never set
/// are not provided.
#[derive(Debug, Default)]
pub struct MemorySource {
  docs: Mutex<BTreeMap<Feed, String>>,
}

impl MemorySource {
  pub fn new() -> Self { Self::default() }

  /// Read every feed found in `dir` under its [`Feed::file_name`]. Absent
  /// files are simply not provided; a required one then fails the refresh.
  pub async fn load_dir(dir: &Path) -> Result<Self> {
    let loaded = Self::new();
    for feed in Feed::iter() {
      let path = dir.join(feed.file_name());
      match tokio::fs::read_to_string(&path).await {
        Ok(body) => loaded.set(feed, body),
        Err(e) if e.kind() == ErrorKind::NotFound => {
          if feed.is_required() {
            warn!(%feed, path = %path.display(), "required feed file missing");
          }
        }
        Err(source) => return Err(Error::Read { path, source }),
      }
    }
    debug!(dir = %dir.display(), "loaded feeds from directory");
    Ok(loaded)
  }

  pub fn with(self, feed: Feed, body: impl Into<String>) -> Self {
    self.set(feed, body);
    self
  }

  /// Replace the document for `feed`; takes effect on the next fetch.
  pub fn set(&self, feed: Feed, body: impl Into<String>) {
    self.lock().insert(feed, body.into());
  }

  pub fn remove(&self, feed: Feed) { self.lock().remove(&feed); }

  fn lock(&self) -> MutexGuard<'_, BTreeMap<Feed, String>> {
    // A poisoned map is still a valid map.
    self.docs.lock().unwrap_or_else(PoisonError::into_inner)
  }
}

impl FeedSource for MemorySource {
  fn provides(&self, feed: Feed) -> bool { self.lock().contains_key(&feed) }

  async fn fetch_json(&self, feed: Feed) -> Result<Value> {
    let text = self.fetch_text(feed).await?;
    serde_json::from_str(&text).map_err(|source| Error::Decode { feed, source })
  }

  async fn fetch_text(&self, feed: Feed) -> Result<String> {
    let body = self.lock().get(&feed).cloned();
    body.ok_or(Error::NotConfigured(feed))
  }
}
