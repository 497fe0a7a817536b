//! Error type for `covid-source`.

use std::path::PathBuf;

use covid_core::{ParseError, SchemaError};
use thiserror::Error;

use crate::source::Feed;

#[derive(Debug, Error)]
pub enum Error {
  #[error("failed to build HTTP client: {0}")]
  Client(#[source] reqwest::Error),

  /// Transport failure: DNS, connect, timeout or a truncated body.
  #[error("fetching {feed} from {url}: {source}")]
  Fetch {
    feed:   Feed,
    url:    String,
    #[source]
    source: reqwest::Error,
  },

  #[error("fetching {feed} from {url}: HTTP {status}")]
  Status {
    feed:   Feed,
    url:    String,
    status: reqwest::StatusCode,
  },

  #[error("feed {feed} is not valid JSON: {source}")]
  Decode {
    feed:   Feed,
    #[source]
    source: serde_json::Error,
  },

  #[error("no source configured for feed {0}")]
  NotConfigured(Feed),

  #[error("reading {}: {source}", path.display())]
  Read {
    path:   PathBuf,
    #[source]
    source: std::io::Error,
  },

  #[error("geometry {}: {source}", path.display())]
  GeometryFormat {
    path:   PathBuf,
    #[source]
    source: covid_feeds::Error,
  },

  #[error(transparent)]
  Feeds(#[from] covid_feeds::Error),
}

impl From<SchemaError> for Error {
  fn from(e: SchemaError) -> Self { Self::Feeds(e.into()) }
}

impl From<ParseError> for Error {
  fn from(e: ParseError) -> Self { Self::Feeds(e.into()) }
}

impl Error {
  /// The schema violation behind this error, if that is what it is.
  pub fn schema(&self) -> Option<&SchemaError> {
    match self {
      Self::Feeds(e) => e.schema(),
      _ => None,
    }
  }

  pub fn parse(&self) -> Option<&ParseError> {
    match self {
      Self::Feeds(e) => e.parse(),
      _ => None,
    }
  }

  /// Whether the refresh failed before any data arrived.
  pub fn is_fetch(&self) -> bool {
    matches!(
      self,
      Self::Fetch { .. } | Self::Status { .. } | Self::NotConfigured(_)
    )
  }
}

pub type Result<T, E = Error> = std::result::Result<T, E>;
