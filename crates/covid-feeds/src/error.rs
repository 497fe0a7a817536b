//! Error types for the feed builders.

use covid_core::{ParseError, SchemaError};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum Error {
  #[error(transparent)]
  Core(#[from] covid_core::Error),

  #[error("CSV error: {0}")]
  Csv(#[from] ::csv::Error),

  #[error("JSON error: {0}")]
  Json(#[from] serde_json::Error),
}

impl From<SchemaError> for Error {
  fn from(e: SchemaError) -> Self { Self::Core(e.into()) }
}

impl From<ParseError> for Error {
  fn from(e: ParseError) -> Self { Self::Core(e.into()) }
}

impl Error {
  pub fn schema(&self) -> Option<&SchemaError> {
    match self {
      Self::Core(covid_core::Error::Schema(e)) => Some(e),
      _ => None,
    }
  }

  pub fn parse(&self) -> Option<&ParseError> {
    match self {
      Self::Core(covid_core::Error::Parse(e)) => Some(e),
      _ => None,
    }
  }
}

pub type Result<T, E = Error> = std::result::Result<T, E>;
