//! Builders that turn the raw dashboard feeds into the typed series of
//! `covid-core`.
//!
//! Every builder is a pure function of its input document and a
//! [`BuildOptions`]; none of them perform I/O. Fetching lives in
//! `covid-source`.

mod cells;
pub mod csv;
pub mod districts;
pub mod error;
pub mod geojoin;
pub mod national;
pub mod states;
pub mod tested;

pub use self::{
  csv::{national_from_csv, state_totals_from_csv},
  districts::district_feed,
  error::{Error, Result},
  geojoin::{FeatureCollection, GeoJoinedTable, join},
  national::national_series,
  states::state_series,
  tested::test_series,
};
use serde::Deserialize;

/// What to do with a count cell that is empty or `null`.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EmptyCellPolicy {
  /// Fail with [`covid_core::ParseError::EmptyCell`].
  #[default]
  Reject,
  /// Read the cell as zero.
  Zero,
}

/// Knobs shared by all builders.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct BuildOptions {
  /// Year assumed for dates spelled without one (`30 January`).
  pub default_year: i32,
  pub empty_cells:  EmptyCellPolicy,
}

impl Default for BuildOptions {
  fn default() -> Self {
    Self {
      default_year: 2020,
      empty_cells:  EmptyCellPolicy::Reject,
    }
  }
}
