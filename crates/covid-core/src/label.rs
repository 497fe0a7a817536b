//! Status, period and metric vocabularies, and the column-label splitter.
//!
//! The national feed names its columns by gluing a period token to a metric
//! token (`totalconfirmed`, `dailydeceased`); the CSV variant spells the same
//! thing with a space (`Total Confirmed`). [`Column::from_label`] accepts both
//! and always yields the canonical `"<Period> <Metric>"` display form.

use std::fmt;

use serde::{Serialize, Serializer};
use strum::{AsRefStr, Display, EnumIter, EnumString, IntoEnumIterator};

use crate::error::SchemaError;

// ─── Vocabularies ────────────────────────────────────────────────────────────

/// A per-state status as carried by the state feed.
///
/// Declaration order is the fixed enumeration order used when sorting
/// [`SeriesKey`](crate::series::SeriesKey)s.
#[derive(
  Debug,
  Clone,
  Copy,
  PartialEq,
  Eq,
  PartialOrd,
  Ord,
  Hash,
  Serialize,
  Display,
  EnumString,
  EnumIter,
  AsRefStr,
)]
#[strum(ascii_case_insensitive)]
pub enum Status {
  Confirmed,
  Recovered,
  Deceased,
}

impl Status {
  pub fn metric(self) -> Metric {
    match self {
      Self::Confirmed => Metric::Confirmed,
      Self::Recovered => Metric::Recovered,
      Self::Deceased => Metric::Deceased,
    }
  }
}

/// Whether a count is a delta since the previous day or a running total.
#[derive(
  Debug,
  Clone,
  Copy,
  PartialEq,
  Eq,
  PartialOrd,
  Ord,
  Hash,
  Serialize,
  Display,
  EnumString,
  EnumIter,
  AsRefStr,
)]
#[strum(ascii_case_insensitive)]
pub enum Period {
  Daily,
  Total,
}

impl Period {
  /// The four national columns of this period, in display order.
  pub fn columns(self) -> [Column; 4] {
    [
      Column::new(self, Metric::Confirmed),
      Column::new(self, Metric::Recovered),
      Column::new(self, Metric::Deceased),
      Column::new(self, Metric::Active),
    ]
  }
}

/// What is being counted. `Active` is always derived, never read from a feed.
#[derive(
  Debug,
  Clone,
  Copy,
  PartialEq,
  Eq,
  PartialOrd,
  Ord,
  Hash,
  Serialize,
  Display,
  EnumString,
  EnumIter,
  AsRefStr,
)]
#[strum(ascii_case_insensitive)]
pub enum Metric {
  Confirmed,
  Recovered,
  Deceased,
  Active,
  Tested,
}

// ─── Column ──────────────────────────────────────────────────────────────────

/// A national-series column: a period paired with a metric.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Column {
  pub period: Period,
  pub metric: Metric,
}

impl Column {
  pub const fn new(period: Period, metric: Metric) -> Self {
    Self { period, metric }
  }

  /// Split a raw column label into its period and metric tokens.
  ///
  /// Spaces, underscores and hyphens are removed and case is ignored; what
  /// remains must be exactly one period token followed by exactly one metric
  /// token. Nothing is matched as a substring.
  pub fn from_label(label: &str) -> Result<Self, SchemaError> {
    let compact: String = label
      .chars()
      .filter(|c| !matches!(c, ' ' | '_' | '-'))
      .collect::<String>()
      .to_ascii_lowercase();

    for period in Period::iter() {
      let token = period.as_ref().to_ascii_lowercase();
      let Some(rest) = compact.strip_prefix(token.as_str()) else {
        continue;
      };
      if let Some(metric) =
        Metric::iter().find(|m| rest.eq_ignore_ascii_case(m.as_ref()))
      {
        return Ok(Self { period, metric });
      }
    }

    Err(SchemaError::UnknownColumn(label.to_string()))
  }
}

impl fmt::Display for Column {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    write!(f, "{} {}", self.period, self.metric)
  }
}

impl Serialize for Column {
  fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
    serializer.collect_str(self)
  }
}
