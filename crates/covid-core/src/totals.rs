//! Series that only some feeds provide: national test counts and the
//! long-format per-state cumulative table.

use std::collections::BTreeMap;

use chrono::NaiveDate;
use serde::Serialize;

use crate::{error::SchemaError, region::Region, series::Counts};

/// Cumulative samples tested nationally on a date.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct TestPoint {
  pub date:           NaiveDate,
  pub samples_tested: i64,
}

/// National test counts, one point per date, ascending.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct TestSeries {
  points: Vec<TestPoint>,
}

impl TestSeries {
  pub fn new(mut points: Vec<TestPoint>) -> Result<Self, SchemaError> {
    points.sort_by_key(|p| p.date);
    if let Some(pair) = points.windows(2).find(|w| w[0].date == w[1].date) {
      return Err(SchemaError::DuplicateDate(pair[1].date));
    }
    Ok(Self { points })
  }

  pub fn points(&self) -> &[TestPoint] { &self.points }

  pub fn latest(&self) -> Option<&TestPoint> { self.points.last() }
}

/// One dated row of a region's cumulative totals.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct StateTotalsRow {
  pub date:   NaiveDate,
  pub counts: Counts,
  /// `None` where the feed has not reported a test count.
  pub tested: Option<i64>,
}

/// Cumulative per-region totals, each region's rows ascending by date.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct StateTotals {
  by_region: BTreeMap<Region, Vec<StateTotalsRow>>,
}

impl StateTotals {
  pub fn new(
    by_region: BTreeMap<Region, Vec<StateTotalsRow>>,
  ) -> Result<Self, SchemaError> {
    let mut by_region = by_region;
    for rows in by_region.values_mut() {
      rows.sort_by_key(|r| r.date);
      if let Some(pair) = rows.windows(2).find(|w| w[0].date == w[1].date) {
        return Err(SchemaError::DuplicateDate(pair[1].date));
      }
    }
    Ok(Self { by_region })
  }

  pub fn regions(&self) -> impl Iterator<Item = Region> + '_ {
    self.by_region.keys().copied()
  }

  pub fn region(&self, region: Region) -> Option<&[StateTotalsRow]> {
    self.by_region.get(&region).map(Vec::as_slice)
  }
}
