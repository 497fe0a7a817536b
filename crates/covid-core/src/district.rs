//! Per-district records and the latest-snapshot view.

use std::collections::BTreeMap;

use chrono::NaiveDate;
use serde::Serialize;

use crate::{region::Region, series::Counts};

/// One daily record for a district, as reported.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DistrictRecord {
  pub date:   NaiveDate,
  pub counts: Counts,
  pub notes:  String,
}

/// The district feed after normalisation: region → district → records, with
/// each district's records kept in arrival order.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DistrictFeed {
  regions: BTreeMap<Region, BTreeMap<String, Vec<DistrictRecord>>>,
}

impl DistrictFeed {
  pub fn new(
    regions: BTreeMap<Region, BTreeMap<String, Vec<DistrictRecord>>>,
  ) -> Self {
    Self { regions }
  }

  pub fn regions(&self) -> impl Iterator<Item = Region> + '_ {
    self.regions.keys().copied()
  }

  pub fn districts(&self, region: Region) -> Vec<&str> {
    self
      .regions
      .get(&region)
      .map(|d| d.keys().map(String::as_str).collect())
      .unwrap_or_default()
  }

  /// The full time series for one district, in arrival order.
  pub fn series(&self, region: Region, district: &str) -> Option<&[DistrictRecord]> {
    self
      .regions
      .get(&region)?
      .get(district)
      .map(Vec::as_slice)
  }

  /// Reduce every district to its last record.
  ///
  /// "Last" means last in arrival order; the feed is assumed to append in
  /// chronological order. Districts with no records are omitted.
  pub fn snapshot(&self) -> DistrictSnapshot {
    let by_region = self
      .regions
      .iter()
      .map(|(region, districts)| {
        let rows = districts
          .iter()
          .filter_map(|(name, records)| {
            records.last().map(|last| DistrictRow {
              district: name.clone(),
              date:     last.date,
              counts:   last.counts,
              notes:    last.notes.clone(),
            })
          })
          .collect();
        (*region, rows)
      })
      .collect();
    DistrictSnapshot { by_region }
  }
}

/// A district's latest record with the district name attached.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DistrictRow {
  pub district: String,
  pub date:     NaiveDate,
  pub counts:   Counts,
  pub notes:    String,
}

/// One flat table of [`DistrictRow`]s per region.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DistrictSnapshot {
  by_region: BTreeMap<Region, Vec<DistrictRow>>,
}

impl DistrictSnapshot {
  pub fn regions(&self) -> impl Iterator<Item = Region> + '_ {
    self.by_region.keys().copied()
  }

  pub fn region(&self, region: Region) -> Option<&[DistrictRow]> {
    self.by_region.get(&region).map(Vec::as_slice)
  }
}
