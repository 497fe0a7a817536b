//! Date-indexed series: the national table, the per-state table keyed by
//! `(date, status)`, and the per-region [`DateFrame`] views derived from it.
//!
//! Constructors validate the invariants (ordering, uniqueness, completeness);
//! once built, a series is immutable.

use std::collections::{BTreeMap, BTreeSet};

use chrono::NaiveDate;
use serde::Serialize;
use strum::IntoEnumIterator;

use crate::{
  error::SchemaError,
  label::{Column, Metric, Period, Status},
  region::Region,
};

// ─── Counts ──────────────────────────────────────────────────────────────────

/// Confirmed, recovered and deceased counts with the derived active count.
///
/// `active` is computed in [`Counts::new`] and cannot be set independently,
/// so `active == confirmed - (recovered + deceased)` holds for every value of
/// this type.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
pub struct Counts {
  confirmed: i64,
  recovered: i64,
  deceased:  i64,
  active:    i64,
}

impl Counts {
  /// `None` when the active count does not fit in an `i64`.
  pub fn new(confirmed: i64, recovered: i64, deceased: i64) -> Option<Self> {
    Some(Self {
      confirmed,
      recovered,
      deceased,
      active: active(confirmed, recovered, deceased)?,
    })
  }

  /// Confirmed cases only; recovered and deceased are zero.
  pub fn from_confirmed(confirmed: i64) -> Self {
    Self {
      confirmed,
      active: confirmed,
      ..Self::default()
    }
  }

  pub fn confirmed(&self) -> i64 { self.confirmed }

  pub fn recovered(&self) -> i64 { self.recovered }

  pub fn deceased(&self) -> i64 { self.deceased }

  pub fn active(&self) -> i64 { self.active }

  /// The count for `status`.
  pub fn status(&self, status: Status) -> i64 {
    match status {
      Status::Confirmed => self.confirmed,
      Status::Recovered => self.recovered,
      Status::Deceased => self.deceased,
    }
  }

  /// The count for `metric`; `None` for [`Metric::Tested`], which is tracked
  /// separately.
  pub fn metric(&self, metric: Metric) -> Option<i64> {
    match metric {
      Metric::Confirmed => Some(self.confirmed),
      Metric::Recovered => Some(self.recovered),
      Metric::Deceased => Some(self.deceased),
      Metric::Active => Some(self.active),
      Metric::Tested => None,
    }
  }
}

fn active(confirmed: i64, recovered: i64, deceased: i64) -> Option<i64> {
  confirmed.checked_sub(recovered.checked_add(deceased)?)
}

// ─── National series ─────────────────────────────────────────────────────────

/// One date of the national table. A period is `None` when the feed does not
/// carry that period at all; it is never partially present.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct NationalRow {
  pub date:  NaiveDate,
  pub daily: Option<Counts>,
  pub total: Option<Counts>,
}

impl NationalRow {
  pub fn counts(&self, period: Period) -> Option<&Counts> {
    match period {
      Period::Daily => self.daily.as_ref(),
      Period::Total => self.total.as_ref(),
    }
  }

  pub fn get(&self, column: Column) -> Option<i64> {
    self.counts(column.period)?.metric(column.metric)
  }
}

/// The national time series: one row per date, dates strictly increasing and
/// contiguous.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct NationalSeries {
  rows: Vec<NationalRow>,
}

impl NationalSeries {
  /// Sort `rows` by date and validate them.
  ///
  /// Fails on a duplicated date, on a missing day between the first and last
  /// date, or when rows disagree about which periods are present.
  pub fn new(mut rows: Vec<NationalRow>) -> Result<Self, SchemaError> {
    rows.sort_by_key(|r| r.date);

    for pair in rows.windows(2) {
      let (before, after) = (&pair[0], &pair[1]);
      if before.date == after.date {
        return Err(SchemaError::DuplicateDate(after.date));
      }
      if before.date.succ_opt() != Some(after.date) {
        return Err(SchemaError::DateGap {
          before: before.date,
          after:  after.date,
        });
      }
    }

    if let Some(first) = rows.first() {
      let shape = (first.daily.is_some(), first.total.is_some());
      if let Some(odd) = rows
        .iter()
        .find(|r| (r.daily.is_some(), r.total.is_some()) != shape)
      {
        return Err(SchemaError::UnexpectedShape {
          at:       odd.date.to_string(),
          expected: "the same periods on every row",
        });
      }
    }

    Ok(Self { rows })
  }

  pub fn rows(&self) -> &[NationalRow] { &self.rows }

  pub fn len(&self) -> usize { self.rows.len() }

  pub fn is_empty(&self) -> bool { self.rows.is_empty() }

  /// The periods present in this series.
  pub fn periods(&self) -> Vec<Period> {
    let Some(first) = self.rows.first() else {
      return Vec::new();
    };
    Period::iter().filter(|p| first.counts(*p).is_some()).collect()
  }

  /// All columns present, in display order.
  pub fn columns(&self) -> Vec<Column> {
    self.periods().into_iter().flat_map(Period::columns).collect()
  }

  pub fn row(&self, date: NaiveDate) -> Option<&NationalRow> {
    self
      .rows
      .binary_search_by_key(&date, |r| r.date)
      .ok()
      .map(|i| &self.rows[i])
  }

  pub fn get(&self, date: NaiveDate, column: Column) -> Option<i64> {
    self.row(date)?.get(column)
  }

  /// One column as `(date, value)` points; `None` if the column is absent.
  pub fn column(&self, column: Column) -> Option<Vec<(NaiveDate, i64)>> {
    self
      .rows
      .iter()
      .map(|r| r.get(column).map(|v| (r.date, v)))
      .collect()
  }

  pub fn first_date(&self) -> Option<NaiveDate> {
    self.rows.first().map(|r| r.date)
  }

  pub fn last_date(&self) -> Option<NaiveDate> {
    self.rows.last().map(|r| r.date)
  }
}

// ─── State series ────────────────────────────────────────────────────────────

/// The composite key of the state table. Orders by date, then by status in
/// [`Status`] declaration order.
#[derive(
  Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize,
)]
pub struct SeriesKey {
  pub date:   NaiveDate,
  pub status: Status,
}

impl SeriesKey {
  pub fn new(date: NaiveDate, status: Status) -> Self { Self { date, status } }
}

/// Per-region daily deltas keyed by `(date, status)`.
///
/// Every date present has a row for each of the three statuses, and every row
/// has one value per entry of [`StateSeries::regions`]. Sentinel columns never
/// appear here; [`Region`] cannot represent them.
///
/// The cumulative and active views are computed with checked arithmetic when
/// the series is built, so reading them afterwards cannot overflow.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct StateSeries {
  regions:    Vec<Region>,
  rows:       BTreeMap<SeriesKey, Vec<i64>>,
  /// Indexed by `Status as usize`.
  cumulative: [DateFrame; 3],
  active:     DateFrame,
}

impl StateSeries {
  pub fn new(
    regions: Vec<Region>,
    rows: impl IntoIterator<Item = (SeriesKey, Vec<i64>)>,
  ) -> Result<Self, SchemaError> {
    let mut table = BTreeMap::new();
    for (key, values) in rows {
      if values.len() != regions.len() {
        return Err(SchemaError::RowWidth {
          at:       format!("{} / {}", key.date, key.status),
          found:    values.len(),
          expected: regions.len(),
        });
      }
      if table.insert(key, values).is_some() {
        return Err(SchemaError::DuplicateKey {
          date:   key.date,
          status: key.status,
        });
      }
    }

    let dates: BTreeSet<NaiveDate> = table.keys().map(|k| k.date).collect();
    for date in dates {
      for status in Status::iter() {
        if !table.contains_key(&SeriesKey::new(date, status)) {
          return Err(SchemaError::MissingStatus { date, status });
        }
      }
    }

    let mut series = Self {
      regions,
      rows: table,
      ..Self::default()
    };
    for status in Status::iter() {
      series.cumulative[status as usize] = series
        .daily(status)
        .checked_cumulative()
        .map_err(|cell| cell.overflow(status.metric()))?;
    }
    let [confirmed, recovered, deceased] = &series.cumulative;
    series.active = confirmed
      .checked_zip3(recovered, deceased, active)
      .map_err(|cell| cell.overflow(Metric::Active))?;
    Ok(series)
  }

  pub fn regions(&self) -> &[Region] { &self.regions }

  /// Distinct dates, ascending.
  pub fn dates(&self) -> Vec<NaiveDate> {
    let mut dates: Vec<_> = self.rows.keys().map(|k| k.date).collect();
    dates.dedup();
    dates
  }

  pub fn last_date(&self) -> Option<NaiveDate> {
    self.rows.keys().next_back().map(|k| k.date)
  }

  /// Rows in key order.
  pub fn rows(&self) -> impl Iterator<Item = (&SeriesKey, &[i64])> {
    self.rows.iter().map(|(k, v)| (k, v.as_slice()))
  }

  pub fn get(&self, key: SeriesKey, region: Region) -> Option<i64> {
    let idx = self.regions.iter().position(|r| *r == region)?;
    self.rows.get(&key).map(|v| v[idx])
  }

  /// The daily deltas for one status.
  pub fn daily(&self, status: Status) -> DateFrame {
    let rows = self
      .rows
      .iter()
      .filter(|(k, _)| k.status == status)
      .map(|(k, v)| (k.date, v.clone()))
      .collect();
    DateFrame {
      regions: self.regions.clone(),
      rows,
    }
  }

  /// Running totals for one status, summed per region in ascending date
  /// order.
  pub fn cumulative(&self, status: Status) -> DateFrame {
    self.cumulative[status as usize].clone()
  }

  /// Active cases per region and date, derived from the cumulative views:
  /// `cumulative(Confirmed) - (cumulative(Recovered) + cumulative(Deceased))`.
  pub fn active(&self) -> DateFrame { self.active.clone() }

  /// Cumulative counts per region as of `date`; `None` when the date is not
  /// in the series.
  pub fn counts_at(&self, date: NaiveDate) -> Option<BTreeMap<Region, Counts>> {
    let [confirmed, recovered, deceased] = &self.cumulative;
    let c = confirmed.row(date)?;
    let r = recovered.row(date)?;
    let d = deceased.row(date)?;
    self
      .regions
      .iter()
      .enumerate()
      .map(|(i, region)| Some((*region, Counts::new(c[i], r[i], d[i])?)))
      .collect()
  }
}

// ─── DateFrame ───────────────────────────────────────────────────────────────

/// A date-indexed table with one column per region.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct DateFrame {
  regions: Vec<Region>,
  rows:    BTreeMap<NaiveDate, Vec<i64>>,
}

impl DateFrame {
  pub fn regions(&self) -> &[Region] { &self.regions }

  pub fn len(&self) -> usize { self.rows.len() }

  pub fn is_empty(&self) -> bool { self.rows.is_empty() }

  pub fn dates(&self) -> impl Iterator<Item = NaiveDate> + '_ {
    self.rows.keys().copied()
  }

  pub fn rows(&self) -> impl Iterator<Item = (NaiveDate, &[i64])> {
    self.rows.iter().map(|(d, v)| (*d, v.as_slice()))
  }

  pub fn row(&self, date: NaiveDate) -> Option<&[i64]> {
    self.rows.get(&date).map(Vec::as_slice)
  }

  pub fn get(&self, date: NaiveDate, region: Region) -> Option<i64> {
    let idx = self.regions.iter().position(|r| *r == region)?;
    self.row(date).map(|v| v[idx])
  }

  /// One region's values as `(date, value)` points.
  pub fn column(&self, region: Region) -> Option<Vec<(NaiveDate, i64)>> {
    let idx = self.regions.iter().position(|r| *r == region)?;
    Some(self.rows.iter().map(|(d, v)| (*d, v[idx])).collect())
  }

  /// Prefix sums along the date axis, per region.
  ///
  /// The rows live in a `BTreeMap`, so iteration is always in ascending date
  /// order regardless of the order the source rows arrived in.
  fn checked_cumulative(&self) -> Result<DateFrame, Cell> {
    let mut running = vec![0i64; self.regions.len()];
    let mut rows = BTreeMap::new();
    for (date, values) in &self.rows {
      for (idx, (acc, v)) in running.iter_mut().zip(values).enumerate() {
        *acc = acc.checked_add(*v).ok_or_else(|| self.cell(*date, idx))?;
      }
      rows.insert(*date, running.clone());
    }
    Ok(DateFrame {
      regions: self.regions.clone(),
      rows,
    })
  }

  /// Combine three frames of the same series cell by cell; dates missing
  /// from either of the others are dropped.
  fn checked_zip3(
    &self,
    b: &DateFrame,
    c: &DateFrame,
    f: impl Fn(i64, i64, i64) -> Option<i64>,
  ) -> Result<DateFrame, Cell> {
    let mut rows = BTreeMap::new();
    for (date, xs) in &self.rows {
      let (Some(ys), Some(zs)) = (b.rows.get(date), c.rows.get(date)) else {
        continue;
      };
      let row = (0..xs.len())
        .map(|i| f(xs[i], ys[i], zs[i]).ok_or_else(|| self.cell(*date, i)))
        .collect::<Result<Vec<_>, _>>()?;
      rows.insert(*date, row);
    }
    Ok(DateFrame {
      regions: self.regions.clone(),
      rows,
    })
  }

  fn cell(&self, date: NaiveDate, idx: usize) -> Cell {
    Cell {
      date,
      region: self.regions.get(idx).copied(),
    }
  }
}

/// The cell where a derived view overflowed.
struct Cell {
  date:   NaiveDate,
  region: Option<Region>,
}

impl Cell {
  fn overflow(self, metric: Metric) -> SchemaError {
    let at = match self.region {
      Some(region) => format!("{} / {region}", self.date),
      None => self.date.to_string(),
    };
    SchemaError::Overflow {
      at,
      field: metric.to_string(),
    }
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  fn day(d: u32) -> NaiveDate { NaiveDate::from_ymd_opt(2020, 4, d).unwrap() }

  fn national_row(d: u32, c: i64, r: i64, x: i64) -> NationalRow {
    NationalRow {
      date:  day(d),
      daily: None,
      total: Some(Counts::new(c, r, x).unwrap()),
    }
  }

  fn two_region_series() -> StateSeries {
    let regions = vec![Region::Delhi, Region::Kerala];
    StateSeries::new(regions, [
      (SeriesKey::new(day(2), Status::Confirmed), vec![5, 1]),
      (SeriesKey::new(day(1), Status::Confirmed), vec![10, 3]),
      (SeriesKey::new(day(1), Status::Recovered), vec![2, 0]),
      (SeriesKey::new(day(1), Status::Deceased), vec![1, 0]),
      (SeriesKey::new(day(2), Status::Recovered), vec![4, 1]),
      (SeriesKey::new(day(2), Status::Deceased), vec![0, 1]),
    ])
    .unwrap()
  }

  #[test]
  fn counts_derive_active() {
    let c = Counts::new(10, 3, 2).unwrap();
    assert_eq!(c.active(), 5);
    assert_eq!(c.metric(Metric::Active), Some(5));
    assert_eq!(c.metric(Metric::Tested), None);
    assert_eq!(Counts::from_confirmed(7), Counts::new(7, 0, 0).unwrap());
  }

  #[test]
  fn counts_that_overflow_active_are_refused() {
    assert_eq!(Counts::new(i64::MAX, -1, 0), None);
    assert_eq!(Counts::new(0, i64::MAX, 1), None);
    assert_eq!(Counts::new(i64::MIN, 1, 0), None);
  }

  #[test]
  fn cumulative_overflow_is_a_schema_error() {
    let rows = [Status::Confirmed, Status::Recovered, Status::Deceased]
      .into_iter()
      .flat_map(|status| {
        let big = if status == Status::Confirmed { i64::MAX } else { 0 };
        [
          (SeriesKey::new(day(1), status), vec![1, big]),
          (SeriesKey::new(day(2), status), vec![1, big]),
        ]
      });
    let err =
      StateSeries::new(vec![Region::Goa, Region::Delhi], rows).unwrap_err();
    assert_eq!(err, SchemaError::Overflow {
      at:    format!("{} / {}", day(2), Region::Delhi),
      field: "Confirmed".to_string(),
    });
  }

  #[test]
  fn active_overflow_is_a_schema_error() {
    let err = StateSeries::new(vec![Region::Goa], [
      (SeriesKey::new(day(1), Status::Confirmed), vec![i64::MAX]),
      (SeriesKey::new(day(1), Status::Recovered), vec![-1]),
      (SeriesKey::new(day(1), Status::Deceased), vec![0]),
    ])
    .unwrap_err();
    assert!(matches!(
      err,
      SchemaError::Overflow { field, .. } if field == "Active"
    ));
  }

  #[test]
  fn national_rows_are_sorted() {
    let series = NationalSeries::new(vec![
      national_row(2, 3, 1, 0),
      national_row(1, 1, 0, 0),
    ])
    .unwrap();
    assert_eq!(series.first_date(), Some(day(1)));
    assert_eq!(series.last_date(), Some(day(2)));
    let active = Column::new(Period::Total, Metric::Active);
    assert_eq!(
      series.column(active).unwrap(),
      vec![(day(1), 1), (day(2), 2)]
    );
    assert_eq!(series.column(Column::new(Period::Daily, Metric::Active)), None);
  }

  #[test]
  fn national_duplicate_date_is_rejected() {
    let err = NationalSeries::new(vec![
      national_row(1, 1, 0, 0),
      national_row(1, 2, 0, 0),
    ])
    .unwrap_err();
    assert_eq!(err, SchemaError::DuplicateDate(day(1)));
  }

  #[test]
  fn national_gap_is_rejected() {
    let err = NationalSeries::new(vec![
      national_row(1, 1, 0, 0),
      national_row(3, 2, 0, 0),
    ])
    .unwrap_err();
    assert_eq!(err, SchemaError::DateGap {
      before: day(1),
      after:  day(3),
    });
  }

  #[test]
  fn national_columns_follow_periods() {
    let series = NationalSeries::new(vec![national_row(1, 1, 0, 0)]).unwrap();
    let labels: Vec<String> =
      series.columns().iter().map(ToString::to_string).collect();
    assert_eq!(labels, [
      "Total Confirmed",
      "Total Recovered",
      "Total Deceased",
      "Total Active"
    ]);
  }

  #[test]
  fn state_series_requires_every_status() {
    let err = StateSeries::new(vec![Region::Goa], [(
      SeriesKey::new(day(1), Status::Confirmed),
      vec![1],
    )])
    .unwrap_err();
    assert_eq!(err, SchemaError::MissingStatus {
      date:   day(1),
      status: Status::Recovered,
    });
  }

  #[test]
  fn state_series_rejects_duplicate_keys() {
    let key = SeriesKey::new(day(1), Status::Confirmed);
    let err = StateSeries::new(vec![Region::Goa], [
      (key, vec![1]),
      (key, vec![2]),
    ])
    .unwrap_err();
    assert_eq!(err, SchemaError::DuplicateKey {
      date:   day(1),
      status: Status::Confirmed,
    });
  }

  #[test]
  fn state_series_rejects_ragged_rows() {
    let err = StateSeries::new(vec![Region::Goa, Region::Assam], [(
      SeriesKey::new(day(1), Status::Confirmed),
      vec![1],
    )])
    .unwrap_err();
    assert!(matches!(err, SchemaError::RowWidth { found: 1, .. }));
  }

  #[test]
  fn keys_order_by_date_then_status() {
    let series = two_region_series();
    let keys: Vec<_> = series.rows().map(|(k, _)| *k).collect();
    assert_eq!(keys[0], SeriesKey::new(day(1), Status::Confirmed));
    assert_eq!(keys[2], SeriesKey::new(day(1), Status::Deceased));
    assert_eq!(keys[3], SeriesKey::new(day(2), Status::Confirmed));
    assert_eq!(series.dates(), vec![day(1), day(2)]);
  }

  #[test]
  fn cumulative_sums_in_date_order() {
    let series = two_region_series();
    let confirmed = series.cumulative(Status::Confirmed);
    assert_eq!(
      confirmed.column(Region::Delhi).unwrap(),
      vec![(day(1), 10), (day(2), 15)]
    );
    assert_eq!(confirmed.get(day(2), Region::Kerala), Some(4));
  }

  #[test]
  fn active_matches_cumulative_identity() {
    let series = two_region_series();
    let active = series.active();
    let c = series.cumulative(Status::Confirmed);
    let r = series.cumulative(Status::Recovered);
    let d = series.cumulative(Status::Deceased);
    for date in series.dates() {
      for region in series.regions() {
        let expected = c.get(date, *region).unwrap()
          - r.get(date, *region).unwrap()
          - d.get(date, *region).unwrap();
        assert_eq!(active.get(date, *region), Some(expected));
      }
    }
    // Delhi day 2: confirmed 15, recovered 6, deceased 1.
    assert_eq!(active.get(day(2), Region::Delhi), Some(8));
  }

  #[test]
  fn counts_at_uses_cumulative_values() {
    let series = two_region_series();
    let counts = series.counts_at(day(2)).unwrap();
    let kerala = counts[&Region::Kerala];
    assert_eq!(kerala.confirmed(), 4);
    assert_eq!(kerala.recovered(), 1);
    assert_eq!(kerala.deceased(), 1);
    assert_eq!(kerala.active(), 2);
    assert!(series.counts_at(day(9)).is_none());
  }
}
