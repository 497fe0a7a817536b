//! National series builder.
//!
//! Pipeline:
//!   JSON rows (`cases_time_series`) or CSV records
//!     └─ column layout from the first row  → which periods are present
//!          └─ per row: date + three counts per period → NationalRow
//!               └─ NationalSeries::new → sorted, unique, contiguous

use std::collections::{BTreeMap, BTreeSet};

use chrono::NaiveDate;
use covid_core::{
  SchemaError,
  label::{Column, Metric, Period, Status},
  series::{NationalRow, NationalSeries},
};
use serde_json::Value;
use strum::IntoEnumIterator;
use tracing::debug;

use crate::{
  BuildOptions,
  cells::{self, Row},
  error::Result,
};

/// Where the date lives and which auxiliary columns are tolerated.
pub(crate) struct Layout<'a> {
  pub date_field: &'a str,
  pub ignored:    &'a [&'a str],
}

/// The layout of the `cases_time_series` array in `data.json`.
const JSON_LAYOUT: Layout<'static> = Layout {
  date_field: "date",
  ignored:    &["dateymd"],
};

/// Build the national series from the `cases_time_series` array.
pub fn national_series(
  rows: &Value,
  options: &BuildOptions,
) -> Result<NationalSeries> {
  let rows = cells::table(rows, "cases_time_series")?;
  build(&rows, &JSON_LAYOUT, "cases_time_series", options)
}

/// Shared by the JSON and CSV entry points.
pub(crate) fn build(
  rows: &[&Row],
  layout: &Layout<'_>,
  feed: &str,
  options: &BuildOptions,
) -> Result<NationalSeries> {
  let Some(first) = rows.first() else {
    return Ok(NationalSeries::default());
  };

  let columns = column_layout(first, layout, feed)?;
  let periods = present_periods(&columns)?;

  let mut out = Vec::with_capacity(rows.len());
  for (i, row) in rows.iter().enumerate() {
    let at = format!("{feed}[{i}]");
    check_fields(row, &columns, layout, &at)?;
    out.push(parse_row(row, &columns, &periods, layout, &at, options)?);
  }

  let series = NationalSeries::new(out)?;
  debug!(
    rows = series.len(),
    first = ?series.first_date(),
    last = ?series.last_date(),
    "built national series"
  );
  Ok(series)
}

/// Map each metric column of `first` to its canonical [`Column`].
fn column_layout(
  first: &Row,
  layout: &Layout<'_>,
  feed: &str,
) -> Result<BTreeMap<Column, String>, SchemaError> {
  let mut columns = BTreeMap::new();
  for key in first.keys() {
    if key == layout.date_field || layout.ignored.contains(&key.as_str()) {
      continue;
    }
    let column = Column::from_label(key)?;
    if matches!(column.metric, Metric::Active | Metric::Tested) {
      // Derived or unrelated; never trusted from the source.
      return Err(SchemaError::UnexpectedField {
        at:    format!("{feed}[0]"),
        field: key.clone(),
      });
    }
    columns.insert(column, key.clone());
  }
  Ok(columns)
}

/// A period is present when all three of its status columns are; a period
/// with only some of them cannot yield an active count.
fn present_periods(
  columns: &BTreeMap<Column, String>,
) -> Result<Vec<Period>, SchemaError> {
  let mut periods = Vec::new();
  for period in Period::iter() {
    let wanted: Vec<Column> = Status::iter()
      .map(|s| Column::new(period, s.metric()))
      .collect();
    let found = wanted.iter().filter(|c| columns.contains_key(c)).count();
    if found == wanted.len() {
      periods.push(period);
    } else if let Some(missing) =
      wanted.iter().find(|c| !columns.contains_key(c))
      && found > 0
    {
      return Err(SchemaError::IncompletePeriod {
        period,
        missing: *missing,
      });
    }
  }
  Ok(periods)
}

fn check_fields(
  row: &Row,
  columns: &BTreeMap<Column, String>,
  layout: &Layout<'_>,
  at: &str,
) -> Result<(), SchemaError> {
  let known: BTreeSet<&str> = columns
    .values()
    .map(String::as_str)
    .chain([layout.date_field])
    .chain(layout.ignored.iter().copied())
    .collect();
  if let Some(extra) = row.keys().find(|k| !known.contains(k.as_str())) {
    return Err(SchemaError::UnexpectedField {
      at:    at.to_string(),
      field: extra.clone(),
    });
  }
  Ok(())
}

fn parse_row(
  row: &Row,
  columns: &BTreeMap<Column, String>,
  periods: &[Period],
  layout: &Layout<'_>,
  at: &str,
  options: &BuildOptions,
) -> Result<NationalRow> {
  let date = parse_row_date(row, layout.date_field, at, options)?;

  let mut daily = None;
  let mut total = None;
  for &period in periods {
    let read = |status: Status| -> Result<i64> {
      let name = &columns[&Column::new(period, status.metric())];
      let cell = cells::field(row, at, name)?;
      Ok(cells::parse_count(at, name, cell, options)?)
    };
    let counts = cells::counts(
      at,
      &Column::new(period, Metric::Active).to_string(),
      read(Status::Confirmed)?,
      read(Status::Recovered)?,
      read(Status::Deceased)?,
    )?;
    match period {
      Period::Daily => daily = Some(counts),
      Period::Total => total = Some(counts),
    }
  }

  Ok(NationalRow { date, daily, total })
}

pub(crate) fn parse_row_date(
  row: &Row,
  field: &str,
  at: &str,
  options: &BuildOptions,
) -> Result<NaiveDate> {
  let cell = cells::field(row, at, field)?;
  let raw = cells::text(cell).unwrap_or_default();
  Ok(cells::parse_date(at, field, &raw, options.default_year)?)
}
