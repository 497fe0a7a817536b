//! State series builder.
//!
//! The state feed is wide: one row per `(date, status)` and one column per
//! state code, holding daily deltas. Column codes are resolved through the
//! normalisation table (an unknown code aborts the build), the sentinel
//! columns `tt`/`un` are dropped without being read, and the remaining cells
//! are parsed into a [`StateSeries`].

use std::{collections::BTreeMap, str::FromStr};

use covid_core::{
  SchemaError,
  label::Status,
  region::{Region, StateKey},
  series::{SeriesKey, StateSeries},
};
use serde_json::Value;
use tracing::debug;

use crate::{
  BuildOptions,
  cells::{self, Row},
  error::Result,
  national::parse_row_date,
};

const FEED: &str = "states_daily";
const DATE_FIELD: &str = "date";
const STATUS_FIELD: &str = "status";
const IGNORED: &[&str] = &["dateymd"];

/// Build the per-state series from the `states_daily` array.
pub fn state_series(rows: &Value, options: &BuildOptions) -> Result<StateSeries> {
  let rows = cells::table(rows, FEED)?;
  let Some(first) = rows.first() else {
    return Ok(StateSeries::default());
  };

  let header = Header::from_row(first)?;
  let regions: Vec<Region> = header.regions.keys().copied().collect();

  let mut keyed = Vec::with_capacity(rows.len());
  for (i, row) in rows.iter().enumerate() {
    let at = format!("{FEED}[{i}]");
    header.check(row, &at)?;

    let date = parse_row_date(row, DATE_FIELD, &at, options)?;
    let status = parse_status(row, &at)?;
    let values = header
      .regions
      .values()
      .map(|code| {
        let cell = cells::field(row, &at, code)?;
        Ok(cells::parse_count(&at, code, cell, options)?)
      })
      .collect::<Result<Vec<i64>>>()?;

    keyed.push((SeriesKey::new(date, status), values));
  }

  let series = StateSeries::new(regions, keyed)?;
  debug!(
    regions = series.regions().len(),
    dates = series.dates().len(),
    dropped = ?header.sentinels,
    "built state series"
  );
  Ok(series)
}

/// The column layout taken from the first row.
struct Header {
  /// Real regions, in region order, with the source column name.
  regions:   BTreeMap<Region, String>,
  /// Sentinel columns present in the feed; dropped unread.
  sentinels: Vec<String>,
}

impl Header {
  fn from_row(row: &Row) -> Result<Self, SchemaError> {
    let mut regions = BTreeMap::new();
    let mut sentinels = Vec::new();
    for key in row.keys().filter(|k| !is_meta(k)) {
      match StateKey::from_code(key)? {
        StateKey::Region(region) => {
          if regions.insert(region, key.clone()).is_some() {
            return Err(SchemaError::UnexpectedField {
              at:    format!("{FEED}[0]"),
              field: key.clone(),
            });
          }
        }
        StateKey::Sentinel(_) => sentinels.push(key.clone()),
      }
    }
    Ok(Self { regions, sentinels })
  }

  /// Every row must carry exactly the columns of the first.
  fn check(&self, row: &Row, at: &str) -> Result<(), SchemaError> {
    for code in self.regions.values().chain(&self.sentinels) {
      if !row.contains_key(code) {
        return Err(SchemaError::MissingField {
          at:    at.to_string(),
          field: code.clone(),
        });
      }
    }
    for key in row.keys().filter(|k| !is_meta(k)) {
      let known = self.regions.values().chain(&self.sentinels).any(|c| c == key);
      if !known {
        StateKey::from_code(key)?;
        return Err(SchemaError::UnexpectedField {
          at:    at.to_string(),
          field: key.clone(),
        });
      }
    }
    Ok(())
  }
}

fn is_meta(key: &str) -> bool {
  key == DATE_FIELD || key == STATUS_FIELD || IGNORED.contains(&key)
}

fn parse_status(row: &Row, at: &str) -> Result<Status, SchemaError> {
  let cell = cells::field(row, at, STATUS_FIELD)?;
  let raw = cells::text(cell).unwrap_or_default();
  Status::from_str(raw.trim())
    .map_err(|_| SchemaError::UnknownStatus(raw.into_owned()))
}

#[cfg(test)]
mod tests {
  use chrono::NaiveDate;
  use covid_core::ParseError;
  use serde_json::{Value, json};

  use super::*;
  use crate::EmptyCellPolicy;

  fn day(d: u32) -> NaiveDate { NaiveDate::from_ymd_opt(2020, 3, d).unwrap() }

  fn row(date: &str, status: &str, dl: &str, kl: &str, tt: &str) -> Value {
    json!({ "date": date, "status": status, "dl": dl, "kl": kl, "tt": tt, "un": "0" })
  }

  fn feed() -> Vec<Value> {
    vec![
      row("14-Mar-20", "Confirmed", "7", "19", "81"),
      row("14-Mar-20", "Recovered", "1", "3", "9"),
      row("14-Mar-20", "Deceased", "1", "0", "2"),
      row("15-Mar-20", "Confirmed", "0", "3", "27"),
      row("15-Mar-20", "Recovered", "1", "0", "4"),
      row("15-Mar-20", "Deceased", "0", "0", "0"),
      row("16-Mar-20", "Confirmed", "1", "2", "15"),
      row("16-Mar-20", "Recovered", "0", "1", "1"),
      row("16-Mar-20", "Deceased", "0", "1", "0"),
    ]
  }

  fn build(rows: Vec<Value>) -> Result<StateSeries> {
    state_series(&Value::Array(rows), &BuildOptions::default())
  }

  #[test]
  fn live_feed_dates_parse() {
    let series = build(feed()).unwrap();
    assert_eq!(series.dates(), [day(14), day(15), day(16)]);
  }

  #[test]
  fn sentinels_never_become_columns() {
    let series = build(feed()).unwrap();
    assert_eq!(series.regions(), [Region::Delhi, Region::Kerala]);
    let active = series.active();
    assert_eq!(active.regions(), [Region::Delhi, Region::Kerala]);
  }

  #[test]
  fn active_is_derived_from_cumulative_views() {
    let series = build(feed()).unwrap();
    let active = series.active();
    // Kerala: confirmed 19+3+2=24, recovered 3+0+1=4, deceased 0+0+1=1.
    assert_eq!(active.get(day(16), Region::Kerala), Some(19));
    // Delhi on the 15th: confirmed 7, recovered 2, deceased 1.
    assert_eq!(active.get(day(15), Region::Delhi), Some(4));
    for date in series.dates() {
      for &region in series.regions() {
        let cum = |s| series.cumulative(s).get(date, region).unwrap();
        assert_eq!(
          active.get(date, region).unwrap(),
          cum(Status::Confirmed) - cum(Status::Recovered) - cum(Status::Deceased)
        );
      }
    }
  }

  #[test]
  fn row_permutation_does_not_change_cumulative_values() {
    let ordered = build(feed()).unwrap();
    let mut shuffled_rows = feed();
    shuffled_rows.reverse();
    shuffled_rows.swap(0, 4);
    shuffled_rows.swap(2, 7);
    let shuffled = build(shuffled_rows).unwrap();

    for status in [Status::Confirmed, Status::Recovered, Status::Deceased] {
      assert_eq!(ordered.cumulative(status), shuffled.cumulative(status));
    }
    assert_eq!(ordered.active(), shuffled.active());
    assert_eq!(ordered, shuffled);
  }

  #[test]
  fn unknown_state_code_is_a_schema_error() {
    let mut rows = feed();
    rows[0]["zz"] = json!("1");
    let err = build(rows).unwrap_err();
    assert_eq!(
      err.schema(),
      Some(&SchemaError::UnknownStateCode("zz".to_string()))
    );
  }

  #[test]
  fn unknown_code_on_a_later_row_is_a_schema_error() {
    let mut rows = feed();
    rows[4]["zz"] = json!("1");
    let err = build(rows).unwrap_err();
    assert_eq!(
      err.schema(),
      Some(&SchemaError::UnknownStateCode("zz".to_string()))
    );
  }

  #[test]
  fn unknown_status_is_a_schema_error() {
    let mut rows = feed();
    rows[1]["status"] = json!("Migrated");
    let err = build(rows).unwrap_err();
    assert_eq!(
      err.schema(),
      Some(&SchemaError::UnknownStatus("Migrated".to_string()))
    );
  }

  #[test]
  fn missing_status_row_is_a_schema_error() {
    let mut rows = feed();
    rows.remove(5);
    let err = build(rows).unwrap_err();
    assert!(matches!(
      err.schema(),
      Some(SchemaError::MissingStatus { status: Status::Deceased, .. })
    ));
  }

  #[test]
  fn empty_cells_are_rejected_by_default() {
    let mut rows = feed();
    rows[3]["kl"] = json!("");
    let err = build(rows).unwrap_err();
    assert!(matches!(
      err.parse(),
      Some(ParseError::EmptyCell { field, .. }) if field == "kl"
    ));
  }

  #[test]
  fn empty_cells_may_be_zeroed_explicitly() {
    let mut rows = feed();
    rows[3]["kl"] = json!("");
    let options = BuildOptions {
      empty_cells: EmptyCellPolicy::Zero,
      ..BuildOptions::default()
    };
    let series = state_series(&Value::Array(rows), &options).unwrap();
    assert_eq!(
      series.get(SeriesKey::new(day(15), Status::Confirmed), Region::Kerala),
      Some(0)
    );
  }

  #[test]
  fn sentinel_cells_are_not_parsed() {
    let mut rows = feed();
    rows[0]["tt"] = json!("");
    assert!(build(rows).is_ok());
  }

  #[test]
  fn cumulative_overflow_is_an_error_not_a_panic() {
    let mut rows = feed();
    rows[0]["dl"] = json!("9223372036854775807");
    rows[3]["dl"] = json!("9223372036854775807");
    let err = build(rows).unwrap_err();
    assert!(matches!(
      err.schema(),
      Some(SchemaError::Overflow { field, .. }) if field == "Confirmed"
    ));
  }

  #[test]
  fn codes_differing_only_in_case_are_rejected() {
    let mut rows = feed();
    for row in &mut rows {
      row["DL"] = row["dl"].clone();
    }
    let err = build(rows).unwrap_err();
    assert!(matches!(
      err.schema(),
      Some(SchemaError::UnexpectedField { at, field })
        if at == "states_daily[0]" && field.eq_ignore_ascii_case("dl")
    ));
  }

  #[test]
  fn missing_region_column_is_a_schema_error() {
    let mut rows = feed();
    rows[2].as_object_mut().unwrap().remove("kl");
    let err = build(rows).unwrap_err();
    assert!(matches!(
      err.schema(),
      Some(SchemaError::MissingField { field, .. }) if field == "kl"
    ));
  }
}
