//! Test-count series builder.
//!
//! The `tested` array in `data.json` is a log of report events. Each carries
//! an `updatetimestamp` (`DD/MM/YYYY HH:MM:SS`) and a cumulative
//! `totalsamplestested`; events without a sample count are skipped (their
//! timestamp must still parse), and when a date has several reports the
//! latest timestamp wins.

use std::collections::BTreeMap;

use chrono::{NaiveDateTime, NaiveTime};
use covid_core::totals::{TestPoint, TestSeries};
use serde_json::Value;
use tracing::debug;

use crate::{BuildOptions, cells, error::Result};

const FEED: &str = "tested";
const TIMESTAMP_FIELD: &str = "updatetimestamp";
const SAMPLES_FIELD: &str = "totalsamplestested";

/// Build the national test-count series from the `tested` array.
pub fn test_series(rows: &Value, options: &BuildOptions) -> Result<TestSeries> {
  let rows = cells::table(rows, FEED)?;

  let mut latest: BTreeMap<_, (NaiveDateTime, i64)> = BTreeMap::new();
  let mut skipped = 0usize;
  for (i, row) in rows.iter().enumerate() {
    let at = format!("{FEED}[{i}]");

    let stamp = cells::field(row, &at, TIMESTAMP_FIELD)?;
    let raw = cells::text(stamp).unwrap_or_default();
    let stamp = parse_timestamp(&at, &raw, options)?;

    let samples = cells::field(row, &at, SAMPLES_FIELD)?;
    let blank = match samples {
      Value::Null => true,
      Value::String(s) => s.trim().is_empty(),
      _ => false,
    };
    if blank {
      skipped += 1;
      continue;
    }
    let samples = cells::parse_count(&at, SAMPLES_FIELD, samples, options)?;

    let entry = latest.entry(stamp.date()).or_insert((stamp, samples));
    if stamp >= entry.0 {
      *entry = (stamp, samples);
    }
  }

  let points = latest
    .into_iter()
    .map(|(date, (_, samples_tested))| TestPoint {
      date,
      samples_tested,
    })
    .collect();
  let series = TestSeries::new(points)?;
  debug!(points = series.points().len(), skipped, "built test series");
  Ok(series)
}

/// `DD/MM/YYYY HH:MM:SS`, or a bare date in any spelling the other feeds use.
fn parse_timestamp(
  at: &str,
  raw: &str,
  options: &BuildOptions,
) -> Result<NaiveDateTime> {
  if let Ok(stamp) =
    NaiveDateTime::parse_from_str(raw.trim(), "%d/%m/%Y %H:%M:%S")
  {
    return Ok(stamp);
  }
  let date = cells::parse_date(at, TIMESTAMP_FIELD, raw, options.default_year)?;
  Ok(date.and_time(NaiveTime::MIN))
}

#[cfg(test)]
mod tests {
  use chrono::NaiveDate;
  use covid_core::ParseError;
  use serde_json::json;

  use super::*;

  fn build(rows: Value) -> Result<TestSeries> {
    test_series(&rows, &BuildOptions::default())
  }

  #[test]
  fn latest_report_of_the_day_wins() {
    let series = build(json!([
      { "updatetimestamp": "13/03/2020 00:00:00", "totalsamplestested": "6500" },
      { "updatetimestamp": "14/03/2020 20:00:00", "totalsamplestested": "6700" },
      { "updatetimestamp": "14/03/2020 09:00:00", "totalsamplestested": "6600" },
      { "updatetimestamp": "15/03/2020 10:00:00", "totalsamplestested": "" },
    ]))
    .unwrap();

    let points = series.points();
    assert_eq!(points.len(), 2);
    assert_eq!(points[0].date, NaiveDate::from_ymd_opt(2020, 3, 13).unwrap());
    assert_eq!(points[1].samples_tested, 6700);
  }

  #[test]
  fn bare_dates_are_accepted() {
    let series = build(json!([
      { "updatetimestamp": "2020-03-20", "totalsamplestested": 14175 },
    ]))
    .unwrap();
    assert_eq!(series.latest().unwrap().samples_tested, 14175);
  }

  #[test]
  fn non_numeric_samples_are_a_parse_error() {
    let err = build(json!([
      { "updatetimestamp": "13/03/2020 00:00:00", "totalsamplestested": "lots" },
    ]))
    .unwrap_err();
    assert!(matches!(err.parse(), Some(ParseError::InvalidCount { .. })));
  }

  #[test]
  fn bad_timestamp_is_a_parse_error() {
    let err = build(json!([
      { "updatetimestamp": "soon", "totalsamplestested": "1" },
    ]))
    .unwrap_err();
    assert!(matches!(err.parse(), Some(ParseError::InvalidDate { .. })));
  }

  #[test]
  fn bad_timestamp_on_a_blank_report_is_still_an_error() {
    let err = build(json!([
      { "updatetimestamp": "13/03/2020 00:00:00", "totalsamplestested": "6500" },
      { "updatetimestamp": "soon", "totalsamplestested": "" },
    ]))
    .unwrap_err();
    assert!(matches!(
      err.parse(),
      Some(ParseError::InvalidDate { at, .. }) if at == "tested[1]"
    ));
  }
}
