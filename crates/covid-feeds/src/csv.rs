//! CSV variants of the feeds.
//!
//! `case_time_series.csv` carries the national series with spaced column
//! labels (`Daily Confirmed`) and two date columns; it goes through the same
//! builder as the JSON feed. `states.csv` is long-format cumulative totals per
//! state, including test counts, and becomes a [`StateTotals`].

use std::collections::BTreeMap;

use covid_core::{
  region::StateKey,
  series::NationalSeries,
  totals::{StateTotals, StateTotalsRow},
};
use serde::Deserialize;
use serde_json::{Map, Value};
use tracing::debug;

use crate::{
  BuildOptions,
  cells::{self, Row},
  error::Result,
  national::{self, Layout},
};

fn reader(text: &str) -> ::csv::Reader<&[u8]> {
  ::csv::ReaderBuilder::new()
    .trim(::csv::Trim::All)
    .from_reader(text.as_bytes())
}

// ─── National ────────────────────────────────────────────────────────────────

/// Build the national series from `case_time_series.csv`.
///
/// `Date_YMD` is preferred when present; the free-text `Date` column is then
/// ignored.
pub fn national_from_csv(
  text: &str,
  options: &BuildOptions,
) -> Result<NationalSeries> {
  let mut rdr = reader(text);
  let headers = rdr.headers()?.clone();

  let layout = if headers.iter().any(|h| h == "Date_YMD") {
    Layout {
      date_field: "Date_YMD",
      ignored:    &["Date"],
    }
  } else {
    Layout {
      date_field: "Date",
      ignored:    &[],
    }
  };

  let mut rows: Vec<Row> = Vec::new();
  for record in rdr.records() {
    let record = record?;
    let row: Map<String, Value> = headers
      .iter()
      .zip(record.iter())
      .map(|(h, v)| (h.to_string(), Value::String(v.to_string())))
      .collect();
    rows.push(row);
  }

  let refs: Vec<&Row> = rows.iter().collect();
  national::build(&refs, &layout, "case_time_series.csv", options)
}

// ─── State totals ────────────────────────────────────────────────────────────

#[derive(Debug, Deserialize)]
struct StateRecord {
  #[serde(rename = "Date")]
  date:      String,
  #[serde(rename = "State")]
  state:     String,
  #[serde(rename = "Confirmed")]
  confirmed: String,
  #[serde(rename = "Recovered")]
  recovered: String,
  #[serde(rename = "Deceased")]
  deceased:  String,
  #[serde(rename = "Tested", default)]
  tested:    String,
}

/// Build per-state cumulative totals from `states.csv`.
///
/// The national (`India`) and `State Unassigned` rows are dropped, `Other` is
/// ignored, and an empty `Tested` cell means the state did not report tests
/// that day.
pub fn state_totals_from_csv(
  text: &str,
  options: &BuildOptions,
) -> Result<StateTotals> {
  let mut rdr = reader(text);
  let mut by_region: BTreeMap<_, Vec<StateTotalsRow>> = BTreeMap::new();
  let mut dropped = 0usize;

  for (i, record) in rdr.deserialize::<StateRecord>().enumerate() {
    let record = record?;
    let at = format!("states.csv[{i}]");

    let region = match StateKey::from_name(&record.state)? {
      StateKey::Region(region) => region,
      StateKey::Sentinel(_) => {
        dropped += 1;
        continue;
      }
    };

    let count = |field: &str, raw: &str| {
      cells::parse_count_str(&at, field, raw, options.empty_cells)
    };
    let tested = if record.tested.is_empty() {
      None
    } else {
      Some(count("Tested", &record.tested)?)
    };

    by_region.entry(region).or_default().push(StateTotalsRow {
      date: cells::parse_date(&at, "Date", &record.date, options.default_year)?,
      counts: cells::counts(
        &at,
        "Active",
        count("Confirmed", &record.confirmed)?,
        count("Recovered", &record.recovered)?,
        count("Deceased", &record.deceased)?,
      )?,
      tested,
    });
  }

  let totals = StateTotals::new(by_region)?;
  debug!(
    regions = totals.regions().count(),
    dropped, "built state totals"
  );
  Ok(totals)
}
