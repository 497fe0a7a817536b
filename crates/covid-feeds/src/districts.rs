//! District feed normaliser.
//!
//! The district feed is nested: state → district → list of daily records, in
//! arrival order. State keys are codes in some revisions of the feed and full
//! names in others; both resolve through the normalisation table. Sentinel
//! buckets are skipped.

use std::collections::BTreeMap;

use covid_core::{
  SchemaError,
  district::{DistrictFeed, DistrictRecord},
  region::StateKey,
};
use serde_json::Value;
use tracing::{debug, warn};

use crate::{BuildOptions, cells, error::Result, national::parse_row_date};

/// Some revisions wrap the payload in a single top-level key.
const WRAPPER_KEY: &str = "districtsDaily";

/// Normalise the nested district feed.
pub fn district_feed(doc: &Value, options: &BuildOptions) -> Result<DistrictFeed> {
  let doc = doc.get(WRAPPER_KEY).unwrap_or(doc);
  let states = doc.as_object().ok_or_else(|| SchemaError::UnexpectedShape {
    at:       "districts".to_string(),
    expected: "an object keyed by state",
  })?;

  let mut regions = BTreeMap::new();
  for (state_key, districts) in states {
    let region = match StateKey::from_code_or_name(state_key)? {
      StateKey::Region(region) => region,
      StateKey::Sentinel(sentinel) => {
        debug!(code = sentinel.code(), "skipping sentinel bucket in district feed");
        continue;
      }
    };

    let districts = districts.as_object().ok_or_else(|| {
      SchemaError::UnexpectedShape {
        at:       state_key.clone(),
        expected: "an object keyed by district",
      }
    })?;

    let mut parsed = BTreeMap::new();
    for (district, records) in districts {
      let at = format!("{state_key}/{district}");
      let rows = cells::table(records, &at)?;
      let mut out = Vec::with_capacity(rows.len());
      for (i, row) in rows.iter().enumerate() {
        let at = format!("{at}[{i}]");
        let count = |name: &str| -> Result<i64> {
          let cell = cells::field(row, &at, name)?;
          Ok(cells::parse_count(&at, name, cell, options)?)
        };
        let notes = row
          .get("notes")
          .and_then(Value::as_str)
          .unwrap_or_default()
          .to_string();
        out.push(DistrictRecord {
          date: parse_row_date(row, "date", &at, options)?,
          counts: cells::counts(
            &at,
            "active",
            count("confirmed")?,
            count("recovered")?,
            count("deceased")?,
          )?,
          notes,
        });
      }

      if out.windows(2).any(|w| w[1].date < w[0].date) {
        warn!(
          state = region.name(),
          district = district.as_str(),
          "district records are not in chronological order; the snapshot \
           uses the last record received"
        );
      }
      parsed.insert(district.clone(), out);
    }

    if regions.insert(region, parsed).is_some() {
      // A code and a full name for the same region in one payload.
      return Err(
        SchemaError::UnexpectedField {
          at:    "districts".to_string(),
          field: state_key.clone(),
        }
        .into(),
      );
    }
  }

  Ok(DistrictFeed::new(regions))
}

#[cfg(test)]
mod tests {
  use chrono::NaiveDate;
  use covid_core::{ParseError, region::Region};
  use serde_json::json;

  use super::*;

  fn build(doc: Value) -> Result<DistrictFeed> {
    district_feed(&doc, &BuildOptions::default())
  }

  fn payload() -> Value {
    json!({
      "districtsDaily": {
        "kl": {
          "Ernakulam": [
            { "date": "2020-04-21", "confirmed": 24, "recovered": 20, "deceased": 0, "active": 4, "notes": "" },
            { "date": "2020-04-22", "confirmed": "25", "recovered": "21", "deceased": "0", "notes": "1 new" }
          ],
          "Idukki": [
            { "date": "2020-04-22", "confirmed": 10, "recovered": 10, "deceased": 0 }
          ]
        },
        "Delhi": {
          "Unknown": [
            { "date": "2020-04-22", "confirmed": 2248, "recovered": 724, "deceased": 48, "notes": "" }
          ]
        },
        "tt": {}
      }
    })
  }

  #[test]
  fn snapshot_is_last_record_with_district_name() {
    let feed = build(payload()).unwrap();
    let snapshot = feed.snapshot();

    let kerala = snapshot.region(Region::Kerala).unwrap();
    assert_eq!(kerala.len(), 2);
    assert_eq!(kerala[0].district, "Ernakulam");
    assert_eq!(kerala[0].counts.confirmed(), 25);
    assert_eq!(kerala[0].counts.active(), 4);
    assert_eq!(kerala[0].notes, "1 new");
    assert_eq!(kerala[1].notes, "");

    let delhi = snapshot.region(Region::Delhi).unwrap();
    assert_eq!(delhi[0].district, "Unknown");
    assert_eq!(snapshot.regions().count(), 2);
  }

  #[test]
  fn series_keeps_every_record() {
    let feed = build(payload()).unwrap();
    let series = feed.series(Region::Kerala, "Ernakulam").unwrap();
    assert_eq!(series.len(), 2);
    assert_eq!(series[0].date, NaiveDate::from_ymd_opt(2020, 4, 21).unwrap());
  }

  #[test]
  fn unwrapped_payload_is_accepted() {
    let doc = payload()["districtsDaily"].clone();
    assert_eq!(build(doc).unwrap(), build(payload()).unwrap());
  }

  #[test]
  fn out_of_order_records_still_take_the_last() {
    let feed = build(json!({
      "ga": {
        "North Goa": [
          { "date": "2020-05-02", "confirmed": 5, "recovered": 0, "deceased": 0 },
          { "date": "2020-05-01", "confirmed": 4, "recovered": 0, "deceased": 0 }
        ]
      }
    }))
    .unwrap();
    let rows = feed.snapshot();
    let goa = rows.region(Region::Goa).unwrap();
    assert_eq!(goa[0].counts.confirmed(), 4);
  }

  #[test]
  fn unknown_state_key_is_a_schema_error() {
    let err = build(json!({ "Atlantis": {} })).unwrap_err();
    assert_eq!(
      err.schema(),
      Some(&SchemaError::UnknownStateName("Atlantis".to_string()))
    );
  }

  #[test]
  fn bad_count_is_a_parse_error() {
    let err = build(json!({
      "ga": { "South Goa": [ { "date": "2020-05-01", "confirmed": "n/a", "recovered": 0, "deceased": 0 } ] }
    }))
    .unwrap_err();
    assert!(matches!(err.parse(), Some(ParseError::InvalidCount { .. })));
  }

  #[test]
  fn missing_field_is_a_schema_error() {
    let err = build(json!({
      "ga": { "South Goa": [ { "date": "2020-05-01", "confirmed": 1, "recovered": 0 } ] }
    }))
    .unwrap_err();
    assert!(matches!(
      err.schema(),
      Some(SchemaError::MissingField { field, .. }) if field == "deceased"
    ));
  }

  #[test]
  fn same_region_twice_is_rejected() {
    let err = build(json!({ "ga": {}, "Goa": {} })).unwrap_err();
    assert!(matches!(err.schema(), Some(SchemaError::UnexpectedField { .. })));
  }
}
