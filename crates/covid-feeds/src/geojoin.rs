//! Geo-join builder.
//!
//! Pairs the features of a polygon collection with current-status rows by
//! exact name equality. The join is inner: a feature without a status row and
//! a status row without a feature are both dropped. Drops are reported in
//! [`Coverage`] and logged, never raised.

use std::collections::{BTreeMap, BTreeSet};

use chrono::NaiveDate;
use covid_core::{
  SchemaError,
  district::DistrictRow,
  region::correct_geometry_name,
  series::{Counts, StateSeries},
};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value, json};
use tracing::{debug, warn};

use crate::error::Result;

// ─── GeoJSON ─────────────────────────────────────────────────────────────────

/// A GeoJSON feature. The geometry is carried through untouched.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Feature {
  #[serde(default)]
  pub properties: Map<String, Value>,
  #[serde(default)]
  pub geometry:   Value,
}

/// A GeoJSON feature collection.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct FeatureCollection {
  pub features: Vec<Feature>,
}

impl FeatureCollection {
  pub fn from_json(text: &str) -> Result<Self> { Ok(serde_json::from_str(text)?) }

  pub fn from_value(value: Value) -> Result<Self> {
    Ok(serde_json::from_value(value)?)
  }

  pub fn len(&self) -> usize { self.features.len() }

  pub fn is_empty(&self) -> bool { self.features.is_empty() }
}

// ─── Join ────────────────────────────────────────────────────────────────────

/// One row of a current-status table: the join key and its counts.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct StatusRow {
  pub name:   String,
  pub counts: Counts,
}

/// A feature that found its status row.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct JoinedFeature {
  /// The join key, after name correction.
  pub name:    String,
  pub counts:  Counts,
  pub feature: Feature,
}

/// What the inner join dropped.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct Coverage {
  /// Features whose name matched no status row.
  pub missing_status:   Vec<String>,
  /// Status rows whose name matched no feature.
  pub missing_geometry: Vec<String>,
}

impl Coverage {
  pub fn is_complete(&self) -> bool {
    self.missing_status.is_empty() && self.missing_geometry.is_empty()
  }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct GeoJoinedTable {
  features: Vec<JoinedFeature>,
  coverage: Coverage,
}

impl GeoJoinedTable {
  /// Matched features, in the order of the source collection.
  pub fn features(&self) -> &[JoinedFeature] { &self.features }

  pub fn coverage(&self) -> &Coverage { &self.coverage }

  pub fn get(&self, name: &str) -> Option<&JoinedFeature> {
    self.features.iter().find(|f| f.name == name)
  }

  pub fn names(&self) -> impl Iterator<Item = &str> {
    self.features.iter().map(|f| f.name.as_str())
  }

  /// A map-ready feature collection with the counts merged into each
  /// feature's properties.
  pub fn to_geojson(&self) -> Value {
    let features: Vec<Value> = self
      .features
      .iter()
      .map(|joined| {
        let mut properties = joined.feature.properties.clone();
        let counts = joined.counts;
        properties.insert("name".into(), json!(joined.name));
        properties.insert("confirmed".into(), json!(counts.confirmed()));
        properties.insert("recovered".into(), json!(counts.recovered()));
        properties.insert("deceased".into(), json!(counts.deceased()));
        properties.insert("active".into(), json!(counts.active()));
        json!({
          "type": "Feature",
          "properties": properties,
          "geometry": joined.feature.geometry,
        })
      })
      .collect();
    json!({ "type": "FeatureCollection", "features": features })
  }
}

/// Inner-join `collection` with `rows` on the feature property
/// `name_property`.
///
/// Feature names go through [`correct_geometry_name`] first. A feature that
/// lacks the name property is a schema error: the wrong property name was
/// configured. If `rows` repeats a name, the last one wins.
pub fn join(
  collection: &FeatureCollection,
  name_property: &str,
  rows: &[StatusRow],
) -> Result<GeoJoinedTable> {
  let status: BTreeMap<&str, Counts> =
    rows.iter().map(|r| (r.name.as_str(), r.counts)).collect();

  let mut features = Vec::new();
  let mut matched = BTreeSet::new();
  let mut coverage = Coverage::default();

  for (i, feature) in collection.features.iter().enumerate() {
    let name = feature
      .properties
      .get(name_property)
      .and_then(Value::as_str)
      .ok_or_else(|| SchemaError::MissingField {
        at:    format!("features[{i}].properties"),
        field: name_property.to_string(),
      })?;
    let name = correct_geometry_name(name);

    match status.get(name) {
      Some(counts) => {
        matched.insert(name);
        features.push(JoinedFeature {
          name:    name.to_string(),
          counts:  *counts,
          feature: feature.clone(),
        });
      }
      None => coverage.missing_status.push(name.to_string()),
    }
  }

  coverage.missing_geometry = status
    .keys()
    .filter(|name| !matched.contains(*name))
    .map(|name| name.to_string())
    .collect();

  if !coverage.is_complete() {
    warn!(
      missing_status = ?coverage.missing_status,
      missing_geometry = ?coverage.missing_geometry,
      "geo join dropped unmatched rows"
    );
  }
  debug!(joined = features.len(), "geo join complete");

  Ok(GeoJoinedTable { features, coverage })
}

// ─── Status tables ───────────────────────────────────────────────────────────

/// The national status table: cumulative counts per state as of `date`,
/// keyed by canonical state name. `None` when `date` is not in the series.
pub fn national_rows(series: &StateSeries, date: NaiveDate) -> Option<Vec<StatusRow>> {
  let counts = series.counts_at(date)?;
  Some(
    counts
      .into_iter()
      .map(|(region, counts)| StatusRow {
        name: region.name().to_string(),
        counts,
      })
      .collect(),
  )
}

/// A state's status table from its district snapshot, keyed by district
/// name.
pub fn district_rows(snapshot: &[DistrictRow]) -> Vec<StatusRow> {
  snapshot
    .iter()
    .map(|row| StatusRow {
      name:   row.district.clone(),
      counts: row.counts,
    })
    .collect()
}

#[cfg(test)]
mod tests {
  use covid_core::{label::Status, region::Region, series::SeriesKey};

  use super::*;

  fn collection(names: &[&str]) -> FeatureCollection {
    FeatureCollection::from_value(json!({
      "type": "FeatureCollection",
      "features": names.iter().map(|n| json!({
        "type": "Feature",
        "properties": { "st_nm": n },
        "geometry": { "type": "Point", "coordinates": [0, 0] },
      })).collect::<Vec<_>>(),
    }))
    .unwrap()
  }

  fn row(name: &str, confirmed: i64) -> StatusRow {
    StatusRow {
      name:   name.to_string(),
      counts: Counts::from_confirmed(confirmed),
    }
  }

  #[test]
  fn unmatched_status_row_is_dropped_without_error() {
    let rows = [row("A", 1), row("B", 2), row("C", 3)];
    let table = join(&collection(&["A", "C"]), "st_nm", &rows).unwrap();

    assert_eq!(table.names().collect::<Vec<_>>(), ["A", "C"]);
    assert_eq!(table.get("A").unwrap().counts.confirmed(), 1);
    assert_eq!(table.get("C").unwrap().counts.confirmed(), 3);
    assert_eq!(table.coverage().missing_geometry, ["B"]);
    assert!(table.coverage().missing_status.is_empty());
  }

  #[test]
  fn unmatched_feature_is_recorded() {
    let table = join(&collection(&["A", "Z"]), "st_nm", &[row("A", 1)]).unwrap();
    assert_eq!(table.features().len(), 1);
    assert_eq!(table.coverage().missing_status, ["Z"]);
    assert!(!table.coverage().is_complete());
  }

  #[test]
  fn misspelled_territory_is_corrected_before_joining() {
    let canonical = Region::DadraNagarHaveliDamanDiu.name();
    let geometry = collection(&["Dadra and Nagar Haveli Daman and Diu"]);
    let table = join(&geometry, "st_nm", &[row(canonical, 4)]).unwrap();
    assert_eq!(table.names().collect::<Vec<_>>(), [canonical]);
    assert!(table.coverage().is_complete());
  }

  #[test]
  fn missing_name_property_is_a_schema_error() {
    let err = join(&collection(&["A"]), "district", &[]).unwrap_err();
    assert!(matches!(
      err.schema(),
      Some(SchemaError::MissingField { field, .. }) if field == "district"
    ));
  }

  #[test]
  fn geojson_output_merges_counts_into_properties() {
    let rows = [StatusRow {
      name:   "A".to_string(),
      counts: Counts::new(10, 4, 1).unwrap(),
    }];
    let out = join(&collection(&["A"]), "st_nm", &rows)
      .unwrap()
      .to_geojson();
    assert_eq!(out["type"], "FeatureCollection");
    let props = &out["features"][0]["properties"];
    assert_eq!(props["st_nm"], "A");
    assert_eq!(props["active"], 5);
    assert_eq!(out["features"][0]["geometry"]["type"], "Point");
  }

  #[test]
  fn national_rows_use_cumulative_counts() {
    let d1 = NaiveDate::from_ymd_opt(2020, 3, 14).unwrap();
    let d2 = NaiveDate::from_ymd_opt(2020, 3, 15).unwrap();
    let mut rows = Vec::new();
    for (date, c, r) in [(d1, 5, 1), (d2, 3, 2)] {
      rows.push((SeriesKey::new(date, Status::Confirmed), vec![c]));
      rows.push((SeriesKey::new(date, Status::Recovered), vec![r]));
      rows.push((SeriesKey::new(date, Status::Deceased), vec![0]));
    }
    let series = StateSeries::new(vec![Region::Kerala], rows).unwrap();

    let table = national_rows(&series, d2).unwrap();
    assert_eq!(table, [StatusRow {
      name:   "Kerala".to_string(),
      counts: Counts::new(8, 3, 0).unwrap(),
    }]);
    assert!(national_rows(&series, NaiveDate::MIN).is_none());
  }

  #[test]
  fn district_rows_key_on_district_name() {
    let snapshot = [DistrictRow {
      district: "Ernakulam".to_string(),
      date:     NaiveDate::from_ymd_opt(2020, 5, 1).unwrap(),
      counts:   Counts::new(3, 1, 0).unwrap(),
      notes:    String::new(),
    }];
    assert_eq!(district_rows(&snapshot), [StatusRow {
      name:   "Ernakulam".to_string(),
      counts: Counts::new(3, 1, 0).unwrap(),
    }]);
  }
}
