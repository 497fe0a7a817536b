//! Handlers for the map-ready GeoJSON endpoints.
//!
//! Both return a `FeatureCollection` whose feature properties carry the
//! joined counts. Coverage gaps are not errors; they only shrink the output.

use std::sync::Arc;

use axum::{
  Json,
  extract::{Path, Query, State},
};
use chrono::NaiveDate;
use covid_source::Snapshot;
use serde::Deserialize;
use serde_json::Value;

use crate::{error::ApiError, regions::resolve};

#[derive(Debug, Deserialize)]
pub struct MapParams {
  pub date: Option<NaiveDate>,
}

/// `GET /map[?date=YYYY-MM-DD]`: states joined with cumulative counts.
pub async fn national(
  State(snapshot): State<Arc<Snapshot>>,
  Query(params): Query<MapParams>,
) -> Result<Json<Value>, ApiError> {
  let table = snapshot.national_map(params.date)?.ok_or_else(|| {
    ApiError::NotFound(match params.date {
      Some(date) => format!("no state data for {date}"),
      None => "no state data".into(),
    })
  })?;
  Ok(Json(table.to_geojson()))
}

/// `GET /map/{code}`: a state's districts joined with their latest counts.
pub async fn districts(
  State(snapshot): State<Arc<Snapshot>>,
  Path(code): Path<String>,
) -> Result<Json<Value>, ApiError> {
  let region = resolve(&code)?;
  let table = snapshot
    .district_map(region)?
    .ok_or_else(|| ApiError::no_data("district geometry", region))?;
  Ok(Json(table.to_geojson()))
}
