//! Handlers for the national endpoints.
//!
//! | Method | Path | Notes |
//! |--------|------|-------|
//! | `GET`  | `/national` | Optional `?column=Total Active` for one column |
//! | `GET`  | `/tested` | Cumulative samples tested per date |

use std::sync::Arc;

use axum::{
  Json,
  extract::{Query, State},
  response::{IntoResponse, Response},
};
use chrono::NaiveDate;
use covid_core::{label::Column, totals::TestSeries};
use covid_source::Snapshot;
use serde::{Deserialize, Serialize};

use crate::error::ApiError;

#[derive(Debug, Deserialize)]
pub struct SeriesParams {
  pub column: Option<String>,
}

/// One `(date, value)` point of a single column.
#[derive(Debug, Serialize)]
pub struct Point {
  pub date:  NaiveDate,
  pub value: i64,
}

/// `GET /national[?column=<label>]`
pub async fn series(
  State(snapshot): State<Arc<Snapshot>>,
  Query(params): Query<SeriesParams>,
) -> Result<Response, ApiError> {
  let Some(label) = params.column else {
    return Ok(Json(snapshot.national.rows()).into_response());
  };

  let column = Column::from_label(&label)
    .map_err(|e| ApiError::BadRequest(e.to_string()))?;
  let points: Vec<Point> = snapshot
    .national
    .column(column)
    .ok_or_else(|| ApiError::NotFound(format!("column not in feed: {column}")))?
    .into_iter()
    .map(|(date, value)| Point { date, value })
    .collect();
  Ok(Json(points).into_response())
}

/// `GET /tested`
pub async fn tested(State(snapshot): State<Arc<Snapshot>>) -> Json<TestSeries> {
  Json(snapshot.tested.clone())
}
