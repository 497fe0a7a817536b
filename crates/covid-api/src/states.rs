//! Handlers for the per-state endpoints.
//!
//! | Method | Path | Notes |
//! |--------|------|-------|
//! | `GET`  | `/states` | `?status=confirmed` (required), `&view=daily\|cumulative` |
//! | `GET`  | `/states/active` | Active cases per state and date |
//! | `GET`  | `/states/{code}` | Cumulative counts for one state; 404 if absent |
//! | `GET`  | `/states/{code}/totals` | Rows of `states.csv`; 404 if not configured |

use std::{str::FromStr, sync::Arc};

use axum::{
  Json,
  extract::{Path, Query, State},
};
use chrono::NaiveDate;
use covid_core::{
  label::Status,
  series::{Counts, DateFrame},
  totals::StateTotalsRow,
};
use covid_source::Snapshot;
use serde::{Deserialize, Serialize};

use crate::{error::ApiError, regions::resolve};

// ─── Frame ────────────────────────────────────────────────────────────────────

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum View {
  Daily,
  #[default]
  Cumulative,
}

#[derive(Debug, Deserialize)]
pub struct FrameParams {
  pub status: Option<String>,
  #[serde(default)]
  pub view:   View,
}

/// `GET /states?status=<status>[&view=daily|cumulative]`
pub async fn frame(
  State(snapshot): State<Arc<Snapshot>>,
  Query(params): Query<FrameParams>,
) -> Result<Json<DateFrame>, ApiError> {
  let raw = params
    .status
    .ok_or_else(|| ApiError::BadRequest("missing status".into()))?;
  let status = Status::from_str(&raw)
    .map_err(|_| ApiError::BadRequest(format!("unknown status: {raw}")))?;

  let frame = match params.view {
    View::Daily => snapshot.states.daily(status),
    View::Cumulative => snapshot.states.cumulative(status),
  };
  Ok(Json(frame))
}

/// `GET /states/active`
pub async fn active(State(snapshot): State<Arc<Snapshot>>) -> Json<DateFrame> {
  Json(snapshot.active.clone())
}

// ─── One state ────────────────────────────────────────────────────────────────

#[derive(Debug, Serialize)]
pub struct DatedCounts {
  pub date:   NaiveDate,
  #[serde(flatten)]
  pub counts: Counts,
}

/// `GET /states/{code}`
pub async fn one(
  State(snapshot): State<Arc<Snapshot>>,
  Path(code): Path<String>,
) -> Result<Json<Vec<DatedCounts>>, ApiError> {
  let region = resolve(&code)?;
  let column = |status| snapshot.states.cumulative(status).column(region);
  let (Some(confirmed), Some(recovered), Some(deceased)) = (
    column(Status::Confirmed),
    column(Status::Recovered),
    column(Status::Deceased),
  ) else {
    return Err(ApiError::no_data("state series", region));
  };

  let rows = confirmed
    .into_iter()
    .zip(recovered)
    .zip(deceased)
    .map(|(((date, c), (_, r)), (_, d))| {
      Some(DatedCounts {
        date,
        counts: Counts::new(c, r, d)?,
      })
    })
    .collect::<Option<Vec<_>>>()
    .ok_or_else(|| ApiError::no_data("state series", region))?;
  Ok(Json(rows))
}

/// `GET /states/{code}/totals`
pub async fn totals(
  State(snapshot): State<Arc<Snapshot>>,
  Path(code): Path<String>,
) -> Result<Json<Vec<StateTotalsRow>>, ApiError> {
  let region = resolve(&code)?;
  let totals = snapshot
    .state_totals
    .as_ref()
    .ok_or_else(|| ApiError::NotFound("state totals feed not configured".into()))?;
  let rows = totals
    .region(region)
    .ok_or_else(|| ApiError::no_data("state totals", region))?;
  Ok(Json(rows.to_vec()))
}
