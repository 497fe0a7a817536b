//! Handlers for `/districts/...`.
//!
//! | Method | Path | Notes |
//! |--------|------|-------|
//! | `GET`  | `/districts/{code}` | Latest record per district |
//! | `GET`  | `/districts/{code}/{district}` | Every record, in arrival order |

use std::sync::Arc;

use axum::{
  Json,
  extract::{Path, State},
};
use covid_core::district::{DistrictRecord, DistrictRow};
use covid_source::Snapshot;

use crate::{error::ApiError, regions::resolve};

/// `GET /districts/{code}`
pub async fn latest(
  State(snapshot): State<Arc<Snapshot>>,
  Path(code): Path<String>,
) -> Result<Json<Vec<DistrictRow>>, ApiError> {
  let region = resolve(&code)?;
  let rows = snapshot
    .district_snapshot
    .region(region)
    .ok_or_else(|| ApiError::no_data("district records", region))?;
  Ok(Json(rows.to_vec()))
}

/// `GET /districts/{code}/{district}`
pub async fn series(
  State(snapshot): State<Arc<Snapshot>>,
  Path((code, district)): Path<(String, String)>,
) -> Result<Json<Vec<DistrictRecord>>, ApiError> {
  let region = resolve(&code)?;
  let records = snapshot
    .districts
    .series(region, &district)
    .ok_or_else(|| {
      ApiError::NotFound(format!("no district {district:?} in {region}"))
    })?;
  Ok(Json(records.to_vec()))
}
