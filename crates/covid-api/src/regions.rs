//! Handler for `GET /regions`, and the region path parameter shared by the
//! per-region endpoints.

use axum::Json;
use covid_core::region::Region;
use serde::Serialize;
use strum::IntoEnumIterator;

use crate::error::ApiError;

#[derive(Debug, Serialize)]
pub struct RegionInfo {
  pub code: &'static str,
  pub name: &'static str,
  pub slug: &'static str,
}

/// `GET /regions`
pub async fn list() -> Json<Vec<RegionInfo>> {
  Json(
    Region::iter()
      .map(|r| RegionInfo {
        code: r.code(),
        name: r.name(),
        slug: r.slug(),
      })
      .collect(),
  )
}

/// Resolve a `{code}` path segment. Two-letter codes and geometry slugs are
/// both accepted.
pub(crate) fn resolve(segment: &str) -> Result<Region, ApiError> {
  Region::from_code(segment)
    .ok()
    .or_else(|| Region::from_slug(segment))
    .ok_or_else(|| ApiError::NotFound(format!("unknown region: {segment}")))
}
