//! The refresh session.
//!
//! Pipeline (one refresh, run to completion):
//!   fetch  data.json, states_daily, districts_daily [, CSV feeds]
//!     └─ normalise  national, state, district, test-count builders
//!          └─ derive  active view, district snapshot
//!               └─ publish  Arc<Snapshot>, only if every step succeeded

use std::sync::Arc;

use chrono::{DateTime, NaiveDate, Utc};
use covid_core::{
  SchemaError,
  district::{DistrictFeed, DistrictSnapshot},
  region::Region,
  series::{DateFrame, NationalSeries, StateSeries},
  totals::{StateTotals, TestSeries},
};
use covid_feeds::{
  BuildOptions, GeoJoinedTable,
  geojoin::{self, district_rows, national_rows},
};
use serde_json::Value;
use tracing::{info, warn};

use crate::{
  Result,
  geometry::GeometrySet,
  source::{Feed, FeedSource},
};

// ─── Snapshot ────────────────────────────────────────────────────────────────

/// Everything one refresh produced. Never mutated after publication.
#[derive(Debug, Clone)]
pub struct Snapshot {
  pub refreshed_at:      DateTime<Utc>,
  pub national:          NationalSeries,
  pub states:            StateSeries,
  /// Active cases per state, from the cumulative views of `states`.
  pub active:            DateFrame,
  pub districts:         DistrictFeed,
  pub district_snapshot: DistrictSnapshot,
  pub tested:            TestSeries,
  /// Present only when the source provides `states.csv`.
  pub state_totals:      Option<StateTotals>,
  geometry:              Arc<GeometrySet>,
}

impl Snapshot {
  pub fn geometry(&self) -> &GeometrySet { &self.geometry }

  /// State-level map as of `date`, or the latest date in the state series.
  /// `None` when the date is not in the series.
  pub fn national_map(
    &self,
    date: Option<NaiveDate>,
  ) -> Result<Option<GeoJoinedTable>> {
    let Some(date) = date.or_else(|| self.states.last_date()) else {
      return Ok(None);
    };
    let Some(rows) = national_rows(&self.states, date) else {
      return Ok(None);
    };
    let table = geojoin::join(
      self.geometry.national(),
      self.geometry.state_name_property(),
      &rows,
    )?;
    Ok(Some(table))
  }

  /// District-level map for `region` from the latest district records.
  /// `None` when there is no geometry file for the region.
  pub fn district_map(&self, region: Region) -> Result<Option<GeoJoinedTable>> {
    let Some(collection) = self.geometry.state(region) else {
      return Ok(None);
    };
    let rows = self
      .district_snapshot
      .region(region)
      .map(district_rows)
      .unwrap_or_default();
    let table = geojoin::join(
      collection,
      self.geometry.district_name_property(),
      &rows,
    )?;
    Ok(Some(table))
  }
}

// ─── Dashboard ───────────────────────────────────────────────────────────────

/// Owns a source and the most recently published snapshot.
///
/// `refresh` takes `&mut self`, so refreshes never overlap. Readers hold an
/// `Arc<Snapshot>` and are unaffected by later refreshes.
pub struct Dashboard<S> {
  source:   S,
  geometry: Arc<GeometrySet>,
  options:  BuildOptions,
  current:  Option<Arc<Snapshot>>,
}

impl<S: FeedSource> Dashboard<S> {
  pub fn new(source: S, geometry: GeometrySet, options: BuildOptions) -> Self {
    Self {
      source,
      geometry: Arc::new(geometry),
      options,
      current: None,
    }
  }

  pub fn source(&self) -> &S { &self.source }

  /// The last published snapshot, if any refresh has succeeded.
  pub fn snapshot(&self) -> Option<Arc<Snapshot>> { self.current.clone() }

  /// Fetch, normalise and derive everything, then publish.
  ///
  /// On failure the error is returned and the previously published snapshot
  /// (if any) stays current.
  pub async fn refresh(&mut self) -> Result<Arc<Snapshot>> {
    match self.build().await {
      Ok(snapshot) => {
        let snapshot = Arc::new(snapshot);
        info!(
          national_rows = snapshot.national.len(),
          states = snapshot.states.regions().len(),
          last_date = ?snapshot.states.last_date(),
          "published snapshot"
        );
        self.current = Some(snapshot.clone());
        Ok(snapshot)
      }
      Err(e) => {
        warn!(
          error = %e,
          kept_previous = self.current.is_some(),
          "refresh failed"
        );
        Err(e)
      }
    }
  }

  /// The current snapshot, refreshing first if there is none yet.
  pub async fn snapshot_or_refresh(&mut self) -> Result<Arc<Snapshot>> {
    match &self.current {
      Some(snapshot) => Ok(snapshot.clone()),
      None => self.refresh().await,
    }
  }

  async fn build(&self) -> Result<Snapshot> {
    let options = &self.options;

    let data = self.source.fetch_json(Feed::Data).await?;
    let national = if self.source.provides(Feed::CaseTimeSeries) {
      let text = self.source.fetch_text(Feed::CaseTimeSeries).await?;
      covid_feeds::national_from_csv(&text, options)?
    } else {
      let rows = member(&data, Feed::Data, "cases_time_series")?;
      covid_feeds::national_series(rows, options)?
    };
    let tested =
      covid_feeds::test_series(member(&data, Feed::Data, "tested")?, options)?;

    let states_doc = self.source.fetch_json(Feed::StatesDaily).await?;
    let states = covid_feeds::state_series(
      member(&states_doc, Feed::StatesDaily, "states_daily")?,
      options,
    )?;

    let districts_doc = self.source.fetch_json(Feed::DistrictsDaily).await?;
    let districts = covid_feeds::district_feed(&districts_doc, options)?;

    let state_totals = if self.source.provides(Feed::StateTotals) {
      let text = self.source.fetch_text(Feed::StateTotals).await?;
      Some(covid_feeds::state_totals_from_csv(&text, options)?)
    } else {
      None
    };

    Ok(Snapshot {
      refreshed_at: Utc::now(),
      active: states.active(),
      district_snapshot: districts.snapshot(),
      national,
      states,
      districts,
      tested,
      state_totals,
      geometry: self.geometry.clone(),
    })
  }
}

/// A required top-level member of a feed document.
fn member<'a>(doc: &'a Value, feed: Feed, key: &str) -> Result<&'a Value> {
  doc.get(key).ok_or_else(|| {
    SchemaError::MissingField {
      at:    feed.to_string(),
      field: key.to_string(),
    }
    .into()
  })
}
