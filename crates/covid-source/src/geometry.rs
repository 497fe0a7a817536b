//! Static polygon geometry: one national collection keyed by state name and
//! one collection per state keyed by district name.

use std::{
  collections::BTreeMap,
  io::ErrorKind,
  path::{Path, PathBuf},
};

use covid_core::region::Region;
use covid_feeds::FeatureCollection;
use serde::Deserialize;
use strum::IntoEnumIterator;
use tracing::{debug, info};

use crate::{Error, Result};

/// Where the geometry files live and which feature property holds the join
/// key.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct GeometryConfig {
  pub dir:                    PathBuf,
  /// National collection, relative to `dir`.
  pub national_file:          String,
  /// Directory of per-state `<slug>.geojson` files, relative to `dir`.
  pub states_dir:             String,
  pub state_name_property:    String,
  pub district_name_property: String,
}

impl Default for GeometryConfig {
  fn default() -> Self {
    Self {
      dir:                    PathBuf::from("geodata"),
      national_file:          "india.geojson".into(),
      states_dir:             "states".into(),
      state_name_property:    "st_nm".into(),
      district_name_property: "district".into(),
    }
  }
}

/// The loaded geometry. Immutable once built and shared by every snapshot.
#[derive(Debug, Clone, Default)]
pub struct GeometrySet {
  national:               FeatureCollection,
  states:                 BTreeMap<Region, FeatureCollection>,
  state_name_property:    String,
  district_name_property: String,
}

impl GeometrySet {
  pub fn new(
    national: FeatureCollection,
    states: BTreeMap<Region, FeatureCollection>,
    state_name_property: impl Into<String>,
    district_name_property: impl Into<String>,
  ) -> Self {
    Self {
      national,
      states,
      state_name_property: state_name_property.into(),
      district_name_property: district_name_property.into(),
    }
  }

  /// Load the national file and every per-state file that exists.
  ///
  /// The national file is required. A missing state file only narrows
  /// coverage; a file that exists but cannot be read or parsed is an error.
  pub async fn load(config: &GeometryConfig) -> Result<Self> {
    let national_path = config.dir.join(&config.national_file);
    let national = read_collection(&national_path)
      .await?
      .ok_or_else(|| Error::Read {
        path:   national_path.clone(),
        source: ErrorKind::NotFound.into(),
      })?;

    let states_dir = config.dir.join(&config.states_dir);
    let mut states = BTreeMap::new();
    for region in Region::iter() {
      let path = states_dir.join(format!("{}.geojson", region.slug()));
      match read_collection(&path).await? {
        Some(collection) => {
          states.insert(region, collection);
        }
        None => debug!(state = region.name(), "no district geometry"),
      }
    }

    info!(
      national_features = national.len(),
      states = states.len(),
      "loaded geometry"
    );
    Ok(Self::new(
      national,
      states,
      &config.state_name_property,
      &config.district_name_property,
    ))
  }

  pub fn national(&self) -> &FeatureCollection { &self.national }

  pub fn state(&self, region: Region) -> Option<&FeatureCollection> {
    self.states.get(&region)
  }

  pub fn state_name_property(&self) -> &str { &self.state_name_property }

  pub fn district_name_property(&self) -> &str { &self.district_name_property }
}

/// `Ok(None)` when the file does not exist.
async fn read_collection(path: &Path) -> Result<Option<FeatureCollection>> {
  let text = match tokio::fs::read_to_string(path).await {
    Ok(text) => text,
    Err(e) if e.kind() == ErrorKind::NotFound => return Ok(None),
    Err(source) => {
      return Err(Error::Read {
        path: path.to_path_buf(),
        source,
      });
    }
  };
  FeatureCollection::from_json(&text)
    .map(Some)
    .map_err(|source| Error::GeometryFormat {
      path: path.to_path_buf(),
      source,
    })
}
