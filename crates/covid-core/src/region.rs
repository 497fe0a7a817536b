//! State and union-territory normalisation tables.
//!
//! Every feed keys its per-state data by a two-letter code (`dl`, `mh`, ...),
//! the CSV feeds and geometry files use the full name, and the district
//! polygon files are located by a slug. [`Region`] is the single source of
//! truth for all three; the lookup maps below are derived from it once, so
//! they are total over the known code set by construction.
//!
//! The feeds also carry two sentinel columns that are not states at all:
//! `tt` (the national total) and `un` (cases not yet assigned to a state).
//! They resolve to [`StateKey::Sentinel`] and must be excluded from any
//! per-state arithmetic.

use std::{
  collections::HashMap,
  fmt,
  str::FromStr,
  sync::LazyLock,
};

use serde::{Serialize, Serializer};
use strum::{EnumIter, EnumString, IntoEnumIterator, IntoStaticStr};

use crate::error::SchemaError;

// ─── Region ──────────────────────────────────────────────────────────────────

/// A real Indian state or union territory.
///
/// Ordered by source code, which is also the column order of every per-state
/// table.
#[derive(
  Debug,
  Clone,
  Copy,
  PartialEq,
  Eq,
  PartialOrd,
  Ord,
  Hash,
  EnumIter,
  EnumString,
  IntoStaticStr,
)]
#[strum(ascii_case_insensitive)]
pub enum Region {
  #[strum(serialize = "an")]
  AndamanAndNicobarIslands,
  #[strum(serialize = "ap")]
  AndhraPradesh,
  #[strum(serialize = "ar")]
  ArunachalPradesh,
  #[strum(serialize = "as")]
  Assam,
  #[strum(serialize = "br")]
  Bihar,
  #[strum(serialize = "ch")]
  Chandigarh,
  #[strum(serialize = "ct")]
  Chhattisgarh,
  #[strum(serialize = "dd")]
  DadraNagarHaveliDamanDiu,
  #[strum(serialize = "dl")]
  Delhi,
  #[strum(serialize = "dn")]
  DadraAndNagarHaveli,
  #[strum(serialize = "ga")]
  Goa,
  #[strum(serialize = "gj")]
  Gujarat,
  #[strum(serialize = "hp")]
  HimachalPradesh,
  #[strum(serialize = "hr")]
  Haryana,
  #[strum(serialize = "jh")]
  Jharkhand,
  #[strum(serialize = "jk")]
  JammuAndKashmir,
  #[strum(serialize = "ka")]
  Karnataka,
  #[strum(serialize = "kl")]
  Kerala,
  #[strum(serialize = "la")]
  Ladakh,
  #[strum(serialize = "ld")]
  Lakshadweep,
  #[strum(serialize = "mh")]
  Maharashtra,
  #[strum(serialize = "ml")]
  Meghalaya,
  #[strum(serialize = "mn")]
  Manipur,
  #[strum(serialize = "mp")]
  MadhyaPradesh,
  #[strum(serialize = "mz")]
  Mizoram,
  #[strum(serialize = "nl")]
  Nagaland,
  #[strum(serialize = "or")]
  Odisha,
  #[strum(serialize = "pb")]
  Punjab,
  #[strum(serialize = "py")]
  Puducherry,
  #[strum(serialize = "rj")]
  Rajasthan,
  #[strum(serialize = "sk")]
  Sikkim,
  #[strum(serialize = "tg")]
  Telangana,
  #[strum(serialize = "tn")]
  TamilNadu,
  #[strum(serialize = "tr")]
  Tripura,
  #[strum(serialize = "up")]
  UttarPradesh,
  #[strum(serialize = "ut")]
  Uttarakhand,
  #[strum(serialize = "wb")]
  WestBengal,
}

impl Region {
  /// The two-letter source code, lowercase.
  pub fn code(self) -> &'static str { self.into() }

  /// The canonical display name; also the join key for every table.
  pub fn name(self) -> &'static str {
    match self {
      Self::AndamanAndNicobarIslands => "Andaman and Nicobar Islands",
      Self::AndhraPradesh => "Andhra Pradesh",
      Self::ArunachalPradesh => "Arunachal Pradesh",
      Self::Assam => "Assam",
      Self::Bihar => "Bihar",
      Self::Chandigarh => "Chandigarh",
      Self::Chhattisgarh => "Chhattisgarh",
      Self::DadraNagarHaveliDamanDiu => {
        "Dadra and Nagar Haveli and Daman and Diu"
      }
      Self::Delhi => "Delhi",
      Self::DadraAndNagarHaveli => "Dadra and Nagar Haveli",
      Self::Goa => "Goa",
      Self::Gujarat => "Gujarat",
      Self::HimachalPradesh => "Himachal Pradesh",
      Self::Haryana => "Haryana",
      Self::Jharkhand => "Jharkhand",
      Self::JammuAndKashmir => "Jammu and Kashmir",
      Self::Karnataka => "Karnataka",
      Self::Kerala => "Kerala",
      Self::Ladakh => "Ladakh",
      Self::Lakshadweep => "Lakshadweep",
      Self::Maharashtra => "Maharashtra",
      Self::Meghalaya => "Meghalaya",
      Self::Manipur => "Manipur",
      Self::MadhyaPradesh => "Madhya Pradesh",
      Self::Mizoram => "Mizoram",
      Self::Nagaland => "Nagaland",
      Self::Odisha => "Odisha",
      Self::Punjab => "Punjab",
      Self::Puducherry => "Puducherry",
      Self::Rajasthan => "Rajasthan",
      Self::Sikkim => "Sikkim",
      Self::Telangana => "Telangana",
      Self::TamilNadu => "Tamil Nadu",
      Self::Tripura => "Tripura",
      Self::UttarPradesh => "Uttar Pradesh",
      Self::Uttarakhand => "Uttarakhand",
      Self::WestBengal => "West Bengal",
    }
  }

  /// The file-name slug of this region's district polygon file: the
  /// canonical name lowercased with everything but ASCII alphanumerics
  /// removed (`"Tamil Nadu"` → `"tamilnadu"`).
  pub fn slug(self) -> &'static str {
    SLUGS.get(&self).map(String::as_str).unwrap_or_default()
  }

  /// Resolve a two-letter code. Sentinel codes are rejected here; use
  /// [`StateKey::from_code`] when a feed may contain them.
  pub fn from_code(code: &str) -> Result<Self, SchemaError> {
    match StateKey::from_code(code)? {
      StateKey::Region(region) => Ok(region),
      StateKey::Sentinel(_) => {
        Err(SchemaError::UnknownStateCode(code.to_string()))
      }
    }
  }

  /// Resolve a geometry-file slug back to its region.
  pub fn from_slug(slug: &str) -> Option<Self> {
    BY_SLUG.get(slug.to_ascii_lowercase().as_str()).copied()
  }
}

impl fmt::Display for Region {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    f.write_str(self.name())
  }
}

/// Regions serialise as their canonical name, which is what every consumer
/// joins on.
impl Serialize for Region {
  fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
    serializer.serialize_str(self.name())
  }
}

// ─── Sentinels ───────────────────────────────────────────────────────────────

/// A pseudo-state column: an aggregate or unassigned bucket.
#[derive(
  Debug, Clone, Copy, PartialEq, Eq, Hash, EnumIter, EnumString, IntoStaticStr,
)]
#[strum(ascii_case_insensitive)]
pub enum Sentinel {
  /// The national total (`tt`).
  #[strum(serialize = "tt")]
  Total,
  /// Cases not yet attributed to a state (`un`).
  #[strum(serialize = "un")]
  Unassigned,
}

impl Sentinel {
  pub fn code(self) -> &'static str { self.into() }

  /// The name the long-format CSV feed uses for this bucket.
  pub fn name(self) -> &'static str {
    match self {
      Self::Total => "India",
      Self::Unassigned => "State Unassigned",
    }
  }
}

// ─── StateKey ────────────────────────────────────────────────────────────────

/// Anything a per-state feed may use as a state key.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum StateKey {
  Region(Region),
  Sentinel(Sentinel),
}

impl StateKey {
  /// Resolve a two-letter code, failing loudly for anything outside the fixed
  /// code set.
  pub fn from_code(code: &str) -> Result<Self, SchemaError> {
    let trimmed = code.trim();
    if let Ok(region) = Region::from_str(trimmed) {
      return Ok(Self::Region(region));
    }
    if let Ok(sentinel) = Sentinel::from_str(trimmed) {
      return Ok(Self::Sentinel(sentinel));
    }
    Err(SchemaError::UnknownStateCode(code.to_string()))
  }

  /// Resolve a canonical name (case-insensitive), including the sentinel
  /// names used by the CSV feeds.
  pub fn from_name(name: &str) -> Result<Self, SchemaError> {
    BY_NAME
      .get(name.trim().to_lowercase().as_str())
      .copied()
      .ok_or_else(|| SchemaError::UnknownStateName(name.to_string()))
  }

  /// Resolve either a code or a canonical name. Nested feeds are not
  /// consistent about which one they use.
  pub fn from_code_or_name(key: &str) -> Result<Self, SchemaError> {
    Self::from_code(key).or_else(|_| Self::from_name(key))
  }

  pub fn region(self) -> Option<Region> {
    match self {
      Self::Region(region) => Some(region),
      Self::Sentinel(_) => None,
    }
  }
}

// ─── Derived lookup tables ───────────────────────────────────────────────────

fn slugify(name: &str) -> String {
  name
    .chars()
    .filter(char::is_ascii_alphanumeric)
    .map(|c| c.to_ascii_lowercase())
    .collect()
}

static SLUGS: LazyLock<HashMap<Region, String>> = LazyLock::new(|| {
  Region::iter().map(|r| (r, slugify(r.name()))).collect()
});

static BY_SLUG: LazyLock<HashMap<String, Region>> = LazyLock::new(|| {
  Region::iter().map(|r| (slugify(r.name()), r)).collect()
});

static BY_NAME: LazyLock<HashMap<String, StateKey>> = LazyLock::new(|| {
  Region::iter()
    .map(|r| (r.name().to_lowercase(), StateKey::Region(r)))
    .chain(
      Sentinel::iter()
        .map(|s| (s.name().to_lowercase(), StateKey::Sentinel(s))),
    )
    .collect()
});

// ─── Geometry name corrections ───────────────────────────────────────────────

/// Names that geometry sources spell differently from the canonical table.
const GEOMETRY_NAME_CORRECTIONS: &[(&str, &str)] = &[(
  "Dadra and Nagar Haveli Daman and Diu",
  "Dadra and Nagar Haveli and Daman and Diu",
)];

/// Map a feature name from a geometry file onto the canonical spelling.
/// Names without a known correction are returned unchanged.
pub fn correct_geometry_name(name: &str) -> &str {
  GEOMETRY_NAME_CORRECTIONS
    .iter()
    .find(|(from, _)| *from == name)
    .map(|(_, to)| *to)
    .unwrap_or(name)
}
