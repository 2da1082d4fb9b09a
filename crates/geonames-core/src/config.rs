// crates/geonames-core/src/config.rs

//! # Import Configuration
//!
//! One explicit [`ImportConfig`] value is built at startup (from defaults or
//! a JSON file) and handed to every component constructor. Nothing in the
//! crate reads ambient settings.

use crate::error::{GeoNamesError, Result};
use crate::schema::EntityKind;
use crate::source::RawRow;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet};
use std::fmt;
use std::path::PathBuf;
use std::str::FromStr;

pub const DEFAULT_CHUNK_SIZE: usize = 1024;
pub const DEFAULT_PROGRESS_INTERVAL: u64 = 100_000;
/// GeoNames id of the "Earth" record, which parents every continent.
pub const EARTH_ID: i64 = 6_295_630;

// -----------------------------------------------------------------------------
// MEMORY MODE
// -----------------------------------------------------------------------------

/// Row production strategy, trading memory for throughput.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MemoryMode {
    /// Bounded chunks; never more than one chunk per dataset in memory.
    #[default]
    Low,
    /// Whole dataset parsed in memory, rows handed out one at a time.
    Normal,
    /// Whole dataset materialized as rows before the first one is yielded.
    Max,
}

impl MemoryMode {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Low => "low",
            Self::Normal => "normal",
            Self::Max => "max",
        }
    }
}

impl fmt::Display for MemoryMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for MemoryMode {
    type Err = GeoNamesError;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "low" => Ok(Self::Low),
            "normal" => Ok(Self::Normal),
            "max" => Ok(Self::Max),
            other => Err(GeoNamesError::InvalidData(format!(
                "unknown memory mode '{other}' (expected low, normal or max)"
            ))),
        }
    }
}

// -----------------------------------------------------------------------------
// ROW FILTERS
// -----------------------------------------------------------------------------

/// Field → allowed values. A row passes when *every* listed field holds one
/// of its allowed values. An empty list lets every row through.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct AllowList {
    rules: BTreeMap<String, BTreeSet<String>>,
}

impl AllowList {
    pub fn new() -> Self {
        Self::default()
    }

    /// Builder-style: restrict `field` to `values`.
    pub fn with<I, V>(mut self, field: &str, values: I) -> Self
    where
        I: IntoIterator<Item = V>,
        V: Into<String>,
    {
        self.rules
            .entry(field.to_owned())
            .or_default()
            .extend(values.into_iter().map(Into::into));
        self
    }

    pub fn is_empty(&self) -> bool {
        self.rules.is_empty()
    }

    pub fn fields(&self) -> impl Iterator<Item = &str> {
        self.rules.keys().map(String::as_str)
    }

    pub fn matches(&self, row: &RawRow) -> bool {
        self.rules.iter().all(|(field, allowed)| {
            row.get(field)
                .map(|v| allowed.contains(v))
                .unwrap_or(false)
        })
    }
}

// -----------------------------------------------------------------------------
// FEATURE CLASSES
// -----------------------------------------------------------------------------

/// Feature codes that classify a gazetteer record as one of the entity
/// kinds. Evaluated at query time, never stored on the entity.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct FeatureClasses {
    pub continents: Vec<String>,
    pub countries: Vec<String>,
    pub regions: Vec<String>,
    pub cities: Vec<String>,
}

impl Default for FeatureClasses {
    fn default() -> Self {
        fn owned(codes: &[&str]) -> Vec<String> {
            codes.iter().map(|c| (*c).to_owned()).collect()
        }
        Self {
            continents: owned(&["CONT"]),
            countries: owned(&["PCL", "PCLD", "PCLF", "PCLI"]),
            regions: owned(&["ADM1"]),
            cities: owned(&["PPL", "PPLA", "PPLA2", "PPLC"]),
        }
    }
}

impl FeatureClasses {
    pub fn kind_of(&self, feature_code: Option<&str>) -> EntityKind {
        let Some(code) = feature_code else {
            return EntityKind::Other;
        };
        let has = |codes: &[String]| codes.iter().any(|c| c == code);
        if has(&self.continents) {
            EntityKind::Continent
        } else if has(&self.countries) {
            EntityKind::Country
        } else if has(&self.regions) {
            EntityKind::Region
        } else if has(&self.cities) {
            EntityKind::City
        } else {
            EntityKind::Other
        }
    }

    /// Every configured code, continents first.
    pub fn all_codes(&self) -> Vec<String> {
        self.continents
            .iter()
            .chain(&self.countries)
            .chain(&self.regions)
            .chain(&self.cities)
            .cloned()
            .collect()
    }
}

// -----------------------------------------------------------------------------
// DATASETS
// -----------------------------------------------------------------------------

/// Location and row filter of one input dump.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DatasetConfig {
    /// Relative paths are resolved against [`ImportConfig::data_dir`].
    pub path: PathBuf,
    #[serde(default)]
    pub filter: AllowList,
    #[serde(default = "default_true")]
    pub enabled: bool,
    /// Column names in file order; the schema's own list when absent.
    #[serde(default)]
    pub fields: Option<Vec<String>>,
}

fn default_true() -> bool {
    true
}

impl DatasetConfig {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            filter: AllowList::new(),
            enabled: true,
            fields: None,
        }
    }

    pub fn with_filter(mut self, filter: AllowList) -> Self {
        self.filter = filter;
        self
    }
}

/// Top-level importer configuration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ImportConfig {
    pub data_dir: PathBuf,
    pub hierarchy: DatasetConfig,
    pub objects: DatasetConfig,
    pub translations: DatasetConfig,
    pub countries: DatasetConfig,
    pub postal_codes: DatasetConfig,

    pub memory_mode: MemoryMode,
    pub chunk_size: usize,

    /// Synthetic root that anchors every top-level node.
    pub root_id: i64,
    /// Ids dropped from the hierarchy and from the objects dataset.
    pub ignore_ids: BTreeSet<i64>,
    pub feature_classes: FeatureClasses,
    /// Records with these feature codes that never appear in the hierarchy
    /// file are attached directly under the root.
    pub root_feature_codes: BTreeSet<String>,

    pub progress_interval: u64,
}

impl Default for ImportConfig {
    fn default() -> Self {
        let feature_classes = FeatureClasses::default();
        let watched_countries = ["RU", "UA"];

        Self {
            data_dir: PathBuf::from("data"),
            hierarchy: DatasetConfig::new("dump/hierarchy.zip"),
            objects: DatasetConfig::new("dump/allCountries.zip").with_filter(
                AllowList::new()
                    .with("feature_code", feature_classes.all_codes())
                    .with("country_code", watched_countries)
                    // Continents carry no country code.
                    .with("country_code", [""]),
            ),
            translations: DatasetConfig::new("dump/alternateNames.zip")
                .with_filter(AllowList::new().with("isolanguage", ["ru", "ua"])),
            countries: DatasetConfig::new("dump/countryInfo.txt"),
            postal_codes: DatasetConfig::new("zip/allCountries.zip")
                .with_filter(AllowList::new().with("country_code", watched_countries)),
            memory_mode: MemoryMode::Low,
            chunk_size: DEFAULT_CHUNK_SIZE,
            root_id: 0,
            ignore_ids: BTreeSet::from([EARTH_ID]),
            root_feature_codes: feature_classes.continents.iter().cloned().collect(),
            feature_classes,
            progress_interval: DEFAULT_PROGRESS_INTERVAL,
        }
    }
}

impl ImportConfig {
    /// Absolute (or data-dir relative) location of a dataset.
    pub fn resolve(&self, dataset: &DatasetConfig) -> PathBuf {
        if dataset.path.is_absolute() {
            dataset.path.clone()
        } else {
            self.data_dir.join(&dataset.path)
        }
    }

    pub fn is_ignored(&self, id: i64) -> bool {
        self.ignore_ids.contains(&id)
    }

    #[cfg(feature = "json")]
    pub fn from_json_str(s: &str) -> Result<Self> {
        Ok(serde_json::from_str(s)?)
    }

    #[cfg(feature = "json")]
    pub fn from_json_file(path: impl AsRef<std::path::Path>) -> Result<Self> {
        let path = path.as_ref();
        let text = std::fs::read_to_string(path).map_err(|e| match e.kind() {
            std::io::ErrorKind::NotFound => GeoNamesError::SourceNotFound(path.to_path_buf()),
            _ => GeoNamesError::Io(e),
        })?;
        Self::from_json_str(&text)
    }

    /// Sanity checks that cannot be expressed through serde defaults.
    pub fn validate(&self) -> Result<()> {
        if self.chunk_size == 0 {
            return Err(GeoNamesError::InvalidData(
                "chunk_size must be at least 1".into(),
            ));
        }
        if self.ignore_ids.contains(&self.root_id) {
            return Err(GeoNamesError::InvalidData(format!(
                "root id {} cannot be ignored",
                self.root_id
            )));
        }
        Ok(())
    }
}
