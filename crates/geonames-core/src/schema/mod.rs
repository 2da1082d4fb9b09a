// crates/geonames-core/src/schema/mod.rs

//! # Row Validator
//!
//! Every dataset has a schema that type-checks and coerces one [`RawRow`]
//! into a typed record. Failures are collected per field ([`FieldErrors`])
//! and never abort the stream; the caller decides what to do with them.
//!
//! Schemas are pure: validating the same row twice yields equal records.

mod alternate;
mod country;
mod edge;
mod fields;
mod geoname;
mod postal;

pub use alternate::AlternateName;
pub use country::CountryInfo;
pub use edge::Edge;
pub use fields::{FieldError, FieldErrorKind, FieldErrors};
pub use geoname::GeoNameRecord;
pub use postal::PostalCode;

use crate::source::RawRow;
use fields::FieldReader;
use serde::{Deserialize, Serialize};
use std::fmt;

/// A record type that can be read from one dump row.
pub trait RowSchema: Sized {
    /// Column names, in file order.
    const FIELDS: &'static [&'static str];

    fn from_row(row: &RawRow) -> Result<Self, FieldErrors>;
}

/// WGS84 point built from a latitude/longitude column pair.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Point {
    pub lat: f64,
    pub lon: f64,
}

impl Point {
    /// Both columns must be present for a point; either one alone yields
    /// `None`. Malformed values are reported through the reader.
    fn read(f: &mut FieldReader<'_>, lat: &'static str, lon: &'static str) -> Option<Point> {
        let lat = f.decimal(lat, -90.0..=90.0);
        let lon = f.decimal(lon, -180.0..=180.0);
        Some(Point {
            lat: lat?,
            lon: lon?,
        })
    }
}

/// Classification of a gazetteer entity, derived from its feature code
/// through [`crate::config::FeatureClasses`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum EntityKind {
    Continent,
    Country,
    Region,
    City,
    Other,
}

impl EntityKind {
    pub const ALL: [EntityKind; 5] = [
        Self::Continent,
        Self::Country,
        Self::Region,
        Self::City,
        Self::Other,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Continent => "continent",
            Self::Country => "country",
            Self::Region => "region",
            Self::City => "city",
            Self::Other => "other",
        }
    }
}

impl fmt::Display for EntityKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Validated output of a [`Schema`] for one source row.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum TypedRecord {
    GeoName(GeoNameRecord),
    AlternateName(AlternateName),
    CountryInfo(CountryInfo),
    PostalCode(PostalCode),
    Edge(Edge),
}

impl TypedRecord {
    /// The GeoNames id this record is keyed on. Postal codes have none.
    pub fn primary_id(&self) -> Option<i64> {
        match self {
            Self::GeoName(r) => Some(r.geonameid),
            Self::AlternateName(r) => Some(r.alternate_name_id),
            Self::CountryInfo(r) => r.geonameid,
            Self::PostalCode(_) => None,
            Self::Edge(e) => Some(e.child),
        }
    }
}

/// The validator kinds, one per dataset.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Schema {
    GeoName,
    AlternateName,
    CountryInfo,
    PostalCode,
    HierarchyEdge,
}

impl Schema {
    pub fn name(&self) -> &'static str {
        match self {
            Self::GeoName => "geoname",
            Self::AlternateName => "alternate-name",
            Self::CountryInfo => "country-info",
            Self::PostalCode => "postal-code",
            Self::HierarchyEdge => "hierarchy-edge",
        }
    }

    /// Declared columns, in file order. The row source uses these as its
    /// field list unless a dataset overrides them.
    pub fn fields(&self) -> &'static [&'static str] {
        match self {
            Self::GeoName => GeoNameRecord::FIELDS,
            Self::AlternateName => AlternateName::FIELDS,
            Self::CountryInfo => CountryInfo::FIELDS,
            Self::PostalCode => PostalCode::FIELDS,
            Self::HierarchyEdge => Edge::FIELDS,
        }
    }

    pub fn validate(&self, row: &RawRow) -> Result<TypedRecord, FieldErrors> {
        match self {
            Self::GeoName => GeoNameRecord::from_row(row).map(TypedRecord::GeoName),
            Self::AlternateName => AlternateName::from_row(row).map(TypedRecord::AlternateName),
            Self::CountryInfo => CountryInfo::from_row(row).map(TypedRecord::CountryInfo),
            Self::PostalCode => PostalCode::from_row(row).map(TypedRecord::PostalCode),
            Self::HierarchyEdge => Edge::from_row(row).map(TypedRecord::Edge),
        }
    }
}
