// crates/geonames-core/src/schema/geoname.rs
use super::fields::{FieldErrors, FieldReader};
use super::{Point, RowSchema};
use crate::source::RawRow;
use crate::text::{split_list, transliterate};
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

/// A gazetteer record from `allCountries.txt`.
///
/// The raw `latitude`/`longitude` columns are folded into [`Self::location`]
/// and not kept.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GeoNameRecord {
    pub geonameid: i64,
    pub name: String,
    /// Plain ASCII name; transliterated from `name` when the dump leaves it empty.
    pub asciiname: String,
    pub alternatenames: Vec<String>,
    pub location: Option<Point>,
    pub feature_class: String,
    pub feature_code: Option<String>,
    /// Absent on continent and ocean records.
    pub country_code: Option<String>,
    pub cc2: Vec<String>,
    pub admin1_code: Option<String>,
    pub admin2_code: Option<String>,
    pub admin3_code: Option<String>,
    pub admin4_code: Option<String>,
    pub population: Option<i64>,
    pub elevation: Option<i32>,
    /// Digital elevation model, srtm3 or gtopo30.
    pub dem: Option<i32>,
    pub timezone: Option<String>,
    pub modification_date: Option<NaiveDate>,
}

impl RowSchema for GeoNameRecord {
    const FIELDS: &'static [&'static str] = &[
        "geonameid",
        "name",
        "asciiname",
        "alternatenames",
        "latitude",
        "longitude",
        "feature_class",
        "feature_code",
        "country_code",
        "cc2",
        "admin1_code",
        "admin2_code",
        "admin3_code",
        "admin4_code",
        "population",
        "elevation",
        "dem",
        "timezone",
        "modification_date",
    ];

    fn from_row(row: &RawRow) -> Result<Self, FieldErrors> {
        let mut f = FieldReader::new(row);

        let geonameid = f.int::<i64>("geonameid", true);
        let name = f.required_text("name", 200);
        let asciiname = f.text("asciiname", 200);
        let alternatenames = f.text("alternatenames", 10_000);
        let location = Point::read(&mut f, "latitude", "longitude");
        let feature_class = f.code("feature_class", 1, true);
        let feature_code = f.text("feature_code", 10);
        let country_code = f.code("country_code", 2, false);
        let cc2 = f.text("cc2", 200);
        let admin1_code = f.text("admin1_code", 20);
        let admin2_code = f.text("admin2_code", 80);
        let admin3_code = f.text("admin3_code", 20);
        let admin4_code = f.text("admin4_code", 20);
        let population = f.int::<i64>("population", false);
        let elevation = f.int::<i32>("elevation", false);
        let dem = f.int::<i32>("dem", false);
        let timezone = f.text("timezone", 40);
        let modification_date = f.date("modification_date");

        f.finish()?;

        // Required values are present once finish() has passed.
        let name = name.unwrap_or_default();
        let asciiname = asciiname.unwrap_or_else(|| transliterate(&name));

        Ok(Self {
            geonameid: geonameid.unwrap_or_default(),
            name,
            asciiname,
            alternatenames: alternatenames.as_deref().map(split_list).unwrap_or_default(),
            location,
            feature_class: feature_class.unwrap_or_default(),
            feature_code,
            country_code,
            cc2: cc2.as_deref().map(split_list).unwrap_or_default(),
            admin1_code,
            admin2_code,
            admin3_code,
            admin4_code,
            population,
            elevation,
            dem,
            timezone,
            modification_date,
        })
    }
}
