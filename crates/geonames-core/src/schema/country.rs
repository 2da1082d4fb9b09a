// crates/geonames-core/src/schema/country.rs
use super::fields::{FieldErrors, FieldReader};
use super::RowSchema;
use crate::source::RawRow;
use crate::text::split_list;
use once_cell::sync::Lazy;
use serde::{Deserialize, Serialize};
use std::collections::HashSet;

/// Continent codes used by `countryInfo.txt`.
static CONTINENTS: Lazy<HashSet<&'static str>> =
    Lazy::new(|| ["AF", "AS", "EU", "NA", "OC", "SA", "AN"].into_iter().collect());

/// Country metadata from `countryInfo.txt`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CountryInfo {
    pub iso_alpha2: String,
    pub iso_alpha3: String,
    pub iso_numeric: String,
    pub fips: Option<String>,
    pub country: String,
    pub capital: Option<String>,
    /// Square kilometres.
    pub area: Option<f64>,
    pub population: Option<i64>,
    pub continent: String,
    pub tld: Option<String>,
    pub currency_code: Option<String>,
    pub currency_name: Option<String>,
    pub phone: Option<String>,
    pub postal_code_format: Option<String>,
    pub postal_code_regex: Option<String>,
    pub languages: Vec<String>,
    pub geonameid: Option<i64>,
    pub neighbours: Vec<String>,
    pub equivalent_fips_code: Option<String>,
}

impl RowSchema for CountryInfo {
    const FIELDS: &'static [&'static str] = &[
        "iso_3166_1_a2",
        "iso_3166_1_a3",
        "iso_3166_1_numeric",
        "fips",
        "country",
        "capital",
        "area",
        "population",
        "continent",
        "tld",
        "currency_code",
        "currency_name",
        "phone",
        "postal_code_format",
        "postal_code_regex",
        "languages",
        "geonameid",
        "neighbours",
        "equivalent_fips_code",
    ];

    fn from_row(row: &RawRow) -> Result<Self, FieldErrors> {
        let mut f = FieldReader::new(row);

        let iso_alpha2 = f.code("iso_3166_1_a2", 2, true);
        let iso_alpha3 = f.code("iso_3166_1_a3", 3, true);
        let iso_numeric = f.code("iso_3166_1_numeric", 3, true);
        let fips = f.text("fips", 2);
        let country = f.required_text("country", 200);
        let capital = f.text("capital", 200);
        let area = f.decimal("area", 0.0..=f64::MAX);
        let population = f.int::<i64>("population", false);
        let continent = f.code("continent", 2, true);
        f.ensure("continent", continent.as_deref(), |c| CONTINENTS.contains(c));
        let tld = f.code("tld", 3, false);
        let currency_code = f.code("currency_code", 3, false);
        let currency_name = f.text("currency_name", 200);
        let phone = f.text("phone", 200);
        let postal_code_format = f.text("postal_code_format", 255);
        let postal_code_regex = f.text("postal_code_regex", 255);
        let languages = f.text("languages", 255);
        let geonameid = f.int::<i64>("geonameid", false);
        let neighbours = f.text("neighbours", 255);
        let equivalent_fips_code = f.text("equivalent_fips_code", 10);

        f.finish()?;

        Ok(Self {
            iso_alpha2: iso_alpha2.unwrap_or_default(),
            iso_alpha3: iso_alpha3.unwrap_or_default(),
            iso_numeric: iso_numeric.unwrap_or_default(),
            fips,
            country: country.unwrap_or_default(),
            capital,
            area,
            population,
            continent: continent.unwrap_or_default(),
            tld,
            currency_code,
            currency_name,
            phone,
            postal_code_format,
            postal_code_regex,
            languages: languages.as_deref().map(split_list).unwrap_or_default(),
            geonameid,
            neighbours: neighbours.as_deref().map(split_list).unwrap_or_default(),
            equivalent_fips_code,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::schema::FieldErrorKind;

    fn russia() -> RawRow {
        RawRow::from_pairs(CountryInfo::FIELDS.iter().copied().zip([
            "RU",
            "RUS",
            "643",
            "RS",
            "Russia",
            "Moscow",
            "17100000",
            "140702000",
            "EU",
            ".ru",
            "RUB",
            "Ruble",
            "7",
            "######",
            "^(\\d{6})$",
            "ru,tt,xal",
            "2017370",
            "GE,CN,BY,UA",
            "",
        ]))
    }

    #[test]
    fn parses_country_row() {
        let info = CountryInfo::from_row(&russia()).unwrap();
        assert_eq!(info.iso_alpha3, "RUS");
        assert_eq!(info.area, Some(17_100_000.0));
        assert_eq!(info.languages, vec!["ru", "tt", "xal"]);
        assert_eq!(info.neighbours.len(), 4);
        assert_eq!(info.geonameid, Some(2017370));
        assert_eq!(info.equivalent_fips_code, None);
    }

    #[test]
    fn unknown_continent_is_rejected() {
        let mut row = russia();
        row.insert("continent", "XX");
        let errors = CountryInfo::from_row(&row).unwrap_err();
        assert!(errors.has("continent", &FieldErrorKind::NotAllowed));
    }
}
