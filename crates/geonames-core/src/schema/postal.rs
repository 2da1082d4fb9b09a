// crates/geonames-core/src/schema/postal.rs
use super::fields::{FieldErrors, FieldReader};
use super::{Point, RowSchema};
use crate::source::RawRow;
use serde::{Deserialize, Serialize};

/// A postal code entry from the `zip/allCountries.txt` dump.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PostalCode {
    pub country_code: String,
    pub postal_code: String,
    pub place_name: String,
    pub admin_name1: Option<String>,
    pub admin_code1: Option<String>,
    pub admin_name2: Option<String>,
    pub admin_code2: Option<String>,
    pub admin_name3: Option<String>,
    pub admin_code3: Option<String>,
    pub location: Option<Point>,
    /// 1 = estimated ... 6 = centroid.
    pub accuracy: Option<u8>,
}

impl RowSchema for PostalCode {
    const FIELDS: &'static [&'static str] = &[
        "country_code",
        "postal_code",
        "place_name",
        "admin_name1",
        "admin_code1",
        "admin_name2",
        "admin_code2",
        "admin_name3",
        "admin_code3",
        "latitude",
        "longitude",
        "accuracy",
    ];

    fn from_row(row: &RawRow) -> Result<Self, FieldErrors> {
        let mut f = FieldReader::new(row);

        let country_code = f.code("country_code", 2, true);
        let postal_code = f.required_text("postal_code", 20);
        let place_name = f.required_text("place_name", 180);
        let admin_name1 = f.text("admin_name1", 100);
        let admin_code1 = f.text("admin_code1", 20);
        let admin_name2 = f.text("admin_name2", 100);
        let admin_code2 = f.text("admin_code2", 20);
        let admin_name3 = f.text("admin_name3", 100);
        let admin_code3 = f.text("admin_code3", 20);
        let location = Point::read(&mut f, "latitude", "longitude");
        let accuracy = f.int_in::<u8>("accuracy", 1..=6);

        f.finish()?;

        Ok(Self {
            country_code: country_code.unwrap_or_default(),
            postal_code: postal_code.unwrap_or_default(),
            place_name: place_name.unwrap_or_default(),
            admin_name1,
            admin_code1,
            admin_name2,
            admin_code2,
            admin_name3,
            admin_code3,
            location,
            accuracy,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::schema::FieldErrorKind;

    #[test]
    fn parses_postal_code() {
        let row = RawRow::from_pairs(PostalCode::FIELDS.iter().copied().zip([
            "RU", "101000", "Москва 101", "Москва", "48", "", "", "", "", "55.7522", "37.6156", "4",
        ]));
        let pc = PostalCode::from_row(&row).unwrap();
        assert_eq!(pc.postal_code, "101000");
        assert_eq!(pc.admin_code1.as_deref(), Some("48"));
        assert_eq!(pc.accuracy, Some(4));
        assert!(pc.location.is_some());
    }

    #[test]
    fn accuracy_must_be_one_to_six() {
        let row = RawRow::from_pairs([
            ("country_code", "UA"),
            ("postal_code", "01001"),
            ("place_name", "Київ"),
            ("accuracy", "9"),
        ]);
        let errors = PostalCode::from_row(&row).unwrap_err();
        assert!(errors.has("accuracy", &FieldErrorKind::OutOfRange));
    }
}
