// crates/geonames-core/src/schema/alternate.rs
use super::fields::{FieldErrors, FieldReader};
use super::RowSchema;
use crate::source::RawRow;
use serde::{Deserialize, Serialize};

/// A name translation / variant from `alternateNames.txt`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AlternateName {
    pub alternate_name_id: i64,
    pub geonameid: i64,
    /// ISO 639 code, or `post`, `iata`, `link`, `abbr`...
    pub isolanguage: Option<String>,
    pub alternate_name: Option<String>,
    pub is_preferred_name: bool,
    pub is_short_name: bool,
    pub is_colloquial: bool,
    pub is_historic: bool,
}

impl RowSchema for AlternateName {
    const FIELDS: &'static [&'static str] = &[
        "alternateNameId",
        "geonameid",
        "isolanguage",
        "alternate_name",
        "isPreferredName",
        "isShortName",
        "isColloquial",
        "isHistoric",
    ];

    fn from_row(row: &RawRow) -> Result<Self, FieldErrors> {
        let mut f = FieldReader::new(row);

        let alternate_name_id = f.int::<i64>("alternateNameId", true);
        let geonameid = f.int::<i64>("geonameid", true);
        let isolanguage = f.text("isolanguage", 7);
        let alternate_name = f.text("alternate_name", 200);
        let is_preferred_name = f.flag("isPreferredName");
        let is_short_name = f.flag("isShortName");
        let is_colloquial = f.flag("isColloquial");
        let is_historic = f.flag("isHistoric");

        f.finish()?;

        Ok(Self {
            alternate_name_id: alternate_name_id.unwrap_or_default(),
            geonameid: geonameid.unwrap_or_default(),
            isolanguage,
            alternate_name,
            is_preferred_name,
            is_short_name,
            is_colloquial,
            is_historic,
        })
    }
}
