// crates/geonames-core/src/schema/edge.rs
use super::fields::{FieldErrors, FieldReader};
use super::RowSchema;
use crate::source::RawRow;
use serde::{Deserialize, Serialize};

/// One `parent → child` line of `hierarchy.txt`. Consumed by the tree
/// builder and not retained afterwards.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Edge {
    pub parent: i64,
    pub child: i64,
    /// Relation type, `ADM` for the administrative hierarchy.
    pub relation: Option<String>,
}

impl Edge {
    pub fn new(parent: i64, child: i64, relation: Option<&str>) -> Self {
        Self {
            parent,
            child,
            relation: relation.map(str::to_owned),
        }
    }
}

impl RowSchema for Edge {
    const FIELDS: &'static [&'static str] = &["parent", "child", "type"];

    fn from_row(row: &RawRow) -> Result<Self, FieldErrors> {
        let mut f = FieldReader::new(row);

        let parent = f.int::<i64>("parent", true);
        let child = f.int::<i64>("child", true);
        let relation = f.text("type", 20);

        f.finish()?;

        Ok(Self {
            parent: parent.unwrap_or_default(),
            child: child.unwrap_or_default(),
            relation,
        })
    }
}
