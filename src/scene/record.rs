//! Input records and their stable identifiers.

use std::borrow::Borrow;
use std::collections::BTreeMap;
use std::fmt;
use std::path::Path;

use serde::{Deserialize, Deserializer, Serialize};

use crate::error::CubefieldError;

/// Year assumed for records whose temporal field does not parse.
pub const NEUTRAL_YEAR: i32 = 2000;

/// Stable, unique record identifier.
#[derive(
    Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize,
)]
#[serde(transparent)]
pub struct RecordId(String);

impl RecordId {
    /// Wrap an identifier string.
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    /// The identifier text.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for RecordId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl Borrow<str> for RecordId {
    fn borrow(&self) -> &str {
        &self.0
    }
}

impl From<&str> for RecordId {
    fn from(id: &str) -> Self {
        Self(id.to_owned())
    }
}

impl From<String> for RecordId {
    fn from(id: String) -> Self {
        Self(id)
    }
}

/// One data item rendered as one cube.
///
/// Records are immutable once loaded; the set only shrinks through
/// explicit deletes.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Record {
    /// Stable unique identifier.
    pub id: RecordId,
    /// Temporal field as supplied (usually a year, possibly a date).
    #[serde(default, deserialize_with = "year_text")]
    pub year: String,
    /// Categorical field used by the ring and cluster layouts.
    #[serde(default)]
    pub category: String,
    /// Any other columns, carried through untouched for display.
    #[serde(flatten)]
    pub fields: BTreeMap<String, serde_json::Value>,
}

impl Record {
    /// Record with the given id, year text and category.
    pub fn new(
        id: impl Into<RecordId>,
        year: impl Into<String>,
        category: impl Into<String>,
    ) -> Self {
        Self {
            id: id.into(),
            year: year.into(),
            category: category.into(),
            fields: BTreeMap::new(),
        }
    }

    /// Ordinal year, or [`NEUTRAL_YEAR`] when the field does not parse.
    ///
    /// Accepts a bare year (`"1994"`) or a leading year in a date
    /// (`"1994-05-01"`).
    #[must_use]
    pub fn year(&self) -> i32 {
        parse_year(&self.year).unwrap_or(NEUTRAL_YEAR)
    }
}

/// Accept the temporal field as a JSON string or number.
fn year_text<'de, D: Deserializer<'de>>(
    deserializer: D,
) -> Result<String, D::Error> {
    Ok(match serde_json::Value::deserialize(deserializer)? {
        serde_json::Value::String(text) => text,
        serde_json::Value::Null => String::new(),
        other => other.to_string(),
    })
}

fn parse_year(raw: &str) -> Option<i32> {
    let trimmed = raw.trim();
    if let Ok(year) = trimmed.parse::<i32>() {
        return Some(year);
    }
    let digits: String = trimmed
        .chars()
        .take_while(char::is_ascii_digit)
        .collect();
    if digits.len() == 4 {
        digits.parse().ok()
    } else {
        None
    }
}

/// Parse a JSON array of records.
pub fn parse_records(json: &str) -> Result<Vec<Record>, CubefieldError> {
    serde_json::from_str(json)
        .map_err(|e| CubefieldError::RecordParse(e.to_string()))
}

/// Load a JSON array of records from disk.
pub fn load_records(path: &Path) -> Result<Vec<Record>, CubefieldError> {
    let content = std::fs::read_to_string(path)?;
    let records = parse_records(&content)?;
    log::info!("Loaded {} records from {}", records.len(), path.display());
    Ok(records)
}

/// Deterministic synthetic records for the demo viewer and benchmarks.
#[must_use]
pub fn demo_records(count: usize) -> Vec<Record> {
    const CATEGORIES: [&str; 6] =
        ["alpha", "beta", "gamma", "delta", "epsilon", "zeta"];
    (0..count)
        .map(|i| {
            let year = 1980 + (i * 7 + i / 3) % 45;
            Record::new(
                format!("rec-{i:05}"),
                year.to_string(),
                CATEGORIES[(i * 5 + i / 11) % CATEGORIES.len()],
            )
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn year_parsing_falls_back_to_neutral() {
        assert_eq!(Record::new("a", "1994", "x").year(), 1994);
        assert_eq!(Record::new("a", " 2010 ", "x").year(), 2010);
        assert_eq!(Record::new("a", "1987-03-12", "x").year(), 1987);
        assert_eq!(Record::new("a", "unknown", "x").year(), NEUTRAL_YEAR);
        assert_eq!(Record::new("a", "", "x").year(), NEUTRAL_YEAR);
    }

    #[test]
    fn records_parse_with_extra_fields() {
        let json = r#"[
            {"id": "a", "year": "1990", "category": "film", "title": "X"},
            {"id": "b"},
            {"id": "c", "year": 2004}
        ]"#;
        let records = parse_records(json).unwrap();
        assert_eq!(records.len(), 3);
        assert_eq!(records[2].year(), 2004);
        assert_eq!(records[0].id.as_str(), "a");
        assert_eq!(records[0].fields["title"], "X");
        assert_eq!(records[1].year(), NEUTRAL_YEAR);
        assert!(records[1].category.is_empty());
    }

    #[test]
    fn malformed_json_is_a_parse_error() {
        assert!(matches!(
            parse_records("{not json"),
            Err(CubefieldError::RecordParse(_))
        ));
    }

    #[test]
    fn demo_records_are_unique() {
        let records = demo_records(500);
        let ids: std::collections::HashSet<_> =
            records.iter().map(|r| r.id.clone()).collect();
        assert_eq!(ids.len(), 500);
    }
}
