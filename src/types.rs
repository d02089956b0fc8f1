//! Shared types passed between pipeline stages.
//!
//! [`Row`] is what the fetch stage writes to `rows.json` and what the
//! generate stage reads back, so its serialized form must stay a plain
//! `{ "column": "value" }` object.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// One spreadsheet row keyed by normalized column name.
///
/// Header normalization happens at ingestion (see [`crate::sheet`]), so keys
/// are always lower-case with `_` separators: `bild_url_2`, `titel_de`, ...
/// Values are kept verbatim; accessors treat blank values as absent, which
/// is how editors "clear" a cell.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Row(BTreeMap<String, String>);

impl Row {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, key: impl Into<String>, value: impl Into<String>) {
        self.0.insert(key.into(), value.into());
    }

    /// Value for `key`, or `None` when the column is missing or blank.
    pub fn get(&self, key: &str) -> Option<&str> {
        self.0
            .get(key)
            .map(String::as_str)
            .filter(|v| !v.trim().is_empty())
    }

    /// First non-blank value among `keys`.
    pub fn first_of(&self, keys: &[&str]) -> Option<&str> {
        keys.iter().find_map(|k| self.get(k))
    }

    /// Value for `key`, trimmed, or `""`.
    pub fn text(&self, key: &str) -> &str {
        self.get(key).map(str::trim).unwrap_or("")
    }

    /// Numeric ordering key. `None` when `position` is blank or not a number.
    pub fn position(&self) -> Option<f64> {
        self.get("position")?
            .trim()
            .parse::<f64>()
            .ok()
            .filter(|p| p.is_finite())
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl<K: Into<String>, V: Into<String>> FromIterator<(K, V)> for Row {
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        Self(
            iter.into_iter()
                .map(|(k, v)| (k.into(), v.into()))
                .collect(),
        )
    }
}

/// Which of the two desktop columns a tile lives in.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Column {
    Left,
    Right,
}

impl Column {
    /// Parse the `spalte` field. Only `rechts`/`right` select the right
    /// column; everything else, including a blank cell, is left.
    pub fn from_field(value: &str) -> Self {
        match value.trim().to_lowercase().as_str() {
            "rechts" | "right" => Column::Right,
            _ => Column::Left,
        }
    }

    /// DOM id of the container this column renders into.
    pub fn container_id(self) -> &'static str {
        match self {
            Column::Left => "content-left",
            Column::Right => "content-right",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn blank_values_read_as_absent() {
        let row: Row = [("medium", "  "), ("titel_de", "Vogue")].into_iter().collect();
        assert_eq!(row.get("medium"), None);
        assert_eq!(row.get("titel_de"), Some("Vogue"));
        assert_eq!(row.text("missing"), "");
    }

    #[test]
    fn first_of_skips_blank_keys() {
        let row: Row = [("bild_url", ""), ("bild_url_1", "https://a")]
            .into_iter()
            .collect();
        assert_eq!(row.first_of(&["bild_url", "bild_url_1"]), Some("https://a"));
    }

    #[test]
    fn position_parses_numbers_only() {
        let row: Row = [("position", " 12 ")].into_iter().collect();
        assert_eq!(row.position(), Some(12.0));

        let row: Row = [("position", "abc")].into_iter().collect();
        assert_eq!(row.position(), None);

        assert_eq!(Row::new().position(), None);
    }

    #[test]
    fn column_from_field() {
        assert_eq!(Column::from_field("Rechts"), Column::Right);
        assert_eq!(Column::from_field("right "), Column::Right);
        assert_eq!(Column::from_field("links"), Column::Left);
        assert_eq!(Column::from_field(""), Column::Left);
        assert_eq!(Column::from_field("middle"), Column::Left);
    }

    #[test]
    fn row_serializes_as_plain_object() {
        let row: Row = [("position", "1"), ("typ", "bild")].into_iter().collect();
        let json = serde_json::to_string(&row).unwrap();
        assert_eq!(json, r#"{"position":"1","typ":"bild"}"#);
    }
}
