//! Spreadsheet query endpoint: request URL and response parsing.
//!
//! The endpoint answers with JSON wrapped in a JavaScript callback:
//!
//! ```text
//! /*O_o*/
//! google.visualization.Query.setResponse({"version":"0.6","table":{...}});
//! ```
//!
//! [`parse_table`] strips the wrapper, reads the column labels and zips them
//! with each row's cells. Filtering and ordering are left to
//! [`crate::ingest`].

use crate::config::SheetConfig;
use crate::types::Row;
use serde::Deserialize;
use thiserror::Error;
use url::Url;

const PAYLOAD_PREFIX: &str = "google.visualization.Query.setResponse(";

#[derive(Error, Debug)]
pub enum SheetError {
    #[error("response is not a wrapped query payload")]
    NotWrapped,
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

/// Build the query URL for a sheet tab.
pub fn sheet_url(sheet: &SheetConfig) -> Result<Url, url::ParseError> {
    let mut url = Url::parse(&format!(
        "{}/{}/gviz/tq",
        sheet.base_url.trim_end_matches('/'),
        sheet.id.trim()
    ))?;
    url.query_pairs_mut()
        .append_pair("tqx", "out:json")
        .append_pair("sheet", &sheet.tab);
    Ok(url)
}

/// Extract the JSON argument from the callback wrapper.
pub fn unwrap_payload(body: &str) -> Result<&str, SheetError> {
    let start = body.find(PAYLOAD_PREFIX).ok_or(SheetError::NotWrapped)? + PAYLOAD_PREFIX.len();
    let rest = body[start..].trim_end();
    let rest = rest.strip_suffix(';').unwrap_or(rest).trim_end();
    let inner = rest.strip_suffix(')').ok_or(SheetError::NotWrapped)?;
    if inner.trim().is_empty() {
        return Err(SheetError::NotWrapped);
    }
    Ok(inner)
}

#[derive(Debug, Deserialize)]
struct Payload {
    table: Table,
}

#[derive(Debug, Deserialize)]
struct Table {
    cols: Vec<ColumnSpec>,
    #[serde(default)]
    rows: Vec<TableRow>,
}

#[derive(Debug, Deserialize)]
struct ColumnSpec {
    #[serde(default)]
    label: Option<String>,
}

#[derive(Debug, Deserialize)]
struct TableRow {
    #[serde(default)]
    c: Vec<Option<Cell>>,
}

#[derive(Debug, Deserialize)]
struct Cell {
    #[serde(default)]
    v: serde_json::Value,
}

/// Normalize a column label: trimmed, lower-case, `-` and spaces become `_`.
///
/// `"Bild-URL 2"` → `"bild_url_2"`
pub fn normalize_header(label: &str) -> String {
    label.trim().to_lowercase().replace(['-', ' '], "_")
}

/// Render a cell value the way editors typed it.
///
/// Numbers come back as floats (`1.0`); integral ones lose the fraction so
/// positions and years read naturally.
fn cell_text(value: &serde_json::Value) -> String {
    match value {
        serde_json::Value::Null => String::new(),
        serde_json::Value::String(s) => s.clone(),
        serde_json::Value::Bool(b) => b.to_string(),
        serde_json::Value::Number(n) => match (n.as_i64(), n.as_f64()) {
            (Some(i), _) => i.to_string(),
            (None, Some(f)) if f.is_finite() && f.fract() == 0.0 && f.abs() < 1e15 => {
                format!("{}", f as i64)
            }
            _ => n.to_string(),
        },
        other => other.to_string(),
    }
}

/// Parse a raw endpoint response into one [`Row`] per table row.
///
/// Columns without a label are ignored; missing cells read as empty.
pub fn parse_table(body: &str) -> Result<Vec<Row>, SheetError> {
    let payload: Payload = serde_json::from_str(unwrap_payload(body)?)?;
    let headers: Vec<String> = payload
        .table
        .cols
        .iter()
        .map(|col| col.label.as_deref().map(normalize_header).unwrap_or_default())
        .collect();

    let rows: Vec<Row> = payload
        .table
        .rows
        .iter()
        .map(|row| {
            headers
                .iter()
                .enumerate()
                .filter(|(_, header)| !header.is_empty())
                .map(|(i, header)| {
                    let value = row
                        .c
                        .get(i)
                        .and_then(Option::as_ref)
                        .map(|cell| cell_text(&cell.v))
                        .unwrap_or_default();
                    (header.clone(), value)
                })
                .collect::<Row>()
        })
        .collect();

    Ok(rows)
}
