//! Tabular exports: quote-everything CSV and flat JSON.
//!
//! The CSV shape (every cell quoted, comma delimiter, newline records,
//! header row first) is the wire contract spreadsheet importers depend on —
//! do not "optimize" away the quoting.

use chrono::{DateTime, Utc};
use serde::Serialize;

pub const CSV_MIME: &str = "text/csv";

/// A finished CSV export ready for delivery.
#[derive(Debug, Clone, Serialize)]
pub struct CsvExport {
    pub filename: String,
    pub mime: String,
    pub content: String,
}

impl CsvExport {
    pub fn new(report_name: &str, headers: &[&str], rows: &[Vec<String>], now: DateTime<Utc>) -> Self {
        CsvExport {
            filename: csv_filename(report_name, now),
            mime: CSV_MIME.to_string(),
            content: to_csv(headers, rows),
        }
    }
}

/// `<report-name>_<unix-ms-timestamp>.csv`
pub fn csv_filename(report_name: &str, now: DateTime<Utc>) -> String {
    format!("{}_{}.csv", report_name, now.timestamp_millis())
}

/// Serialize rows with every cell quoted. Interior quotes are doubled so a
/// quoted cell can still round-trip; delimiters are comma and newline.
pub fn to_csv(headers: &[&str], rows: &[Vec<String>]) -> String {
    let header_line = headers
        .iter()
        .map(|h| quote(h))
        .collect::<Vec<_>>()
        .join(",");

    let mut lines = Vec::with_capacity(rows.len() + 1);
    lines.push(header_line);
    for row in rows {
        lines.push(
            row.iter()
                .map(|cell| quote(cell))
                .collect::<Vec<_>>()
                .join(","),
        );
    }
    lines.join("\n")
}

fn quote(value: &str) -> String {
    format!("\"{}\"", value.replace('"', "\"\""))
}

/// Flat JSON export: `{ total, fecha_generacion, <items_key>: [rows] }`.
pub fn json_export(
    items_key: &str,
    rows: Vec<serde_json::Value>,
    now: DateTime<Utc>,
) -> serde_json::Value {
    let mut obj = serde_json::Map::new();
    obj.insert("total".to_string(), serde_json::json!(rows.len()));
    obj.insert(
        "fecha_generacion".to_string(),
        serde_json::json!(now.to_rfc3339()),
    );
    obj.insert(items_key.to_string(), serde_json::Value::Array(rows));
    serde_json::Value::Object(obj)
}
