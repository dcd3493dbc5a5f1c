//! Loosely-typed tabular data
//!
//! A [`Table`] is the only input the aggregator understands. Readers in this
//! module turn uploaded workbooks and CSV text into tables; the remote
//! fetchers build them from API responses.

mod delimited;
mod workbook;

pub use delimited::{csv_to_json_rows, from_csv_str};
pub use workbook::from_workbook_bytes;

use serde::Serialize;
use std::fmt;
use thiserror::Error;

/// Errors raised while building a table
#[derive(Error, Debug)]
pub enum TableError {
    /// A row had more cells than the header declares
    #[error("row {row} has {found} cells but only {expected} columns are defined")]
    RowWidth {
        row: usize,
        expected: usize,
        found: usize,
    },

    /// The workbook could not be opened or read
    #[error("workbook error: {0}")]
    Workbook(String),

    /// The workbook contains no sheets
    #[error("workbook has no sheets")]
    NoSheets,

    /// CSV text could not be parsed
    #[error("csv error: {0}")]
    Csv(#[from] csv::Error),
}

/// A single untyped cell
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum Value {
    Null,
    Number(f64),
    Text(String),
}

impl Value {
    pub fn is_null(&self) -> bool {
        matches!(self, Value::Null)
    }

    /// Interpret a CSV field: blanks are null, numeric text becomes a number.
    pub fn infer(raw: &str) -> Self {
        let trimmed = raw.trim();
        if trimmed.is_empty() {
            return Value::Null;
        }
        match trimmed.parse::<f64>() {
            Ok(n) if n.is_finite() => Value::Number(n),
            _ => Value::Text(raw.to_string()),
        }
    }

    /// Convert a JSON value coming back from a remote API.
    ///
    /// Booleans and nested structures are kept as their JSON text.
    pub fn from_json(value: &serde_json::Value) -> Self {
        match value {
            serde_json::Value::Null => Value::Null,
            serde_json::Value::Number(n) => n.as_f64().map(Value::Number).unwrap_or(Value::Null),
            serde_json::Value::String(s) => Value::Text(s.clone()),
            other => Value::Text(other.to_string()),
        }
    }
}

impl From<&Value> for serde_json::Value {
    fn from(value: &Value) -> Self {
        match value {
            Value::Null => serde_json::Value::Null,
            Value::Number(n) => serde_json::Number::from_f64(*n)
                .map(serde_json::Value::Number)
                .unwrap_or(serde_json::Value::Null),
            Value::Text(s) => serde_json::Value::String(s.clone()),
        }
    }
}

impl From<f64> for Value {
    fn from(n: f64) -> Self {
        Value::Number(n)
    }
}

impl From<&str> for Value {
    fn from(s: &str) -> Self {
        Value::Text(s.to_string())
    }
}

impl From<String> for Value {
    fn from(s: String) -> Self {
        Value::Text(s)
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::Null => Ok(()),
            Value::Number(n) => write!(f, "{}", n),
            Value::Text(s) => f.write_str(s),
        }
    }
}

/// Ordered rows of named-column values
///
/// Rows are stored positionally; every row has exactly one cell per column.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Table {
    columns: Vec<String>,
    rows: Vec<Vec<Value>>,
}

impl Table {
    pub fn new(columns: Vec<String>) -> Self {
        Self {
            columns,
            rows: Vec::new(),
        }
    }

    /// Build a table from column names and positional rows.
    pub fn from_rows<I>(columns: Vec<String>, rows: I) -> Result<Self, TableError>
    where
        I: IntoIterator<Item = Vec<Value>>,
    {
        let mut table = Self::new(columns);
        for row in rows {
            table.push_row(row)?;
        }
        Ok(table)
    }

    /// Append a row. Short rows are padded with nulls, long rows are rejected.
    pub fn push_row(&mut self, mut row: Vec<Value>) -> Result<(), TableError> {
        if row.len() > self.columns.len() {
            return Err(TableError::RowWidth {
                row: self.rows.len(),
                expected: self.columns.len(),
                found: row.len(),
            });
        }
        row.resize(self.columns.len(), Value::Null);
        self.rows.push(row);
        Ok(())
    }

    pub fn columns(&self) -> &[String] {
        &self.columns
    }

    pub fn rows(&self) -> &[Vec<Value>] {
        &self.rows
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn columns(names: &[&str]) -> Vec<String> {
        names.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn test_push_row_pads_short_rows() {
        let mut table = Table::new(columns(&["a", "b", "c"]));
        table.push_row(vec![Value::from(1.0)]).unwrap();

        assert_eq!(table.rows()[0], vec![Value::Number(1.0), Value::Null, Value::Null]);
    }

    #[test]
    fn test_push_row_rejects_wide_rows() {
        let mut table = Table::new(columns(&["a"]));
        let err = table
            .push_row(vec![Value::from(1.0), Value::from(2.0)])
            .unwrap_err();

        assert!(matches!(
            err,
            TableError::RowWidth {
                row: 0,
                expected: 1,
                found: 2
            }
        ));
    }

    #[test]
    fn test_value_infer() {
        assert_eq!(Value::infer(""), Value::Null);
        assert_eq!(Value::infer("   "), Value::Null);
        assert_eq!(Value::infer("12.5"), Value::Number(12.5));
        assert_eq!(Value::infer("2025-01-15"), Value::Text("2025-01-15".to_string()));
        assert_eq!(Value::infer("NaN"), Value::Text("NaN".to_string()));
    }

    #[test]
    fn test_value_from_json() {
        assert_eq!(Value::from_json(&serde_json::json!(null)), Value::Null);
        assert_eq!(Value::from_json(&serde_json::json!(20250115)), Value::Number(20250115.0));
        assert_eq!(Value::from_json(&serde_json::json!("USD")), Value::Text("USD".to_string()));
        assert_eq!(Value::from_json(&serde_json::json!(true)), Value::Text("true".to_string()));
    }

    #[test]
    fn test_value_serializes_untagged() {
        let json = serde_json::to_string(&vec![Value::Null, Value::from(1.5), Value::from("x")]).unwrap();
        assert_eq!(json, r#"[null,1.5,"x"]"#);
    }
}
