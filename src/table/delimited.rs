use serde_json::{Map, Value as JsonValue};
use std::collections::{HashMap, HashSet};
use std::iter;

use super::{Table, TableError, Value};

const BOM: char = '\u{feff}';

/// Parse CSV text with a header row into a [`Table`].
///
/// Ragged records are accepted; missing trailing cells become null.
pub fn from_csv_str(text: &str) -> Result<Table, TableError> {
    let (columns, rows) = read_records(text, Value::infer)?;
    Table::from_rows(columns, rows)
}

/// Parse CSV text into JSON objects keyed by column name.
///
/// Integral cells stay integers, so large counts keep every digit. Other
/// numbers become floats and everything else is kept as text.
pub fn csv_to_json_rows(text: &str) -> Result<(Vec<String>, Vec<Map<String, JsonValue>>), TableError> {
    let (columns, records) = read_records(text, json_cell)?;

    let rows: Vec<Map<String, JsonValue>> = records
        .into_iter()
        .enumerate()
        .map(|(row, cells)| {
            if cells.len() > columns.len() {
                return Err(TableError::RowWidth {
                    row,
                    expected: columns.len(),
                    found: cells.len(),
                });
            }
            Ok(columns
                .iter()
                .cloned()
                .zip(cells.into_iter().chain(iter::repeat(JsonValue::Null)))
                .collect::<Map<String, JsonValue>>())
        })
        .collect::<Result<_, _>>()?;

    Ok((columns, rows))
}

fn read_records<T>(
    text: &str,
    mut cell: impl FnMut(&str) -> T,
) -> Result<(Vec<String>, Vec<Vec<T>>), TableError> {
    let mut reader = csv::ReaderBuilder::new()
        .flexible(true)
        .from_reader(text.trim_start_matches(BOM).as_bytes());

    let columns = column_names(reader.headers()?.iter());

    let mut rows: Vec<Vec<T>> = Vec::new();
    for record in reader.records() {
        let record = record?;
        if record.iter().all(|field| field.trim().is_empty()) {
            continue;
        }
        rows.push(record.iter().map(&mut cell).collect());
    }

    Ok((columns, rows))
}

fn json_cell(raw: &str) -> JsonValue {
    let trimmed = raw.trim();
    if trimmed.is_empty() {
        return JsonValue::Null;
    }
    if let Ok(n) = trimmed.parse::<i64>() {
        return n.into();
    }
    if let Ok(n) = trimmed.parse::<u64>() {
        return n.into();
    }
    trimmed
        .parse::<f64>()
        .ok()
        .and_then(serde_json::Number::from_f64)
        .map(JsonValue::Number)
        .unwrap_or_else(|| JsonValue::String(raw.to_string()))
}

/// Name header cells, filling blanks with `Unnamed: N` and suffixing
/// repeats as `Name.1`, `Name.2` so every column name is unique.
pub(super) fn column_names<I, S>(raw: I) -> Vec<String>
where
    I: IntoIterator<Item = S>,
    S: AsRef<str>,
{
    let mut used = HashSet::new();
    let mut repeats: HashMap<String, usize> = HashMap::new();
    let mut names = Vec::new();

    for (idx, cell) in raw.into_iter().enumerate() {
        let base = header_name(cell.as_ref(), idx);
        let mut name = base.clone();
        while used.contains(&name) {
            let count = repeats.entry(base.clone()).or_insert(0);
            *count += 1;
            name = format!("{}.{}", base, count);
        }
        used.insert(name.clone());
        names.push(name);
    }

    names
}

fn header_name(raw: &str, idx: usize) -> String {
    let name = raw.trim();
    if name.is_empty() {
        format!("Unnamed: {}", idx)
    } else {
        name.to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parses_header_and_rows() {
        let table = from_csv_str("Date,Cost\n2025-01-15,10\n2025-01-20,5.5\n").unwrap();

        assert_eq!(table.columns(), &["Date".to_string(), "Cost".to_string()]);
        assert_eq!(table.len(), 2);
        assert_eq!(table.rows()[1][1], Value::Number(5.5));
    }

    #[test]
    fn test_strips_bom_and_names_blank_headers() {
        let table = from_csv_str("\u{feff}Report Refresh Date,,Cost\n2025-01-01,x,3\n").unwrap();

        assert_eq!(table.columns()[0], "Report Refresh Date");
        assert_eq!(table.columns()[1], "Unnamed: 1");
    }

    #[test]
    fn test_short_records_are_padded_and_blank_lines_skipped() {
        let table = from_csv_str("a,b,c\n1,2\n,,\n4,5,6\n").unwrap();

        assert_eq!(table.len(), 2);
        assert_eq!(table.rows()[0][2], Value::Null);
    }

    #[test]
    fn test_header_only() {
        let table = from_csv_str("Date,Cost\n").unwrap();
        assert!(table.is_empty());
        assert_eq!(table.columns().len(), 2);
    }

    #[test]
    fn test_duplicate_headers_get_numbered_suffixes() {
        let table = from_csv_str("Cost,Date,Cost,Cost\n1,2025-01-01,2,3\n").unwrap();

        assert_eq!(table.columns(), &["Cost", "Date", "Cost.1", "Cost.2"]);
        assert_eq!(table.rows()[0][2], Value::Number(2.0));

        let (_, rows) = csv_to_json_rows("Cost,Cost\n1,2\n").unwrap();
        assert_eq!(rows[0].len(), 2);
        assert_eq!(rows[0]["Cost.1"], 2);
    }

    #[test]
    fn test_column_names_skip_taken_suffixes() {
        assert_eq!(column_names(["a", "a.1", "a", ""]), vec!["a", "a.1", "a.2", "Unnamed: 3"]);
        assert_eq!(column_names([" ", ""]), vec!["Unnamed: 0", "Unnamed: 1"]);
    }

    #[test]
    fn test_json_rows_keep_integers_exact() {
        let (columns, rows) =
            csv_to_json_rows("Count,Bytes,Ratio,Note\n12,9007199254740993,0.5,\n-3,18446744073709551615,NaN,x\n")
                .unwrap();

        assert_eq!(columns, vec!["Count", "Bytes", "Ratio", "Note"]);
        assert_eq!(
            JsonValue::Object(rows[0].clone()),
            serde_json::json!({"Count": 12, "Bytes": 9007199254740993u64, "Ratio": 0.5, "Note": null})
        );
        assert_eq!(serde_json::to_string(&rows[0]["Bytes"]).unwrap(), "9007199254740993");
        assert_eq!(rows[1]["Count"], -3);
        assert_eq!(rows[1]["Bytes"], u64::MAX);
        assert_eq!(rows[1]["Ratio"], "NaN");
        assert_eq!(rows[1]["Note"], "x");
    }

    #[test]
    fn test_json_rows_pad_short_records_and_reject_wide_ones() {
        let (_, rows) = csv_to_json_rows("a,b\n1\n").unwrap();
        assert_eq!(rows[0]["b"], JsonValue::Null);

        let err = csv_to_json_rows("a\n1,2\n").unwrap_err();
        assert!(matches!(err, TableError::RowWidth { row: 0, expected: 1, found: 2 }));
    }
}
