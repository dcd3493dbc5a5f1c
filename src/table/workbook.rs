use calamine::{open_workbook_auto_from_rs, Data, Reader};
use std::io::Cursor;

use super::delimited::column_names;
use super::{Table, TableError, Value};

/// Read the first sheet of an `.xls`/`.xlsx` workbook into a [`Table`].
///
/// The first row is the header. Fully blank rows are skipped. Date cells are
/// rendered as ISO text so they survive into the sample preview unchanged.
pub fn from_workbook_bytes(bytes: Vec<u8>) -> Result<Table, TableError> {
    let mut workbook = open_workbook_auto_from_rs(Cursor::new(bytes))
        .map_err(|e| TableError::Workbook(e.to_string()))?;

    let range = workbook
        .worksheet_range_at(0)
        .ok_or(TableError::NoSheets)?
        .map_err(|e| TableError::Workbook(e.to_string()))?;

    let mut rows = range.rows();
    let Some(header) = rows.next() else {
        return Ok(Table::default());
    };

    let columns = column_names(header.iter().map(|cell| cell.to_string()));

    let mut table = Table::new(columns);
    for row in rows {
        let values: Vec<Value> = row.iter().map(cell_value).collect();
        if values.iter().all(Value::is_null) {
            continue;
        }
        table.push_row(values)?;
    }

    Ok(table)
}

fn cell_value(cell: &Data) -> Value {
    match cell {
        Data::Empty | Data::Error(_) => Value::Null,
        Data::Int(n) => Value::Number(*n as f64),
        Data::Float(n) => Value::Number(*n),
        Data::String(s) if s.trim().is_empty() => Value::Null,
        Data::String(s) | Data::DateTimeIso(s) | Data::DurationIso(s) => Value::Text(s.clone()),
        Data::Bool(b) => Value::Text(b.to_string()),
        Data::DateTime(dt) => match dt.as_datetime() {
            Some(ts) if ts.time() == chrono::NaiveTime::MIN => {
                Value::Text(ts.date().format("%Y-%m-%d").to_string())
            }
            Some(ts) => Value::Text(ts.format("%Y-%m-%d %H:%M:%S").to_string()),
            None => Value::Number(dt.as_f64()),
        },
    }
}
