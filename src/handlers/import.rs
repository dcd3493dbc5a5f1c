use axum::{
    extract::{multipart::MultipartRejection, Multipart},
    Json,
};
use std::time::Instant;

use crate::{
    aggregator::{self, AggregateOptions, AggregationResult},
    error::AppError,
    metrics,
    table,
};

/// Multipart field carrying the workbook
const FILE_FIELD: &str = "file";

/// Handle /import-excel endpoint
///
/// Reads the `file` field, parses the first sheet and aggregates it with a
/// sample preview.
pub async fn import_excel(
    multipart: Result<Multipart, MultipartRejection>,
) -> Result<Json<AggregationResult>, AppError> {
    let start = Instant::now();
    let mut multipart = multipart.map_err(|e| AppError::InvalidUpload(e.body_text()))?;

    let (file_name, bytes) = loop {
        let field = multipart
            .next_field()
            .await
            .map_err(|e| AppError::InvalidUpload(e.body_text()))?
            .ok_or_else(|| AppError::InvalidUpload(format!("Missing multipart field '{}'", FILE_FIELD)))?;

        if field.name() != Some(FILE_FIELD) {
            continue;
        }

        let file_name = field.file_name().unwrap_or_default().to_string();
        if !is_excel_file_name(&file_name) {
            return Err(AppError::InvalidUpload("Only Excel files are supported".to_string()));
        }

        let bytes = field
            .bytes()
            .await
            .map_err(|e| AppError::InvalidUpload(e.body_text()))?;
        break (file_name, bytes);
    };

    tracing::info!(file_name = %file_name, size = bytes.len(), "Importing spreadsheet");

    let result = tokio::task::spawn_blocking(move || {
        let table = table::from_workbook_bytes(bytes.to_vec())
            .map_err(|e| AppError::InvalidUpload(format!("Failed to read Excel: {}", e)))?;
        aggregator::aggregate(&table, &AggregateOptions::spreadsheet()).map_err(AppError::from)
    })
    .await
    .map_err(|e| AppError::InternalError(format!("Spreadsheet task failed: {}", e)))??;

    metrics::record_aggregation("spreadsheet", &result.stats);
    tracing::info!(
        file_name = %file_name,
        included = result.stats.included,
        cost_zeroed = result.stats.cost_zeroed,
        dropped_invalid_date = result.stats.dropped_invalid_date,
        duration_ms = start.elapsed().as_millis() as u64,
        "Spreadsheet aggregated"
    );

    Ok(Json(result))
}

fn is_excel_file_name(name: &str) -> bool {
    let lower = name.to_ascii_lowercase();
    lower.ends_with(".xls") || lower.ends_with(".xlsx")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_is_excel_file_name() {
        assert!(is_excel_file_name("costs.xlsx"));
        assert!(is_excel_file_name("COSTS.XLS"));
        assert!(!is_excel_file_name("costs.csv"));
        assert!(!is_excel_file_name("costs.xlsx.txt"));
        assert!(!is_excel_file_name(""));
    }
}
