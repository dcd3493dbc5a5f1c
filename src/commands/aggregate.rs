use anyhow::{bail, Context, Result};
use colored::Colorize;
use cost_analytics::{
    aggregator::{self, AggregateOptions, KeywordProfile, Selection},
    table::{self, Table},
};
use std::path::Path;
use tracing::info;

/// Execute the aggregate command
///
/// Prints the aggregation as pretty JSON on stdout and a row summary on stderr.
pub fn execute(path: &Path, profile: KeywordProfile, sample: usize) -> Result<()> {
    let table = load_table(path)?;
    info!(file = %path.display(), rows = table.len(), "Loaded table");

    let options = AggregateOptions {
        profile,
        sample_limit: (sample > 0).then_some(sample),
    };
    let result = aggregator::aggregate(&table, &options)
        .with_context(|| format!("Failed to aggregate {}", path.display()))?;

    println!("{}", serde_json::to_string_pretty(&result)?);

    eprintln!("{}", "Summary:".bold());
    if let Some(columns) = &result.columns {
        eprintln!("  {}: {} ({})", "Date column".cyan(), columns.date.name, describe(columns.date.selection));
        eprintln!("  {}: {} ({})", "Cost column".cyan(), columns.cost.name, describe(columns.cost.selection));
    }
    eprintln!("  {}: {}", "Rows included".cyan(), result.stats.included.to_string().green());
    eprintln!("  {}: {}", "Cost zeroed".cyan(), result.stats.cost_zeroed.to_string().yellow());
    eprintln!(
        "  {}: {}",
        "Dropped (invalid date)".cyan(),
        result.stats.dropped_invalid_date.to_string().red()
    );
    eprintln!("  {}: {:.2}", "Total".cyan(), result.monthly_sum());

    Ok(())
}

/// Read a `.xls`/`.xlsx` workbook or a `.csv` export into a [`Table`].
fn load_table(path: &Path) -> Result<Table> {
    let extension = path
        .extension()
        .and_then(|e| e.to_str())
        .map(str::to_ascii_lowercase)
        .unwrap_or_default();

    let table = match extension.as_str() {
        "xls" | "xlsx" => {
            let bytes = std::fs::read(path)
                .with_context(|| format!("Failed to read {}", path.display()))?;
            table::from_workbook_bytes(bytes)?
        }
        "csv" => {
            let text = std::fs::read_to_string(path)
                .with_context(|| format!("Failed to read {}", path.display()))?;
            table::from_csv_str(&text)?
        }
        _ => bail!(
            "Unsupported file type '{}': expected .xls, .xlsx or .csv",
            path.display()
        ),
    };

    Ok(table)
}

fn describe(selection: Selection) -> String {
    match selection {
        Selection::Keyword(keyword) => format!("matched '{}'", keyword),
        Selection::Positional => "positional".to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn test_load_csv_table() {
        let mut file = tempfile::Builder::new().suffix(".CSV").tempfile().unwrap();
        write!(file, "Date,Cost\n2025-01-05,10\n2025-02-10,20\n").unwrap();

        let table = load_table(file.path()).unwrap();
        assert_eq!(table.columns(), ["Date", "Cost"]);
        assert_eq!(table.len(), 2);
    }

    #[test]
    fn test_load_table_rejects_other_extensions() {
        let file = tempfile::Builder::new().suffix(".json").tempfile().unwrap();

        let err = load_table(file.path()).unwrap_err();
        assert!(err.to_string().contains("Unsupported file type"));
    }

    #[test]
    fn test_execute_csv() {
        let mut file = tempfile::Builder::new().suffix(".csv").tempfile().unwrap();
        write!(file, "Date,Cost\n2025-01-05,10\nbad,5\n").unwrap();

        assert!(execute(file.path(), KeywordProfile::Spreadsheet, 0).is_ok());
    }

    #[test]
    fn test_describe_selection() {
        assert_eq!(describe(Selection::Keyword("cost")), "matched 'cost'");
        assert_eq!(describe(Selection::Positional), "positional");
    }
}
