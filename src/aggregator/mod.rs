//! Monthly and quarterly cost aggregation
//!
//! Every pathway that produces cost totals (spreadsheet import, billing API,
//! the offline CLI) goes through [`aggregate`]:
//!
//! 1. resolve the date and cost columns from their names ([`columns`])
//! 2. classify each row as included, cost-zeroed or dropped ([`normalize`])
//! 3. sum surviving rows into month and quarter buckets ([`period`])

pub mod columns;
pub mod normalize;
pub mod period;

pub use columns::{resolve_column_roles, ColumnRef, ColumnRoles, KeywordProfile, Selection};
pub use normalize::{normalize_row, normalize_table, parse_cost, parse_date, RowOutcome};
pub use period::{MonthKey, PeriodBuckets, QuarterKey};

use serde::Serialize;
use thiserror::Error;

use crate::table::Table;

/// Number of surviving rows echoed back from a spreadsheet import
pub const DEFAULT_SAMPLE_LIMIT: usize = 10;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum AggregateError {
    /// Positional fallback needed a column the table does not have
    #[error("table needs at least {required} column(s) to resolve date and cost, found {found}")]
    InsufficientColumns { required: usize, found: usize },
}

/// Aggregation settings chosen by the caller
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct AggregateOptions {
    pub profile: KeywordProfile,
    /// Echo this many surviving rows back verbatim. `None` omits the sample.
    pub sample_limit: Option<usize>,
}

impl AggregateOptions {
    pub fn spreadsheet() -> Self {
        Self {
            profile: KeywordProfile::Spreadsheet,
            sample_limit: Some(DEFAULT_SAMPLE_LIMIT),
        }
    }

    pub fn remote() -> Self {
        Self {
            profile: KeywordProfile::Remote,
            sample_limit: None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PeriodTotal {
    pub period: String,
    pub total: f64,
}

/// One sample row: the original date and cost cells keyed by column name
pub type SampleRow = serde_json::Map<String, serde_json::Value>;

/// Per-outcome row counts
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct RowStats {
    pub included: usize,
    pub cost_zeroed: usize,
    pub dropped_invalid_date: usize,
}

impl RowStats {
    pub fn record(&mut self, outcome: &RowOutcome) {
        match outcome {
            RowOutcome::Included { .. } => self.included += 1,
            RowOutcome::CostZeroed { .. } => self.cost_zeroed += 1,
            RowOutcome::DroppedInvalidDate => self.dropped_invalid_date += 1,
        }
    }

    pub fn total(&self) -> usize {
        self.included + self.cost_zeroed + self.dropped_invalid_date
    }

    /// Counts paired with their outcome label, as used in metrics
    pub fn by_outcome(&self) -> [(&'static str, usize); 3] {
        [
            ("included", self.included),
            ("cost_zeroed", self.cost_zeroed),
            ("dropped_invalid_date", self.dropped_invalid_date),
        ]
    }
}

/// Aggregation output
///
/// Serializes as `{monthly, quarterly, sample?}`. Row statistics and the
/// resolved columns are kept for logging and metrics only.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AggregationResult {
    pub monthly: Vec<PeriodTotal>,
    pub quarterly: Vec<PeriodTotal>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub sample: Option<Vec<SampleRow>>,
    #[serde(skip)]
    pub stats: RowStats,
    #[serde(skip)]
    pub columns: Option<ColumnRoles>,
}

impl AggregationResult {
    fn empty(options: &AggregateOptions) -> Self {
        Self {
            monthly: Vec::new(),
            quarterly: Vec::new(),
            sample: options.sample_limit.map(|_| Vec::new()),
            stats: RowStats::default(),
            columns: None,
        }
    }

    pub fn monthly_sum(&self) -> f64 {
        self.monthly.iter().map(|p| p.total).sum()
    }

    pub fn quarterly_sum(&self) -> f64 {
        self.quarterly.iter().map(|p| p.total).sum()
    }
}

/// Aggregate a table into month and quarter totals.
///
/// A table with no rows yields empty totals without resolving columns.
pub fn aggregate(table: &Table, options: &AggregateOptions) -> Result<AggregationResult, AggregateError> {
    if table.is_empty() {
        return Ok(AggregationResult::empty(options));
    }

    let roles = resolve_column_roles(table.columns(), options.profile)?;
    let outcomes = normalize_table(table, &roles);

    let mut buckets = PeriodBuckets::default();
    let mut stats = RowStats::default();
    let mut sample = options.sample_limit.map(|_| Vec::new());

    for (row, outcome) in table.rows().iter().zip(&outcomes) {
        stats.record(outcome);
        let Some((date, cost)) = outcome.contribution() else {
            continue;
        };
        buckets.add(date, cost);

        if let (Some(limit), Some(sample)) = (options.sample_limit, sample.as_mut()) {
            if sample.len() < limit {
                sample.push(sample_row(row, &roles));
            }
        }
    }

    Ok(AggregationResult {
        monthly: buckets
            .monthly()
            .map(|(key, total)| PeriodTotal {
                period: key.to_string(),
                total,
            })
            .collect(),
        quarterly: buckets
            .quarterly()
            .map(|(key, total)| PeriodTotal {
                period: key.to_string(),
                total,
            })
            .collect(),
        sample,
        stats,
        columns: Some(roles),
    })
}

fn sample_row(row: &[crate::table::Value], roles: &ColumnRoles) -> SampleRow {
    let mut sample = SampleRow::new();
    sample.insert(roles.date.name.clone(), (&row[roles.date.index]).into());
    sample.insert(roles.cost.name.clone(), (&row[roles.cost.index]).into());
    sample
}
