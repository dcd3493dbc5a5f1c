//! Column role resolution
//!
//! Picks the date and cost columns of a table by case-insensitive keyword
//! matching on the column names, falling back to position.

use super::AggregateError;

const SPREADSHEET_DATE: &[&str] = &["date", "usage_date", "billingdate", "day"];
const SPREADSHEET_COST: &[&str] = &["cost", "amount", "charge", "costusd", "charges"];
const REMOTE_DATE: &[&str] = &["date", "usage"];
const REMOTE_COST: &[&str] = &["cost", "amount", "charge", "costusd", "charges", "pre", "usage"];
const SECONDARY_COST: &[&str] = &["price"];

const DATE_FALLBACK_INDEX: usize = 0;
const COST_FALLBACK_INDEX: usize = 1;

/// Which keyword table to resolve column roles with
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum KeywordProfile {
    /// Uploaded spreadsheets
    #[default]
    Spreadsheet,
    /// Tables shaped from billing API responses
    Remote,
}

impl KeywordProfile {
    pub fn date_keywords(self) -> &'static [&'static str] {
        match self {
            Self::Spreadsheet => SPREADSHEET_DATE,
            Self::Remote => REMOTE_DATE,
        }
    }

    /// Cost keyword tiers, tried in order. The first tier with any match wins.
    pub fn cost_keyword_tiers(self) -> [&'static [&'static str]; 2] {
        match self {
            Self::Spreadsheet => [SPREADSHEET_COST, SECONDARY_COST],
            Self::Remote => [REMOTE_COST, SECONDARY_COST],
        }
    }
}

impl std::str::FromStr for KeywordProfile {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "spreadsheet" => Ok(Self::Spreadsheet),
            "remote" => Ok(Self::Remote),
            other => Err(format!("unknown keyword profile '{}'", other)),
        }
    }
}

/// How a column was chosen for its role
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Selection {
    /// The column name contains this keyword
    Keyword(&'static str),
    /// No name matched; the column was taken by position
    Positional,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ColumnRef {
    pub index: usize,
    pub name: String,
    pub selection: Selection,
}

/// The resolved date and cost columns. Both may point at the same column.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ColumnRoles {
    pub date: ColumnRef,
    pub cost: ColumnRef,
}

/// Resolve the date and cost columns from the column names.
///
/// Columns are scanned in order and the first match wins for each role
/// independently. Without a date match the first column is used; without a
/// cost match the second column is used. A table too narrow for the needed
/// fallback yields [`AggregateError::InsufficientColumns`].
pub fn resolve_column_roles<S: AsRef<str>>(
    columns: &[S],
    profile: KeywordProfile,
) -> Result<ColumnRoles, AggregateError> {
    let lowered: Vec<String> = columns
        .iter()
        .map(|c| c.as_ref().to_lowercase())
        .collect();

    let date = match find_column(&lowered, profile.date_keywords()) {
        Some((index, keyword)) => column_ref(columns, index, Selection::Keyword(keyword)),
        None => positional(columns, DATE_FALLBACK_INDEX)?,
    };

    let cost = match profile
        .cost_keyword_tiers()
        .iter()
        .find_map(|tier| find_column(&lowered, tier))
    {
        Some((index, keyword)) => column_ref(columns, index, Selection::Keyword(keyword)),
        None => positional(columns, COST_FALLBACK_INDEX)?,
    };

    Ok(ColumnRoles { date, cost })
}

fn find_column(lowered: &[String], keywords: &[&'static str]) -> Option<(usize, &'static str)> {
    lowered.iter().enumerate().find_map(|(index, name)| {
        keywords
            .iter()
            .find(|kw| name.contains(*kw))
            .map(|kw| (index, *kw))
    })
}

fn positional<S: AsRef<str>>(columns: &[S], index: usize) -> Result<ColumnRef, AggregateError> {
    if index >= columns.len() {
        return Err(AggregateError::InsufficientColumns {
            required: index + 1,
            found: columns.len(),
        });
    }
    Ok(column_ref(columns, index, Selection::Positional))
}

fn column_ref<S: AsRef<str>>(columns: &[S], index: usize, selection: Selection) -> ColumnRef {
    ColumnRef {
        index,
        name: columns[index].as_ref().to_string(),
        selection,
    }
}
