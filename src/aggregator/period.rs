use chrono::{Datelike, NaiveDate};
use std::collections::BTreeMap;
use std::fmt;

/// Calendar month bucket, rendered as `YYYY-MM`
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct MonthKey {
    year: i32,
    month: u32,
}

impl From<NaiveDate> for MonthKey {
    fn from(date: NaiveDate) -> Self {
        Self {
            year: date.year(),
            month: date.month(),
        }
    }
}

impl fmt::Display for MonthKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:04}-{:02}", self.year, self.month)
    }
}

/// Calendar quarter bucket, rendered as `YYYYQn`
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct QuarterKey {
    year: i32,
    quarter: u32,
}

impl From<NaiveDate> for QuarterKey {
    fn from(date: NaiveDate) -> Self {
        Self {
            year: date.year(),
            quarter: date.month().div_ceil(3),
        }
    }
}

impl fmt::Display for QuarterKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:04}Q{}", self.year, self.quarter)
    }
}

/// Running month and quarter sums. Keys iterate in chronological order.
#[derive(Debug, Default, Clone)]
pub struct PeriodBuckets {
    monthly: BTreeMap<MonthKey, f64>,
    quarterly: BTreeMap<QuarterKey, f64>,
}

impl PeriodBuckets {
    pub fn add(&mut self, date: NaiveDate, cost: f64) {
        *self.monthly.entry(MonthKey::from(date)).or_insert(0.0) += cost;
        *self.quarterly.entry(QuarterKey::from(date)).or_insert(0.0) += cost;
    }

    pub fn monthly(&self) -> impl Iterator<Item = (MonthKey, f64)> + '_ {
        self.monthly.iter().map(|(k, v)| (*k, *v))
    }

    pub fn quarterly(&self) -> impl Iterator<Item = (QuarterKey, f64)> + '_ {
        self.quarterly.iter().map(|(k, v)| (*k, *v))
    }
}
