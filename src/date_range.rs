use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Days, NaiveDate, Utc};
use serde::Serialize;

use crate::error::DeployMetricsError;

const SEPARATOR: &str = "..";
const DATE_FORMAT: &str = "%Y-%m-%d";

/// Inclusive range of calendar dates, written `YYYY-MM-DD..YYYY-MM-DD`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct DateRange {
    pub start: NaiveDate,
    pub end: NaiveDate,
}

impl DateRange {
    pub fn new(start: NaiveDate, end: NaiveDate) -> Result<Self, DeployMetricsError> {
        if start > end {
            return Err(DeployMetricsError::Config(format!(
                "Date filter start {start} is after end {end}"
            )));
        }
        Ok(Self { start, end })
    }

    pub fn contains(&self, timestamp: DateTime<Utc>) -> bool {
        let date = timestamp.date_naive();
        self.start <= date && date <= self.end
    }

    /// Number of calendar days covered, counting both ends.
    pub fn days(&self) -> i64 {
        (self.end - self.start).num_days() + 1
    }

    /// Split into two adjacent halves; `None` for a single day.
    pub fn split(&self) -> Option<(Self, Self)> {
        let days = self.days();
        if days < 2 {
            return None;
        }

        let first_end = self
            .start
            .checked_add_days(Days::new(u64::try_from(days / 2 - 1).ok()?))?;
        let second_start = first_end.succ_opt()?;
        Some((
            Self {
                start: self.start,
                end: first_end,
            },
            Self {
                start: second_start,
                end: self.end,
            },
        ))
    }

    /// Value for the GitHub `created` search qualifier.
    pub fn as_created_qualifier(&self) -> String {
        self.to_string()
    }
}

impl fmt::Display for DateRange {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}{SEPARATOR}{}",
            self.start.format(DATE_FORMAT),
            self.end.format(DATE_FORMAT)
        )
    }
}

impl FromStr for DateRange {
    type Err = DeployMetricsError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        let (start, end) = value.split_once(SEPARATOR).ok_or_else(|| {
            DeployMetricsError::Config(format!(
                "Date filter '{value}' must look like YYYY-MM-DD..YYYY-MM-DD"
            ))
        })?;

        let parse = |raw: &str| {
            NaiveDate::parse_from_str(raw, DATE_FORMAT).map_err(|e| {
                DeployMetricsError::Config(format!("Invalid date '{raw}' in date filter: {e}"))
            })
        };

        Self::new(parse(start)?, parse(end)?)
    }
}
