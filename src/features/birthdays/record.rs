//! Birthday records and their normalized bucket keys
//!
//! - **Version**: 1.0.0
//! - **Since**: 1.0.0

use crate::core::ValidationError;
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use std::fmt;

/// Offsets used when a record does not list its own
pub const DEFAULT_REMINDER_OFFSETS: [u32; 4] = [30, 7, 1, 0];

/// A birthday as declared in the birthday book
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BirthdayRecord {
    pub name: String,
    pub month: u32,
    pub day: u32,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub year: Option<i32>,
    #[serde(default = "default_offsets")]
    pub reminder_offsets: Vec<u32>,
}

fn default_offsets() -> Vec<u32> {
    DEFAULT_REMINDER_OFFSETS.to_vec()
}

impl BirthdayRecord {
    pub fn new(name: impl Into<String>, month: u32, day: u32, year: Option<i32>) -> Self {
        Self {
            name: name.into(),
            month,
            day,
            year,
            reminder_offsets: default_offsets(),
        }
    }

    pub fn with_offsets(mut self, offsets: impl IntoIterator<Item = u32>) -> Self {
        self.reminder_offsets = offsets.into_iter().collect();
        self
    }

    /// Distinct offsets, falling back to the defaults when none are listed
    pub fn distinct_offsets(&self) -> BTreeSet<u32> {
        if self.reminder_offsets.is_empty() {
            DEFAULT_REMINDER_OFFSETS.iter().copied().collect()
        } else {
            self.reminder_offsets.iter().copied().collect()
        }
    }

    /// Strict validation applied before a record is written to the book.
    ///
    /// Returns the record with a trimmed name and offsets sorted descending.
    pub fn validated(&self) -> Result<BirthdayRecord, ValidationError> {
        let name = self.name.trim();
        if name.is_empty() {
            return Err(ValidationError::EmptyName);
        }
        validate_month_day(self.month, self.day)?;

        if let Some(year) = self.year {
            if !(1900..=3000).contains(&year) {
                return Err(ValidationError::YearOutOfRange(year));
            }
            if NaiveDate::from_ymd_opt(year, self.month, self.day).is_none() {
                return Err(ValidationError::InvalidDate {
                    year,
                    month: self.month,
                    day: self.day,
                });
            }
        }

        Ok(BirthdayRecord {
            name: name.to_string(),
            month: self.month,
            day: self.day,
            year: self.year,
            reminder_offsets: self.distinct_offsets().into_iter().rev().collect(),
        })
    }
}

/// Canonical bucket key: collapsed lowercase name, month, day, year-or-none
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct NormalizedKey {
    name: String,
    month: u32,
    day: u32,
    year: Option<i32>,
}

impl fmt::Display for NormalizedKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}|{:02}|{:02}|", self.name, self.month, self.day)?;
        match self.year {
            Some(year) => write!(f, "{year}"),
            None => write!(f, "none"),
        }
    }
}

/// Lowercase, trim and collapse internal whitespace
pub fn normalize_name(name: &str) -> String {
    name.split_whitespace()
        .map(str::to_lowercase)
        .collect::<Vec<_>>()
        .join(" ")
}

/// Check month/day against a leap year calendar so Feb 29 stays valid
pub fn validate_month_day(month: u32, day: u32) -> Result<(), ValidationError> {
    if !(1..=12).contains(&month) {
        return Err(ValidationError::InvalidMonth(month));
    }
    if !(1..=31).contains(&day) {
        return Err(ValidationError::InvalidDay(day));
    }
    if NaiveDate::from_ymd_opt(2000, month, day).is_none() {
        return Err(ValidationError::InvalidMonthDay { month, day });
    }
    Ok(())
}

pub fn normalize(record: &BirthdayRecord) -> Result<NormalizedKey, ValidationError> {
    validate_month_day(record.month, record.day)?;
    Ok(NormalizedKey {
        name: normalize_name(&record.name),
        month: record.month,
        day: record.day,
        year: record.year,
    })
}

/// Parse offsets typed by a user, e.g. `30, 7, 1, 0`.
///
/// Blank input, `skip` or `default` yield the default offsets; the flag in
/// the result reports whether the defaults were used.
pub fn parse_offsets_text(raw: &str) -> Result<(Vec<u32>, bool), ValidationError> {
    let text = raw.trim();
    if text.is_empty() || text.eq_ignore_ascii_case("skip") || text.eq_ignore_ascii_case("default")
    {
        return Ok((DEFAULT_REMINDER_OFFSETS.to_vec(), true));
    }

    let mut values = BTreeSet::new();
    for token in text.split(',').map(str::trim).filter(|t| !t.is_empty()) {
        if !token.chars().all(|c| c.is_ascii_digit()) {
            return Err(ValidationError::InvalidOffsets);
        }
        let value = token
            .parse::<u32>()
            .map_err(|_| ValidationError::InvalidOffsets)?;
        values.insert(value);
    }

    if values.is_empty() {
        return Err(ValidationError::InvalidOffsets);
    }
    Ok((values.into_iter().rev().collect(), false))
}
