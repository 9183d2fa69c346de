//! Date engine: next occurrence and days-until for a birthday
//!
//! All calculations take "today" as a calendar date that the caller already
//! resolved in the configured timezone.
//!
//! - **Version**: 1.0.0
//! - **Since**: 1.0.0

use crate::core::{ConfigError, ValidationError};
use crate::features::birthdays::record::{validate_month_day, BirthdayRecord};
use chrono::{Datelike, NaiveDate};
use std::fmt;
use std::str::FromStr;

/// How Feb 29 birthdays are observed in non-leap years
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum LeapDayRule {
    /// Celebrate on Feb 28
    #[default]
    Feb28,
}

impl fmt::Display for LeapDayRule {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            LeapDayRule::Feb28 => write!(f, "feb28"),
        }
    }
}

impl FromStr for LeapDayRule {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "feb28" => Ok(LeapDayRule::Feb28),
            _ => Err(ConfigError::UnsupportedLeapDayRule(s.to_string())),
        }
    }
}

pub fn is_leap_year(year: i32) -> bool {
    year % 4 == 0 && (year % 100 != 0 || year % 400 == 0)
}

/// The date a birthday is observed in `year`
pub fn occurrence_in_year(
    record: &BirthdayRecord,
    year: i32,
    rule: LeapDayRule,
) -> Result<NaiveDate, ValidationError> {
    validate_month_day(record.month, record.day)?;

    let day = if record.month == 2 && record.day == 29 && !is_leap_year(year) {
        match rule {
            LeapDayRule::Feb28 => 28,
        }
    } else {
        record.day
    };

    NaiveDate::from_ymd_opt(year, record.month, day).ok_or(ValidationError::InvalidMonthDay {
        month: record.month,
        day: record.day,
    })
}

/// The first observed birthday on or after `today`
pub fn next_occurrence(
    record: &BirthdayRecord,
    today: NaiveDate,
    rule: LeapDayRule,
) -> Result<NaiveDate, ValidationError> {
    let this_year = occurrence_in_year(record, today.year(), rule)?;
    if this_year >= today {
        return Ok(this_year);
    }
    occurrence_in_year(record, today.year() + 1, rule)
}

/// Whole days from `today` to the next occurrence (0 on the day itself)
pub fn days_until(
    record: &BirthdayRecord,
    today: NaiveDate,
    rule: LeapDayRule,
) -> Result<u32, ValidationError> {
    let next = next_occurrence(record, today, rule)?;
    // next >= today, and at most one year ahead
    Ok((next - today).num_days() as u32)
}

/// Age reached on `occurrence` when the birth year is known
pub fn turning_age(record: &BirthdayRecord, occurrence: NaiveDate) -> Option<i32> {
    record.year.map(|year| occurrence.year() - year)
}
