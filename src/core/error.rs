//! Error types for the birthday core
//!
//! - **Version**: 1.0.0
//! - **Since**: 1.0.0

use std::path::PathBuf;
use thiserror::Error;

/// A single birthday record failed validation.
///
/// Scoped to that record: callers skip it and keep processing the rest.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ValidationError {
    #[error("birthday name must not be empty")]
    EmptyName,
    #[error("invalid month: {0}")]
    InvalidMonth(u32),
    #[error("invalid day: {0}")]
    InvalidDay(u32),
    #[error("invalid month/day combination: {month:02}-{day:02}")]
    InvalidMonthDay { month: u32, day: u32 },
    #[error("year must be between 1900 and 3000 when provided (got {0})")]
    YearOutOfRange(i32),
    #[error("{year:04}-{month:02}-{day:02} is not a real date")]
    InvalidDate { year: i32, month: u32, day: u32 },
    #[error("reminder offsets must be comma-separated non-negative integers")]
    InvalidOffsets,
}

/// Schedule settings that make the bot unsafe to start.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ConfigError {
    #[error("unsupported leap_day_rule '{0}' (only 'feb28' is supported)")]
    UnsupportedLeapDayRule(String),
    #[error("daily_send_time '{0}' must be a valid 24-hour HH:MM time")]
    InvalidSendTime(String),
    #[error("unknown timezone '{0}'")]
    UnknownTimezone(String),
}

/// Reading or writing one of the persisted state files failed.
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("failed to access {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("failed to parse {path}: {source}")]
    Parse {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },
}

impl StoreError {
    pub(crate) fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        StoreError::Io {
            path: path.into(),
            source,
        }
    }
}
