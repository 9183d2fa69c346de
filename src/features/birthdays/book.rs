//! # Birthday Book
//!
//! YAML file holding the schedule settings and the ordered list of birthdays.
//!
//! ```yaml
//! timezone: America/Los_Angeles
//! daily_send_time: "09:00"
//! leap_day_rule: feb28
//! birthdays:
//!   - name: Alice
//!     month: 3
//!     day: 14
//!     year: 1990
//!     reminder_offsets: [30, 7, 1, 0]
//! ```
//!
//! - **Version**: 1.0.0
//! - **Since**: 1.0.0

use crate::core::storage::write_atomic;
use crate::core::ConfigError;
use crate::features::birthdays::dates::LeapDayRule;
use crate::features::birthdays::record::BirthdayRecord;
use anyhow::{anyhow, Context, Result};
use chrono::NaiveTime;
use chrono_tz::Tz;
use log::info;
use serde::{Deserialize, Serialize};
use std::path::Path;

pub const DEFAULT_TIMEZONE: &str = "America/Los_Angeles";
pub const DEFAULT_SEND_TIME: &str = "09:00";

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BirthdayBook {
    pub timezone: String,
    pub daily_send_time: String,
    #[serde(default = "default_leap_day_rule")]
    pub leap_day_rule: String,
    #[serde(default)]
    pub birthdays: Vec<BirthdayRecord>,
}

fn default_leap_day_rule() -> String {
    LeapDayRule::default().to_string()
}

impl Default for BirthdayBook {
    fn default() -> Self {
        Self {
            timezone: DEFAULT_TIMEZONE.to_string(),
            daily_send_time: DEFAULT_SEND_TIME.to_string(),
            leap_day_rule: default_leap_day_rule(),
            birthdays: Vec::new(),
        }
    }
}

/// Validated schedule settings; any failure here is fatal at startup
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ScheduleSettings {
    pub timezone: Tz,
    pub send_time: NaiveTime,
    pub leap_day_rule: LeapDayRule,
}

impl ScheduleSettings {
    pub fn new(timezone: &str, daily_send_time: &str, leap_day_rule: &str) -> Result<Self, ConfigError> {
        let tz = timezone
            .trim()
            .parse::<Tz>()
            .map_err(|_| ConfigError::UnknownTimezone(timezone.to_string()))?;
        Ok(Self {
            timezone: tz,
            send_time: parse_send_time(daily_send_time)?,
            leap_day_rule: leap_day_rule.parse()?,
        })
    }
}

/// Parse a strict 24-hour `HH:MM` time
pub fn parse_send_time(value: &str) -> Result<NaiveTime, ConfigError> {
    let invalid = || ConfigError::InvalidSendTime(value.to_string());
    let (hour, minute) = value.trim().split_once(':').ok_or_else(invalid)?;

    let is_number = |s: &str| !s.is_empty() && s.len() <= 2 && s.chars().all(|c| c.is_ascii_digit());
    if !is_number(hour) || !is_number(minute) {
        return Err(invalid());
    }

    let hour: u32 = hour.parse().map_err(|_| invalid())?;
    let minute: u32 = minute.parse().map_err(|_| invalid())?;
    NaiveTime::from_hms_opt(hour, minute, 0).ok_or_else(invalid)
}

impl BirthdayBook {
    pub fn load(path: &Path) -> Result<Self> {
        let contents = std::fs::read_to_string(path)
            .with_context(|| format!("Birthday config not found: {}", path.display()))?;
        Self::from_yaml(&contents)
            .with_context(|| format!("Failed to parse birthday config {}", path.display()))
    }

    pub fn from_yaml(contents: &str) -> Result<Self> {
        let book: BirthdayBook = serde_yaml::from_str(contents)?;
        Ok(book)
    }

    pub fn schedule(&self) -> Result<ScheduleSettings, ConfigError> {
        ScheduleSettings::new(&self.timezone, &self.daily_send_time, &self.leap_day_rule)
    }

    /// Render the book back to YAML, validating settings and every record first
    pub fn to_yaml(&self) -> Result<String> {
        let schedule = self.schedule()?;
        let birthdays = self
            .birthdays
            .iter()
            .enumerate()
            .map(|(i, record)| {
                record
                    .validated()
                    .map_err(|e| anyhow!("birthday #{} ({}): {e}", i + 1, record.name))
            })
            .collect::<Result<Vec<_>>>()?;

        let normalized = BirthdayBook {
            timezone: self.timezone.trim().to_string(),
            daily_send_time: schedule.send_time.format("%H:%M").to_string(),
            leap_day_rule: schedule.leap_day_rule.to_string(),
            birthdays,
        };
        Ok(serde_yaml::to_string(&normalized)?)
    }

    pub fn save_atomic(&self, path: &Path) -> Result<()> {
        let rendered = self.to_yaml()?;
        write_atomic(path, rendered.as_bytes())?;
        Ok(())
    }

    /// Write a default book when none exists yet
    pub fn ensure_default(path: &Path) -> Result<()> {
        if path.exists() {
            return Ok(());
        }
        BirthdayBook::default().save_atomic(path)?;
        info!("📄 Created default birthday config at {}", path.display());
        Ok(())
    }

    /// Append a record and save; returns the updated book
    pub fn append_birthday(path: &Path, record: BirthdayRecord) -> Result<Self> {
        let record = record.validated()?;
        let mut book = Self::load(path)?;
        book.birthdays.push(record);
        book.save_atomic(path)?;
        Ok(book)
    }

    /// Replace the record at `position` (0-based) and save
    pub fn update_birthday(path: &Path, position: usize, record: BirthdayRecord) -> Result<Self> {
        let record = record.validated()?;
        let mut book = Self::load(path)?;
        let slot = book
            .birthdays
            .get_mut(position)
            .ok_or_else(|| anyhow!("No birthday at position {}", position + 1))?;
        *slot = record;
        book.save_atomic(path)?;
        Ok(book)
    }
}
