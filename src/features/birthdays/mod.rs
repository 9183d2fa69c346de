//! # Birthdays Feature
//!
//! Birthday records, their normalized keys, stable person identities and the
//! date engine that resolves the next observed occurrence.
//!
//! - **Version**: 1.0.0
//! - **Since**: 1.0.0
//! - **Toggleable**: false

pub mod book;
pub mod dates;
pub mod identity;
pub mod record;

pub use book::{BirthdayBook, ScheduleSettings};
pub use dates::{days_until, next_occurrence, turning_age, LeapDayRule};
pub use identity::{IdentityIndex, IdentityResolution, PersonId, SkippedRecord};
pub use record::{
    normalize, parse_offsets_text, BirthdayRecord, NormalizedKey, DEFAULT_REMINDER_OFFSETS,
};
