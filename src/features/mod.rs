//! # Features Layer
//!
//! - **birthdays**: records, identities and the date engine
//! - **reminders**: daily scheduling, dedupe and delivery

pub mod birthdays;
pub mod reminders;

pub use birthdays::{BirthdayBook, BirthdayRecord, IdentityIndex, ScheduleSettings};
pub use reminders::{
    DedupeStore, DiscordChannelSink, ReminderScheduler, ReminderService, ReminderSink,
};
