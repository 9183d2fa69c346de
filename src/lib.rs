// Command layer - owner-only chat commands
pub mod commands;

// Core layer - configuration, errors, persistence helpers
pub mod core;

// Features layer - birthdays and reminders
pub mod features;

pub use commands::CommandHandler;
pub use core::Config;

pub use features::birthdays::{
    BirthdayBook, BirthdayRecord, IdentityIndex, LeapDayRule, NormalizedKey, PersonId,
    ScheduleSettings,
};
pub use features::reminders::{
    DedupeStore, DiscordChannelSink, ReminderKey, ReminderScheduler, ReminderService, ReminderSink,
};
