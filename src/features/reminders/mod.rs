//! # Reminders Feature
//!
//! Daily birthday reminders at configured day offsets, delivered once per
//! reminder across restarts.
//!
//! - **Version**: 1.0.0
//! - **Since**: 1.0.0
//! - **Toggleable**: false

pub mod dedupe;
pub mod delivery;
pub mod message;
pub mod scheduler;
pub mod service;

pub use dedupe::{DedupeStore, ReminderKey};
pub use delivery::{DiscordChannelSink, ReminderSink};
pub use message::{format_reminder_message, render_list_message};
pub use scheduler::{due_reminders, DailyTrigger, DueReminder, ReminderScheduler};
pub use service::{BirthdayListRow, DispatchError, DispatchOutcome, ReminderService};
