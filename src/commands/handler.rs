//! Text command handling for `/list` and `/help`
//!
//! - **Version**: 1.0.0
//! - **Since**: 1.1.0

use crate::core::chunk_for_message;
use crate::features::reminders::{render_list_message, ReminderService};
use anyhow::Result;
use chrono::NaiveDate;
use log::{debug, info, warn};
use serenity::model::channel::Message;
use serenity::prelude::Context;
use std::sync::Arc;

pub const UNAUTHORIZED_REPLY: &str = "This bot is restricted to its configured owner.";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ChatCommand {
    List,
    Help,
}

impl ChatCommand {
    /// Parse the leading `/command` word; `/list@BotName` is accepted too
    pub fn parse(content: &str) -> Option<Self> {
        let word = content.split_whitespace().next()?;
        let name = word.strip_prefix('/')?;
        let name = name.split('@').next().unwrap_or(name);
        match name.to_ascii_lowercase().as_str() {
            "list" => Some(ChatCommand::List),
            "help" | "start" => Some(ChatCommand::Help),
            _ => None,
        }
    }
}

/// Who may run commands, and where
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CommandAccess {
    pub allowed_user_id: Option<u64>,
    pub channel_id: u64,
}

impl CommandAccess {
    pub fn is_authorized(&self, user_id: u64, channel_id: u64) -> bool {
        self.allowed_user_id == Some(user_id) && self.channel_id == channel_id
    }
}

pub fn render_help() -> String {
    [
        "Commands:",
        "/list - Show tracked birthdays and days until each",
        "/help - Show this help message",
        "",
        "Birthdays live in the YAML birthday book; reminders go out daily at the configured send time.",
    ]
    .join("\n")
}

pub struct CommandHandler {
    service: Arc<ReminderService>,
    access: CommandAccess,
}

impl CommandHandler {
    pub fn new(service: Arc<ReminderService>, access: CommandAccess) -> Self {
        if access.allowed_user_id.is_none() {
            warn!("ALLOWED_USER_ID is not set; chat commands will be refused");
        }
        Self { service, access }
    }

    /// Reply text for `command` sent by `user_id` in `channel_id`
    pub fn reply(
        &self,
        command: ChatCommand,
        user_id: u64,
        channel_id: u64,
        today: NaiveDate,
    ) -> Result<String> {
        if !self.access.is_authorized(user_id, channel_id) {
            warn!("🚫 Refused {command:?} from user {user_id} in channel {channel_id}");
            return Ok(UNAUTHORIZED_REPLY.to_string());
        }

        match command {
            ChatCommand::Help => Ok(render_help()),
            ChatCommand::List => {
                let rows = self.service.list_with_days_until(today)?;
                debug!("Listing {} birthday(s) for {today}", rows.len());
                Ok(render_list_message(&rows))
            }
        }
    }

    pub async fn handle_message(&self, ctx: &Context, msg: &Message) -> Result<()> {
        let Some(command) = ChatCommand::parse(&msg.content) else {
            return Ok(());
        };
        info!(
            "📥 Command {command:?} | User: {} | Channel: {}",
            msg.author.id, msg.channel_id
        );

        let reply = self.reply(
            command,
            msg.author.id.0,
            msg.channel_id.0,
            self.service.today(),
        )?;
        for chunk in chunk_for_message(&reply) {
            msg.channel_id.say(&ctx.http, chunk).await?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::MESSAGE_LIMIT;
    use crate::features::birthdays::{
        BirthdayBook, BirthdayRecord, IdentityIndex, LeapDayRule, ScheduleSettings,
    };
    use crate::features::reminders::{DedupeStore, ReminderSink};
    use async_trait::async_trait;
    use chrono::NaiveTime;
    use tempfile::TempDir;

    const OWNER: u64 = 7;
    const CHANNEL: u64 = 99;

    struct SilentSink;

    #[async_trait]
    impl ReminderSink for SilentSink {
        async fn send(&self, _text: &str) -> anyhow::Result<()> {
            Ok(())
        }
    }

    fn today() -> NaiveDate {
        NaiveDate::from_ymd_opt(2026, 3, 7).unwrap()
    }

    fn handler(dir: &TempDir, birthdays: Vec<BirthdayRecord>) -> CommandHandler {
        let book_path = dir.path().join("birthdays.yaml");
        BirthdayBook {
            timezone: "UTC".to_string(),
            birthdays,
            ..Default::default()
        }
        .save_atomic(&book_path)
        .unwrap();

        let schedule = ScheduleSettings {
            timezone: chrono_tz::UTC,
            send_time: NaiveTime::from_hms_opt(9, 0, 0).unwrap(),
            leap_day_rule: LeapDayRule::Feb28,
        };
        let service = ReminderService::new(
            book_path,
            schedule,
            IdentityIndex::load(dir.path().join("person_index.json")).unwrap(),
            DedupeStore::load(dir.path().join("reminder_state.json")).unwrap(),
            Arc::new(SilentSink),
        );
        CommandHandler::new(
            Arc::new(service),
            CommandAccess {
                allowed_user_id: Some(OWNER),
                channel_id: CHANNEL,
            },
        )
    }

    #[test]
    fn test_parse_commands() {
        assert_eq!(ChatCommand::parse("/list"), Some(ChatCommand::List));
        assert_eq!(ChatCommand::parse("  /LIST please"), Some(ChatCommand::List));
        assert_eq!(ChatCommand::parse("/list@BirthdayBot"), Some(ChatCommand::List));
        assert_eq!(ChatCommand::parse("/help"), Some(ChatCommand::Help));
        assert_eq!(ChatCommand::parse("list"), None);
        assert_eq!(ChatCommand::parse("/add"), None);
        assert_eq!(ChatCommand::parse(""), None);
    }

    #[test]
    fn test_access_requires_owner_and_channel() {
        let access = CommandAccess {
            allowed_user_id: Some(OWNER),
            channel_id: CHANNEL,
        };
        assert!(access.is_authorized(OWNER, CHANNEL));
        assert!(!access.is_authorized(OWNER + 1, CHANNEL));
        assert!(!access.is_authorized(OWNER, CHANNEL + 1));

        let locked = CommandAccess {
            allowed_user_id: None,
            channel_id: CHANNEL,
        };
        assert!(!locked.is_authorized(OWNER, CHANNEL));
    }

    #[test]
    fn test_strangers_are_refused() {
        let dir = TempDir::new().unwrap();
        let handler = handler(&dir, vec![BirthdayRecord::new("Alice", 3, 14, Some(1990))]);

        let reply = handler.reply(ChatCommand::List, 12345, CHANNEL, today()).unwrap();
        assert_eq!(reply, UNAUTHORIZED_REPLY);
    }

    #[test]
    fn test_help_lists_commands() {
        let dir = TempDir::new().unwrap();
        let handler = handler(&dir, vec![]);

        let reply = handler.reply(ChatCommand::Help, OWNER, CHANNEL, today()).unwrap();
        assert!(reply.contains("/list"));
        assert!(reply.contains("/help"));
    }

    #[test]
    fn test_list_reply_for_owner() {
        let dir = TempDir::new().unwrap();
        let handler = handler(
            &dir,
            vec![
                BirthdayRecord::new("Later", 12, 1, None),
                BirthdayRecord::new("Alice", 3, 14, Some(1990)),
            ],
        );

        let reply = handler.reply(ChatCommand::List, OWNER, CHANNEL, today()).unwrap();
        assert!(reply.starts_with("Tracked birthdays (2)"));
        let alice = reply.find("1. Alice").unwrap();
        let later = reply.find("2. Later").unwrap();
        assert!(alice < later);
        assert!(reply.contains("In 7d"));
        assert!(reply.contains("Turning 36"));
    }

    #[test]
    fn test_empty_book_reply() {
        let dir = TempDir::new().unwrap();
        let handler = handler(&dir, vec![]);

        let reply = handler.reply(ChatCommand::List, OWNER, CHANNEL, today()).unwrap();
        assert_eq!(reply, "No birthdays tracked yet.");
    }

    #[test]
    fn test_long_listing_splits_between_entries() {
        let dir = TempDir::new().unwrap();
        let birthdays = (0..120)
            .map(|i| BirthdayRecord::new(format!("Friend number {i:03}"), 1 + i % 12, 1 + i % 28, Some(1990)))
            .collect();
        let handler = handler(&dir, birthdays);

        let reply = handler.reply(ChatCommand::List, OWNER, CHANNEL, today()).unwrap();
        let messages = chunk_for_message(&reply);
        assert!(messages.len() > 1);
        for message in &messages[1..] {
            assert!(message.len() <= MESSAGE_LIMIT);
            // Each later message starts at an entry, never mid-entry
            let first_line = message.lines().next().unwrap();
            assert!(first_line.contains(". Friend number"), "{first_line}");
        }
        assert!(messages[0].starts_with("Tracked birthdays (120)"));
        assert!(messages[0].len() <= MESSAGE_LIMIT);
        assert_eq!(messages.join("\n\n"), reply);
    }

    #[test]
    fn test_missing_book_is_an_error() {
        let dir = TempDir::new().unwrap();
        let handler = handler(&dir, vec![]);
        std::fs::remove_file(dir.path().join("birthdays.yaml")).unwrap();

        assert!(handler.reply(ChatCommand::List, OWNER, CHANNEL, today()).is_err());
    }
}
