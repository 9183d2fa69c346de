use anyhow::{Context as _, Result};
use dotenvy::dotenv;
use log::{error, info};
use serenity::async_trait;
use serenity::http::Http;
use serenity::model::channel::Message;
use serenity::model::gateway::Ready;
use serenity::prelude::*;
use std::sync::Arc;

use birthday_bot::commands::{CommandAccess, CommandHandler};
use birthday_bot::core::Config;
use birthday_bot::features::birthdays::{BirthdayBook, IdentityIndex};
use birthday_bot::features::reminders::{
    DedupeStore, DiscordChannelSink, ReminderScheduler, ReminderService,
};

struct Handler {
    command_handler: Arc<CommandHandler>,
}

#[async_trait]
impl EventHandler for Handler {
    async fn message(&self, ctx: Context, msg: Message) {
        if msg.author.bot {
            return;
        }

        if let Err(e) = self.command_handler.handle_message(&ctx, &msg).await {
            error!("Error handling message: {e:#}");
            if let Err(why) = msg
                .channel_id
                .say(&ctx.http, "Sorry, I couldn't read the birthday list right now.")
                .await
            {
                error!("Failed to send error message: {why}");
            }
        }
    }

    async fn ready(&self, _ctx: Context, ready: Ready) {
        info!("🎉 {} is connected and ready!", ready.user.name);
        info!("📡 Connected to {} guilds", ready.guilds.len());
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    // Load environment variables from .env file
    dotenv().ok();

    let config = Config::from_env()?;

    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(&config.log_level))
        .init();

    info!("Starting Birthday Reminder Bot...");

    BirthdayBook::ensure_default(&config.birthday_config_path)?;
    let book = BirthdayBook::load(&config.birthday_config_path)?;

    // Ambiguous scheduling settings are fatal before anything runs
    let schedule = book
        .schedule()
        .with_context(|| format!("Invalid settings in {}", config.birthday_config_path.display()))?;
    info!(
        "📄 Loaded {} birthday(s) from {}",
        book.birthdays.len(),
        config.birthday_config_path.display()
    );

    let identities = IdentityIndex::load(&config.person_index_path)
        .context("Failed to load person identity index")?;
    let dedupe = DedupeStore::load(&config.reminder_state_path)
        .context("Failed to load reminder state")?;
    info!(
        "🆔 {} known person id(s), {} reminder(s) already sent",
        identities.len(),
        dedupe.len()
    );

    // Reminders go out over REST, independent of the gateway session
    let http = Arc::new(Http::new(&config.discord_token));
    let sink = Arc::new(DiscordChannelSink::new(http, config.reminder_channel_id));

    let service = Arc::new(ReminderService::new(
        config.birthday_config_path.clone(),
        schedule,
        identities,
        dedupe,
        sink,
    ));

    let command_handler = CommandHandler::new(
        service.clone(),
        CommandAccess {
            allowed_user_id: config.allowed_user_id,
            channel_id: config.command_channel_id,
        },
    );
    let handler = Handler {
        command_handler: Arc::new(command_handler),
    };

    let intents = GatewayIntents::GUILD_MESSAGES
        | GatewayIntents::DIRECT_MESSAGES
        | GatewayIntents::MESSAGE_CONTENT;

    let mut client = Client::builder(&config.discord_token, intents)
        .event_handler(handler)
        .await
        .map_err(|e| {
            error!("Failed to create Discord client: {e}");
            anyhow::anyhow!("Client creation failed: {}", e)
        })?;

    let scheduler = ReminderScheduler::new(service);

    info!("Establishing WebSocket connection to Discord gateway...");
    tokio::select! {
        result = scheduler.run() => {
            if let Err(e) = result {
                error!("Reminder scheduler stopped: {e}");
                return Err(e.into());
            }
        }
        result = client.start() => {
            if let Err(why) = result {
                error!("Gateway connection failed: {why:?}");
                return Err(why.into());
            }
        }
        _ = tokio::signal::ctrl_c() => {
            info!("👋 Shutdown requested, stopping reminder scheduler");
        }
    }

    Ok(())
}
