//! Print the tracked birthdays, soonest first, with each record's person id

use anyhow::{Context, Result};
use chrono::Utc;
use dotenvy::dotenv;

use birthday_bot::core::Config;
use birthday_bot::features::birthdays::{BirthdayBook, IdentityIndex};
use birthday_bot::features::reminders::message::render_list_message;
use birthday_bot::features::reminders::service::list_rows;

fn main() -> Result<()> {
    dotenv().ok();
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("warn")).init();

    let (book_path, index_path) = Config::paths_from_env();
    let book = BirthdayBook::load(&book_path)?;
    let schedule = book
        .schedule()
        .with_context(|| format!("Invalid settings in {}", book_path.display()))?;

    let today = Utc::now().with_timezone(&schedule.timezone).date_naive();
    let rows = list_rows(&book.birthdays, today, &schedule);
    println!("{}", render_list_message(&rows));

    let mut index = IdentityIndex::load(&index_path).context("Failed to load person identity index")?;
    let identities = index.resolve(&book.birthdays)?;
    println!();
    println!("Person ids (book order):");
    for (position, record) in book.birthdays.iter().enumerate() {
        match identities.get(position) {
            Some(id) => println!("{:>3}. {} -> {}", position + 1, record.name, id),
            None => println!("{:>3}. {} -> (invalid record)", position + 1, record.name),
        }
    }

    Ok(())
}
