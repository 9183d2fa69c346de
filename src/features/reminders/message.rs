//! Reminder and listing text
//!
//! Each reminder picks one of several phrasings. The choice is a pure function
//! of the person, the occurrence date and the days remaining, so re-rendering
//! the same reminder always yields the same text.
//!
//! - **Version**: 1.0.0
//! - **Since**: 1.0.0

use crate::features::reminders::scheduler::DueReminder;
use crate::features::reminders::service::BirthdayListRow;
use sha2::{Digest, Sha256};

const TODAY_TEMPLATES: &[&str] = &[
    "🎉 It's {name}'s birthday today!\nDate: {date}\nThis is not a drill.",
    "🥳 Today we celebrate {name}.\nDate: {date}\nGo make it count.",
    "🚨 Birthday Alert 🚨\n{name}'s big day has arrived.\nDate: {date}",
    "🎂 It's {name} Day™.\nDate: {date}",
    "📢 Public service announcement:\n{name} was born on this day.\nDate: {date}\nCake is appropriate.",
    "🌟 Today's featured human: {name}.\nDate: {date}",
];

const TOMORROW_TEMPLATES: &[&str] = &[
    "⏳ 24-hour warning.\n{name}'s birthday is tomorrow.\nDate: {date}",
    "🎁 Heads up - {name}'s big day is tomorrow.\nDate: {date}",
    "🗓️ Tomorrow: {name}'s birthday.\nDate: {date}\nPlan accordingly.",
    "🎈 One sleep left until {name}'s birthday.\nDate: {date}",
    "📦 Final call before {name}'s birthday.\nDate: {date}",
];

const IN_DAYS_TEMPLATES: &[&str] = &[
    "📆 Countdown: {days} days until {name}'s birthday.\nDate: {date}",
    "🎉 {name}'s birthday is in {days} days.\nDate: {date}",
    "⌛ T-minus {days} days until {name} Day.\nDate: {date}",
    "🎈 {days} days until cake for {name}.\nDate: {date}",
    "🧁 {days} days left to prepare for {name}'s birthday.\nDate: {date}",
    "📢 Announcement: {name}'s birthday is {days} days away.\nDate: {date}",
];

const TODAY_AGE_TEMPLATES: &[&str] = &[
    "🎉 It's {name}'s birthday (turning {age})!\nDate: {date}",
    "🎈 {name} officially turns {age} today.\nDate: {date}",
    "🎂 {name} hits {age} today.\nDate: {date}",
    "🥳 Today marks {age} years of {name}.\nDate: {date}",
];

const TOMORROW_AGE_TEMPLATES: &[&str] = &[
    "⏳ {name} turns {age} tomorrow.\nDate: {date}",
    "🎉 {age} begins tomorrow for {name}.\nDate: {date}",
    "🗓️ Tomorrow: {name} hits {age}.\nDate: {date}",
];

const IN_DAYS_AGE_TEMPLATES: &[&str] = &[
    "📆 In {days} days, {name} turns {age}.\nDate: {date}",
    "🎉 {days} days until {name} hits {age}.\nDate: {date}",
    "🌟 {name} reaches {age} in {days} days.\nDate: {date}",
];

fn template_group(reminder: &DueReminder) -> (&'static str, &'static [&'static str]) {
    let has_age = reminder.turning_age.is_some();
    match (reminder.days_until, has_age) {
        (0, false) => ("today", TODAY_TEMPLATES),
        (0, true) => ("today-age", TODAY_AGE_TEMPLATES),
        (1, false) => ("tomorrow", TOMORROW_TEMPLATES),
        (1, true) => ("tomorrow-age", TOMORROW_AGE_TEMPLATES),
        (_, false) => ("in-days", IN_DAYS_TEMPLATES),
        (_, true) => ("in-days-age", IN_DAYS_AGE_TEMPLATES),
    }
}

fn select_template(reminder: &DueReminder, group: &str, templates: &[&'static str]) -> &'static str {
    let seed = format!(
        "{}|{}|{}|{}",
        reminder.person_id, reminder.occurrence, reminder.days_until, group
    );
    let digest = Sha256::digest(seed.as_bytes());
    let index = u32::from_be_bytes([digest[0], digest[1], digest[2], digest[3]]) as usize;
    templates[index % templates.len()]
}

pub fn format_reminder_message(reminder: &DueReminder) -> String {
    let (group, templates) = template_group(reminder);
    let template = select_template(reminder, group, templates);

    let age = reminder
        .turning_age
        .map(|a| a.to_string())
        .unwrap_or_default();
    template
        .replace("{name}", &reminder.name)
        .replace("{age}", &age)
        .replace("{days}", &reminder.days_until.to_string())
        .replace("{date}", &reminder.occurrence.format("%Y-%m-%d").to_string())
}

/// `30d, 7d, 1d, day-of`
pub fn format_reminder_offsets(offsets: &[u32]) -> String {
    offsets
        .iter()
        .map(|&offset| {
            if offset == 0 {
                "day-of".to_string()
            } else {
                format!("{offset}d")
            }
        })
        .collect::<Vec<_>>()
        .join(", ")
}

pub fn render_list_message(rows: &[BirthdayListRow]) -> String {
    if rows.is_empty() {
        return "No birthdays tracked yet.".to_string();
    }

    let mut lines = vec![
        format!("Tracked birthdays ({})", rows.len()),
        "Sorted by soonest:".to_string(),
    ];

    for (index, row) in rows.iter().enumerate() {
        lines.push(format!("{}. {}", index + 1, row.record.name));

        let mut details = vec![
            format!("In {}d", row.days_until),
            format!("Next {}", row.next_date.format("%Y-%m-%d")),
        ];
        if let Some(age) = row.turning_age {
            details.push(format!("Turning {age}"));
        }
        let offsets: Vec<u32> = row.record.distinct_offsets().into_iter().rev().collect();
        details.push(format!("Reminders {}", format_reminder_offsets(&offsets)));
        lines.push(format!("   {}", details.join(" | ")));
        lines.push(String::new());
    }

    lines.join("\n").trim_end().to_string()
}
