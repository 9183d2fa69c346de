//! # Reminder Scheduler
//!
//! Decides which offset reminders are due on a given local date, and drives
//! the once-per-day check loop in the configured timezone.
//!
//! - **Version**: 1.0.0
//! - **Since**: 1.0.0
//!
//! The loop sleeps until the next send instant, recomputed from the wall clock
//! on every iteration. A process that starts after today's send time fires
//! immediately (catch-up); a date that already fired never fires again.

use crate::features::birthdays::dates::{days_until, next_occurrence, turning_age};
use crate::features::birthdays::{
    BirthdayRecord, IdentityResolution, LeapDayRule, PersonId, ScheduleSettings,
};
use crate::features::reminders::dedupe::ReminderKey;
use crate::features::reminders::service::{DispatchError, ReminderService};
use chrono::{
    DateTime, Datelike, Duration, LocalResult, NaiveDate, NaiveTime, Offset, TimeZone, Utc,
};
use chrono_tz::Tz;
use log::{error, info, warn};
use std::sync::Arc;

/// Longest single sleep; the target is recomputed after waking in case the
/// wall clock jumped (suspend, manual clock changes)
const MAX_SLEEP: std::time::Duration = std::time::Duration::from_secs(60 * 60);

/// A reminder that matches today's date, before dedupe filtering
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DueReminder {
    /// Position of the record in the birthday book
    pub position: usize,
    pub person_id: PersonId,
    pub name: String,
    pub offset: u32,
    pub occurrence: NaiveDate,
    pub days_until: u32,
    pub turning_age: Option<i32>,
}

impl DueReminder {
    pub fn key(&self) -> ReminderKey {
        ReminderKey::new(self.person_id.clone(), self.occurrence.year(), self.offset)
    }
}

/// Reminders due on `today`, sorted soonest first then by name.
///
/// Records without a resolved identity or with an invalid date are skipped.
pub fn due_reminders(
    records: &[BirthdayRecord],
    identities: &IdentityResolution,
    today: NaiveDate,
    rule: LeapDayRule,
) -> Vec<DueReminder> {
    let mut due = Vec::new();

    for (position, record) in records.iter().enumerate() {
        let Some(person_id) = identities.get(position) else {
            continue;
        };

        let (days, occurrence) = match days_until(record, today, rule)
            .and_then(|days| next_occurrence(record, today, rule).map(|next| (days, next)))
        {
            Ok(pair) => pair,
            Err(e) => {
                warn!("Skipping reminders for {}: {}", record.name, e);
                continue;
            }
        };

        // days_until is a single value, so at most one distinct offset matches
        if record.distinct_offsets().contains(&days) {
            due.push(DueReminder {
                position,
                person_id: person_id.clone(),
                name: record.name.clone(),
                offset: days,
                occurrence,
                days_until: days,
                turning_age: turning_age(record, occurrence),
            });
        }
    }

    due.sort_by(|a, b| {
        a.days_until
            .cmp(&b.days_until)
            .then_with(|| a.name.to_lowercase().cmp(&b.name.to_lowercase()))
    });
    due
}

/// Resolve a local wall-clock time to an instant.
///
/// Ambiguous times (clocks going back) take the earlier instant; times inside
/// a gap (clocks going forward) move to the first valid minute after it.
pub fn local_instant(tz: Tz, date: NaiveDate, time: NaiveTime) -> DateTime<Utc> {
    let wall = date.and_time(time);
    let mut naive = wall;
    // tz database gaps never exceed one day
    for _ in 0..=(24 * 60) {
        match tz.from_local_datetime(&naive) {
            LocalResult::Single(t) => return t.with_timezone(&Utc),
            LocalResult::Ambiguous(earliest, _) => return earliest.with_timezone(&Utc),
            LocalResult::None => naive += Duration::minutes(1),
        }
    }
    // Use the offset in force one day earlier
    let offset = tz.offset_from_utc_datetime(&(wall - Duration::days(1))).fix();
    Utc.from_utc_datetime(&(wall - Duration::seconds(i64::from(offset.local_minus_utc()))))
}

/// Once-per-local-day trigger at the configured send time
#[derive(Debug, Clone)]
pub struct DailyTrigger {
    timezone: Tz,
    send_time: NaiveTime,
    last_fired: Option<NaiveDate>,
}

impl DailyTrigger {
    pub fn new(settings: &ScheduleSettings) -> Self {
        Self {
            timezone: settings.timezone,
            send_time: settings.send_time,
            last_fired: None,
        }
    }

    pub fn local_date(&self, now: DateTime<Utc>) -> NaiveDate {
        now.with_timezone(&self.timezone).date_naive()
    }

    /// The local date to check now, if its send time has passed and it has
    /// not fired yet
    pub fn due_date(&self, now: DateTime<Utc>) -> Option<NaiveDate> {
        let today = self.local_date(now);
        if self.last_fired == Some(today) {
            return None;
        }
        if now >= local_instant(self.timezone, today, self.send_time) {
            Some(today)
        } else {
            None
        }
    }

    pub fn mark_fired(&mut self, date: NaiveDate) {
        self.last_fired = Some(date);
    }

    /// When the next check should happen
    pub fn next_wake(&self, now: DateTime<Utc>) -> DateTime<Utc> {
        let today = self.local_date(now);
        if self.last_fired != Some(today) {
            return local_instant(self.timezone, today, self.send_time).max(now);
        }
        let mut day = today;
        loop {
            day = match day.succ_opt() {
                Some(next) => next,
                None => return now + Duration::days(1),
            };
            let instant = local_instant(self.timezone, day, self.send_time);
            if instant > now {
                return instant;
            }
        }
    }
}

/// Background loop delivering birthday reminders once per day
pub struct ReminderScheduler {
    service: Arc<ReminderService>,
    trigger: DailyTrigger,
}

impl ReminderScheduler {
    pub fn new(service: Arc<ReminderService>) -> Self {
        let trigger = DailyTrigger::new(service.schedule());
        Self { service, trigger }
    }

    /// Run forever. Returns only when identity storage fails, since
    /// identifiers can no longer be trusted after that.
    pub async fn run(mut self) -> Result<(), DispatchError> {
        let schedule = self.service.schedule();
        info!(
            "⏰ Birthday reminder scheduler started (daily at {} {})",
            schedule.send_time.format("%H:%M"),
            schedule.timezone
        );

        loop {
            if let Some(today) = self.trigger.due_date(Utc::now()) {
                self.trigger.mark_fired(today);
                match self.service.dispatch_for_date(today).await {
                    Ok(outcome) => info!("🎂 Reminder check for {today}: {outcome}"),
                    Err(e) if e.is_fatal() => {
                        error!("❌ Reminder check for {today} failed: {e}");
                        return Err(e);
                    }
                    Err(e) => error!("Reminder check for {today} skipped: {e}"),
                }
            }

            let now = Utc::now();
            let wake = self.trigger.next_wake(now);
            let wait = (wake - now)
                .to_std()
                .unwrap_or(std::time::Duration::ZERO)
                .min(MAX_SLEEP);
            tokio::time::sleep(wait).await;
        }
    }
}
