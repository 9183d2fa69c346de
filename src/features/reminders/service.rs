//! # Reminder Service
//!
//! Ties the birthday book, identity index, dedupe store and delivery sink
//! together: one dispatch per local day, plus the listing and identity
//! queries used by chat flows.
//!
//! - **Version**: 1.0.0
//! - **Since**: 1.0.0

use crate::core::StoreError;
use crate::features::birthdays::dates::{next_occurrence, turning_age};
use crate::features::birthdays::{
    days_until, BirthdayBook, BirthdayRecord, IdentityIndex, PersonId, ScheduleSettings,
};
use crate::features::reminders::dedupe::DedupeStore;
use crate::features::reminders::delivery::ReminderSink;
use crate::features::reminders::message::format_reminder_message;
use crate::features::reminders::scheduler::due_reminders;
use chrono::{NaiveDate, Utc};
use log::{debug, info, warn};
use std::fmt;
use std::path::PathBuf;
use std::sync::Arc;
use thiserror::Error;
use tokio::sync::Mutex;

#[derive(Debug, Error)]
pub enum DispatchError {
    /// The birthday book could not be read; the check is skipped
    #[error("birthday source unavailable: {0:#}")]
    Source(anyhow::Error),
    /// Identity index could not be persisted; the bot must stop
    #[error("identity index storage failed: {0}")]
    IdentityStorage(#[from] StoreError),
}

impl DispatchError {
    pub fn is_fatal(&self) -> bool {
        matches!(self, DispatchError::IdentityStorage(_))
    }
}

/// Counters for one dispatch
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct DispatchOutcome {
    pub due: usize,
    pub sent: usize,
    pub already_sent: usize,
    pub failed: usize,
    pub skipped_records: usize,
}

impl fmt::Display for DispatchOutcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} due, {} sent, {} already sent, {} failed, {} invalid record(s)",
            self.due, self.sent, self.already_sent, self.failed, self.skipped_records
        )
    }
}

/// One line of the birthday listing
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BirthdayListRow {
    pub record: BirthdayRecord,
    pub days_until: u32,
    pub next_date: NaiveDate,
    pub turning_age: Option<i32>,
}

struct ReminderState {
    identities: IdentityIndex,
    dedupe: DedupeStore,
}

pub struct ReminderService {
    book_path: PathBuf,
    schedule: ScheduleSettings,
    state: Mutex<ReminderState>,
    sink: Arc<dyn ReminderSink>,
}

impl ReminderService {
    pub fn new(
        book_path: impl Into<PathBuf>,
        schedule: ScheduleSettings,
        identities: IdentityIndex,
        dedupe: DedupeStore,
        sink: Arc<dyn ReminderSink>,
    ) -> Self {
        Self {
            book_path: book_path.into(),
            schedule,
            state: Mutex::new(ReminderState { identities, dedupe }),
            sink,
        }
    }

    pub fn schedule(&self) -> &ScheduleSettings {
        &self.schedule
    }

    /// Today's calendar date in the configured timezone
    pub fn today(&self) -> NaiveDate {
        Utc::now().with_timezone(&self.schedule.timezone).date_naive()
    }

    fn load_book(&self) -> Result<BirthdayBook, DispatchError> {
        BirthdayBook::load(&self.book_path).map_err(DispatchError::Source)
    }

    /// Deliver every reminder due on `today` that has not been sent yet.
    ///
    /// A reminder is recorded as sent only after the sink accepts it. Sink
    /// failures leave it unrecorded; dedupe write failures are logged and
    /// tolerated.
    pub async fn dispatch_for_date(&self, today: NaiveDate) -> Result<DispatchOutcome, DispatchError> {
        let book = self.load_book()?;
        let mut state = self.state.lock().await;

        let identities = state.identities.resolve(&book.birthdays)?;
        if let Err(e) = state.dedupe.prune(today) {
            warn!("Failed to prune reminder state: {e}");
        }

        let due = due_reminders(
            &book.birthdays,
            &identities,
            today,
            self.schedule.leap_day_rule,
        );
        let mut outcome = DispatchOutcome {
            due: due.len(),
            skipped_records: identities.skipped.len(),
            ..Default::default()
        };

        for reminder in due {
            let key = reminder.key();
            if state.dedupe.is_sent(&key) {
                debug!("Reminder {key} already sent, skipping");
                outcome.already_sent += 1;
                continue;
            }

            let message = format_reminder_message(&reminder);
            if let Err(e) = self.sink.send(&message).await {
                warn!(
                    "Failed to deliver reminder for {} ({} day(s) out): {e:#}",
                    reminder.name, reminder.offset
                );
                outcome.failed += 1;
                continue;
            }

            outcome.sent += 1;
            info!(
                "📨 Sent reminder for {} ({} day(s) until {})",
                reminder.name, reminder.days_until, reminder.occurrence
            );
            if let Err(e) = state.dedupe.mark_sent(&key, Utc::now()) {
                warn!(
                    "⚠️ Reminder {key} was delivered but could not be recorded ({e}); it may be sent again after a restart"
                );
            }
        }

        Ok(outcome)
    }

    /// Every valid birthday with days until its next occurrence, soonest first
    pub fn list_with_days_until(&self, today: NaiveDate) -> anyhow::Result<Vec<BirthdayListRow>> {
        let book = BirthdayBook::load(&self.book_path)?;
        Ok(list_rows(&book.birthdays, today, &self.schedule))
    }

    /// Stable identifier of the record at `position` in the current book
    pub async fn resolve_identity(&self, position: usize) -> Result<Option<PersonId>, DispatchError> {
        let book = self.load_book()?;
        let mut state = self.state.lock().await;
        let resolution = state.identities.resolve(&book.birthdays)?;
        Ok(resolution.get(position).cloned())
    }
}

/// Listing rows for `records`, skipping any with invalid dates
pub fn list_rows(
    records: &[BirthdayRecord],
    today: NaiveDate,
    schedule: &ScheduleSettings,
) -> Vec<BirthdayListRow> {
    let rule = schedule.leap_day_rule;
    let mut rows: Vec<BirthdayListRow> = records
        .iter()
        .filter_map(|record| {
            let days = days_until(record, today, rule).ok()?;
            let next_date = next_occurrence(record, today, rule).ok()?;
            Some(BirthdayListRow {
                record: record.clone(),
                days_until: days,
                next_date,
                turning_age: turning_age(record, next_date),
            })
        })
        .collect();

    rows.sort_by(|a, b| {
        a.days_until
            .cmp(&b.days_until)
            .then_with(|| a.record.name.to_lowercase().cmp(&b.record.name.to_lowercase()))
    });
    rows
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::features::birthdays::LeapDayRule;
    use anyhow::anyhow;
    use async_trait::async_trait;
    use chrono::NaiveTime;
    use std::path::Path;
    use std::sync::atomic::{AtomicBool, Ordering};
    use tempfile::TempDir;

    #[derive(Default)]
    struct RecordingSink {
        messages: std::sync::Mutex<Vec<String>>,
        fail: AtomicBool,
    }

    impl RecordingSink {
        fn messages(&self) -> Vec<String> {
            self.messages.lock().unwrap().clone()
        }
    }

    #[async_trait]
    impl ReminderSink for RecordingSink {
        async fn send(&self, text: &str) -> anyhow::Result<()> {
            if self.fail.load(Ordering::SeqCst) {
                return Err(anyhow!("channel unavailable"));
            }
            self.messages.lock().unwrap().push(text.to_string());
            Ok(())
        }
    }

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    fn schedule() -> ScheduleSettings {
        ScheduleSettings {
            timezone: chrono_tz::UTC,
            send_time: NaiveTime::from_hms_opt(9, 0, 0).unwrap(),
            leap_day_rule: LeapDayRule::Feb28,
        }
    }

    fn write_book(path: &Path, birthdays: Vec<BirthdayRecord>) {
        let book = BirthdayBook {
            timezone: "UTC".to_string(),
            birthdays,
            ..Default::default()
        };
        book.save_atomic(path).unwrap();
    }

    fn service(dir: &TempDir, sink: Arc<RecordingSink>) -> ReminderService {
        ReminderService::new(
            dir.path().join("birthdays.yaml"),
            schedule(),
            IdentityIndex::load(dir.path().join("person_index.json")).unwrap(),
            DedupeStore::load(dir.path().join("reminder_state.json")).unwrap(),
            sink,
        )
    }

    fn alice() -> BirthdayRecord {
        BirthdayRecord::new("Alice", 3, 14, Some(1990)).with_offsets([30, 7, 1, 0])
    }

    #[tokio::test]
    async fn test_dispatch_deduplicates_same_day() {
        let dir = TempDir::new().unwrap();
        write_book(&dir.path().join("birthdays.yaml"), vec![alice()]);
        let sink = Arc::new(RecordingSink::default());
        let service = service(&dir, sink.clone());

        let first = service.dispatch_for_date(date(2026, 3, 7)).await.unwrap();
        assert_eq!(first.sent, 1);
        let second = service.dispatch_for_date(date(2026, 3, 7)).await.unwrap();
        assert_eq!(second.sent, 0);
        assert_eq!(second.already_sent, 1);

        let messages = sink.messages();
        assert_eq!(messages.len(), 1);
        assert!(messages[0].contains("Alice"));
        assert!(messages[0].contains("Date: 2026-03-14"));
    }

    #[tokio::test]
    async fn test_dedupe_survives_restart() {
        let dir = TempDir::new().unwrap();
        write_book(&dir.path().join("birthdays.yaml"), vec![alice()]);
        let sink = Arc::new(RecordingSink::default());

        service(&dir, sink.clone())
            .dispatch_for_date(date(2026, 3, 7))
            .await
            .unwrap();
        // New service instance reloads both stores from disk
        let outcome = service(&dir, sink.clone())
            .dispatch_for_date(date(2026, 3, 7))
            .await
            .unwrap();

        assert_eq!(outcome.already_sent, 1);
        assert_eq!(sink.messages().len(), 1);
    }

    #[tokio::test]
    async fn test_next_offset_sends_on_its_own_day() {
        let dir = TempDir::new().unwrap();
        write_book(&dir.path().join("birthdays.yaml"), vec![alice()]);
        let sink = Arc::new(RecordingSink::default());
        let service = service(&dir, sink.clone());

        service.dispatch_for_date(date(2026, 3, 7)).await.unwrap();
        let quiet = service.dispatch_for_date(date(2026, 3, 8)).await.unwrap();
        assert_eq!(quiet.due, 0);
        let tomorrow = service.dispatch_for_date(date(2026, 3, 13)).await.unwrap();
        assert_eq!(tomorrow.sent, 1);
        let today = service.dispatch_for_date(date(2026, 3, 14)).await.unwrap();
        assert_eq!(today.sent, 1);
        assert_eq!(sink.messages().len(), 3);
    }

    #[tokio::test]
    async fn test_failed_delivery_is_not_marked_sent() {
        let dir = TempDir::new().unwrap();
        write_book(&dir.path().join("birthdays.yaml"), vec![alice()]);
        let sink = Arc::new(RecordingSink::default());
        let service = service(&dir, sink.clone());

        sink.fail.store(true, Ordering::SeqCst);
        let failed = service.dispatch_for_date(date(2026, 3, 7)).await.unwrap();
        assert_eq!(failed.failed, 1);
        assert_eq!(failed.sent, 0);

        sink.fail.store(false, Ordering::SeqCst);
        let retried = service.dispatch_for_date(date(2026, 3, 7)).await.unwrap();
        assert_eq!(retried.sent, 1);
        assert_eq!(sink.messages().len(), 1);
    }

    #[tokio::test]
    async fn test_two_bobs_each_get_a_reminder() {
        let dir = TempDir::new().unwrap();
        let bob = BirthdayRecord::new("Bob", 5, 1, Some(1980));
        write_book(&dir.path().join("birthdays.yaml"), vec![bob.clone(), bob]);
        let sink = Arc::new(RecordingSink::default());
        let service = service(&dir, sink.clone());

        let outcome = service.dispatch_for_date(date(2026, 5, 1)).await.unwrap();
        assert_eq!(outcome.sent, 2);

        let first = service.resolve_identity(0).await.unwrap().unwrap();
        let second = service.resolve_identity(1).await.unwrap().unwrap();
        assert_ne!(first, second);
        assert_eq!(service.resolve_identity(2).await.unwrap(), None);
    }

    #[tokio::test]
    async fn test_missing_book_is_not_fatal() {
        let dir = TempDir::new().unwrap();
        let service = service(&dir, Arc::new(RecordingSink::default()));

        let err = service.dispatch_for_date(date(2026, 3, 7)).await.unwrap_err();
        assert!(matches!(err, DispatchError::Source(_)));
        assert!(!err.is_fatal());
    }

    #[tokio::test]
    async fn test_unwritable_identity_index_is_fatal() {
        let dir = TempDir::new().unwrap();
        write_book(&dir.path().join("birthdays.yaml"), vec![alice()]);
        let service = service(&dir, Arc::new(RecordingSink::default()));
        // A directory now sits where the index file must be written
        std::fs::create_dir(dir.path().join("person_index.json")).unwrap();

        let err = service.dispatch_for_date(date(2026, 3, 7)).await.unwrap_err();
        assert!(matches!(err, DispatchError::IdentityStorage(_)));
        assert!(err.is_fatal());
    }

    #[tokio::test]
    async fn test_dispatch_after_failed_identity_write_stays_fatal() {
        let dir = TempDir::new().unwrap();
        write_book(&dir.path().join("birthdays.yaml"), vec![alice()]);
        let sink = Arc::new(RecordingSink::default());
        let service = service(&dir, sink.clone());
        std::fs::create_dir(dir.path().join("person_index.json")).unwrap();

        assert!(service.resolve_identity(0).await.is_err());
        // The id minted by the failed lookup must not be reused for delivery
        let err = service.dispatch_for_date(date(2026, 3, 7)).await.unwrap_err();
        assert!(matches!(err, DispatchError::IdentityStorage(_)));
        assert!(sink.messages().is_empty());
    }

    #[test]
    fn test_list_rows_sorted_soonest_first() {
        let records = vec![
            BirthdayRecord::new("Later", 12, 1, None),
            alice(),
            BirthdayRecord::new("Broken", 2, 31, None),
            BirthdayRecord::new("aaron", 3, 14, None),
        ];
        let rows = list_rows(&records, date(2026, 3, 7), &schedule());
        let names: Vec<_> = rows.iter().map(|r| r.record.name.as_str()).collect();
        assert_eq!(names, vec!["aaron", "Alice", "Later"]);
        assert_eq!(rows[1].days_until, 7);
        assert_eq!(rows[1].turning_age, Some(36));
        assert_eq!(rows[0].turning_age, None);
    }

    #[test]
    fn test_list_with_days_until_reads_book() {
        let dir = TempDir::new().unwrap();
        write_book(&dir.path().join("birthdays.yaml"), vec![alice()]);
        let service = service(&dir, Arc::new(RecordingSink::default()));
        let rows = service.list_with_days_until(date(2026, 3, 7)).unwrap();
        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0].next_date, date(2026, 3, 14));
    }
}
