//! # Dedupe Store
//!
//! Persisted record of reminders already delivered, keyed by
//! `(person id, occurrence year, offset)` and mapped to the send time.
//!
//! - **Version**: 1.0.0
//! - **Since**: 1.0.0

use crate::core::storage::{read_json_optional, write_json_atomic};
use crate::core::StoreError;
use chrono::{DateTime, Duration, NaiveDate, Utc};
use log::{debug, info};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;
use std::path::PathBuf;

const STATE_VERSION: u32 = 1;

/// Entries older than this are dropped by [`DedupeStore::prune`]
pub const RETENTION_DAYS: i64 = 400;

/// One reminder instance: a person, the year of the birthday being announced,
/// and the offset in days before it
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct ReminderKey {
    pub person_id: String,
    pub occurrence_year: i32,
    pub offset: u32,
}

impl ReminderKey {
    pub fn new(person_id: impl Into<String>, occurrence_year: i32, offset: u32) -> Self {
        Self {
            person_id: person_id.into(),
            occurrence_year,
            offset,
        }
    }
}

impl fmt::Display for ReminderKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}|{}|{}", self.person_id, self.occurrence_year, self.offset)
    }
}

#[derive(Debug, Default, Serialize, Deserialize)]
struct StateFile {
    #[serde(default)]
    version: u32,
    #[serde(default)]
    sent: BTreeMap<String, DateTime<Utc>>,
    #[serde(default)]
    last_pruned: Option<NaiveDate>,
}

#[derive(Debug)]
pub struct DedupeStore {
    path: PathBuf,
    sent: BTreeMap<String, DateTime<Utc>>,
    last_pruned: Option<NaiveDate>,
}

impl DedupeStore {
    /// Load the store, starting empty when the file is absent or blank
    pub fn load(path: impl Into<PathBuf>) -> Result<Self, StoreError> {
        let path = path.into();
        let file: StateFile = read_json_optional(&path)?.unwrap_or_default();
        debug!(
            "Loaded reminder state from {} ({} sent keys)",
            path.display(),
            file.sent.len()
        );
        Ok(Self {
            path,
            sent: file.sent,
            last_pruned: file.last_pruned,
        })
    }

    pub fn is_sent(&self, key: &ReminderKey) -> bool {
        self.sent.contains_key(&key.to_string())
    }

    pub fn sent_at(&self, key: &ReminderKey) -> Option<DateTime<Utc>> {
        self.sent.get(&key.to_string()).copied()
    }

    pub fn len(&self) -> usize {
        self.sent.len()
    }

    pub fn is_empty(&self) -> bool {
        self.sent.is_empty()
    }

    pub fn last_pruned(&self) -> Option<NaiveDate> {
        self.last_pruned
    }

    /// Record a confirmed send and flush.
    ///
    /// The key stays recorded in memory even when the flush fails, so this
    /// process never re-sends it; only a restart could.
    pub fn mark_sent(&mut self, key: &ReminderKey, at: DateTime<Utc>) -> Result<(), StoreError> {
        self.sent.insert(key.to_string(), at);
        self.flush()
    }

    /// Drop entries sent more than [`RETENTION_DAYS`] before `today` and flush
    pub fn prune(&mut self, today: NaiveDate) -> Result<usize, StoreError> {
        if self.last_pruned == Some(today) {
            return Ok(0);
        }

        let cutoff = today - Duration::days(RETENTION_DAYS);
        let before = self.sent.len();
        self.sent.retain(|_, sent_at| sent_at.date_naive() >= cutoff);
        let removed = before - self.sent.len();
        self.last_pruned = Some(today);

        if removed > 0 {
            info!("🧹 Pruned {removed} reminder key(s) older than {cutoff}");
        }
        self.flush()?;
        Ok(removed)
    }

    fn flush(&self) -> Result<(), StoreError> {
        let file = StateFile {
            version: STATE_VERSION,
            sent: self.sent.clone(),
            last_pruned: self.last_pruned,
        };
        write_json_atomic(&self.path, &file)
    }
}
