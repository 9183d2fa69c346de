//! # Identity Index
//!
//! Stable person identifiers for records that carry no explicit id.
//!
//! An identifier is bound to `(normalized key, occurrence index)`: the n-th
//! record in source order sharing the same normalized name/month/day/year
//! always gets the n-th identifier stored for that bucket. Entries are only
//! ever appended, so identifiers survive unrelated edits elsewhere in the book.
//! Reordering records inside one bucket moves identifiers between rows.
//!
//! Every pass re-reads the index file first, so several processes sharing one
//! file agree on identifiers, and newly minted ones only become visible once
//! they are on disk.
//!
//! - **Version**: 1.1.0
//! - **Since**: 1.0.0
//!
//! ## Changelog
//! - 1.1.0: Reload from disk before each pass; keep minted ids only after a successful write
//! - 1.0.0: Initial identity index

use crate::core::storage::{read_json_optional, write_json_atomic};
use crate::core::{StoreError, ValidationError};
use crate::features::birthdays::record::{normalize, BirthdayRecord};
use log::{debug, info, warn};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashMap};
use std::path::{Path, PathBuf};
use uuid::Uuid;

const INDEX_VERSION: u32 = 1;

pub type PersonId = String;

#[derive(Debug, Default, Serialize, Deserialize)]
struct IndexFile {
    #[serde(default)]
    version: u32,
    #[serde(default)]
    buckets: BTreeMap<String, Vec<PersonId>>,
}

/// Persisted `(key, occurrence) -> identifier` mapping
#[derive(Debug)]
pub struct IdentityIndex {
    path: PathBuf,
    /// Last state known to be on disk
    buckets: BTreeMap<String, Vec<PersonId>>,
}

/// A record that could not be given an identity
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SkippedRecord {
    pub position: usize,
    pub name: String,
    pub error: ValidationError,
}

/// Result of one resolver pass over the book
#[derive(Debug, Default)]
pub struct IdentityResolution {
    /// Source position -> identifier, for every valid record
    pub by_position: BTreeMap<usize, PersonId>,
    pub skipped: Vec<SkippedRecord>,
    /// Number of identifiers created during this pass
    pub minted: usize,
}

impl IdentityResolution {
    pub fn get(&self, position: usize) -> Option<&PersonId> {
        self.by_position.get(&position)
    }
}

impl IdentityIndex {
    /// Load the index, starting empty when the file is absent or blank
    pub fn load(path: impl Into<PathBuf>) -> Result<Self, StoreError> {
        let path = path.into();
        let buckets = read_buckets(&path)?;
        debug!(
            "Loaded identity index from {} ({} buckets)",
            path.display(),
            buckets.len()
        );
        Ok(Self { path, buckets })
    }

    pub fn lookup(&self, key: &str, occurrence: usize) -> Option<&PersonId> {
        self.buckets.get(key).and_then(|ids| ids.get(occurrence))
    }

    pub fn len(&self) -> usize {
        self.buckets.values().map(Vec::len).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Assign identifiers to `records` in source order.
    ///
    /// Starts from the index file as it is on disk now. Invalid records are
    /// reported in `skipped` and do not consume an occurrence slot. The file
    /// is rewritten when anything was minted; a failed read or write is
    /// returned as an error, leaves this index untouched, and must be treated
    /// as fatal.
    pub fn resolve(&mut self, records: &[BirthdayRecord]) -> Result<IdentityResolution, StoreError> {
        let mut buckets = read_buckets(&self.path)?;
        let mut occurrences: HashMap<String, usize> = HashMap::new();
        let mut resolution = IdentityResolution::default();

        for (position, record) in records.iter().enumerate() {
            let key = match normalize(record) {
                Ok(key) => key.to_string(),
                Err(error) => {
                    warn!(
                        "Skipping birthday #{} ({}): {}",
                        position + 1,
                        record.name,
                        error
                    );
                    resolution.skipped.push(SkippedRecord {
                        position,
                        name: record.name.clone(),
                        error,
                    });
                    continue;
                }
            };

            let counter = occurrences.entry(key.clone()).or_insert(0);
            let occurrence = *counter;
            *counter += 1;

            let ids = buckets.entry(key).or_default();
            // Occurrences are visited in order, so a missing slot is always the next one
            let person_id = match ids.get(occurrence) {
                Some(existing) => existing.clone(),
                None => {
                    let minted = Uuid::new_v4().to_string();
                    ids.push(minted.clone());
                    resolution.minted += 1;
                    minted
                }
            };
            resolution.by_position.insert(position, person_id);
        }

        if resolution.minted > 0 {
            let file = IndexFile {
                version: INDEX_VERSION,
                buckets,
            };
            write_json_atomic(&self.path, &file)?;
            self.buckets = file.buckets;
            info!(
                "🆔 Assigned {} new person id(s), index saved to {}",
                resolution.minted,
                self.path.display()
            );
        } else {
            self.buckets = buckets;
        }

        Ok(resolution)
    }
}

fn read_buckets(path: &Path) -> Result<BTreeMap<String, Vec<PersonId>>, StoreError> {
    let file: IndexFile = read_json_optional(path)?.unwrap_or_default();
    Ok(file.buckets)
}
