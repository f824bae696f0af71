//! Record numbering.
//!
//! Trackings and out-patient visit files carry human-facing numbers in the register
//! format `{year}{daily_count:02}{seq:03}`: the creation year, the running count of
//! records of that kind created the same day, and a monotonic per-kind sequence. The
//! counters persist in a single `sequence.json` so numbers survive restarts; the daily
//! count resets at day rollover, the sequence never does.
//!
//! The "current day" is an explicit parameter so tests control the calendar.

use chrono::{Datelike, NaiveDate};
use mhr_types::TrackingNumber;
use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use std::sync::Arc;

use crate::config::CoreConfig;
use crate::error::{RecordError, RecordResult};
use crate::repositories::helpers::{read_json, write_json_atomic};

/// Which register a number is drawn from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SequenceKind {
    /// Pregnancy tracking numbers.
    Trackings,
    /// Out-patient file numbers assigned on prenatal visits.
    Visits,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
struct Counter {
    day: Option<NaiveDate>,
    daily_count: u32,
    seq: u64,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
struct Counters {
    #[serde(default)]
    trackings: Counter,
    #[serde(default)]
    visits: Counter,
}

impl Counters {
    fn entry(&mut self, kind: SequenceKind) -> &mut Counter {
        match kind {
            SequenceKind::Trackings => &mut self.trackings,
            SequenceKind::Visits => &mut self.visits,
        }
    }
}

/// Persistent allocator for register numbers.
///
/// Allocation reads, advances, and rewrites `sequence.json` atomically, so two
/// consecutive allocations never hand out the same number even across restarts.
#[derive(Clone, Debug)]
pub struct SequenceStore {
    path: PathBuf,
}

impl SequenceStore {
    /// Creates a sequence store backed by the configured data directory.
    pub fn new(cfg: Arc<CoreConfig>) -> Self {
        Self {
            path: cfg.sequence_file(),
        }
    }

    /// Allocates the next number of the given kind for `today`.
    ///
    /// The daily count resets when `today` differs from the stored day; the sequence
    /// only ever increases.
    ///
    /// # Errors
    ///
    /// Returns storage errors if `sequence.json` cannot be read or rewritten.
    pub fn next(&self, kind: SequenceKind, today: NaiveDate) -> RecordResult<TrackingNumber> {
        let mut counters = match read_json::<Counters>(&self.path) {
            Ok(counters) => counters,
            Err(RecordError::NotFound(_)) => Counters::default(),
            Err(e) => return Err(e),
        };

        let counter = counters.entry(kind);
        if counter.day != Some(today) {
            counter.day = Some(today);
            counter.daily_count = 0;
        }
        counter.daily_count += 1;
        counter.seq += 1;

        let number = TrackingNumber::compose(today.year(), counter.daily_count, counter.seq);

        if let Some(parent) = self.path.parent() {
            std::fs::create_dir_all(parent).map_err(RecordError::StorageDirCreation)?;
        }
        write_json_atomic(&self.path, &counters)?;

        Ok(number)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).expect("valid test date")
    }

    fn store(temp_dir: &TempDir) -> SequenceStore {
        SequenceStore::new(Arc::new(CoreConfig::new(temp_dir.path().to_path_buf())))
    }

    #[test]
    fn consecutive_numbers_on_the_same_day() {
        let temp_dir = TempDir::new().expect("Failed to create temp dir");
        let store = store(&temp_dir);
        let today = date(2025, 8, 6);

        let first = store
            .next(SequenceKind::Trackings, today)
            .expect("first allocation should succeed");
        let second = store
            .next(SequenceKind::Trackings, today)
            .expect("second allocation should succeed");

        assert_eq!(first.as_str(), "202501001");
        assert_eq!(second.as_str(), "202502002");
    }

    #[test]
    fn day_rollover_resets_daily_count_but_not_sequence() {
        let temp_dir = TempDir::new().expect("Failed to create temp dir");
        let store = store(&temp_dir);

        store
            .next(SequenceKind::Trackings, date(2025, 8, 6))
            .expect("allocation should succeed");
        store
            .next(SequenceKind::Trackings, date(2025, 8, 6))
            .expect("allocation should succeed");

        let after_rollover = store
            .next(SequenceKind::Trackings, date(2025, 8, 7))
            .expect("allocation should succeed");

        // Daily count back to 01, sequence carries on at 003.
        assert_eq!(after_rollover.as_str(), "202501003");
    }

    #[test]
    fn kinds_are_counted_independently() {
        let temp_dir = TempDir::new().expect("Failed to create temp dir");
        let store = store(&temp_dir);
        let today = date(2025, 8, 6);

        store
            .next(SequenceKind::Trackings, today)
            .expect("allocation should succeed");
        let visit = store
            .next(SequenceKind::Visits, today)
            .expect("allocation should succeed");

        assert_eq!(visit.as_str(), "202501001");
    }

    #[test]
    fn counters_survive_a_new_store_instance() {
        let temp_dir = TempDir::new().expect("Failed to create temp dir");
        let today = date(2025, 8, 6);

        store(&temp_dir)
            .next(SequenceKind::Trackings, today)
            .expect("allocation should succeed");
        let resumed = store(&temp_dir)
            .next(SequenceKind::Trackings, today)
            .expect("allocation should succeed");

        assert_eq!(resumed.as_str(), "202502002");
    }
}
