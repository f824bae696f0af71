//! Append-only activity log.
//!
//! Every record mutation is logged for audit purposes: who-did-what metadata plus the
//! old/new field values of the change. Entries are JSON lines appended to
//! `activity/log.jsonl`; each line is written in a single call so concurrent appenders
//! do not interleave within a line.
//!
//! The log is write-mostly. Reading back is provided for the audit listing endpoint and
//! for tests; unparseable lines are skipped with a warning rather than poisoning the
//! whole log.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::fs;
use std::io::Write;
use std::path::PathBuf;
use std::sync::Arc;

use crate::config::CoreConfig;
use crate::constants::ACTIVITY_LOG_FILENAME;
use crate::error::{RecordError, RecordResult};

/// The kind of mutation an audit entry records.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AuditAction {
    Create,
    Update,
}

/// One line of the activity log.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AuditEntry {
    pub at: DateTime<Utc>,
    pub action: AuditAction,
    /// Short human-readable title, e.g. "Pregnancy Tracking Created".
    pub title: String,
    /// The record kind this entry concerns, e.g. "pregnancy_tracking".
    pub entity_kind: String,
    /// Canonical UUID of the record.
    pub entity_id: String,
    /// For creates: `{"new": ...}`. For updates: `{"old": ..., "new": ...}` with only
    /// the fields that changed.
    pub info: Value,
}

/// Append-only writer for the activity log.
#[derive(Clone, Debug)]
pub struct ActivityLog {
    path: PathBuf,
}

impl ActivityLog {
    /// Creates an activity log rooted at the configured data directory.
    pub fn new(cfg: Arc<CoreConfig>) -> Self {
        Self {
            path: cfg.activity_dir().join(ACTIVITY_LOG_FILENAME),
        }
    }

    /// Appends one entry to the log.
    ///
    /// # Errors
    ///
    /// Returns `RecordError::StorageDirCreation`, `RecordError::Serialization` or
    /// `RecordError::FileWrite` on failure.
    pub fn append(&self, entry: &AuditEntry) -> RecordResult<()> {
        if let Some(parent) = self.path.parent() {
            fs::create_dir_all(parent).map_err(RecordError::StorageDirCreation)?;
        }

        let mut line = serde_json::to_string(entry).map_err(RecordError::Serialization)?;
        line.push('\n');

        let mut file = fs::OpenOptions::new()
            .create(true)
            .append(true)
            .open(&self.path)
            .map_err(RecordError::FileWrite)?;
        file.write_all(line.as_bytes())
            .map_err(RecordError::FileWrite)?;

        Ok(())
    }

    /// Reads all entries back, oldest first.
    ///
    /// Lines that fail to parse are logged as warnings and skipped.
    pub fn entries(&self) -> Vec<AuditEntry> {
        let contents = match fs::read_to_string(&self.path) {
            Ok(contents) => contents,
            Err(_) => return Vec::new(),
        };

        contents
            .lines()
            .filter(|line| !line.trim().is_empty())
            .filter_map(|line| match serde_json::from_str(line) {
                Ok(entry) => Some(entry),
                Err(e) => {
                    tracing::warn!("skipping unparseable activity log line: {}", e);
                    None
                }
            })
            .collect()
    }
}

/// Computes the changed-fields payload for an update entry.
///
/// Compares two JSON objects and returns `(old, new)` containing only the keys whose
/// values differ, mirroring what a reviewer wants to see in the log: the delta, not the
/// whole record twice.
pub fn change_set(old: &Value, new: &Value) -> (Value, Value) {
    let (Some(old_map), Some(new_map)) = (old.as_object(), new.as_object()) else {
        return (old.clone(), new.clone());
    };

    let mut old_changed = serde_json::Map::new();
    let mut new_changed = serde_json::Map::new();

    for (key, new_value) in new_map {
        match old_map.get(key) {
            Some(old_value) if old_value == new_value => {}
            Some(old_value) => {
                old_changed.insert(key.clone(), old_value.clone());
                new_changed.insert(key.clone(), new_value.clone());
            }
            None => {
                new_changed.insert(key.clone(), new_value.clone());
            }
        }
    }

    (Value::Object(old_changed), Value::Object(new_changed))
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use tempfile::TempDir;

    fn log(temp_dir: &TempDir) -> ActivityLog {
        ActivityLog::new(Arc::new(CoreConfig::new(temp_dir.path().to_path_buf())))
    }

    fn entry(title: &str) -> AuditEntry {
        AuditEntry {
            at: Utc::now(),
            action: AuditAction::Create,
            title: title.to_string(),
            entity_kind: "pregnancy_tracking".to_string(),
            entity_id: "550e8400e29b41d4a716446655440000".to_string(),
            info: json!({"new": {"fullname": "Maria Santos"}}),
        }
    }

    #[test]
    fn append_then_read_back_in_order() {
        let temp_dir = TempDir::new().expect("Failed to create temp dir");
        let log = log(&temp_dir);

        log.append(&entry("First")).expect("append should succeed");
        log.append(&entry("Second")).expect("append should succeed");

        let entries = log.entries();
        assert_eq!(entries.len(), 2);
        assert_eq!(entries[0].title, "First");
        assert_eq!(entries[1].title, "Second");
    }

    #[test]
    fn entries_skip_corrupt_lines() {
        let temp_dir = TempDir::new().expect("Failed to create temp dir");
        let log = log(&temp_dir);

        log.append(&entry("Kept")).expect("append should succeed");
        fs::create_dir_all(temp_dir.path().join("activity")).expect("dir exists");
        let mut file = fs::OpenOptions::new()
            .append(true)
            .open(temp_dir.path().join("activity").join(ACTIVITY_LOG_FILENAME))
            .expect("log file exists");
        writeln!(file, "{{corrupt").expect("should write corrupt line");

        let entries = log.entries();
        assert_eq!(entries.len(), 1);
        assert_eq!(entries[0].title, "Kept");
    }

    #[test]
    fn change_set_keeps_only_differing_keys() {
        let old = json!({"age": 27, "fullname": "Maria Santos", "parity": 1});
        let new = json!({"age": 28, "fullname": "Maria Santos", "parity": 1});

        let (old_changed, new_changed) = change_set(&old, &new);
        assert_eq!(old_changed, json!({"age": 27}));
        assert_eq!(new_changed, json!({"age": 28}));
    }

    #[test]
    fn change_set_includes_newly_added_keys() {
        let old = json!({"parity": 1});
        let new = json!({"parity": 1, "anc_given": true});

        let (old_changed, new_changed) = change_set(&old, &new);
        assert_eq!(old_changed, json!({}));
        assert_eq!(new_changed, json!({"anc_given": true}));
    }
}
