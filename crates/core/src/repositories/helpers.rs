//! Repository-related utilities.
//!
//! This module contains functions shared by the record services: unique sharded
//! directory allocation and atomic JSON persistence.

use crate::error::{RecordError, RecordResult};
use crate::uuid::RecordUuid;
use serde::de::DeserializeOwned;
use serde::Serialize;
use std::{
    fs,
    io::{self, ErrorKind},
    path::{Path, PathBuf},
};

/// Creates a unique sharded directory within the base records directory.
///
/// This function generates UUIDs using the provided source function and attempts to create
/// a corresponding sharded directory. It guards against UUID collisions or pre-existing
/// directories by retrying up to 5 times with different UUIDs.
///
/// # Arguments
///
/// * `base_dir` - The base records directory.
/// * `uuid_source` - A mutable closure that generates new `RecordUuid` instances.
///
/// # Returns
///
/// Returns a tuple of the allocated `RecordUuid` and the `PathBuf` to the created directory.
///
/// # Errors
///
/// Returns a `RecordError::RecordDirCreation` if:
/// - directory creation fails after 5 attempts,
/// - parent directory creation fails.
pub(crate) fn create_unique_record_dir(
    base_dir: &Path,
    mut uuid_source: impl FnMut() -> RecordUuid,
) -> RecordResult<(RecordUuid, PathBuf)> {
    // Allocate a new UUID, but guard against pathological UUID collisions (or pre-existing
    // directories from external interference) by limiting retries.
    for _attempt in 0..5 {
        let uuid = uuid_source();
        let candidate = uuid.sharded_dir(base_dir);

        if candidate.exists() {
            continue;
        }

        if let Some(parent) = candidate.parent() {
            fs::create_dir_all(parent).map_err(RecordError::RecordDirCreation)?;
        }

        match fs::create_dir(&candidate) {
            Ok(()) => return Ok((uuid, candidate)),
            Err(e) if e.kind() == ErrorKind::AlreadyExists => continue,
            Err(e) => return Err(RecordError::RecordDirCreation(e)),
        }
    }

    Err(RecordError::RecordDirCreation(io::Error::new(
        ErrorKind::AlreadyExists,
        "failed to allocate a unique record directory after 5 attempts",
    )))
}

/// Writes a record as JSON, atomically.
///
/// The value is serialised to a temp file next to the target and renamed into place, so a
/// reader never observes a half-written record and a failed write leaves any previous
/// content untouched.
///
/// # Errors
///
/// Returns `RecordError::Serialization` or `RecordError::FileWrite`.
pub(crate) fn write_json_atomic<T: Serialize>(path: &Path, value: &T) -> RecordResult<()> {
    let json = serde_json::to_string_pretty(value).map_err(RecordError::Serialization)?;

    let tmp_path = path.with_extension("json.tmp");
    fs::write(&tmp_path, json).map_err(RecordError::FileWrite)?;
    fs::rename(&tmp_path, path).map_err(RecordError::FileWrite)?;

    Ok(())
}

/// Reads and deserialises a JSON record file.
///
/// # Errors
///
/// Returns `RecordError::NotFound` when the file does not exist,
/// `RecordError::FileRead` for other I/O failures, and
/// `RecordError::Deserialization` for malformed content.
pub(crate) fn read_json<T: DeserializeOwned>(path: &Path) -> RecordResult<T> {
    let contents = fs::read_to_string(path).map_err(|e| {
        if e.kind() == ErrorKind::NotFound {
            RecordError::NotFound(path.display().to_string())
        } else {
            RecordError::FileRead(e)
        }
    })?;
    serde_json::from_str(&contents).map_err(RecordError::Deserialization)
}

/// Walks a sharded record tree and collects every record file named `filename`.
///
/// Files that fail to parse are logged as warnings and skipped, so one corrupt record
/// does not hide the rest of the register.
pub(crate) fn collect_records<T: DeserializeOwned>(base_dir: &Path, filename: &str) -> Vec<T> {
    let mut records = Vec::new();

    let s1_iter = match fs::read_dir(base_dir) {
        Ok(it) => it,
        Err(_) => return records,
    };
    for s1 in s1_iter.flatten() {
        let s1_path = s1.path();
        if !s1_path.is_dir() {
            continue;
        }

        let s2_iter = match fs::read_dir(&s1_path) {
            Ok(it) => it,
            Err(_) => continue,
        };

        for s2 in s2_iter.flatten() {
            let s2_path = s2.path();
            if !s2_path.is_dir() {
                continue;
            }

            let id_iter = match fs::read_dir(&s2_path) {
                Ok(it) => it,
                Err(_) => continue,
            };

            for id_ent in id_iter.flatten() {
                let id_path = id_ent.path();
                if !id_path.is_dir() {
                    continue;
                }

                let record_path = id_path.join(filename);
                if !record_path.is_file() {
                    continue;
                }

                match read_json::<T>(&record_path) {
                    Ok(record) => records.push(record),
                    Err(e) => {
                        tracing::warn!(
                            "failed to parse record: {} - {}",
                            record_path.display(),
                            e
                        );
                    }
                }
            }
        }
    }

    records
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn create_unique_record_dir_retries_past_collisions() {
        let temp_dir = TempDir::new().expect("Failed to create temp dir");

        let fixed = RecordUuid::new();
        let fresh = RecordUuid::new();
        // Pre-create the directory the first UUID would claim.
        fs::create_dir_all(fixed.sharded_dir(temp_dir.path()))
            .expect("should pre-create colliding dir");

        let mut handed_out = vec![fixed, fresh.clone()].into_iter();
        let (uuid, dir) = create_unique_record_dir(temp_dir.path(), || {
            handed_out.next().expect("uuid source exhausted")
        })
        .expect("allocation should succeed on retry");

        assert_eq!(uuid, fresh);
        assert!(dir.is_dir());
    }

    #[test]
    fn write_json_atomic_replaces_and_leaves_no_temp_file() {
        let temp_dir = TempDir::new().expect("Failed to create temp dir");
        let path = temp_dir.path().join("record.json");

        write_json_atomic(&path, &serde_json::json!({"v": 1}))
            .expect("first write should succeed");
        write_json_atomic(&path, &serde_json::json!({"v": 2}))
            .expect("second write should succeed");

        let value: serde_json::Value = read_json(&path).expect("should read back");
        assert_eq!(value["v"], 2);
        assert!(
            !path.with_extension("json.tmp").exists(),
            "temp file should be renamed away"
        );
    }

    #[test]
    fn read_json_maps_missing_file_to_not_found() {
        let temp_dir = TempDir::new().expect("Failed to create temp dir");
        let err = read_json::<serde_json::Value>(&temp_dir.path().join("absent.json"))
            .expect_err("missing file should error");
        assert!(matches!(err, RecordError::NotFound(_)));
    }

    #[test]
    fn collect_records_skips_unparseable_files() {
        let temp_dir = TempDir::new().expect("Failed to create temp dir");

        let good = RecordUuid::new();
        let good_dir = good.sharded_dir(temp_dir.path());
        fs::create_dir_all(&good_dir).expect("should create dir");
        write_json_atomic(&good_dir.join("record.json"), &serde_json::json!({"ok": true}))
            .expect("should write good record");

        let bad = RecordUuid::new();
        let bad_dir = bad.sharded_dir(temp_dir.path());
        fs::create_dir_all(&bad_dir).expect("should create dir");
        fs::write(bad_dir.join("record.json"), "{not json").expect("should write bad record");

        let records: Vec<serde_json::Value> = collect_records(temp_dir.path(), "record.json");
        assert_eq!(records.len(), 1, "only the valid record is returned");
    }
}
