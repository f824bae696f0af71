//! Patient demographics management.
//!
//! This module provides functionality for creating and updating patient demographic
//! records. It handles:
//!
//! - Creation of new patient records with unique UUIDs
//! - Storage in a sharded directory structure under `record_data/patients/`
//! - Derived fields: age (completed years at the write date), full name, and the
//!   assembled address line
//! - Activity-log entries for every mutation
//!
//! ## Storage Layout
//!
//! Patients are stored as JSON files in a sharded structure:
//!
//! ```text
//! patients/
//!   <s1>/
//!     <s2>/
//!       <uuid>/
//!         patient.json
//! ```
//!
//! where `s1` and `s2` are the first four hex characters of the UUID.
//!
//! ## Pure Data Operations
//!
//! This module contains **only** data operations—no API concerns such as
//! authentication, HTTP servers, or service interfaces. API-level logic belongs in
//! `api-rest` or `api-shared`.

use crate::audit::{ActivityLog, AuditAction, AuditEntry};
use crate::config::CoreConfig;
use crate::constants::PATIENT_JSON_FILENAME;
use crate::error::RecordResult;
use crate::repositories::helpers::{
    collect_records, create_unique_record_dir, read_json, write_json_atomic,
};
use crate::risk::age_on;
use crate::uuid::RecordUuid;
use chrono::{DateTime, NaiveDate, Utc};
use mhr_types::NonEmptyText;
use serde::{Deserialize, Serialize};
use serde_json::json;
use std::sync::Arc;

/// A patient demographics record.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Patient {
    pub id: RecordUuid,
    pub first_name: String,
    pub last_name: String,
    /// Derived: `"{first_name} {last_name}"`, denormalised onto dependent records.
    pub fullname: String,
    pub birth_date: NaiveDate,
    /// Derived: completed years at the last write.
    pub age: u32,
    pub zone: Option<String>,
    pub barangay: Option<String>,
    pub municipality: Option<String>,
    pub province: Option<String>,
    /// Derived: the non-empty address parts joined with ", ".
    pub address: String,
    pub created_at: DateTime<Utc>,
}

/// Input for creating a patient.
#[derive(Debug, Clone)]
pub struct NewPatient {
    pub first_name: NonEmptyText,
    pub last_name: NonEmptyText,
    pub birth_date: NaiveDate,
    pub zone: Option<String>,
    pub barangay: Option<String>,
    pub municipality: Option<String>,
    pub province: Option<String>,
}

/// Field changes for updating a patient. `None` leaves a field unchanged.
#[derive(Debug, Clone, Default)]
pub struct PatientUpdate {
    pub first_name: Option<NonEmptyText>,
    pub last_name: Option<NonEmptyText>,
    pub birth_date: Option<NaiveDate>,
    pub zone: Option<String>,
    pub barangay: Option<String>,
    pub municipality: Option<String>,
    pub province: Option<String>,
}

/// Joins the non-empty address parts with ", ".
fn assemble_address(parts: [Option<&str>; 4]) -> String {
    parts
        .iter()
        .filter_map(|part| part.map(str::trim))
        .filter(|part| !part.is_empty())
        .collect::<Vec<_>>()
        .join(", ")
}

/// Service for managing patient demographics operations.
#[derive(Clone, Debug)]
pub struct PatientService {
    cfg: Arc<CoreConfig>,
    log: ActivityLog,
}

impl PatientService {
    /// Creates a new instance of PatientService.
    pub fn new(cfg: Arc<CoreConfig>) -> Self {
        let log = ActivityLog::new(cfg.clone());
        Self { cfg, log }
    }

    /// Creates a new patient record.
    ///
    /// Derives the age (completed years at `today`), full name, and address line, then
    /// persists the record atomically and logs the creation.
    ///
    /// # Errors
    ///
    /// Returns a `RecordError` if the record directory cannot be allocated or the
    /// record cannot be written.
    pub fn create(&self, new: NewPatient, today: NaiveDate) -> RecordResult<Patient> {
        let (id, record_dir) = create_unique_record_dir(&self.cfg.patients_dir(), RecordUuid::new)?;

        let fullname = format!("{} {}", new.first_name, new.last_name);
        let address = assemble_address([
            new.zone.as_deref(),
            new.barangay.as_deref(),
            new.municipality.as_deref(),
            new.province.as_deref(),
        ]);

        let patient = Patient {
            id: id.clone(),
            first_name: new.first_name.as_str().to_string(),
            last_name: new.last_name.as_str().to_string(),
            fullname,
            birth_date: new.birth_date,
            age: age_on(new.birth_date, today),
            zone: new.zone,
            barangay: new.barangay,
            municipality: new.municipality,
            province: new.province,
            address,
            created_at: Utc::now(),
        };

        write_json_atomic(&record_dir.join(PATIENT_JSON_FILENAME), &patient)?;

        self.log.append(&AuditEntry {
            at: Utc::now(),
            action: AuditAction::Create,
            title: "Patient Created".to_string(),
            entity_kind: "patient".to_string(),
            entity_id: id.to_string(),
            info: json!({
                "new": {
                    "firstname": patient.first_name,
                    "lastname": patient.last_name,
                    "age": patient.age,
                    "birth_date": patient.birth_date,
                    "address": patient.address,
                }
            }),
        })?;

        Ok(patient)
    }

    /// Updates a patient record.
    ///
    /// Applies the given changes, recomputes age (at `today`), full name, and address,
    /// persists atomically, and logs the changed fields.
    ///
    /// # Errors
    ///
    /// Returns `RecordError::NotFound` if no such patient exists, or storage errors on
    /// read/write failure.
    pub fn update(
        &self,
        id: &RecordUuid,
        changes: PatientUpdate,
        today: NaiveDate,
    ) -> RecordResult<Patient> {
        let path = id
            .sharded_dir(&self.cfg.patients_dir())
            .join(PATIENT_JSON_FILENAME);
        let existing: Patient = read_json(&path)?;

        let mut updated = existing.clone();
        if let Some(first_name) = changes.first_name {
            updated.first_name = first_name.as_str().to_string();
        }
        if let Some(last_name) = changes.last_name {
            updated.last_name = last_name.as_str().to_string();
        }
        if let Some(birth_date) = changes.birth_date {
            updated.birth_date = birth_date;
        }
        if let Some(zone) = changes.zone {
            updated.zone = Some(zone);
        }
        if let Some(barangay) = changes.barangay {
            updated.barangay = Some(barangay);
        }
        if let Some(municipality) = changes.municipality {
            updated.municipality = Some(municipality);
        }
        if let Some(province) = changes.province {
            updated.province = Some(province);
        }

        updated.fullname = format!("{} {}", updated.first_name, updated.last_name);
        updated.age = age_on(updated.birth_date, today);
        updated.address = assemble_address([
            updated.zone.as_deref(),
            updated.barangay.as_deref(),
            updated.municipality.as_deref(),
            updated.province.as_deref(),
        ]);

        write_json_atomic(&path, &updated)?;
        self.log_update(&existing, &updated)?;

        Ok(updated)
    }

    /// Reads one patient record.
    ///
    /// # Errors
    ///
    /// Returns `RecordError::NotFound` if no such patient exists.
    pub fn read(&self, id: &RecordUuid) -> RecordResult<Patient> {
        let path = id
            .sharded_dir(&self.cfg.patients_dir())
            .join(PATIENT_JSON_FILENAME);
        read_json(&path)
    }

    /// Lists all patient records.
    ///
    /// Individual files that cannot be parsed are logged as warnings and skipped.
    pub fn list(&self) -> Vec<Patient> {
        collect_records(&self.cfg.patients_dir(), PATIENT_JSON_FILENAME)
    }

    fn log_update(&self, old: &Patient, new: &Patient) -> RecordResult<()> {
        let old_value = serde_json::to_value(old).map_err(crate::error::RecordError::Serialization)?;
        let new_value = serde_json::to_value(new).map_err(crate::error::RecordError::Serialization)?;
        let (old_changed, new_changed) = crate::audit::change_set(&old_value, &new_value);

        self.log.append(&AuditEntry {
            at: Utc::now(),
            action: AuditAction::Update,
            title: "Patient Updated".to_string(),
            entity_kind: "patient".to_string(),
            entity_id: new.id.to_string(),
            info: json!({ "old": old_changed, "new": new_changed }),
        })
    }
}
