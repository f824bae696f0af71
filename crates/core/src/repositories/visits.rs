//! Prenatal visit recording.
//!
//! A visit is the out-patient encounter row for one tracking on one day. Recording a
//! visit does several things in one operation, mirroring the paper workflow:
//!
//! - verifies the tracking is still open (no outcome recorded),
//! - copies the attending physician and PHIC answer from the tracking,
//! - assigns an out-patient file number from the visits register,
//! - attaches immunization records, but only while the tracking is in the third
//!   trimester (vaccine data supplied at any other stage is dropped),
//! - completes the day's scheduled appointment, if any,
//! - writes activity-log entries for everything it touched.

use crate::audit::{change_set, ActivityLog, AuditAction, AuditEntry};
use crate::config::CoreConfig;
use crate::constants::VISIT_JSON_FILENAME;
use crate::error::{RecordError, RecordResult};
use crate::numbering::{SequenceKind, SequenceStore};
use crate::pregnancy::PregnancyStatus;
use crate::repositories::appointments::AppointmentService;
use crate::repositories::helpers::{
    collect_records, create_unique_record_dir, read_json, write_json_atomic,
};
use crate::repositories::trackings::TrackingService;
use crate::uuid::RecordUuid;
use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use serde_json::json;
use std::sync::Arc;

/// One administered vaccine dose.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct VaccineDose {
    pub vaccine_name: Option<String>,
    pub dose: u32,
    pub date_given: NaiveDate,
    pub lot_no: Option<String>,
}

/// Immunizations given at a visit. Any subset may be present.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Immunization {
    pub tetanus: Option<VaccineDose>,
    pub covid: Option<VaccineDose>,
    pub other: Option<VaccineDose>,
}

impl Immunization {
    /// True when no vaccine entry is present.
    pub fn is_empty(&self) -> bool {
        self.tetanus.is_none() && self.covid.is_none() && self.other.is_none()
    }
}

/// One prenatal visit record.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PrenatalVisit {
    pub id: RecordUuid,
    pub tracking_id: RecordUuid,
    pub date: NaiveDate,
    /// Copied from the tracking at recording time.
    pub attending_physician: Option<String>,
    /// Out-patient file number from the visits register.
    pub file_number: Option<mhr_types::TrackingNumber>,
    /// "yes"/"no", the register's spelling of the tracking's PHIC flag.
    pub phic: String,
    pub notes: Option<String>,
    /// Present only when immunizations were accepted (third trimester).
    pub immunization: Option<Immunization>,
    pub created_at: DateTime<Utc>,
}

/// Input for recording a visit.
#[derive(Debug, Clone)]
pub struct NewVisit {
    pub tracking_id: RecordUuid,
    pub date: NaiveDate,
    pub notes: Option<String>,
    pub immunization: Option<Immunization>,
}

/// What a recorded visit did, for the operator-facing confirmation.
#[derive(Debug, Clone)]
pub struct VisitReceipt {
    pub visit: PrenatalVisit,
    pub immunization_recorded: bool,
    pub appointment_completed: bool,
    pub message: String,
}

/// Service for recording prenatal visits.
#[derive(Clone, Debug)]
pub struct VisitService {
    cfg: Arc<CoreConfig>,
    log: ActivityLog,
    sequence: SequenceStore,
}

impl VisitService {
    /// Creates a new instance of VisitService.
    pub fn new(cfg: Arc<CoreConfig>) -> Self {
        let log = ActivityLog::new(cfg.clone());
        let sequence = SequenceStore::new(cfg.clone());
        Self { cfg, log, sequence }
    }

    /// Records a prenatal visit against an open tracking.
    ///
    /// # Errors
    ///
    /// - `RecordError::NotFound` if the tracking does not exist.
    /// - `RecordError::NoActiveTracking` if the tracking is already closed.
    /// - Storage errors on persistence failure.
    pub fn record(&self, new: NewVisit, today: NaiveDate) -> RecordResult<VisitReceipt> {
        let tracking_service = TrackingService::new(self.cfg.clone());
        let tracking = tracking_service.read(&new.tracking_id)?;
        if tracking.is_done {
            return Err(RecordError::NoActiveTracking);
        }

        let (id, record_dir) = create_unique_record_dir(&self.cfg.visits_dir(), RecordUuid::new)?;
        let file_number = self.sequence.next(SequenceKind::Visits, today)?;

        // Immunizations only count for third-trimester patients; anything else
        // supplied is dropped, matching the register workflow.
        let immunization = new
            .immunization
            .filter(|i| !i.is_empty())
            .filter(|_| tracking.pregnancy_status == Some(PregnancyStatus::ThirdTrimester));
        let immunization_recorded = immunization.is_some();

        let visit = PrenatalVisit {
            id: id.clone(),
            tracking_id: new.tracking_id.clone(),
            date: new.date,
            attending_physician: tracking.attending_physician.clone(),
            file_number: Some(file_number),
            phic: if tracking.phic { "yes" } else { "no" }.to_string(),
            notes: new.notes,
            immunization,
            created_at: Utc::now(),
        };

        write_json_atomic(&record_dir.join(VISIT_JSON_FILENAME), &visit)?;

        self.log.append(&AuditEntry {
            at: Utc::now(),
            action: AuditAction::Create,
            title: "Prenatal Visit Created".to_string(),
            entity_kind: "prenatal_visit".to_string(),
            entity_id: id.to_string(),
            info: json!({
                "new": {
                    "tracking_id": visit.tracking_id,
                    "file_number": visit.file_number,
                    "attending_physician": visit.attending_physician,
                    "date": visit.date,
                }
            }),
        })?;

        if immunization_recorded {
            self.log.append(&AuditEntry {
                at: Utc::now(),
                action: AuditAction::Create,
                title: "Immunization Record Created".to_string(),
                entity_kind: "prenatal_visit".to_string(),
                entity_id: id.to_string(),
                info: json!({ "new": { "immunization": visit.immunization } }),
            })?;
        }

        let appointment_completed = AppointmentService::new(self.cfg.clone())
            .complete_due(&new.tracking_id, today)?
            .is_some();

        let message = if immunization_recorded {
            "Prenatal visit and immunization records saved successfully!"
        } else {
            "Prenatal care recorded successfully!"
        };

        Ok(VisitReceipt {
            visit,
            immunization_recorded,
            appointment_completed,
            message: message.to_string(),
        })
    }

    /// Updates an existing visit's notes, date, or immunizations.
    ///
    /// The same third-trimester gate applies to immunization changes, and the
    /// tracking must still be open.
    ///
    /// # Errors
    ///
    /// - `RecordError::NotFound` if the visit does not exist.
    /// - `RecordError::NoActiveTracking` if its tracking is already closed.
    pub fn update(
        &self,
        id: &RecordUuid,
        date: Option<NaiveDate>,
        notes: Option<String>,
        immunization: Option<Immunization>,
    ) -> RecordResult<PrenatalVisit> {
        let path = id
            .sharded_dir(&self.cfg.visits_dir())
            .join(VISIT_JSON_FILENAME);
        let existing: PrenatalVisit = read_json(&path)?;

        let tracking = TrackingService::new(self.cfg.clone()).read(&existing.tracking_id)?;
        if tracking.is_done {
            return Err(RecordError::NoActiveTracking);
        }

        let mut updated = existing.clone();
        if let Some(date) = date {
            updated.date = date;
        }
        if let Some(notes) = notes {
            updated.notes = Some(notes);
        }
        if let Some(immunization) = immunization {
            if tracking.pregnancy_status == Some(PregnancyStatus::ThirdTrimester)
                && !immunization.is_empty()
            {
                updated.immunization = Some(immunization);
            }
        }
        updated.attending_physician = tracking.attending_physician.clone();
        updated.phic = if tracking.phic { "yes" } else { "no" }.to_string();

        write_json_atomic(&path, &updated)?;

        let old_value = serde_json::to_value(&existing).map_err(RecordError::Serialization)?;
        let new_value = serde_json::to_value(&updated).map_err(RecordError::Serialization)?;
        let (old_changed, new_changed) = change_set(&old_value, &new_value);
        self.log.append(&AuditEntry {
            at: Utc::now(),
            action: AuditAction::Update,
            title: "Prenatal Visit Updated".to_string(),
            entity_kind: "prenatal_visit".to_string(),
            entity_id: updated.id.to_string(),
            info: json!({ "old": old_changed, "new": new_changed }),
        })?;

        Ok(updated)
    }

    /// Reads one visit.
    ///
    /// # Errors
    ///
    /// Returns `RecordError::NotFound` if no such visit exists.
    pub fn read(&self, id: &RecordUuid) -> RecordResult<PrenatalVisit> {
        let path = id
            .sharded_dir(&self.cfg.visits_dir())
            .join(VISIT_JSON_FILENAME);
        read_json(&path)
    }

    /// Lists visits, optionally for one tracking.
    pub fn list(&self, tracking_id: Option<&RecordUuid>) -> Vec<PrenatalVisit> {
        let mut visits: Vec<PrenatalVisit> =
            collect_records(&self.cfg.visits_dir(), VISIT_JSON_FILENAME);
        if let Some(tracking_id) = tracking_id {
            visits.retain(|v| &v.tracking_id == tracking_id);
        }
        visits
    }
}
