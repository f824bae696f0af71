//! Pregnancy tracking records.
//!
//! A tracking is one pregnancy episode for one patient: the LMP anchor date, the derived
//! gestational status, the gravidity/parity/abortion counters, risk codes, and (once the
//! episode closes) the outcome fields. This module owns persistence and the
//! service-level operations; the pure rules live in [`crate::pregnancy`],
//! [`crate::outcome`], and [`crate::risk`].
//!
//! ## Storage Layout
//!
//! ```text
//! trackings/
//!   <s1>/
//!     <s2>/
//!       <uuid>/
//!         tracking.json
//! ```
//!
//! Writes are atomic (temp file + rename), which is what makes outcome recording
//! all-or-nothing: either every counter and status change lands together or the stored
//! record is untouched.

use crate::audit::{change_set, ActivityLog, AuditAction, AuditEntry};
use crate::config::CoreConfig;
use crate::constants::TRACKING_JSON_FILENAME;
use crate::error::{RecordError, RecordResult};
use crate::numbering::{SequenceKind, SequenceStore};
use crate::outcome::{record_outcome, PregnancyOutcome};
use crate::pregnancy::{classify_status, format_aog, PregnancyStatus};
use crate::repositories::helpers::{
    collect_records, create_unique_record_dir, read_json, write_json_atomic,
};
use crate::repositories::patients::Patient;
use crate::risk::{age_on, derive_auto_markers, RiskEntry};
use crate::uuid::RecordUuid;
use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use serde_json::json;
use std::path::PathBuf;
use std::sync::Arc;

/// One pregnancy episode.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PregnancyTracking {
    pub id: RecordUuid,
    /// Register number, assigned at creation.
    pub tracking_number: Option<mhr_types::TrackingNumber>,
    pub patient_id: RecordUuid,
    /// Denormalised from the patient at creation time.
    pub fullname: String,
    pub age: u32,
    pub birth_date: NaiveDate,
    /// Last menstrual period; absent means gestational status cannot be computed.
    pub lmp: Option<NaiveDate>,
    /// Total pregnancies including this one. Supplied at intake, never derived.
    pub gravidity: u32,
    /// Deliveries after 20 weeks gestation, live or stillborn.
    pub parity: u32,
    /// Pregnancy losses before 20 weeks gestation.
    pub abortion: u32,
    pub pregnancy_status: Option<PregnancyStatus>,
    /// True once the episode is closed by an outcome.
    pub is_done: bool,
    /// Antenatal-care-given flag, set on completed delivery.
    pub anc_given: bool,
    /// PhilHealth insurance membership.
    pub phic: bool,
    pub health_station: Option<String>,
    pub attending_physician: Option<String>,
    pub risk_codes: Vec<RiskEntry>,
    pub outcome_sex: Option<String>,
    pub outcome_weight: Option<String>,
    pub place_of_delivery: Option<String>,
    pub date_delivery: Option<NaiveDate>,
    pub created_at: DateTime<Utc>,
}

/// Input for opening a new tracking.
#[derive(Debug, Clone)]
pub struct NewTracking {
    pub lmp: Option<NaiveDate>,
    pub gravidity: u32,
    pub parity: u32,
    pub abortion: u32,
    pub phic: bool,
    pub health_station: Option<String>,
    pub attending_physician: Option<String>,
    /// Manually entered risk codes; auto markers are derived on top.
    pub risk_codes: Vec<RiskEntry>,
}

/// Field changes for updating an open tracking. `None` leaves a field unchanged.
#[derive(Debug, Clone, Default)]
pub struct TrackingUpdate {
    pub lmp: Option<NaiveDate>,
    pub gravidity: Option<u32>,
    pub phic: Option<bool>,
    pub health_station: Option<String>,
    pub attending_physician: Option<String>,
    /// Replaces the manually entered risk codes; auto markers are re-derived.
    pub risk_codes: Option<Vec<RiskEntry>>,
}

/// Service for managing pregnancy tracking operations.
#[derive(Clone, Debug)]
pub struct TrackingService {
    cfg: Arc<CoreConfig>,
    log: ActivityLog,
    sequence: SequenceStore,
}

impl TrackingService {
    /// Creates a new instance of TrackingService.
    pub fn new(cfg: Arc<CoreConfig>) -> Self {
        let log = ActivityLog::new(cfg.clone());
        let sequence = SequenceStore::new(cfg.clone());
        Self { cfg, log, sequence }
    }

    /// Opens a new pregnancy tracking for a patient.
    ///
    /// Assigns the register number, derives the gestational status from the LMP when one
    /// is supplied (records without an LMP stay unclassified until one is recorded), and
    /// attaches auto-derived risk markers on top of the manually entered codes.
    ///
    /// # Errors
    ///
    /// Returns a `RecordError` if number allocation, persistence, or logging fails.
    pub fn create(
        &self,
        patient: &Patient,
        new: NewTracking,
        today: NaiveDate,
    ) -> RecordResult<PregnancyTracking> {
        let (id, record_dir) =
            create_unique_record_dir(&self.cfg.trackings_dir(), RecordUuid::new)?;

        let tracking_number = self.sequence.next(SequenceKind::Trackings, today)?;
        let age = age_on(patient.birth_date, today);
        let risk_codes = derive_auto_markers(age, new.gravidity, &new.risk_codes, today);

        let tracking = PregnancyTracking {
            id: id.clone(),
            tracking_number: Some(tracking_number),
            patient_id: patient.id.clone(),
            fullname: patient.fullname.clone(),
            age,
            birth_date: patient.birth_date,
            lmp: new.lmp,
            gravidity: new.gravidity,
            parity: new.parity,
            abortion: new.abortion,
            pregnancy_status: new.lmp.map(|lmp| classify_status(lmp, today)),
            is_done: false,
            anc_given: false,
            phic: new.phic,
            health_station: new.health_station,
            attending_physician: new.attending_physician,
            risk_codes,
            outcome_sex: None,
            outcome_weight: None,
            place_of_delivery: None,
            date_delivery: None,
            created_at: Utc::now(),
        };

        write_json_atomic(&record_dir.join(TRACKING_JSON_FILENAME), &tracking)?;

        self.log.append(&AuditEntry {
            at: Utc::now(),
            action: AuditAction::Create,
            title: "Pregnancy Tracking Created".to_string(),
            entity_kind: "pregnancy_tracking".to_string(),
            entity_id: id.to_string(),
            info: json!({
                "new": {
                    "tracking_number": tracking.tracking_number,
                    "patient_id": tracking.patient_id,
                    "fullname": tracking.fullname,
                    "age": tracking.age,
                    "pregnancy_status": tracking.pregnancy_status,
                }
            }),
        })?;

        Ok(tracking)
    }

    /// Updates an open tracking.
    ///
    /// While the record is open and has an LMP, the gestational status is recomputed
    /// from `today` on every update. Closed records keep their terminal status; only
    /// the administrative fields change.
    ///
    /// # Errors
    ///
    /// Returns `RecordError::NotFound` if no such tracking exists, or storage errors.
    pub fn update(
        &self,
        id: &RecordUuid,
        changes: TrackingUpdate,
        today: NaiveDate,
    ) -> RecordResult<PregnancyTracking> {
        let path = self.record_path(id);
        let existing: PregnancyTracking = read_json(&path)?;

        let mut updated = existing.clone();
        if let Some(lmp) = changes.lmp {
            updated.lmp = Some(lmp);
        }
        if let Some(gravidity) = changes.gravidity {
            updated.gravidity = gravidity;
        }
        if let Some(phic) = changes.phic {
            updated.phic = phic;
        }
        if let Some(health_station) = changes.health_station {
            updated.health_station = Some(health_station);
        }
        if let Some(attending_physician) = changes.attending_physician {
            updated.attending_physician = Some(attending_physician);
        }
        if let Some(risk_codes) = changes.risk_codes {
            updated.risk_codes = risk_codes;
        }

        if !updated.is_done {
            if let Some(lmp) = updated.lmp {
                updated.pregnancy_status = Some(classify_status(lmp, today));
            }
        }
        updated.risk_codes =
            derive_auto_markers(updated.age, updated.gravidity, &updated.risk_codes, today);

        write_json_atomic(&path, &updated)?;
        self.log_update(&existing, &updated, "Pregnancy Tracking Updated")?;

        Ok(updated)
    }

    /// Closes the episode with an outcome.
    ///
    /// Delegates the state transition to [`crate::outcome::record_outcome`], persists
    /// the updated record atomically, logs the change, and returns the record together
    /// with the operator-facing confirmation message.
    ///
    /// # Errors
    ///
    /// - `RecordError::NotFound` if no such tracking exists.
    /// - `RecordError::InvalidState` if the episode is already closed; nothing is
    ///   written in that case.
    /// - `RecordError::MissingLmp` if the record has no LMP date.
    pub fn record_outcome(
        &self,
        id: &RecordUuid,
        outcome: PregnancyOutcome,
        today: NaiveDate,
    ) -> RecordResult<(PregnancyTracking, String)> {
        let path = self.record_path(id);
        let existing: PregnancyTracking = read_json(&path)?;

        let update = record_outcome(&existing, outcome, today)?;

        write_json_atomic(&path, &update.record)?;
        self.log_update(&existing, &update.record, "Complete Pregnancy Tracking Updated")?;

        Ok((update.record, update.message))
    }

    /// Re-derives the auto risk markers after a demographics change.
    ///
    /// Called when the patient's birth date changed: the tracking's stored age is
    /// refreshed and the auto marker set recomputed. Manual codes are untouched. The
    /// record is rewritten only when something actually changed.
    ///
    /// # Errors
    ///
    /// Returns `RecordError::NotFound` if no such tracking exists, or storage errors.
    pub fn refresh_auto_markers(
        &self,
        id: &RecordUuid,
        birth_date: NaiveDate,
        today: NaiveDate,
    ) -> RecordResult<PregnancyTracking> {
        let path = self.record_path(id);
        let existing: PregnancyTracking = read_json(&path)?;

        let mut updated = existing.clone();
        updated.birth_date = birth_date;
        updated.age = age_on(birth_date, today);
        updated.risk_codes =
            derive_auto_markers(updated.age, updated.gravidity, &existing.risk_codes, today);

        if updated.age == existing.age && updated.risk_codes == existing.risk_codes {
            return Ok(existing);
        }

        write_json_atomic(&path, &updated)?;
        self.log_update(&existing, &updated, "Pregnancy Tracking Updated")?;

        Ok(updated)
    }

    /// Reads one tracking record.
    ///
    /// # Errors
    ///
    /// Returns `RecordError::NotFound` if no such tracking exists.
    pub fn read(&self, id: &RecordUuid) -> RecordResult<PregnancyTracking> {
        read_json(&self.record_path(id))
    }

    /// Lists trackings, optionally filtered by status.
    pub fn list(&self, status: Option<PregnancyStatus>) -> Vec<PregnancyTracking> {
        let mut trackings: Vec<PregnancyTracking> =
            collect_records(&self.cfg.trackings_dir(), TRACKING_JSON_FILENAME);
        if let Some(status) = status {
            trackings.retain(|t| t.pregnancy_status == Some(status));
        }
        trackings
    }

    /// Lists the open trackings for one patient.
    pub fn list_open_for_patient(&self, patient_id: &RecordUuid) -> Vec<PregnancyTracking> {
        let mut trackings = self.list(None);
        trackings.retain(|t| &t.patient_id == patient_id && !t.is_done);
        trackings
    }

    /// Renders the age of gestation for display.
    ///
    /// # Errors
    ///
    /// Returns `RecordError::MissingLmp` when the record has no LMP date.
    pub fn aog(&self, id: &RecordUuid, today: NaiveDate) -> RecordResult<String> {
        let tracking = self.read(id)?;
        let lmp = tracking.lmp.ok_or(RecordError::MissingLmp)?;
        Ok(format_aog(lmp, today))
    }

    fn record_path(&self, id: &RecordUuid) -> PathBuf {
        id.sharded_dir(&self.cfg.trackings_dir())
            .join(TRACKING_JSON_FILENAME)
    }

    fn log_update(
        &self,
        old: &PregnancyTracking,
        new: &PregnancyTracking,
        title: &str,
    ) -> RecordResult<()> {
        let old_value = serde_json::to_value(old).map_err(RecordError::Serialization)?;
        let new_value = serde_json::to_value(new).map_err(RecordError::Serialization)?;
        let (old_changed, new_changed) = change_set(&old_value, &new_value);

        self.log.append(&AuditEntry {
            at: Utc::now(),
            action: AuditAction::Update,
            title: title.to_string(),
            entity_kind: "pregnancy_tracking".to_string(),
            entity_id: new.id.to_string(),
            info: json!({ "old": old_changed, "new": new_changed }),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::outcome::DeliveryDetails;
    use crate::repositories::patients::{NewPatient, PatientService};
    use mhr_types::NonEmptyText;
    use tempfile::TempDir;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).expect("valid test date")
    }

    fn cfg(temp_dir: &TempDir) -> Arc<CoreConfig> {
        Arc::new(CoreConfig::new(temp_dir.path().to_path_buf()))
    }

    fn test_patient(cfg: Arc<CoreConfig>, birth_date: NaiveDate) -> Patient {
        PatientService::new(cfg)
            .create(
                NewPatient {
                    first_name: NonEmptyText::new("Maria").unwrap(),
                    last_name: NonEmptyText::new("Santos").unwrap(),
                    birth_date,
                    zone: None,
                    barangay: None,
                    municipality: None,
                    province: None,
                },
                date(2025, 8, 6),
            )
            .expect("patient create should succeed")
    }

    fn new_tracking(lmp: Option<NaiveDate>) -> NewTracking {
        NewTracking {
            lmp,
            gravidity: 2,
            parity: 1,
            abortion: 0,
            phic: false,
            health_station: Some("San Isidro Health Station".to_string()),
            attending_physician: Some("Dr. Cruz".to_string()),
            risk_codes: vec![],
        }
    }

    fn delivery_details() -> DeliveryDetails {
        DeliveryDetails {
            outcome_sex: "male".to_string(),
            outcome_weight: "2.9".to_string(),
            place_of_delivery: "Home".to_string(),
            date_delivery: date(2025, 8, 1),
            phic: false,
        }
    }

    #[test]
    fn create_assigns_number_and_derives_status() {
        let temp_dir = TempDir::new().expect("Failed to create temp dir");
        let cfg = cfg(&temp_dir);
        let patient = test_patient(cfg.clone(), date(1998, 2, 14));
        let service = TrackingService::new(cfg);

        let today = date(2025, 8, 6);
        let lmp = today - chrono::Duration::weeks(30);
        let tracking = service
            .create(&patient, new_tracking(Some(lmp)), today)
            .expect("create should succeed");

        assert_eq!(
            tracking.tracking_number.as_ref().map(|n| n.as_str()),
            Some("202501001")
        );
        assert_eq!(
            tracking.pregnancy_status,
            Some(PregnancyStatus::ThirdTrimester)
        );
        assert_eq!(tracking.fullname, "Maria Santos");
        assert!(!tracking.is_done);
    }

    #[test]
    fn create_without_lmp_leaves_status_unset() {
        let temp_dir = TempDir::new().expect("Failed to create temp dir");
        let cfg = cfg(&temp_dir);
        let patient = test_patient(cfg.clone(), date(1998, 2, 14));
        let service = TrackingService::new(cfg);

        let tracking = service
            .create(&patient, new_tracking(None), date(2025, 8, 6))
            .expect("create should succeed");
        assert_eq!(tracking.pregnancy_status, None);
    }

    #[test]
    fn create_attaches_auto_risk_markers() {
        let temp_dir = TempDir::new().expect("Failed to create temp dir");
        let cfg = cfg(&temp_dir);
        // Age 17 at creation, gravidity 4: markers A and D.
        let patient = test_patient(cfg.clone(), date(2008, 6, 1));
        let service = TrackingService::new(cfg);

        let mut new = new_tracking(None);
        new.gravidity = 4;
        new.risk_codes = vec![RiskEntry::manual("C", None)];

        let tracking = service
            .create(&patient, new, date(2025, 8, 6))
            .expect("create should succeed");

        let codes: Vec<&str> = tracking.risk_codes.iter().map(|r| r.code.as_str()).collect();
        assert_eq!(codes, vec!["C", "A", "D"]);
    }

    #[test]
    fn update_recomputes_status_while_open() {
        let temp_dir = TempDir::new().expect("Failed to create temp dir");
        let cfg = cfg(&temp_dir);
        let patient = test_patient(cfg.clone(), date(1998, 2, 14));
        let service = TrackingService::new(cfg);

        let created_on = date(2025, 1, 6);
        let lmp = date(2025, 1, 1);
        let tracking = service
            .create(&patient, new_tracking(Some(lmp)), created_on)
            .expect("create should succeed");
        assert_eq!(
            tracking.pregnancy_status,
            Some(PregnancyStatus::FirstTrimester)
        );

        // A later visit re-derives the status from the visit date.
        let updated = service
            .update(
                &tracking.id,
                TrackingUpdate::default(),
                lmp + chrono::Duration::weeks(30),
            )
            .expect("update should succeed");
        assert_eq!(
            updated.pregnancy_status,
            Some(PregnancyStatus::ThirdTrimester)
        );
    }

    #[test]
    fn outcome_persists_atomically_and_second_attempt_changes_nothing() {
        let temp_dir = TempDir::new().expect("Failed to create temp dir");
        let cfg = cfg(&temp_dir);
        let patient = test_patient(cfg.clone(), date(1998, 2, 14));
        let service = TrackingService::new(cfg);

        let today = date(2025, 8, 6);
        let lmp = today - chrono::Duration::weeks(21);
        let tracking = service
            .create(&patient, new_tracking(Some(lmp)), today)
            .expect("create should succeed");

        let (closed, message) = service
            .record_outcome(&tracking.id, PregnancyOutcome::Miscarriage, today)
            .expect("outcome should be recorded");
        assert!(closed.is_done);
        assert_eq!(closed.parity, tracking.parity + 1);
        assert!(message.contains("Parity"));

        let err = service
            .record_outcome(&tracking.id, PregnancyOutcome::Miscarriage, today)
            .expect_err("second outcome must fail");
        assert!(matches!(err, RecordError::InvalidState));

        // The stored record is exactly the first outcome's result.
        let stored = service.read(&tracking.id).expect("read should succeed");
        assert_eq!(stored.parity, closed.parity);
        assert_eq!(stored.abortion, closed.abortion);
    }

    #[test]
    fn delivery_outcome_stores_detail_fields() {
        let temp_dir = TempDir::new().expect("Failed to create temp dir");
        let cfg = cfg(&temp_dir);
        let patient = test_patient(cfg.clone(), date(1998, 2, 14));
        let service = TrackingService::new(cfg);

        let today = date(2025, 8, 6);
        let lmp = today - chrono::Duration::weeks(38);
        let tracking = service
            .create(&patient, new_tracking(Some(lmp)), today)
            .expect("create should succeed");

        let (closed, _message) = service
            .record_outcome(
                &tracking.id,
                PregnancyOutcome::Delivery(delivery_details()),
                today,
            )
            .expect("outcome should be recorded");

        assert_eq!(closed.pregnancy_status, Some(PregnancyStatus::Completed));
        assert!(closed.anc_given);
        assert_eq!(closed.place_of_delivery.as_deref(), Some("Home"));
        assert_eq!(closed.parity, tracking.parity + 1);
    }

    #[test]
    fn refresh_auto_markers_swaps_age_markers() {
        let temp_dir = TempDir::new().expect("Failed to create temp dir");
        let cfg = cfg(&temp_dir);
        let patient = test_patient(cfg.clone(), date(2008, 6, 1));
        let service = TrackingService::new(cfg);

        let tracking = service
            .create(&patient, new_tracking(None), date(2025, 8, 6))
            .expect("create should succeed");
        assert!(tracking.risk_codes.iter().any(|r| r.code == "A"));

        // Corrected birth date makes the patient 36: A is replaced by B.
        let refreshed = service
            .refresh_auto_markers(&tracking.id, date(1989, 1, 1), date(2025, 8, 6))
            .expect("refresh should succeed");
        let codes: Vec<&str> = refreshed.risk_codes.iter().map(|r| r.code.as_str()).collect();
        assert_eq!(codes, vec!["B"]);
        assert_eq!(refreshed.age, 36);
    }

    #[test]
    fn list_filters_by_status() {
        let temp_dir = TempDir::new().expect("Failed to create temp dir");
        let cfg = cfg(&temp_dir);
        let patient = test_patient(cfg.clone(), date(1998, 2, 14));
        let service = TrackingService::new(cfg);

        let today = date(2025, 8, 6);
        service
            .create(
                &patient,
                new_tracking(Some(today - chrono::Duration::weeks(5))),
                today,
            )
            .expect("create should succeed");
        service
            .create(
                &patient,
                new_tracking(Some(today - chrono::Duration::weeks(30))),
                today,
            )
            .expect("create should succeed");

        let first = service.list(Some(PregnancyStatus::FirstTrimester));
        assert_eq!(first.len(), 1);
        let all = service.list(None);
        assert_eq!(all.len(), 2);
    }

    #[test]
    fn aog_requires_lmp() {
        let temp_dir = TempDir::new().expect("Failed to create temp dir");
        let cfg = cfg(&temp_dir);
        let patient = test_patient(cfg.clone(), date(1998, 2, 14));
        let service = TrackingService::new(cfg);

        let today = date(2025, 8, 6);
        let with_lmp = service
            .create(
                &patient,
                new_tracking(Some(today - chrono::Duration::days(94))),
                today,
            )
            .expect("create should succeed");
        assert_eq!(
            service.aog(&with_lmp.id, today).expect("aog should render"),
            "13w/3d"
        );

        let without_lmp = service
            .create(&patient, new_tracking(None), today)
            .expect("create should succeed");
        let err = service
            .aog(&without_lmp.id, today)
            .expect_err("aog without LMP should fail");
        assert!(matches!(err, RecordError::MissingLmp));
    }
}
