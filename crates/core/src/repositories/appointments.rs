//! Appointment scheduling for pregnancy trackings.
//!
//! Appointments are simple dated rows tied to a tracking. The one piece of behaviour
//! beyond CRUD: recording a prenatal visit completes the day's scheduled appointment,
//! which is what [`AppointmentService::complete_due`] implements.

use crate::audit::{ActivityLog, AuditAction, AuditEntry};
use crate::config::CoreConfig;
use crate::constants::APPOINTMENT_JSON_FILENAME;
use crate::error::RecordResult;
use crate::repositories::helpers::{
    collect_records, create_unique_record_dir, read_json, write_json_atomic,
};
use crate::uuid::RecordUuid;
use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use serde_json::json;
use std::sync::Arc;

/// The closed set of appointment states.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AppointmentStatus {
    Scheduled,
    Completed,
    Cancelled,
}

/// One appointment row.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Appointment {
    pub id: RecordUuid,
    pub tracking_id: RecordUuid,
    pub appointment_date: NaiveDate,
    pub status: AppointmentStatus,
    pub notes: Option<String>,
    pub created_at: DateTime<Utc>,
}

/// Service for managing appointment operations.
#[derive(Clone, Debug)]
pub struct AppointmentService {
    cfg: Arc<CoreConfig>,
    log: ActivityLog,
}

impl AppointmentService {
    /// Creates a new instance of AppointmentService.
    pub fn new(cfg: Arc<CoreConfig>) -> Self {
        let log = ActivityLog::new(cfg.clone());
        Self { cfg, log }
    }

    /// Schedules an appointment for a tracking.
    ///
    /// # Errors
    ///
    /// Returns a `RecordError` if persistence or logging fails.
    pub fn schedule(
        &self,
        tracking_id: &RecordUuid,
        appointment_date: NaiveDate,
        notes: Option<String>,
    ) -> RecordResult<Appointment> {
        let (id, record_dir) =
            create_unique_record_dir(&self.cfg.appointments_dir(), RecordUuid::new)?;

        let appointment = Appointment {
            id: id.clone(),
            tracking_id: tracking_id.clone(),
            appointment_date,
            status: AppointmentStatus::Scheduled,
            notes,
            created_at: Utc::now(),
        };

        write_json_atomic(&record_dir.join(APPOINTMENT_JSON_FILENAME), &appointment)?;

        self.log.append(&AuditEntry {
            at: Utc::now(),
            action: AuditAction::Create,
            title: "Appointment Scheduled".to_string(),
            entity_kind: "appointment".to_string(),
            entity_id: id.to_string(),
            info: json!({
                "new": {
                    "tracking_id": appointment.tracking_id,
                    "appointment_date": appointment.appointment_date,
                    "status": appointment.status,
                }
            }),
        })?;

        Ok(appointment)
    }

    /// Completes the tracking's scheduled appointment for `today`, if one exists.
    ///
    /// Returns the completed appointment, or `None` when nothing was scheduled today.
    ///
    /// # Errors
    ///
    /// Returns a `RecordError` if rewriting the appointment or logging fails.
    pub fn complete_due(
        &self,
        tracking_id: &RecordUuid,
        today: NaiveDate,
    ) -> RecordResult<Option<Appointment>> {
        let due = self.list(Some(tracking_id)).into_iter().find(|a| {
            a.appointment_date == today && a.status == AppointmentStatus::Scheduled
        });

        let Some(mut appointment) = due else {
            return Ok(None);
        };

        appointment.status = AppointmentStatus::Completed;
        let path = appointment
            .id
            .sharded_dir(&self.cfg.appointments_dir())
            .join(APPOINTMENT_JSON_FILENAME);
        write_json_atomic(&path, &appointment)?;

        self.log.append(&AuditEntry {
            at: Utc::now(),
            action: AuditAction::Update,
            title: "Appointment Marked as Completed".to_string(),
            entity_kind: "appointment".to_string(),
            entity_id: appointment.id.to_string(),
            info: json!({
                "old": { "status": AppointmentStatus::Scheduled },
                "new": { "status": AppointmentStatus::Completed },
            }),
        })?;

        Ok(Some(appointment))
    }

    /// Reads one appointment.
    ///
    /// # Errors
    ///
    /// Returns `RecordError::NotFound` if no such appointment exists.
    pub fn read(&self, id: &RecordUuid) -> RecordResult<Appointment> {
        let path = id
            .sharded_dir(&self.cfg.appointments_dir())
            .join(APPOINTMENT_JSON_FILENAME);
        read_json(&path)
    }

    /// Lists appointments, optionally for one tracking.
    pub fn list(&self, tracking_id: Option<&RecordUuid>) -> Vec<Appointment> {
        let mut appointments: Vec<Appointment> =
            collect_records(&self.cfg.appointments_dir(), APPOINTMENT_JSON_FILENAME);
        if let Some(tracking_id) = tracking_id {
            appointments.retain(|a| &a.tracking_id == tracking_id);
        }
        appointments
    }
}
