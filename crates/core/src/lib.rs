//! # MHR Core
//!
//! Core business logic for the MHR maternal-health record system.
//!
//! This crate contains the pregnancy lifecycle rules and file/folder record management:
//! - Gestational status classification and age-of-gestation rendering from the LMP date
//! - The single outcome transition that closes an episode and updates parity/abortion
//! - Auto-derived risk markers from patient demographics
//! - Patient, tracking, visit, and appointment records with sharded JSON storage
//! - Register numbering and the append-only activity log
//!
//! **No API concerns**: HTTP servers, request validation, or service interfaces belong
//! in `api-rest` or `api-shared`.
//!
//! Every date-dependent rule takes its reference date as an explicit parameter; nothing
//! in this crate reads the ambient clock for a computation.

pub mod audit;
pub mod config;
pub mod constants;
pub mod error;
pub mod numbering;
pub mod outcome;
pub mod pregnancy;
pub mod repositories;
pub mod risk;
pub mod uuid;

pub use config::CoreConfig;
pub use error::{RecordError, RecordResult};
pub use outcome::{record_outcome, DeliveryDetails, OutcomeUpdate, PregnancyOutcome};
pub use pregnancy::{classify_status, elapsed_weeks, format_aog, PregnancyStatus};
pub use risk::{age_on, derive_auto_markers, RiskEntry};
pub use uuid::RecordUuid;

pub use repositories::appointments::{Appointment, AppointmentService, AppointmentStatus};
pub use repositories::patients::{NewPatient, Patient, PatientService, PatientUpdate};
pub use repositories::trackings::{
    NewTracking, PregnancyTracking, TrackingService, TrackingUpdate,
};
pub use repositories::visits::{
    Immunization, NewVisit, PrenatalVisit, VaccineDose, VisitReceipt, VisitService,
};
