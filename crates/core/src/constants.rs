//! Constants used throughout the MHR core crate.
//!
//! This module contains all path and filename constants to ensure
//! consistency across the codebase and make maintenance easier.

/// Default directory for record data storage when no explicit directory is configured.
pub const DEFAULT_RECORD_DATA_DIR: &str = "record_data";

/// Directory name for patient demographics storage.
pub const PATIENTS_DIR_NAME: &str = "patients";

/// Directory name for pregnancy tracking records storage.
pub const TRACKINGS_DIR_NAME: &str = "trackings";

/// Directory name for prenatal visit records storage.
pub const VISITS_DIR_NAME: &str = "visits";

/// Directory name for appointment records storage.
pub const APPOINTMENTS_DIR_NAME: &str = "appointments";

/// Directory name for the activity log.
pub const ACTIVITY_DIR_NAME: &str = "activity";

/// Filename for the append-only activity log.
pub const ACTIVITY_LOG_FILENAME: &str = "log.jsonl";

/// Filename for the record numbering counters.
pub const SEQUENCE_FILENAME: &str = "sequence.json";

/// Filename for patient JSON files.
pub const PATIENT_JSON_FILENAME: &str = "patient.json";

/// Filename for pregnancy tracking JSON files.
pub const TRACKING_JSON_FILENAME: &str = "tracking.json";

/// Filename for prenatal visit JSON files.
pub const VISIT_JSON_FILENAME: &str = "visit.json";

/// Filename for appointment JSON files.
pub const APPOINTMENT_JSON_FILENAME: &str = "appointment.json";
