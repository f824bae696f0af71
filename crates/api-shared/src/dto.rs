//! Request and response types for the MHR APIs.
//!
//! These are wire types only: identifiers are canonical UUID strings and statuses are
//! their register spellings. Parsing and validation into core types happens in the
//! handlers, so a bad request never reaches the core.

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

/// Health check response.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct HealthRes {
    pub ok: bool,
    pub message: String,
}

// ============================================================================
// PATIENTS
// ============================================================================

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct CreatePatientReq {
    pub first_name: String,
    pub last_name: String,
    pub birth_date: NaiveDate,
    pub zone: Option<String>,
    pub barangay: Option<String>,
    pub municipality: Option<String>,
    pub province: Option<String>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, ToSchema)]
pub struct UpdatePatientReq {
    pub first_name: Option<String>,
    pub last_name: Option<String>,
    pub birth_date: Option<NaiveDate>,
    pub zone: Option<String>,
    pub barangay: Option<String>,
    pub municipality: Option<String>,
    pub province: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct PatientRes {
    pub id: String,
    pub first_name: String,
    pub last_name: String,
    pub fullname: String,
    pub birth_date: NaiveDate,
    pub age: u32,
    pub address: String,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct ListPatientsRes {
    pub patients: Vec<PatientRes>,
}

// ============================================================================
// PREGNANCY TRACKINGS
// ============================================================================

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct RiskCodeDto {
    pub risk_code: String,
    pub date_detected: Option<NaiveDate>,
    /// True for markers the system derived; the UI locks these.
    #[serde(default)]
    pub auto: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct CreateTrackingReq {
    pub patient_id: String,
    pub lmp: Option<NaiveDate>,
    pub gravidity: u32,
    pub parity: u32,
    pub abortion: u32,
    pub phic: bool,
    pub health_station: Option<String>,
    pub attending_physician: Option<String>,
    #[serde(default)]
    pub risk_codes: Vec<RiskCodeDto>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, ToSchema)]
pub struct UpdateTrackingReq {
    pub lmp: Option<NaiveDate>,
    pub gravidity: Option<u32>,
    pub phic: Option<bool>,
    pub health_station: Option<String>,
    pub attending_physician: Option<String>,
    pub risk_codes: Option<Vec<RiskCodeDto>>,
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct TrackingRes {
    pub id: String,
    pub tracking_number: Option<String>,
    pub patient_id: String,
    pub fullname: String,
    pub age: u32,
    pub lmp: Option<NaiveDate>,
    pub aog: Option<String>,
    pub gravidity: u32,
    pub parity: u32,
    pub abortion: u32,
    pub pregnancy_status: Option<String>,
    pub is_done: bool,
    pub anc_given: bool,
    pub phic: bool,
    pub health_station: Option<String>,
    pub attending_physician: Option<String>,
    pub risk_codes: Vec<RiskCodeDto>,
    pub outcome_sex: Option<String>,
    pub outcome_weight: Option<String>,
    pub place_of_delivery: Option<String>,
    pub date_delivery: Option<NaiveDate>,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct ListTrackingsRes {
    pub trackings: Vec<TrackingRes>,
}

/// Outcome submission. `outcome_type` selects the branch; the delivery detail
/// fields are mandatory when it is `"delivery"` and ignored otherwise.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct OutcomeReq {
    /// `"miscarriage"` or `"delivery"`.
    pub outcome_type: String,
    pub outcome_sex: Option<String>,
    pub outcome_weight: Option<String>,
    pub place_of_delivery: Option<String>,
    pub date_delivery: Option<NaiveDate>,
    pub phic: Option<bool>,
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct OutcomeRes {
    pub message: String,
    pub tracking: TrackingRes,
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct AogRes {
    pub aog: String,
}

// ============================================================================
// PRENATAL VISITS
// ============================================================================

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct VaccineDoseDto {
    pub vaccine_name: Option<String>,
    pub dose: u32,
    pub date_given: NaiveDate,
    pub lot_no: Option<String>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, ToSchema)]
pub struct ImmunizationDto {
    pub tetanus: Option<VaccineDoseDto>,
    pub covid: Option<VaccineDoseDto>,
    pub other: Option<VaccineDoseDto>,
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct CreateVisitReq {
    pub tracking_id: String,
    pub date: NaiveDate,
    pub notes: Option<String>,
    pub immunization: Option<ImmunizationDto>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, ToSchema)]
pub struct UpdateVisitReq {
    pub date: Option<NaiveDate>,
    pub notes: Option<String>,
    pub immunization: Option<ImmunizationDto>,
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct VisitRes {
    pub id: String,
    pub tracking_id: String,
    pub date: NaiveDate,
    pub attending_physician: Option<String>,
    pub file_number: Option<String>,
    pub phic: String,
    pub notes: Option<String>,
    pub immunization: Option<ImmunizationDto>,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct RecordVisitRes {
    pub visit: VisitRes,
    pub immunization_recorded: bool,
    pub appointment_completed: bool,
    pub message: String,
}

// ============================================================================
// APPOINTMENTS
// ============================================================================

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct CreateAppointmentReq {
    pub tracking_id: String,
    pub appointment_date: NaiveDate,
    pub notes: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct AppointmentRes {
    pub id: String,
    pub tracking_id: String,
    pub appointment_date: NaiveDate,
    pub status: String,
    pub notes: Option<String>,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct ListAppointmentsRes {
    pub appointments: Vec<AppointmentRes>,
}
