//! # API REST
//!
//! REST API implementation for MHR.
//!
//! Handles:
//! - HTTP endpoints with axum
//! - OpenAPI/Swagger documentation
//! - REST-specific concerns (JSON serialization, CORS, status-code mapping)
//!
//! Uses `api-shared` for wire types and `mhr-core` for all record operations. Handlers
//! own request validation and identifier parsing so that invalid input is rejected with
//! `400` before any core operation runs. The current date is taken once per request and
//! passed into the core, which never reads the clock itself.

#![warn(rust_2018_idioms)]

use axum::{
    extract::{Path as AxumPath, Query, State},
    http::StatusCode,
    response::Json,
    routing::{get, post, put},
    Router,
};
use chrono::Utc;
use serde::Deserialize;
use std::sync::Arc;
use tower_http::cors::CorsLayer;
use utoipa::OpenApi;
use utoipa_swagger_ui::SwaggerUi;

use api_shared::dto::{
    AogRes, AppointmentRes, CreateAppointmentReq, CreatePatientReq, CreateTrackingReq,
    CreateVisitReq, HealthRes, ImmunizationDto, ListAppointmentsRes, ListPatientsRes,
    ListTrackingsRes, OutcomeReq, OutcomeRes, PatientRes, RecordVisitRes, RiskCodeDto,
    TrackingRes, UpdatePatientReq, UpdateTrackingReq, UpdateVisitReq, VaccineDoseDto, VisitRes,
};
use api_shared::HealthService;
use mhr_core::{
    Appointment, AppointmentService, CoreConfig, DeliveryDetails, Immunization, NewPatient,
    NewTracking, NewVisit, Patient, PatientService, PatientUpdate, PregnancyOutcome,
    PregnancyStatus, PregnancyTracking, PrenatalVisit, RecordError, RecordUuid, RiskEntry,
    TrackingService, TrackingUpdate, VaccineDose, VisitService,
};
use mhr_types::NonEmptyText;

/// Application state for the REST API
///
/// Contains shared state that needs to be accessible to all request handlers:
/// the core configuration that every record service is constructed from.
#[derive(Clone)]
pub struct AppState {
    cfg: Arc<CoreConfig>,
}

impl AppState {
    pub fn new(cfg: Arc<CoreConfig>) -> Self {
        Self { cfg }
    }
}

#[derive(OpenApi)]
#[openapi(
    paths(
        health,
        list_patients,
        create_patient,
        update_patient,
        list_trackings,
        create_tracking,
        update_tracking,
        record_outcome,
        get_aog,
        create_visit,
        update_visit,
        list_appointments,
        create_appointment,
    ),
    components(schemas(
        HealthRes,
        CreatePatientReq,
        UpdatePatientReq,
        PatientRes,
        ListPatientsRes,
        RiskCodeDto,
        CreateTrackingReq,
        UpdateTrackingReq,
        TrackingRes,
        ListTrackingsRes,
        OutcomeReq,
        OutcomeRes,
        AogRes,
        VaccineDoseDto,
        ImmunizationDto,
        CreateVisitReq,
        UpdateVisitReq,
        VisitRes,
        RecordVisitRes,
        CreateAppointmentReq,
        AppointmentRes,
        ListAppointmentsRes,
    ))
)]
pub struct ApiDoc;

/// Builds the MHR REST application router.
///
/// All routes, Swagger UI, and the permissive CORS layer are assembled here so the
/// standalone `mhr-api-rest` binary and the workspace `mhr-run` binary serve the same
/// surface.
pub fn app(cfg: Arc<CoreConfig>) -> Router {
    Router::new()
        .route("/health", get(health))
        .route("/patients", get(list_patients))
        .route("/patients", post(create_patient))
        .route("/patients/:id", put(update_patient))
        .route("/trackings", get(list_trackings))
        .route("/trackings", post(create_tracking))
        .route("/trackings/:id", put(update_tracking))
        .route("/trackings/:id/outcome", post(record_outcome))
        .route("/trackings/:id/aog", get(get_aog))
        .route("/visits", post(create_visit))
        .route("/visits/:id", put(update_visit))
        .route("/appointments", get(list_appointments))
        .route("/appointments", post(create_appointment))
        .merge(
            SwaggerUi::new("/swagger-ui/{_:.*}").url("/api-docs/openapi.json", ApiDoc::openapi()),
        )
        .layer(CorsLayer::permissive())
        .with_state(AppState::new(cfg))
}

// ============================================================================
// ERROR MAPPING
// ============================================================================

fn error_response(context: &str, e: &RecordError) -> (StatusCode, &'static str) {
    tracing::error!("{}: {:?}", context, e);
    match e {
        RecordError::InvalidState => (
            StatusCode::CONFLICT,
            "Pregnancy tracking is already closed",
        ),
        RecordError::NoActiveTracking => {
            (StatusCode::CONFLICT, "No active pregnancy tracking found")
        }
        RecordError::NotFound(_) => (StatusCode::NOT_FOUND, "Record not found"),
        RecordError::InvalidInput(_) | RecordError::MissingLmp | RecordError::Text(_) => {
            (StatusCode::BAD_REQUEST, "Invalid request")
        }
        _ => (StatusCode::INTERNAL_SERVER_ERROR, "Internal error"),
    }
}

fn parse_id(input: &str) -> Result<RecordUuid, (StatusCode, &'static str)> {
    RecordUuid::parse(input).map_err(|e| {
        tracing::error!("Invalid record UUID: {:?}", e);
        (StatusCode::BAD_REQUEST, "Invalid record UUID")
    })
}

// ============================================================================
// WIRE MAPPING
// ============================================================================

fn patient_res(p: &Patient) -> PatientRes {
    PatientRes {
        id: p.id.to_string(),
        first_name: p.first_name.clone(),
        last_name: p.last_name.clone(),
        fullname: p.fullname.clone(),
        birth_date: p.birth_date,
        age: p.age,
        address: p.address.clone(),
        created_at: p.created_at,
    }
}

fn risk_code_dto(entry: &RiskEntry) -> RiskCodeDto {
    RiskCodeDto {
        risk_code: entry.code.clone(),
        date_detected: entry.date_detected,
        auto: entry.auto,
    }
}

fn risk_entry(dto: &RiskCodeDto) -> RiskEntry {
    RiskEntry {
        code: dto.risk_code.clone(),
        date_detected: dto.date_detected,
        auto: dto.auto,
    }
}

fn tracking_res(t: &PregnancyTracking, today: chrono::NaiveDate) -> TrackingRes {
    TrackingRes {
        id: t.id.to_string(),
        tracking_number: t.tracking_number.as_ref().map(|n| n.to_string()),
        patient_id: t.patient_id.to_string(),
        fullname: t.fullname.clone(),
        age: t.age,
        lmp: t.lmp,
        aog: t.lmp.map(|lmp| mhr_core::format_aog(lmp, today)),
        gravidity: t.gravidity,
        parity: t.parity,
        abortion: t.abortion,
        pregnancy_status: t.pregnancy_status.map(|s| s.as_str().to_string()),
        is_done: t.is_done,
        anc_given: t.anc_given,
        phic: t.phic,
        health_station: t.health_station.clone(),
        attending_physician: t.attending_physician.clone(),
        risk_codes: t.risk_codes.iter().map(risk_code_dto).collect(),
        outcome_sex: t.outcome_sex.clone(),
        outcome_weight: t.outcome_weight.clone(),
        place_of_delivery: t.place_of_delivery.clone(),
        date_delivery: t.date_delivery,
        created_at: t.created_at,
    }
}

fn vaccine_dose(dto: VaccineDoseDto) -> VaccineDose {
    VaccineDose {
        vaccine_name: dto.vaccine_name,
        dose: dto.dose,
        date_given: dto.date_given,
        lot_no: dto.lot_no,
    }
}

fn vaccine_dose_dto(dose: &VaccineDose) -> VaccineDoseDto {
    VaccineDoseDto {
        vaccine_name: dose.vaccine_name.clone(),
        dose: dose.dose,
        date_given: dose.date_given,
        lot_no: dose.lot_no.clone(),
    }
}

fn immunization(dto: ImmunizationDto) -> Immunization {
    Immunization {
        tetanus: dto.tetanus.map(vaccine_dose),
        covid: dto.covid.map(vaccine_dose),
        other: dto.other.map(vaccine_dose),
    }
}

fn immunization_dto(i: &Immunization) -> ImmunizationDto {
    ImmunizationDto {
        tetanus: i.tetanus.as_ref().map(vaccine_dose_dto),
        covid: i.covid.as_ref().map(vaccine_dose_dto),
        other: i.other.as_ref().map(vaccine_dose_dto),
    }
}

fn visit_res(v: &PrenatalVisit) -> VisitRes {
    VisitRes {
        id: v.id.to_string(),
        tracking_id: v.tracking_id.to_string(),
        date: v.date,
        attending_physician: v.attending_physician.clone(),
        file_number: v.file_number.as_ref().map(|n| n.to_string()),
        phic: v.phic.clone(),
        notes: v.notes.clone(),
        immunization: v.immunization.as_ref().map(immunization_dto),
        created_at: v.created_at,
    }
}

fn appointment_res(a: &Appointment) -> AppointmentRes {
    AppointmentRes {
        id: a.id.to_string(),
        tracking_id: a.tracking_id.to_string(),
        appointment_date: a.appointment_date,
        status: match a.status {
            mhr_core::AppointmentStatus::Scheduled => "scheduled",
            mhr_core::AppointmentStatus::Completed => "completed",
            mhr_core::AppointmentStatus::Cancelled => "cancelled",
        }
        .to_string(),
        notes: a.notes.clone(),
        created_at: a.created_at,
    }
}

// ============================================================================
// HANDLERS
// ============================================================================

#[utoipa::path(
    get,
    path = "/health",
    responses(
        (status = 200, description = "Health check response", body = HealthRes)
    )
)]
/// Health check endpoint for the REST API
///
/// Returns the current health status of the MHR service.
/// This endpoint is used for monitoring and load balancer health checks.
#[axum::debug_handler]
async fn health(State(_state): State<AppState>) -> Json<HealthRes> {
    Json(HealthService::check_health())
}

#[utoipa::path(
    get,
    path = "/patients",
    responses(
        (status = 200, description = "List of patients", body = ListPatientsRes)
    )
)]
/// List all patients in the system
///
/// Individual records that cannot be parsed are skipped with a warning rather than
/// failing the listing.
#[axum::debug_handler]
async fn list_patients(State(state): State<AppState>) -> Json<ListPatientsRes> {
    let patients = PatientService::new(state.cfg.clone())
        .list()
        .iter()
        .map(patient_res)
        .collect();
    Json(ListPatientsRes { patients })
}

#[utoipa::path(
    post,
    path = "/patients",
    request_body = CreatePatientReq,
    responses(
        (status = 201, description = "Patient created", body = PatientRes),
        (status = 400, description = "Bad request"),
        (status = 500, description = "Internal server error")
    )
)]
/// Create a new patient record
///
/// Derives the age, full name, and address line from the submitted fields. The record
/// is stored as JSON in a sharded directory structure under the configured record data
/// directory.
#[axum::debug_handler]
async fn create_patient(
    State(state): State<AppState>,
    Json(req): Json<CreatePatientReq>,
) -> Result<Json<PatientRes>, (StatusCode, &'static str)> {
    let first_name = NonEmptyText::new(&req.first_name)
        .map_err(|_| (StatusCode::BAD_REQUEST, "first_name is required"))?;
    let last_name = NonEmptyText::new(&req.last_name)
        .map_err(|_| (StatusCode::BAD_REQUEST, "last_name is required"))?;

    let new = NewPatient {
        first_name,
        last_name,
        birth_date: req.birth_date,
        zone: req.zone,
        barangay: req.barangay,
        municipality: req.municipality,
        province: req.province,
    };

    let today = Utc::now().date_naive();
    match PatientService::new(state.cfg.clone()).create(new, today) {
        Ok(patient) => Ok(Json(patient_res(&patient))),
        Err(e) => Err(error_response("Create patient error", &e)),
    }
}

#[utoipa::path(
    put,
    path = "/patients/{id}",
    request_body = UpdatePatientReq,
    responses(
        (status = 200, description = "Patient updated", body = PatientRes),
        (status = 400, description = "Bad request"),
        (status = 404, description = "Patient not found"),
        (status = 500, description = "Internal server error")
    )
)]
/// Update a patient record
///
/// Recomputes the derived fields, and when the birth date changed, re-derives the auto
/// risk markers on the patient's open pregnancy trackings.
#[axum::debug_handler]
async fn update_patient(
    State(state): State<AppState>,
    AxumPath(id): AxumPath<String>,
    Json(req): Json<UpdatePatientReq>,
) -> Result<Json<PatientRes>, (StatusCode, &'static str)> {
    let id = parse_id(&id)?;

    let first_name = match req.first_name {
        Some(name) => Some(
            NonEmptyText::new(&name)
                .map_err(|_| (StatusCode::BAD_REQUEST, "first_name cannot be empty"))?,
        ),
        None => None,
    };
    let last_name = match req.last_name {
        Some(name) => Some(
            NonEmptyText::new(&name)
                .map_err(|_| (StatusCode::BAD_REQUEST, "last_name cannot be empty"))?,
        ),
        None => None,
    };

    let birth_date_changed = req.birth_date.is_some();
    let changes = PatientUpdate {
        first_name,
        last_name,
        birth_date: req.birth_date,
        zone: req.zone,
        barangay: req.barangay,
        municipality: req.municipality,
        province: req.province,
    };

    let today = Utc::now().date_naive();
    let patient_service = PatientService::new(state.cfg.clone());
    let patient = match patient_service.update(&id, changes, today) {
        Ok(patient) => patient,
        Err(e) => return Err(error_response("Update patient error", &e)),
    };

    if birth_date_changed {
        let tracking_service = TrackingService::new(state.cfg.clone());
        for tracking in tracking_service.list_open_for_patient(&patient.id) {
            if let Err(e) =
                tracking_service.refresh_auto_markers(&tracking.id, patient.birth_date, today)
            {
                return Err(error_response("Refresh risk markers error", &e));
            }
        }
    }

    Ok(Json(patient_res(&patient)))
}

#[derive(Debug, Deserialize)]
struct ListTrackingsQuery {
    status: Option<String>,
}

#[utoipa::path(
    get,
    path = "/trackings",
    params(
        ("status" = Option<String>, Query, description = "Filter by pregnancy status")
    ),
    responses(
        (status = 200, description = "List of pregnancy trackings", body = ListTrackingsRes),
        (status = 400, description = "Bad request")
    )
)]
/// List pregnancy trackings
///
/// Optionally filtered by pregnancy status (register spelling, e.g. `third_trimester`).
#[axum::debug_handler]
async fn list_trackings(
    State(state): State<AppState>,
    Query(query): Query<ListTrackingsQuery>,
) -> Result<Json<ListTrackingsRes>, (StatusCode, &'static str)> {
    let status = match query.status.as_deref() {
        Some(value) => Some(
            value
                .parse::<PregnancyStatus>()
                .map_err(|_| (StatusCode::BAD_REQUEST, "Unknown pregnancy status"))?,
        ),
        None => None,
    };

    let today = Utc::now().date_naive();
    let trackings = TrackingService::new(state.cfg.clone())
        .list(status)
        .iter()
        .map(|t| tracking_res(t, today))
        .collect();
    Ok(Json(ListTrackingsRes { trackings }))
}

#[utoipa::path(
    post,
    path = "/trackings",
    request_body = CreateTrackingReq,
    responses(
        (status = 201, description = "Pregnancy tracking created", body = TrackingRes),
        (status = 400, description = "Bad request"),
        (status = 404, description = "Patient not found"),
        (status = 500, description = "Internal server error")
    )
)]
/// Open a new pregnancy tracking for a patient
///
/// Assigns the register number, derives the gestational status from the LMP when one is
/// supplied, and attaches the auto-derived risk markers.
#[axum::debug_handler]
async fn create_tracking(
    State(state): State<AppState>,
    Json(req): Json<CreateTrackingReq>,
) -> Result<Json<TrackingRes>, (StatusCode, &'static str)> {
    let patient_id = parse_id(&req.patient_id)?;
    let today = Utc::now().date_naive();

    if let Some(lmp) = req.lmp {
        if lmp > today {
            return Err((StatusCode::BAD_REQUEST, "lmp cannot be in the future"));
        }
    }

    let patient = match PatientService::new(state.cfg.clone()).read(&patient_id) {
        Ok(patient) => patient,
        Err(e) => return Err(error_response("Read patient error", &e)),
    };

    let new = NewTracking {
        lmp: req.lmp,
        gravidity: req.gravidity,
        parity: req.parity,
        abortion: req.abortion,
        phic: req.phic,
        health_station: req.health_station,
        attending_physician: req.attending_physician,
        risk_codes: req.risk_codes.iter().map(risk_entry).collect(),
    };

    match TrackingService::new(state.cfg.clone()).create(&patient, new, today) {
        Ok(tracking) => Ok(Json(tracking_res(&tracking, today))),
        Err(e) => Err(error_response("Create tracking error", &e)),
    }
}

#[utoipa::path(
    put,
    path = "/trackings/{id}",
    request_body = UpdateTrackingReq,
    responses(
        (status = 200, description = "Pregnancy tracking updated", body = TrackingRes),
        (status = 400, description = "Bad request"),
        (status = 404, description = "Tracking not found"),
        (status = 500, description = "Internal server error")
    )
)]
/// Update an open pregnancy tracking
///
/// While the record is open and has an LMP, the gestational status is recomputed from
/// today's date on every update.
#[axum::debug_handler]
async fn update_tracking(
    State(state): State<AppState>,
    AxumPath(id): AxumPath<String>,
    Json(req): Json<UpdateTrackingReq>,
) -> Result<Json<TrackingRes>, (StatusCode, &'static str)> {
    let id = parse_id(&id)?;
    let today = Utc::now().date_naive();

    if let Some(lmp) = req.lmp {
        if lmp > today {
            return Err((StatusCode::BAD_REQUEST, "lmp cannot be in the future"));
        }
    }

    let changes = TrackingUpdate {
        lmp: req.lmp,
        gravidity: req.gravidity,
        phic: req.phic,
        health_station: req.health_station,
        attending_physician: req.attending_physician,
        risk_codes: req
            .risk_codes
            .map(|codes| codes.iter().map(risk_entry).collect()),
    };

    match TrackingService::new(state.cfg.clone()).update(&id, changes, today) {
        Ok(tracking) => Ok(Json(tracking_res(&tracking, today))),
        Err(e) => Err(error_response("Update tracking error", &e)),
    }
}

#[utoipa::path(
    post,
    path = "/trackings/{id}/outcome",
    request_body = OutcomeReq,
    responses(
        (status = 200, description = "Outcome recorded", body = OutcomeRes),
        (status = 400, description = "Bad request"),
        (status = 404, description = "Tracking not found"),
        (status = 409, description = "Tracking already closed"),
        (status = 500, description = "Internal server error")
    )
)]
/// Record a pregnancy outcome
///
/// `outcome_type` is `"miscarriage"` or `"delivery"`. A delivery requires the sex,
/// weight, place and date of delivery, and the PHIC answer; requests missing any of
/// them are rejected before the core operation runs. A second outcome on the same
/// tracking returns `409` and changes nothing.
#[axum::debug_handler]
async fn record_outcome(
    State(state): State<AppState>,
    AxumPath(id): AxumPath<String>,
    Json(req): Json<OutcomeReq>,
) -> Result<Json<OutcomeRes>, (StatusCode, &'static str)> {
    let id = parse_id(&id)?;

    let outcome = match req.outcome_type.as_str() {
        "miscarriage" => PregnancyOutcome::Miscarriage,
        "delivery" => {
            let (Some(outcome_sex), Some(outcome_weight), Some(place_of_delivery)) =
                (req.outcome_sex, req.outcome_weight, req.place_of_delivery)
            else {
                return Err((
                    StatusCode::BAD_REQUEST,
                    "Missing mandatory delivery fields",
                ));
            };
            let (Some(date_delivery), Some(phic)) = (req.date_delivery, req.phic) else {
                return Err((
                    StatusCode::BAD_REQUEST,
                    "Missing mandatory delivery fields",
                ));
            };
            if outcome_sex.trim().is_empty()
                || outcome_weight.trim().is_empty()
                || place_of_delivery.trim().is_empty()
            {
                return Err((
                    StatusCode::BAD_REQUEST,
                    "Missing mandatory delivery fields",
                ));
            }
            PregnancyOutcome::Delivery(DeliveryDetails {
                outcome_sex,
                outcome_weight,
                place_of_delivery,
                date_delivery,
                phic,
            })
        }
        _ => return Err((StatusCode::BAD_REQUEST, "Unknown outcome type")),
    };

    let today = Utc::now().date_naive();
    match TrackingService::new(state.cfg.clone()).record_outcome(&id, outcome, today) {
        Ok((tracking, message)) => Ok(Json(OutcomeRes {
            message,
            tracking: tracking_res(&tracking, today),
        })),
        Err(e) => Err(error_response("Record outcome error", &e)),
    }
}

#[utoipa::path(
    get,
    path = "/trackings/{id}/aog",
    responses(
        (status = 200, description = "Age of gestation", body = AogRes),
        (status = 400, description = "Tracking has no LMP"),
        (status = 404, description = "Tracking not found")
    )
)]
/// Render the age of gestation for a tracking
///
/// Returns the display string `"{weeks}w/{days}d"` computed from the LMP date.
#[axum::debug_handler]
async fn get_aog(
    State(state): State<AppState>,
    AxumPath(id): AxumPath<String>,
) -> Result<Json<AogRes>, (StatusCode, &'static str)> {
    let id = parse_id(&id)?;
    let today = Utc::now().date_naive();

    match TrackingService::new(state.cfg.clone()).aog(&id, today) {
        Ok(aog) => Ok(Json(AogRes { aog })),
        Err(e) => Err(error_response("AOG error", &e)),
    }
}

#[utoipa::path(
    post,
    path = "/visits",
    request_body = CreateVisitReq,
    responses(
        (status = 201, description = "Prenatal visit recorded", body = RecordVisitRes),
        (status = 400, description = "Bad request"),
        (status = 404, description = "Tracking not found"),
        (status = 409, description = "No active pregnancy tracking"),
        (status = 500, description = "Internal server error")
    )
)]
/// Record a prenatal visit
///
/// Copies the attending physician and PHIC answer from the tracking, assigns the
/// out-patient file number, attaches immunizations for third-trimester patients, and
/// completes today's scheduled appointment if there is one.
#[axum::debug_handler]
async fn create_visit(
    State(state): State<AppState>,
    Json(req): Json<CreateVisitReq>,
) -> Result<Json<RecordVisitRes>, (StatusCode, &'static str)> {
    let tracking_id = parse_id(&req.tracking_id)?;
    let today = Utc::now().date_naive();

    let new = NewVisit {
        tracking_id,
        date: req.date,
        notes: req.notes,
        immunization: req.immunization.map(immunization),
    };

    match VisitService::new(state.cfg.clone()).record(new, today) {
        Ok(receipt) => Ok(Json(RecordVisitRes {
            visit: visit_res(&receipt.visit),
            immunization_recorded: receipt.immunization_recorded,
            appointment_completed: receipt.appointment_completed,
            message: receipt.message,
        })),
        Err(e) => Err(error_response("Record visit error", &e)),
    }
}

#[utoipa::path(
    put,
    path = "/visits/{id}",
    request_body = UpdateVisitReq,
    responses(
        (status = 200, description = "Prenatal visit updated", body = VisitRes),
        (status = 400, description = "Bad request"),
        (status = 404, description = "Visit not found"),
        (status = 409, description = "No active pregnancy tracking"),
        (status = 500, description = "Internal server error")
    )
)]
/// Update a prenatal visit
#[axum::debug_handler]
async fn update_visit(
    State(state): State<AppState>,
    AxumPath(id): AxumPath<String>,
    Json(req): Json<UpdateVisitReq>,
) -> Result<Json<VisitRes>, (StatusCode, &'static str)> {
    let id = parse_id(&id)?;

    match VisitService::new(state.cfg.clone()).update(
        &id,
        req.date,
        req.notes,
        req.immunization.map(immunization),
    ) {
        Ok(visit) => Ok(Json(visit_res(&visit))),
        Err(e) => Err(error_response("Update visit error", &e)),
    }
}

#[derive(Debug, Deserialize)]
struct ListAppointmentsQuery {
    tracking_id: Option<String>,
}

#[utoipa::path(
    get,
    path = "/appointments",
    params(
        ("tracking_id" = Option<String>, Query, description = "Filter by tracking")
    ),
    responses(
        (status = 200, description = "List of appointments", body = ListAppointmentsRes),
        (status = 400, description = "Bad request")
    )
)]
/// List appointments, optionally for one tracking
#[axum::debug_handler]
async fn list_appointments(
    State(state): State<AppState>,
    Query(query): Query<ListAppointmentsQuery>,
) -> Result<Json<ListAppointmentsRes>, (StatusCode, &'static str)> {
    let tracking_id = match query.tracking_id.as_deref() {
        Some(value) => Some(parse_id(value)?),
        None => None,
    };

    let appointments = AppointmentService::new(state.cfg.clone())
        .list(tracking_id.as_ref())
        .iter()
        .map(appointment_res)
        .collect();
    Ok(Json(ListAppointmentsRes { appointments }))
}

#[utoipa::path(
    post,
    path = "/appointments",
    request_body = CreateAppointmentReq,
    responses(
        (status = 201, description = "Appointment scheduled", body = AppointmentRes),
        (status = 400, description = "Bad request"),
        (status = 404, description = "Tracking not found"),
        (status = 500, description = "Internal server error")
    )
)]
/// Schedule an appointment for a tracking
#[axum::debug_handler]
async fn create_appointment(
    State(state): State<AppState>,
    Json(req): Json<CreateAppointmentReq>,
) -> Result<Json<AppointmentRes>, (StatusCode, &'static str)> {
    let tracking_id = parse_id(&req.tracking_id)?;

    // The tracking must exist; scheduling against a ghost record is a caller bug.
    if let Err(e) = TrackingService::new(state.cfg.clone()).read(&tracking_id) {
        return Err(error_response("Read tracking error", &e));
    }

    match AppointmentService::new(state.cfg.clone()).schedule(
        &tracking_id,
        req.appointment_date,
        req.notes,
    ) {
        Ok(appointment) => Ok(Json(appointment_res(&appointment))),
        Err(e) => Err(error_response("Schedule appointment error", &e)),
    }
}
