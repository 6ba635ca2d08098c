//! # API REST
//!
//! REST boundary over the ward record core.
//!
//! Handles:
//! - HTTP endpoints with axum (registration, search, the four record forms)
//! - OpenAPI/Swagger documentation
//! - REST-specific concerns (JSON serialization, status mapping, CORS)
//!
//! Every handler re-resolves the patient from the path id before touching a
//! record table, so a stale or mistyped id becomes a 404 instead of an
//! orphaned row.

#![warn(rust_2018_idioms)]

use axum::{
    body::Bytes,
    extract::{Path as AxumPath, Query, State},
    http::StatusCode,
    response::{IntoResponse, Json, Response},
    routing::{get, post, put},
    Router,
};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tower_http::cors::CorsLayer;
use utoipa::{OpenApi, ToSchema};
use utoipa_swagger_ui::SwaggerUi;
use uuid::Uuid;

use ward_core::attachments::AttachmentStore;
use ward_core::{
    AdmissionDischarge, CoreContext, DischargeType, Gender, HistorySection, HistorySectionKind,
    IdentityService, MaritalStatus, NewPatient, OrientationAssessment, OrientationQuestion,
    Patient, PatientChart, PersonalData, RecordError, Sex,
};

/// Application state for the REST API server
///
/// Contains shared state that needs to be accessible to all request handlers:
/// the core context, the identity service built over it, and the attachment
/// store image uploads go to.
#[derive(Clone)]
pub struct AppState {
    ctx: Arc<CoreContext>,
    identity: IdentityService,
    attachments: Arc<dyn AttachmentStore>,
}

impl AppState {
    pub fn new(ctx: Arc<CoreContext>, attachments: Arc<dyn AttachmentStore>) -> Self {
        Self {
            identity: IdentityService::new(Arc::clone(&ctx)),
            ctx,
            attachments,
        }
    }
}

/// Build the application router over the given state.
///
/// Separate from `main` so integration tests can drive the exact router the
/// binary serves.
pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/health", get(health))
        .route("/patients", post(register_patient))
        // One param name per path position: this segment must stay `:id`
        // to coexist with the record routes below, even though the number
        // search reads it as the patient number.
        .route("/patients/:id", get(find_patient))
        .route(
            "/patients/:id/personal-data",
            get(get_personal_data).put(put_personal_data),
        )
        .route(
            "/patients/:id/orientation",
            get(get_orientation).put(put_orientation),
        )
        .route(
            "/patients/:id/admission-discharge",
            get(get_admission_discharge).put(put_admission_discharge),
        )
        .route("/patients/:id/history", get(get_history))
        .route("/patients/:id/history/:section", put(put_history_section))
        .route("/patients/:id/attachments", post(upload_attachment))
        .merge(SwaggerUi::new("/swagger-ui").url("/api-docs/openapi.json", ApiDoc::openapi()))
        .layer(CorsLayer::permissive())
        .with_state(state)
}

#[derive(OpenApi)]
#[openapi(
    paths(
        health,
        register_patient,
        find_patient,
        get_personal_data,
        put_personal_data,
        get_orientation,
        put_orientation,
        get_admission_discharge,
        put_admission_discharge,
        get_history,
        put_history_section,
        upload_attachment,
    ),
    components(schemas(
        HealthRes,
        ErrorBody,
        RegisterPatientReq,
        AttachmentRes,
        HistoryRes,
        HistorySectionRes,
        Patient,
        Gender,
        PersonalData,
        Sex,
        MaritalStatus,
        OrientationAssessment,
        OrientationQuestion,
        AdmissionDischarge,
        DischargeType,
        HistorySection,
        HistorySectionKind,
    ))
)]
struct ApiDoc;

/// Health check response body
#[derive(Serialize, ToSchema)]
pub struct HealthRes {
    pub ok: bool,
    pub message: String,
}

/// Error payload rendered for every failed request
#[derive(Serialize, ToSchema)]
pub struct ErrorBody {
    pub error: String,
}

/// Request body for registering a new patient
#[derive(Deserialize, ToSchema)]
pub struct RegisterPatientReq {
    pub full_name: String,
    pub age: u16,
    pub gender: Gender,
}

/// One history section as presented by the chart
#[derive(Serialize, ToSchema)]
pub struct HistorySectionRes {
    pub section_type: HistorySectionKind,
    pub title: String,
    pub content: String,
    pub image_urls: Vec<String>,
}

/// The full section catalog of one patient, in catalog order
#[derive(Serialize, ToSchema)]
pub struct HistoryRes {
    pub sections: Vec<HistorySectionRes>,
}

/// Reference to a stored attachment, for use in `image_urls`
#[derive(Serialize, ToSchema)]
pub struct AttachmentRes {
    pub reference: String,
}

#[derive(Deserialize)]
struct AttachmentQuery {
    filename: String,
}

/// A request failure mapped to its HTTP rendering.
struct ApiError {
    status: StatusCode,
    message: String,
}

impl ApiError {
    fn not_found(message: impl Into<String>) -> Self {
        Self {
            status: StatusCode::NOT_FOUND,
            message: message.into(),
        }
    }
}

impl From<RecordError> for ApiError {
    fn from(err: RecordError) -> Self {
        tracing::error!(error = %err, "record operation failed");
        let status = match &err {
            RecordError::InvalidInput(_) => StatusCode::BAD_REQUEST,
            RecordError::Persistence(_) => StatusCode::BAD_GATEWAY,
            RecordError::Consistency(_)
            | RecordError::Serialization(_)
            | RecordError::Deserialization(_)
            | RecordError::Attachment(_) => StatusCode::INTERNAL_SERVER_ERROR,
        };
        Self {
            status,
            message: err.to_string(),
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        (
            self.status,
            Json(ErrorBody {
                error: self.message,
            }),
        )
            .into_response()
    }
}

/// Resolve the path id to a patient, or 404.
async fn resolve_patient(state: &AppState, id: Uuid) -> Result<Patient, ApiError> {
    state
        .identity
        .find_by_id(id)
        .await?
        .ok_or_else(|| ApiError::not_found("No patient found with this id"))
}

async fn open_chart(state: &AppState, id: Uuid) -> Result<PatientChart, ApiError> {
    let patient = resolve_patient(state, id).await?;
    Ok(PatientChart::open(Arc::clone(&state.ctx), patient))
}

fn section_res(kind: HistorySectionKind, section: &HistorySection) -> HistorySectionRes {
    HistorySectionRes {
        section_type: kind,
        title: kind.display_name().to_owned(),
        content: section.content.clone(),
        image_urls: section.image_urls.clone(),
    }
}

#[utoipa::path(
    get,
    path = "/health",
    responses(
        (status = 200, description = "Health check response", body = HealthRes)
    )
)]
/// Health check endpoint for the REST API
///
/// Used for monitoring and load balancer health checks.
#[axum::debug_handler]
async fn health(State(_state): State<AppState>) -> Json<HealthRes> {
    Json(HealthRes {
        ok: true,
        message: "Ward REST API is alive".into(),
    })
}

#[utoipa::path(
    post,
    path = "/patients",
    request_body = RegisterPatientReq,
    responses(
        (status = 201, description = "Patient registered", body = Patient),
        (status = 400, description = "Invalid registration input", body = ErrorBody),
        (status = 502, description = "Storage failure", body = ErrorBody)
    )
)]
/// Register a new patient
///
/// Validates the name and age, requests a fresh patient number and inserts
/// the patient row. The returned patient carries the assigned number and id.
///
/// # Errors
/// Returns `400 Bad Request` when the name is blank or the age is out of
/// range, and `502 Bad Gateway` when number generation or the insert fails.
#[axum::debug_handler]
async fn register_patient(
    State(state): State<AppState>,
    Json(req): Json<RegisterPatientReq>,
) -> Result<(StatusCode, Json<Patient>), ApiError> {
    let request = NewPatient::new(&req.full_name, req.age, req.gender)?;
    let patient = state.identity.register(request).await?;
    Ok((StatusCode::CREATED, Json(patient)))
}

#[utoipa::path(
    get,
    path = "/patients/{id}",
    params(
        ("id" = String, Path, description = "Patient number to search for, e.g. PT-20260101-0001")
    ),
    responses(
        (status = 200, description = "The matching patient", body = Patient),
        (status = 404, description = "No patient carries this number", body = ErrorBody),
        (status = 502, description = "Storage failure", body = ErrorBody)
    )
)]
/// Search a patient by patient number
///
/// Exact, case-sensitive match on the formatted number. Zero matches is a
/// 404, not a server failure.
#[axum::debug_handler]
async fn find_patient(
    State(state): State<AppState>,
    AxumPath(number): AxumPath<String>,
) -> Result<Json<Patient>, ApiError> {
    match state.identity.find_by_number(&number).await? {
        Some(patient) => Ok(Json(patient)),
        None => Err(ApiError::not_found("No patient found with this number")),
    }
}

#[utoipa::path(
    get,
    path = "/patients/{id}/personal-data",
    params(("id" = Uuid, Path, description = "Patient id")),
    responses(
        (status = 200, description = "Personal data draft, defaults when no row exists", body = PersonalData),
        (status = 404, description = "Unknown patient", body = ErrorBody)
    )
)]
/// Read the personal data record
///
/// Returns the stored row, or an all-defaults draft when the patient has
/// never saved personal data.
#[axum::debug_handler]
async fn get_personal_data(
    State(state): State<AppState>,
    AxumPath(id): AxumPath<Uuid>,
) -> Result<Json<PersonalData>, ApiError> {
    let chart = open_chart(&state, id).await?;
    let form = chart.personal_data().await?;
    Ok(Json(form.draft().clone()))
}

#[utoipa::path(
    put,
    path = "/patients/{id}/personal-data",
    params(("id" = Uuid, Path, description = "Patient id")),
    request_body = PersonalData,
    responses(
        (status = 200, description = "The saved record", body = PersonalData),
        (status = 404, description = "Unknown patient", body = ErrorBody),
        (status = 502, description = "Storage failure", body = ErrorBody)
    )
)]
/// Save the personal data record
///
/// Full-field-set replacement: the submitted body becomes the whole row,
/// inserted on first save and updated afterwards.
#[axum::debug_handler]
async fn put_personal_data(
    State(state): State<AppState>,
    AxumPath(id): AxumPath<Uuid>,
    Json(draft): Json<PersonalData>,
) -> Result<Json<PersonalData>, ApiError> {
    let chart = open_chart(&state, id).await?;
    let mut form = chart.personal_data().await?;
    form.set_draft(draft);
    form.save().await?;
    Ok(Json(form.draft().clone()))
}

#[utoipa::path(
    get,
    path = "/patients/{id}/orientation",
    params(("id" = Uuid, Path, description = "Patient id")),
    responses(
        (status = 200, description = "Orientation checklist, all-false when no row exists", body = OrientationAssessment),
        (status = 404, description = "Unknown patient", body = ErrorBody)
    )
)]
/// Read the orientation checklist
#[axum::debug_handler]
async fn get_orientation(
    State(state): State<AppState>,
    AxumPath(id): AxumPath<Uuid>,
) -> Result<Json<OrientationAssessment>, ApiError> {
    let chart = open_chart(&state, id).await?;
    let form = chart.orientation().await?;
    Ok(Json(form.draft().clone()))
}

#[utoipa::path(
    put,
    path = "/patients/{id}/orientation",
    params(("id" = Uuid, Path, description = "Patient id")),
    request_body = OrientationAssessment,
    responses(
        (status = 200, description = "The saved checklist", body = OrientationAssessment),
        (status = 404, description = "Unknown patient", body = ErrorBody),
        (status = 502, description = "Storage failure", body = ErrorBody)
    )
)]
/// Save the orientation checklist
#[axum::debug_handler]
async fn put_orientation(
    State(state): State<AppState>,
    AxumPath(id): AxumPath<Uuid>,
    Json(draft): Json<OrientationAssessment>,
) -> Result<Json<OrientationAssessment>, ApiError> {
    let chart = open_chart(&state, id).await?;
    let mut form = chart.orientation().await?;
    form.set_draft(draft);
    form.save().await?;
    Ok(Json(form.draft().clone()))
}

#[utoipa::path(
    get,
    path = "/patients/{id}/admission-discharge",
    params(("id" = Uuid, Path, description = "Patient id")),
    responses(
        (status = 200, description = "Admission and discharge record", body = AdmissionDischarge),
        (status = 404, description = "Unknown patient", body = ErrorBody)
    )
)]
/// Read the admission and discharge record
#[axum::debug_handler]
async fn get_admission_discharge(
    State(state): State<AppState>,
    AxumPath(id): AxumPath<Uuid>,
) -> Result<Json<AdmissionDischarge>, ApiError> {
    let chart = open_chart(&state, id).await?;
    let form = chart.admission_discharge().await?;
    Ok(Json(form.draft().clone()))
}

#[utoipa::path(
    put,
    path = "/patients/{id}/admission-discharge",
    params(("id" = Uuid, Path, description = "Patient id")),
    request_body = AdmissionDischarge,
    responses(
        (status = 200, description = "The saved record", body = AdmissionDischarge),
        (status = 404, description = "Unknown patient", body = ErrorBody),
        (status = 502, description = "Storage failure", body = ErrorBody)
    )
)]
/// Save the admission and discharge record
#[axum::debug_handler]
async fn put_admission_discharge(
    State(state): State<AppState>,
    AxumPath(id): AxumPath<Uuid>,
    Json(draft): Json<AdmissionDischarge>,
) -> Result<Json<AdmissionDischarge>, ApiError> {
    let chart = open_chart(&state, id).await?;
    let mut form = chart.admission_discharge().await?;
    form.set_draft(draft);
    form.save().await?;
    Ok(Json(form.draft().clone()))
}

#[utoipa::path(
    get,
    path = "/patients/{id}/history",
    params(("id" = Uuid, Path, description = "Patient id")),
    responses(
        (status = 200, description = "All ten history sections in catalog order", body = HistoryRes),
        (status = 404, description = "Unknown patient", body = ErrorBody)
    )
)]
/// Read the full history section catalog
///
/// Sections with no stored row come back with empty content and no images,
/// so the client always renders the same ten tabs.
#[axum::debug_handler]
async fn get_history(
    State(state): State<AppState>,
    AxumPath(id): AxumPath<Uuid>,
) -> Result<Json<HistoryRes>, ApiError> {
    let chart = open_chart(&state, id).await?;
    let form = chart.history().await?;
    let sections = form
        .sections()
        .map(|(kind, section)| section_res(kind, section))
        .collect();
    Ok(Json(HistoryRes { sections }))
}

#[utoipa::path(
    put,
    path = "/patients/{id}/history/{section}",
    params(
        ("id" = Uuid, Path, description = "Patient id"),
        ("section" = String, Path, description = "Section identifier, e.g. examination")
    ),
    request_body = HistorySection,
    responses(
        (status = 200, description = "The saved section", body = HistorySectionRes),
        (status = 400, description = "Unknown section identifier", body = ErrorBody),
        (status = 404, description = "Unknown patient", body = ErrorBody),
        (status = 502, description = "Storage failure", body = ErrorBody)
    )
)]
/// Save one history section
///
/// Writes exactly one `(patient, section)` row; every other section keeps
/// its stored state.
#[axum::debug_handler]
async fn put_history_section(
    State(state): State<AppState>,
    AxumPath((id, section)): AxumPath<(Uuid, String)>,
    Json(draft): Json<HistorySection>,
) -> Result<Json<HistorySectionRes>, ApiError> {
    let kind = HistorySectionKind::try_from(section.as_str())?;
    let chart = open_chart(&state, id).await?;
    let mut form = chart.history().await?;
    form.edit_section(kind, |current| *current = draft);
    form.save_section(kind).await?;
    Ok(Json(section_res(kind, form.section(kind))))
}

#[utoipa::path(
    post,
    path = "/patients/{id}/attachments",
    params(
        ("id" = Uuid, Path, description = "Patient id"),
        ("filename" = String, Query, description = "Original filename of the upload")
    ),
    request_body(content = Vec<u8>, content_type = "application/octet-stream"),
    responses(
        (status = 201, description = "Attachment stored", body = AttachmentRes),
        (status = 400, description = "Unusable filename", body = ErrorBody),
        (status = 404, description = "Unknown patient", body = ErrorBody),
        (status = 500, description = "Attachment storage failure", body = ErrorBody)
    )
)]
/// Store an attachment for a patient
///
/// Stores the raw bytes and returns the reference string to carry in a
/// history section's `image_urls`; rows never embed file content.
#[axum::debug_handler]
async fn upload_attachment(
    State(state): State<AppState>,
    AxumPath(id): AxumPath<Uuid>,
    Query(query): Query<AttachmentQuery>,
    body: Bytes,
) -> Result<(StatusCode, Json<AttachmentRes>), ApiError> {
    resolve_patient(&state, id).await?;
    let reference = state.attachments.store(id, &query.filename, &body).await?;
    Ok((StatusCode::CREATED, Json(AttachmentRes { reference })))
}
