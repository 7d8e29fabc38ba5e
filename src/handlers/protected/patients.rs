use axum::{
    extract::{rejection::{JsonRejection, PathRejection}, Path, State},
    Extension, Json,
};

use crate::app::AppState;
use crate::middleware::{ApiResponse, ApiResult, AuthUser};
use crate::models::{NewPatient, Patient};

/// POST /patients - register a patient
///
/// Input: `{"name": "Ana", "health_card_number": "123", "address": "Rua A, 10"}`;
/// only `name` is required.
pub async fn create_patient(
    State(state): State<AppState>,
    Extension(user): Extension<AuthUser>,
    payload: Result<Json<NewPatient>, JsonRejection>,
) -> ApiResult<Patient> {
    let Json(fields) = payload?;
    let patient = state.service.create_patient(fields).await?;
    tracing::info!(user = %user.username, patient_id = patient.id, "Created patient");
    Ok(ApiResponse::created(patient))
}

/// GET /patients - all patients in creation order
pub async fn list_patients(State(state): State<AppState>) -> ApiResult<Vec<Patient>> {
    Ok(ApiResponse::success(state.service.list_patients().await))
}

/// GET /patients/:id
pub async fn get_patient(
    State(state): State<AppState>,
    id: Result<Path<u64>, PathRejection>,
) -> ApiResult<Patient> {
    let Path(id) = id?;
    Ok(ApiResponse::success(state.service.get_patient(id).await?))
}
