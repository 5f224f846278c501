//! In-call function endpoint the voice agent invokes to fetch a patient.

use axum::extract::State;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde::Deserialize;
use serde_json::json;

use callflow::sanitize::{normalize_medical_id, sanitize_text};

use crate::error::ApiError;
use crate::state::AppState;

#[derive(Debug, Deserialize)]
pub struct FetchPatientRequest {
    pub medical_id: Option<String>,
}

/// POST /api/functions/fetch-patient
///
/// Called mid-conversation by the voice agent once the caller has stated
/// their medical ID. No bearer auth; the platform invokes this directly.
pub async fn fetch_patient(
    State(state): State<AppState>,
    Json(body): Json<FetchPatientRequest>,
) -> Result<Response, ApiError> {
    let Some(medical_id) = body
        .medical_id
        .map(|id| normalize_medical_id(&sanitize_text(&id)))
        .filter(|id| !id.is_empty())
    else {
        return Err(ApiError::BadRequest("Medical ID is required".to_string()));
    };

    let Some(patient) = database::patient::find_by_medical_id(state.db.pool(), &medical_id).await?
    else {
        return Ok((
            StatusCode::NOT_FOUND,
            Json(json!({
                "error": "Patient not found",
                "medical_id": medical_id,
            })),
        )
            .into_response());
    };

    // Shaped for direct consumption by the voice agent.
    Ok(Json(json!({
        "patient_found": true,
        "patient_info": {
            "name": patient.name,
            "medical_id": patient.medical_id,
            "allergies": patient.allergies.as_deref().unwrap_or("None reported"),
            "current_medications": patient.current_medications.as_deref().unwrap_or("None"),
            "medical_history": patient.medical_history.as_deref().unwrap_or("No significant history"),
            "last_call_summary": patient.last_call_summary.as_deref().unwrap_or("No previous calls"),
        }
    }))
    .into_response())
}
