//! Bot CRUD endpoints for the dashboard.

use axum::extract::{Path, State};
use axum::http::{HeaderMap, StatusCode};
use axum::response::IntoResponse;
use axum::Json;
use serde::Deserialize;
use serde_json::json;

use database::models::{Bot, NewBot};

use crate::auth;
use crate::error::{ApiError, Result};
use crate::state::AppState;

#[derive(Debug, Deserialize)]
pub struct CreateBot {
    pub uid: Option<String>,
    pub name: Option<String>,
    pub prompt: Option<String>,
    pub domain: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct UpdateBot {
    pub uid: Option<String>,
    pub name: Option<String>,
    pub prompt: Option<String>,
    pub domain: Option<String>,
    pub is_active: Option<bool>,
}

/// GET /api/bots
pub async fn list(State(state): State<AppState>, headers: HeaderMap) -> Result<Json<Vec<Bot>>> {
    auth::authorize(state.api_key.as_deref(), &headers)?;

    let bots = database::bot::list_bots(state.db.pool()).await?;
    Ok(Json(bots))
}

/// POST /api/bots
pub async fn create(
    State(state): State<AppState>,
    headers: HeaderMap,
    Json(body): Json<CreateBot>,
) -> Result<impl IntoResponse> {
    auth::authorize(state.api_key.as_deref(), &headers)?;

    let required = [&body.uid, &body.name, &body.prompt];
    if required
        .iter()
        .any(|field| field.as_deref().map_or(true, |s| s.trim().is_empty()))
    {
        return Err(ApiError::BadRequest(
            "UID, name, and prompt are required".to_string(),
        ));
    }

    let new_bot = NewBot {
        uid: body.uid.unwrap_or_default(),
        name: body.name.unwrap_or_default(),
        prompt: body.prompt.unwrap_or_default(),
        domain: body.domain.unwrap_or_else(|| "medical".to_string()),
    };

    let bot = database::bot::create_bot(state.db.pool(), &new_bot).await?;
    Ok((StatusCode::CREATED, Json(bot)))
}

/// GET /api/bots/:id
pub async fn get(
    State(state): State<AppState>,
    headers: HeaderMap,
    Path(id): Path<i64>,
) -> Result<Json<Bot>> {
    auth::authorize(state.api_key.as_deref(), &headers)?;

    let bot = database::bot::get_bot(state.db.pool(), id).await?;
    Ok(Json(bot))
}

/// PUT /api/bots/:id. Absent fields keep their current value.
pub async fn update(
    State(state): State<AppState>,
    headers: HeaderMap,
    Path(id): Path<i64>,
    Json(body): Json<UpdateBot>,
) -> Result<Json<Bot>> {
    auth::authorize(state.api_key.as_deref(), &headers)?;

    let current = database::bot::get_bot(state.db.pool(), id).await?;
    let bot = database::bot::update_bot(
        state.db.pool(),
        id,
        body.uid.as_deref().unwrap_or(&current.uid),
        body.name.as_deref().unwrap_or(&current.name),
        body.prompt.as_deref().unwrap_or(&current.prompt),
        body.domain.as_deref().unwrap_or(&current.domain),
        body.is_active.unwrap_or(current.is_active),
    )
    .await?;

    Ok(Json(bot))
}

/// DELETE /api/bots/:id
pub async fn delete(
    State(state): State<AppState>,
    headers: HeaderMap,
    Path(id): Path<i64>,
) -> Result<impl IntoResponse> {
    auth::authorize(state.api_key.as_deref(), &headers)?;

    database::bot::delete_bot(state.db.pool(), id).await?;
    Ok(Json(json!({ "message": "Bot deleted successfully" })))
}
