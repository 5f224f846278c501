//! Call log listing for the dashboard.

use axum::extract::{Query, State};
use axum::http::HeaderMap;
use axum::Json;
use serde::Deserialize;

use database::models::CallLogView;

use crate::auth;
use crate::error::Result;
use crate::state::AppState;

const DEFAULT_PAGE_SIZE: i64 = 50;
const MAX_PAGE_SIZE: i64 = 200;

#[derive(Debug, Deserialize)]
pub struct ListQuery {
    pub bot_id: Option<i64>,
    pub limit: Option<i64>,
}

/// GET /api/call-logs?bot_id=&limit=
pub async fn list(
    State(state): State<AppState>,
    headers: HeaderMap,
    Query(query): Query<ListQuery>,
) -> Result<Json<Vec<CallLogView>>> {
    auth::authorize(state.api_key.as_deref(), &headers)?;

    let limit = query
        .limit
        .unwrap_or(DEFAULT_PAGE_SIZE)
        .clamp(1, MAX_PAGE_SIZE);

    let logs = database::call_log::list_call_logs(state.db.pool(), query.bot_id, limit).await?;
    Ok(Json(logs))
}
