//! HTTP API endpoints.
//!
//! Read-only access to match state for pages that are not connected yet.

use axum::{
    extract::{Path, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::Serialize;
use std::sync::Arc;

use crate::state::AppState;

#[derive(Debug, Clone, Serialize)]
pub struct ErrorResponse {
    pub code: String,
    pub msg: String,
}

/// Get a match snapshot.
///
/// GET /api/matches/{match_id}
pub async fn get_match(
    State(state): State<Arc<AppState>>,
    Path(match_id): Path<String>,
) -> Response {
    match state.get_snapshot(&match_id).await {
        Ok(snapshot) => Json(snapshot).into_response(),
        Err(e) => (
            StatusCode::NOT_FOUND,
            Json(ErrorResponse {
                code: e.code().to_string(),
                msg: e.to_string(),
            }),
        )
            .into_response(),
    }
}
