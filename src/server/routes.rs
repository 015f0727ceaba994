use axum::Json;
use axum::extract::State;
use axum::extract::rejection::JsonRejection;
use serde::{Deserialize, Serialize};
use tokio_util::sync::CancellationToken;
use tracing::debug;

use super::AppState;
use super::error::ApiError;
use crate::consts::LIVENESS_MESSAGE;
use crate::rewrite::RewriteRequest;
use crate::tone::{Tone, ToneDescriptor};

#[derive(Debug, Serialize, Deserialize)]
pub struct RewriteResponse {
    pub result: String,
}

pub(super) async fn liveness() -> &'static str {
    debug!("health check");
    LIVENESS_MESSAGE
}

pub(super) async fn tones() -> Json<Vec<ToneDescriptor>> {
    Json(Tone::all().iter().map(|t| t.descriptor()).collect())
}

pub(super) async fn rewrite(
    State(state): State<AppState>,
    payload: Result<Json<RewriteRequest>, JsonRejection>,
) -> Result<Json<RewriteResponse>, ApiError> {
    let Json(request) = payload.map_err(|rejection| {
        debug!(error = %rejection.body_text(), "rejected rewrite body");
        ApiError::InvalidBody
    })?;

    // Dropping this future on disconnect already drops the engine call; the
    // guard also cancels anything the service hands off to another task.
    let cancel = CancellationToken::new();
    let _guard = cancel.clone().drop_guard();

    let result = state.service.rewrite(&request, &cancel).await?;
    Ok(Json(RewriteResponse {
        result: result.text,
    }))
}
