use axum::{
    extract::{rejection::JsonRejection, State},
    routing::post,
    Json, Router,
};
use tracing::instrument;

use crate::{
    error::AppError,
    rewards::dto::ProgressView,
    state::AppState,
    visits::{
        dto::{ScanClient, ScanRequest, ScanResponse},
        services::{record_visit, ScanInput},
    },
};

pub fn scan_routes() -> Router<AppState> {
    Router::new().route("/api/scan", post(scan))
}

/// POST /api/scan { qrToken, scanId?, note? }
#[instrument(skip(state, payload))]
pub async fn scan(
    State(state): State<AppState>,
    payload: Result<Json<ScanRequest>, JsonRejection>,
) -> Result<Json<ScanResponse>, AppError> {
    let Json(payload) = payload?;
    let qr_token = payload
        .qr_token
        .map(|t| t.trim().to_string())
        .filter(|t| !t.is_empty())
        .ok_or_else(|| AppError::InvalidInput("QR code is required".into()))?;

    let outcome = record_visit(
        &state,
        ScanInput {
            qr_token,
            scan_id: payload.scan_id,
            note: payload.note,
        },
    )
    .await?;

    Ok(Json(ScanResponse {
        success: true,
        message: format!("Visit #{} recorded", outcome.total),
        visits: outcome.total,
        reward: outcome.reward,
        progress: ProgressView::new(&outcome.progress, &state.config.reward),
        duplicate: outcome.duplicate,
        client: ScanClient {
            name: outcome.user.username,
            email: outcome.user.email,
        },
    }))
}
