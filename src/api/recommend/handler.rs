// Copyright (c) 2025 Fabstir
// SPDX-License-Identifier: BUSL-1.1
use axum::{extract::State, Json};
use tracing::{error, info, warn};

use super::request::ImageRequest;
use crate::api::errors::ApiError;
use crate::api::http_server::AppState;
use crate::pipeline::OutputRecord;

/// POST / - Detect furniture and describe each piece
///
/// # Response
/// Array of `{box, prompt}` records, plus `links` when marketplace lookup is
/// enabled, ordered by signed box area.
///
/// # Errors
/// - 400: invalid data URI / base64, or undecodable image
/// - 500: inference, translation, marketplace or internal data failure
pub async fn recommend_handler(
    State(state): State<AppState>,
    ImageRequest(payload): ImageRequest,
) -> Result<Json<Vec<OutputRecord>>, ApiError> {
    let records = state.pipeline.process(&payload).await.map_err(|e| {
        let api_error = ApiError::from(&e);
        if api_error.status_code() >= 500 {
            error!("Request failed ({}): {}", api_error.status_code(), e);
        } else {
            warn!("Rejected request ({}): {}", api_error.status_code(), e);
        }
        api_error
    })?;

    info!("Returning {} recommendations", records.len());
    Ok(Json(records))
}
