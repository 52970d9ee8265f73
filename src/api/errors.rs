// Copyright (c) 2025 Fabstir
// SPDX-License-Identifier: BUSL-1.1
use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use std::fmt;

use crate::pipeline::PipelineError;

/// Public failure kinds of the recommendation endpoint
///
/// Each kind maps to one status code and one fixed message; internal
/// details are logged, never returned to the client.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ApiError {
    /// Payload failed data-URI / base64 validation, or no image was sent
    InvalidImageData,
    /// Payload passed validation but is not a decodable image
    UndecodableImage,
    TranslationFailed,
    MarketplaceFailed,
    /// Detector or captioner sidecar failed
    InferenceFailed,
    /// Empty caption or unusable detection geometry
    InternalDataFailure,
}

impl ApiError {
    pub fn message(&self) -> &'static str {
        match self {
            ApiError::InvalidImageData => "Invalid image data",
            ApiError::UndecodableImage => "Could not decode image",
            ApiError::TranslationFailed => "Translation failed",
            ApiError::MarketplaceFailed => "Mercado Libre API failed",
            ApiError::InferenceFailed => "Model inference failed",
            ApiError::InternalDataFailure => "Internal data failure",
        }
    }

    pub fn status_code(&self) -> u16 {
        match self {
            ApiError::InvalidImageData | ApiError::UndecodableImage => 400,
            ApiError::TranslationFailed
            | ApiError::MarketplaceFailed
            | ApiError::InferenceFailed
            | ApiError::InternalDataFailure => 500,
        }
    }
}

impl From<&PipelineError> for ApiError {
    fn from(err: &PipelineError) -> Self {
        match err {
            PipelineError::BadInput(e) if e.is_validation_error() => ApiError::InvalidImageData,
            PipelineError::BadInput(_) => ApiError::UndecodableImage,
            PipelineError::Detection(_) => ApiError::InferenceFailed,
            PipelineError::Caption { source, .. } => match source {
                crate::vision::CaptionError::EmptyCaption => ApiError::InternalDataFailure,
                _ => ApiError::InferenceFailed,
            },
            PipelineError::Translation(_) => ApiError::TranslationFailed,
            PipelineError::Marketplace(_) => ApiError::MarketplaceFailed,
            PipelineError::InvalidGeometry { .. } => ApiError::InternalDataFailure,
        }
    }
}

impl fmt::Display for ApiError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} ({})", self.message(), self.status_code())
    }
}

impl std::error::Error for ApiError {}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status =
            StatusCode::from_u16(self.status_code()).unwrap_or(StatusCode::INTERNAL_SERVER_ERROR);
        (status, Json(self.message())).into_response()
    }
}
