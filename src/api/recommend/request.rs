// Copyright (c) 2025 Fabstir
// SPDX-License-Identifier: BUSL-1.1
//! Request extraction for `POST /`
//!
//! Two body shapes are accepted:
//! - `multipart/form-data` with the raw file in the `image` field
//! - a data URI, either as plain text or as a JSON string literal

use axum::{
    async_trait,
    body::Bytes,
    extract::{FromRequest, Request},
    http::header::CONTENT_TYPE,
};
use axum_extra::extract::Multipart;
use std::fmt;
use tracing::warn;

use crate::api::errors::ApiError;
use crate::vision::ImagePayload;

/// Multipart field carrying the uploaded file
pub const IMAGE_FIELD: &str = "image";

/// The image carried by a recommendation request
#[derive(Debug)]
pub struct ImageRequest(pub ImagePayload);

fn is_multipart(req: &Request) -> bool {
    req.headers()
        .get(CONTENT_TYPE)
        .and_then(|v| v.to_str().ok())
        .map(|ct| ct.trim_start().starts_with("multipart/form-data"))
        .unwrap_or(false)
}

/// Log a rejected body and map it to the public error
fn reject(reason: impl fmt::Display) -> ApiError {
    let err = ApiError::InvalidImageData;
    warn!("Rejected request ({}): {}", err.status_code(), reason);
    err
}

/// Pull the data URI out of a non-multipart body
pub fn data_uri_from_body(body: &[u8]) -> Result<String, ApiError> {
    let text = std::str::from_utf8(body)
        .map_err(|e| reject(format_args!("body is not UTF-8: {}", e)))?;
    let text = text.trim();

    if text.starts_with('"') {
        return serde_json::from_str::<String>(text).map_err(|e| {
            reject(format_args!("body looks like JSON but is not a string literal: {}", e))
        });
    }

    Ok(text.to_string())
}

/// First field named `image`, else the first file field
async fn read_image_field(mut multipart: Multipart) -> Result<Vec<u8>, ApiError> {
    let mut fallback = None;

    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| reject(format_args!("malformed multipart body: {}", e)))?
    {
        let named = field.name() == Some(IMAGE_FIELD);
        let is_file = field.file_name().is_some();
        if !named && (!is_file || fallback.is_some()) {
            continue;
        }

        let bytes = field
            .bytes()
            .await
            .map_err(|e| reject(format_args!("failed to read multipart field: {}", e)))?;
        if named {
            return Ok(bytes.to_vec());
        }
        fallback = Some(bytes.to_vec());
    }

    fallback.ok_or_else(|| reject(format_args!("multipart body has no '{}' field", IMAGE_FIELD)))
}

#[async_trait]
impl<S> FromRequest<S> for ImageRequest
where
    S: Send + Sync,
{
    type Rejection = ApiError;

    async fn from_request(req: Request, state: &S) -> Result<Self, Self::Rejection> {
        if is_multipart(&req) {
            let multipart = Multipart::from_request(req, state)
                .await
                .map_err(|e| reject(format_args!("multipart rejected: {}", e)))?;
            let bytes = read_image_field(multipart).await?;
            return Ok(Self(ImagePayload::Upload(bytes)));
        }

        let body = Bytes::from_request(req, state)
            .await
            .map_err(|e| reject(format_args!("failed to read request body: {}", e)))?;
        Ok(Self(ImagePayload::DataUri(data_uri_from_body(&body)?)))
    }
}
