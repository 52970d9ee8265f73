// Copyright (c) 2025 Fabstir
// SPDX-License-Identifier: BUSL-1.1
//! Captioning adapter for cropped detections
//!
//! Two strategies are supported, selected once per deployment:
//! - fixed-prefix: conditional captioning seeded with [`CAPTION_PREFIX`],
//!   the prefix is stripped and the first letter capitalized
//! - open-vocabulary: free image-to-text interrogation, first clause only

use std::fmt;
use std::str::FromStr;
use std::time::Duration;

use anyhow::Result;
use async_trait::async_trait;
use image::DynamicImage;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::{debug, info};

use super::image_utils::{encode_png_base64, ImageError};

/// Text the conditional captioner is seeded with
pub const CAPTION_PREFIX: &str = "a detailed description of the furniture is a ";

/// Class hint used when a detection carries no class
pub const DEFAULT_CLASS_HINT: &str = "furniture";

#[derive(Debug, Error)]
pub enum CaptionError {
    #[error("Caption is empty")]
    EmptyCaption,

    #[error("Failed to prepare crop for captioning: {0}")]
    Image(#[from] ImageError),

    #[error("Captioner request failed: {0}")]
    Request(String),

    #[error("Captioner returned status {0}")]
    Status(u16),

    #[error("Malformed captioner response: {0}")]
    MalformedResponse(String),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CaptionStrategy {
    FixedPrefix,
    OpenVocabulary,
}

impl FromStr for CaptionStrategy {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "fixed-prefix" | "fixed_prefix" | "blip" => Ok(Self::FixedPrefix),
            "open-vocabulary" | "open_vocabulary" | "interrogator" => Ok(Self::OpenVocabulary),
            other => Err(format!(
                "unknown caption strategy '{}', expected fixed-prefix or open-vocabulary",
                other
            )),
        }
    }
}

impl fmt::Display for CaptionStrategy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CaptionStrategy::FixedPrefix => write!(f, "fixed-prefix"),
            CaptionStrategy::OpenVocabulary => write!(f, "open-vocabulary"),
        }
    }
}

/// Uppercase the first character, leaving the rest untouched
pub fn capitalize_first(text: &str) -> Result<String, CaptionError> {
    let mut chars = text.chars();
    let first = chars.next().ok_or(CaptionError::EmptyCaption)?;
    Ok(first.to_uppercase().chain(chars).collect())
}

/// Remove `prefix` from a decoded caption (if present) and capitalize
pub fn strip_prefix_and_capitalize(decoded: &str, prefix: &str) -> Result<String, CaptionError> {
    if decoded.is_empty() {
        return Err(CaptionError::EmptyCaption);
    }
    let stripped = decoded.strip_prefix(prefix).unwrap_or(decoded);
    capitalize_first(stripped)
}

/// Keep the first comma-separated clause of an interrogator output
pub fn first_clause(text: &str) -> Result<String, CaptionError> {
    let clause = text.split(',').next().unwrap_or_default().trim();
    if clause.is_empty() {
        return Err(CaptionError::EmptyCaption);
    }
    Ok(clause.to_string())
}

/// Apply the strategy's post-processing to a raw model output
pub fn postprocess_caption(raw: &str, strategy: CaptionStrategy) -> Result<String, CaptionError> {
    match strategy {
        CaptionStrategy::FixedPrefix => strip_prefix_and_capitalize(raw, CAPTION_PREFIX),
        CaptionStrategy::OpenVocabulary => first_clause(raw),
    }
}

/// Image captioning capability
#[async_trait]
pub trait Captioner: Send + Sync {
    /// Describe `crop`; the result is never empty
    async fn caption(
        &self,
        crop: &DynamicImage,
        class_hint: Option<&str>,
    ) -> Result<String, CaptionError>;

    fn strategy(&self) -> CaptionStrategy;
}

#[derive(Serialize)]
struct ConditionalCaptionRequest<'a> {
    image: String,
    text: &'a str,
    class_hint: &'a str,
}

#[derive(Serialize)]
struct InterrogateRequest {
    image: String,
}

#[derive(Deserialize)]
struct CaptionResponse {
    caption: String,
}

/// Client for a captioning sidecar (BLIP conditional captioning or CLIP interrogator)
pub struct HttpCaptioner {
    client: Client,
    endpoint: String,
    strategy: CaptionStrategy,
}

impl HttpCaptioner {
    pub fn new(endpoint: &str, strategy: CaptionStrategy, timeout: Duration) -> Result<Self> {
        let client = Client::builder().timeout(timeout).build()?;
        let endpoint = endpoint.trim_end_matches('/').to_string();
        info!(
            "Captioner sidecar configured: endpoint={}, strategy={}",
            endpoint, strategy
        );
        Ok(Self {
            client,
            endpoint,
            strategy,
        })
    }

    async fn request_raw(
        &self,
        crop: &DynamicImage,
        class_hint: Option<&str>,
    ) -> Result<String, CaptionError> {
        let image = encode_png_base64(crop)?;

        let request = match self.strategy {
            CaptionStrategy::FixedPrefix => self
                .client
                .post(format!("{}/caption", self.endpoint))
                .json(&ConditionalCaptionRequest {
                    image,
                    text: CAPTION_PREFIX,
                    class_hint: class_hint.unwrap_or(DEFAULT_CLASS_HINT),
                }),
            CaptionStrategy::OpenVocabulary => self
                .client
                .post(format!("{}/interrogate", self.endpoint))
                .json(&InterrogateRequest { image }),
        };

        let response = request
            .send()
            .await
            .map_err(|e| CaptionError::Request(e.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            return Err(CaptionError::Status(status.as_u16()));
        }

        let body: CaptionResponse = response
            .json()
            .await
            .map_err(|e| CaptionError::MalformedResponse(e.to_string()))?;
        Ok(body.caption)
    }
}

#[async_trait]
impl Captioner for HttpCaptioner {
    async fn caption(
        &self,
        crop: &DynamicImage,
        class_hint: Option<&str>,
    ) -> Result<String, CaptionError> {
        let raw = self.request_raw(crop, class_hint).await?;
        debug!("Raw caption: {:?}", raw);
        postprocess_caption(&raw, self.strategy)
    }

    fn strategy(&self) -> CaptionStrategy {
        self.strategy
    }
}
