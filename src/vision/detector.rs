// Copyright (c) 2025 Fabstir
// SPDX-License-Identifier: BUSL-1.1
//! Open-vocabulary object detection adapter
//!
//! The detector itself is a grounding-detection model hosted in a sidecar
//! service. This module only moves images to it and normalizes what comes
//! back: box rounding and class-id to label mapping.

use std::time::Duration;

use anyhow::Result;
use async_trait::async_trait;
use image::DynamicImage;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::{debug, info};

use super::image_utils::{encode_png_base64, ImageError};
use super::vocabulary::Vocabulary;

pub const DEFAULT_BOX_THRESHOLD: f32 = 0.35;
pub const DEFAULT_TEXT_THRESHOLD: f32 = 0.25;

#[derive(Debug, Error)]
pub enum DetectorError {
    #[error("Failed to prepare image for detection: {0}")]
    Image(#[from] ImageError),

    #[error("Detector request failed: {0}")]
    Request(String),

    #[error("Detector returned status {0}")]
    Status(u16),

    #[error("Malformed detector response: {0}")]
    MalformedResponse(String),
}

/// Axis-aligned box `(x1, y1, x2, y2)` in pixel coordinates
///
/// Serializes as a 4-element JSON array: integers when rounded, floats otherwise.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum BoundingBox {
    Pixels([i64; 4]),
    Subpixel([f32; 4]),
}

impl BoundingBox {
    pub fn coords(&self) -> [f64; 4] {
        match self {
            BoundingBox::Pixels(c) => c.map(|v| v as f64),
            BoundingBox::Subpixel(c) => c.map(|v| v as f64),
        }
    }

    /// `(x2 - x1) * (y1 - y2)`
    ///
    /// Negative for every normally oriented box. Output ordering depends on
    /// this exact sign convention, so it is not a rectangle area.
    pub fn signed_area(&self) -> f64 {
        let [x1, y1, x2, y2] = self.coords();
        (x2 - x1) * (y1 - y2)
    }
}

/// Detection as reported by the model, before normalization
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct RawDetection {
    pub xyxy: [f32; 4],
    pub confidence: f64,
    #[serde(default)]
    pub class_id: Option<i64>,
}

/// Normalized detection
#[derive(Debug, Clone, PartialEq)]
pub struct Detection {
    pub bbox: BoundingBox,
    pub confidence: f64,
    pub class_id: Option<usize>,
    pub label: Option<String>,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct DetectionThresholds {
    pub box_threshold: f32,
    pub text_threshold: f32,
}

impl Default for DetectionThresholds {
    fn default() -> Self {
        Self {
            box_threshold: DEFAULT_BOX_THRESHOLD,
            text_threshold: DEFAULT_TEXT_THRESHOLD,
        }
    }
}

/// Object detection capability
#[async_trait]
pub trait Detector: Send + Sync {
    /// Detect objects named in `vocabulary`, in the detector's own order
    async fn detect(
        &self,
        image: &DynamicImage,
        vocabulary: &Vocabulary,
        thresholds: DetectionThresholds,
    ) -> Result<Vec<RawDetection>, DetectorError>;

    /// Detector name for logging
    fn name(&self) -> &'static str;
}

/// Python-style `round`: halves go to the nearest even integer
fn round_half_even(v: f32) -> i64 {
    (v as f64).round_ties_even() as i64
}

/// Normalize one raw detection against the vocabulary
///
/// An out-of-range or negative class id is treated as absent.
pub fn normalize_detection(
    raw: &RawDetection,
    vocabulary: &Vocabulary,
    round_boxes: bool,
) -> Detection {
    let bbox = if round_boxes {
        BoundingBox::Pixels(raw.xyxy.map(round_half_even))
    } else {
        BoundingBox::Subpixel(raw.xyxy)
    };

    let class_id = raw
        .class_id
        .and_then(|id| usize::try_from(id).ok())
        .filter(|id| *id < vocabulary.len());

    Detection {
        bbox,
        confidence: raw.confidence,
        class_id,
        label: class_id.and_then(|id| vocabulary.get(id)).map(str::to_string),
    }
}

pub fn normalize_detections(
    raw: &[RawDetection],
    vocabulary: &Vocabulary,
    round_boxes: bool,
) -> Vec<Detection> {
    raw.iter()
        .map(|r| normalize_detection(r, vocabulary, round_boxes))
        .collect()
}

#[derive(Serialize)]
struct DetectRequest<'a> {
    image: String,
    classes: &'a [String],
    box_threshold: f32,
    text_threshold: f32,
}

#[derive(Deserialize)]
struct DetectResponse {
    detections: Vec<RawDetection>,
}

/// Client for a grounding-detection sidecar
pub struct HttpDetector {
    client: Client,
    endpoint: String,
}

impl HttpDetector {
    pub fn new(endpoint: &str, timeout: Duration) -> Result<Self> {
        let client = Client::builder().timeout(timeout).build()?;
        let endpoint = endpoint.trim_end_matches('/').to_string();
        info!("Detector sidecar configured: endpoint={}", endpoint);
        Ok(Self { client, endpoint })
    }

    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }
}

#[async_trait]
impl Detector for HttpDetector {
    async fn detect(
        &self,
        image: &DynamicImage,
        vocabulary: &Vocabulary,
        thresholds: DetectionThresholds,
    ) -> Result<Vec<RawDetection>, DetectorError> {
        let request = DetectRequest {
            image: encode_png_base64(image)?,
            classes: vocabulary.classes(),
            box_threshold: thresholds.box_threshold,
            text_threshold: thresholds.text_threshold,
        };

        let response = self
            .client
            .post(format!("{}/detect", self.endpoint))
            .json(&request)
            .send()
            .await
            .map_err(|e| DetectorError::Request(e.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            return Err(DetectorError::Status(status.as_u16()));
        }

        let body: DetectResponse = response
            .json()
            .await
            .map_err(|e| DetectorError::MalformedResponse(e.to_string()))?;

        debug!("Detector returned {} raw detections", body.detections.len());
        Ok(body.detections)
    }

    fn name(&self) -> &'static str {
        "grounding-dino"
    }
}
