// Copyright (c) 2025 Fabstir
// SPDX-License-Identifier: BUSL-1.1
//! Detection-to-recommendation pipeline
//!
//! One request runs the stages strictly in order:
//! ingest → detect → filter → crop + caption → translate → look up links →
//! sort by signed area.
//!
//! The [`Pipeline`] is built once at startup and shared read-only between
//! concurrent requests. Every stage failure aborts the request; no partial
//! output is ever assembled.

pub mod filter;
pub mod output;

use std::sync::Arc;

use image::DynamicImage;
use thiserror::Error;
use tracing::{debug, info, warn};

use crate::marketplace::{LinkSet, MarketplaceError, RecommendationProvider};
use crate::translation::{TranslationError, Translator};
use crate::vision::captioner::DEFAULT_CLASS_HINT;
use crate::vision::detector::normalize_detections;
use crate::vision::image_utils::normalize_to_rgb;
use crate::vision::{
    BoundingBox, CaptionError, Captioner, Detection, DetectionThresholds, Detector,
    DetectorError, ImageError, ImagePayload, Vocabulary,
};

pub use filter::filter_by_confidence;
pub use output::{sort_by_signed_area, OutputRecord};

#[derive(Debug, Error)]
pub enum PipelineError {
    /// Payload failed validation or decoding
    #[error("Bad input: {0}")]
    BadInput(#[from] ImageError),

    #[error("Detection failed: {0}")]
    Detection(#[from] DetectorError),

    #[error("Captioning failed for detection {index}: {source}")]
    Caption {
        index: usize,
        #[source]
        source: CaptionError,
    },

    #[error("Translation failed: {0}")]
    Translation(#[from] TranslationError),

    #[error("Marketplace lookup failed: {0}")]
    Marketplace(#[from] MarketplaceError),

    #[error("Invalid geometry for detection {index}: {reason}")]
    InvalidGeometry { index: usize, reason: String },
}

/// Fixed per-deployment pipeline settings
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PipelineSettings {
    /// Detections must score strictly above this to be kept
    pub confidence_threshold: f64,
    pub thresholds: DetectionThresholds,
    /// Round box coordinates to integer pixels
    pub round_boxes: bool,
}

impl Default for PipelineSettings {
    fn default() -> Self {
        Self {
            confidence_threshold: 0.0,
            thresholds: DetectionThresholds::default(),
            round_boxes: true,
        }
    }
}

/// Crop the region covered by `bbox`, clamped to the image bounds
pub fn crop_detection(
    image: &DynamicImage,
    bbox: &BoundingBox,
    index: usize,
) -> Result<DynamicImage, PipelineError> {
    let [x1, y1, x2, y2] = bbox.coords();
    if ![x1, y1, x2, y2].iter().all(|v| v.is_finite()) {
        return Err(PipelineError::InvalidGeometry {
            index,
            reason: "non-finite coordinate".to_string(),
        });
    }

    let (width, height) = (image.width() as f64, image.height() as f64);
    let left = x1.min(x2).clamp(0.0, width).floor();
    let right = x1.max(x2).clamp(0.0, width).ceil();
    let top = y1.min(y2).clamp(0.0, height).floor();
    let bottom = y1.max(y2).clamp(0.0, height).ceil();

    if right <= left || bottom <= top {
        return Err(PipelineError::InvalidGeometry {
            index,
            reason: format!(
                "box ({}, {}, {}, {}) is empty inside a {}x{} image",
                x1, y1, x2, y2, width, height
            ),
        });
    }

    Ok(image.crop_imm(
        left as u32,
        top as u32,
        (right - left) as u32,
        (bottom - top) as u32,
    ))
}

/// Request-independent pipeline context: adapters, vocabulary and settings
pub struct Pipeline {
    detector: Arc<dyn Detector>,
    captioner: Arc<dyn Captioner>,
    translator: Option<Arc<dyn Translator>>,
    recommender: Option<Arc<dyn RecommendationProvider>>,
    vocabulary: Arc<Vocabulary>,
    settings: PipelineSettings,
}

impl Pipeline {
    pub fn new(
        detector: Arc<dyn Detector>,
        captioner: Arc<dyn Captioner>,
        vocabulary: Vocabulary,
        settings: PipelineSettings,
    ) -> Self {
        Self {
            detector,
            captioner,
            translator: None,
            recommender: None,
            vocabulary: Arc::new(vocabulary),
            settings,
        }
    }

    /// Enable caption translation
    pub fn with_translator(mut self, translator: Arc<dyn Translator>) -> Self {
        self.translator = Some(translator);
        self
    }

    /// Enable marketplace link lookup
    pub fn with_recommendations(mut self, recommender: Arc<dyn RecommendationProvider>) -> Self {
        self.recommender = Some(recommender);
        self
    }

    /// Decode a payload and run it through the pipeline
    pub async fn process(&self, payload: &ImagePayload) -> Result<Vec<OutputRecord>, PipelineError> {
        let (image, info) = payload.decode()?;
        debug!(
            "Decoded image: {}x{}, {} bytes",
            info.width, info.height, info.size_bytes
        );
        self.run(&image).await
    }

    /// Detect and keep detections above the confidence threshold
    pub async fn detect(&self, image: &DynamicImage) -> Result<Vec<Detection>, PipelineError> {
        let raw = self
            .detector
            .detect(image, &self.vocabulary, self.settings.thresholds)
            .await?;
        let detections = normalize_detections(&raw, &self.vocabulary, self.settings.round_boxes);
        let total = detections.len();
        let kept = filter_by_confidence(detections, self.settings.confidence_threshold);

        info!(
            "{} detections from {}, {} above confidence {}",
            total,
            self.detector.name(),
            kept.len(),
            self.settings.confidence_threshold
        );
        Ok(kept)
    }

    async fn caption_all(
        &self,
        image: &DynamicImage,
        detections: &[Detection],
    ) -> Result<Vec<String>, PipelineError> {
        debug!(
            "Captioning {} crops ({})",
            detections.len(),
            self.captioner.strategy()
        );
        let mut captions = Vec::with_capacity(detections.len());
        for (index, detection) in detections.iter().enumerate() {
            let crop = crop_detection(image, &detection.bbox, index)?;
            let hint = detection.label.as_deref().unwrap_or(DEFAULT_CLASS_HINT);
            let caption = self
                .captioner
                .caption(&crop, Some(hint))
                .await
                .map_err(|source| PipelineError::Caption { index, source })?;
            debug!("Detection {} ({}): {:?}", index, hint, caption);
            captions.push(caption);
        }
        Ok(captions)
    }

    async fn translate_all(&self, captions: Vec<String>) -> Result<Vec<String>, PipelineError> {
        let Some(translator) = &self.translator else {
            return Ok(captions);
        };

        let mut translated = Vec::with_capacity(captions.len());
        for caption in &captions {
            let text = translator.translate(caption).await.map_err(|e| {
                warn!(
                    "Translation via {} failed with status {:?}: {}",
                    translator.name(),
                    e.status(),
                    e
                );
                e
            })?;
            translated.push(text);
        }
        Ok(translated)
    }

    async fn lookup_all(
        &self,
        captions: &[String],
    ) -> Result<Option<Vec<LinkSet>>, PipelineError> {
        let Some(recommender) = &self.recommender else {
            return Ok(None);
        };

        let mut link_sets = Vec::with_capacity(captions.len());
        for caption in captions {
            let links = recommender.lookup(caption).await.map_err(|e| {
                warn!(
                    "Marketplace lookup via {} failed with status {:?}: {}",
                    recommender.name(),
                    e.status(),
                    e
                );
                e
            })?;
            link_sets.push(links);
        }
        Ok(Some(link_sets))
    }

    /// Run every stage on a decoded bitmap
    pub async fn run(&self, image: &DynamicImage) -> Result<Vec<OutputRecord>, PipelineError> {
        let normalized;
        let image = if matches!(image, DynamicImage::ImageRgb8(_)) {
            image
        } else {
            normalized = normalize_to_rgb(image.clone());
            &normalized
        };

        let detections = self.detect(image).await?;
        let captions = self.caption_all(image, &detections).await?;
        let prompts = self.translate_all(captions).await?;
        let link_sets = self.lookup_all(&prompts).await?;

        let mut records: Vec<OutputRecord> = match link_sets {
            Some(link_sets) => detections
                .iter()
                .zip(prompts)
                .zip(link_sets)
                .map(|((detection, prompt), links)| OutputRecord {
                    bbox: detection.bbox,
                    prompt,
                    links: Some(links),
                })
                .collect(),
            None => detections
                .iter()
                .zip(prompts)
                .map(|(detection, prompt)| OutputRecord {
                    bbox: detection.bbox,
                    prompt,
                    links: None,
                })
                .collect(),
        };

        sort_by_signed_area(&mut records);
        Ok(records)
    }
}
