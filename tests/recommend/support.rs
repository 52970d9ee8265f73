// Copyright (c) 2025 Fabstir
// SPDX-License-Identifier: BUSL-1.1
//! In-process test doubles for the pipeline adapters

use async_trait::async_trait;
use axum::{body::Body, http::Response, Router};
use base64::{engine::general_purpose::STANDARD, Engine as _};
use desaigner_api::api::{create_app, AppState};
use desaigner_api::marketplace::{LinkSet, MarketplaceError, RecommendationProvider};
use desaigner_api::pipeline::{Pipeline, PipelineSettings};
use desaigner_api::translation::{TranslationError, Translator};
use desaigner_api::vision::{
    CaptionError, CaptionStrategy, Captioner, DetectionThresholds, Detector, DetectorError,
    RawDetection, Vocabulary,
};
use image::{DynamicImage, ImageFormat, Rgb, RgbImage};
use serde_json::Value;
use std::io::Cursor;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

pub const ORIGIN: &str = "https://desaigner.vercel.app";

pub struct FixedDetector(pub Vec<RawDetection>);

#[async_trait]
impl Detector for FixedDetector {
    async fn detect(
        &self,
        _image: &DynamicImage,
        _vocabulary: &Vocabulary,
        _thresholds: DetectionThresholds,
    ) -> Result<Vec<RawDetection>, DetectorError> {
        Ok(self.0.clone())
    }

    fn name(&self) -> &'static str {
        "fixed"
    }
}

/// Captions every crop as "A <hint> in the room."
pub struct HintCaptioner;

#[async_trait]
impl Captioner for HintCaptioner {
    async fn caption(
        &self,
        _crop: &DynamicImage,
        class_hint: Option<&str>,
    ) -> Result<String, CaptionError> {
        Ok(format!("A {} in the room.", class_hint.unwrap_or("thing")))
    }

    fn strategy(&self) -> CaptionStrategy {
        CaptionStrategy::FixedPrefix
    }
}

pub struct PrefixTranslator;

#[async_trait]
impl Translator for PrefixTranslator {
    async fn translate(&self, text: &str) -> Result<String, TranslationError> {
        Ok(format!("ES: {}", text))
    }

    fn name(&self) -> &'static str {
        "prefix"
    }
}

pub struct UnavailableTranslator;

#[async_trait]
impl Translator for UnavailableTranslator {
    async fn translate(&self, _text: &str) -> Result<String, TranslationError> {
        Err(TranslationError::Status { status: 503 })
    }

    fn name(&self) -> &'static str {
        "unavailable"
    }
}

/// Translates the first caption, then reports the service as unavailable
#[derive(Default)]
pub struct FailsOnSecondCallTranslator {
    calls: AtomicUsize,
}

#[async_trait]
impl Translator for FailsOnSecondCallTranslator {
    async fn translate(&self, text: &str) -> Result<String, TranslationError> {
        if self.calls.fetch_add(1, Ordering::SeqCst) == 0 {
            Ok(format!("ES: {}", text))
        } else {
            Err(TranslationError::Status { status: 503 })
        }
    }

    fn name(&self) -> &'static str {
        "fails-on-second-call"
    }
}

/// Rejects every lookup as unauthorized
pub struct UnauthorizedProvider;

#[async_trait]
impl RecommendationProvider for UnauthorizedProvider {
    async fn lookup(&self, _caption: &str) -> Result<LinkSet, MarketplaceError> {
        Err(MarketplaceError::ApiError { status: 401 })
    }

    fn name(&self) -> &'static str {
        "unauthorized"
    }
}

/// Returns a single product link per caption
pub struct SingleLinkProvider;

#[async_trait]
impl RecommendationProvider for SingleLinkProvider {
    async fn lookup(&self, caption: &str) -> Result<LinkSet, MarketplaceError> {
        Ok(LinkSet::from_links(vec![format!(
            "https://mercadolibre.com.ar/p/{}",
            caption.len()
        )]))
    }

    fn name(&self) -> &'static str {
        "single-link"
    }
}

pub fn vocabulary() -> Vocabulary {
    Vocabulary::new(vec!["sofa".to_string(), "lamp".to_string()]).unwrap()
}

/// Sofa (0,0,100,50; 0.9) and lamp (10,10,30,40; 0.05)
pub fn sofa_and_lamp() -> Vec<RawDetection> {
    vec![
        RawDetection {
            xyxy: [10.0, 10.0, 30.0, 40.0],
            confidence: 0.05,
            class_id: Some(1),
        },
        RawDetection {
            xyxy: [0.0, 0.0, 100.0, 50.0],
            confidence: 0.9,
            class_id: Some(0),
        },
    ]
}

pub fn pipeline(detections: Vec<RawDetection>, confidence_threshold: f64) -> Pipeline {
    let settings = PipelineSettings {
        confidence_threshold,
        ..PipelineSettings::default()
    };
    Pipeline::new(
        Arc::new(FixedDetector(detections)),
        Arc::new(HintCaptioner),
        vocabulary(),
        settings,
    )
}

pub fn app(pipeline: Pipeline) -> Router {
    create_app(AppState::new(pipeline), &[ORIGIN.to_string()])
}

pub fn png_bytes(width: u32, height: u32) -> Vec<u8> {
    let img = RgbImage::from_pixel(width, height, Rgb([180, 40, 40]));
    let mut buf = Cursor::new(Vec::new());
    DynamicImage::ImageRgb8(img)
        .write_to(&mut buf, ImageFormat::Png)
        .unwrap();
    buf.into_inner()
}

pub fn png_data_uri(width: u32, height: u32) -> String {
    format!("data:image/png;base64,{}", STANDARD.encode(png_bytes(width, height)))
}

pub fn multipart_body(boundary: &str, field: &str, bytes: &[u8]) -> Vec<u8> {
    let mut body = format!(
        "--{b}\r\nContent-Disposition: form-data; name=\"{f}\"; filename=\"room.png\"\r\n\
         Content-Type: image/png\r\n\r\n",
        b = boundary,
        f = field
    )
    .into_bytes();
    body.extend_from_slice(bytes);
    body.extend_from_slice(format!("\r\n--{}--\r\n", boundary).as_bytes());
    body
}

pub async fn body_json(response: Response<Body>) -> Value {
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    serde_json::from_slice(&bytes).unwrap()
}
