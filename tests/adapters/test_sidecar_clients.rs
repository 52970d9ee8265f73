// Copyright (c) 2025 Fabstir
// SPDX-License-Identifier: BUSL-1.1
use axum::{
    extract::Query,
    http::StatusCode,
    routing::{get, post},
    Json, Router,
};
use base64::{engine::general_purpose::STANDARD, Engine as _};
use desaigner_api::marketplace::MercadoLibreProvider;
use desaigner_api::pipeline::{Pipeline, PipelineError, PipelineSettings};
use desaigner_api::translation::GoogleDictTranslator;
use desaigner_api::vision::{
    CaptionError, CaptionStrategy, Captioner, DetectionThresholds, Detector, DetectorError,
    HttpCaptioner, HttpDetector, ImagePayload, Vocabulary,
};
use image::{DynamicImage, Rgb, RgbImage};
use serde_json::{json, Value};
use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

use super::fake_server::spawn;

const TIMEOUT: Duration = Duration::from_secs(5);

fn room(width: u32, height: u32) -> DynamicImage {
    DynamicImage::ImageRgb8(RgbImage::from_pixel(width, height, Rgb([90, 60, 30])))
}

fn vocabulary() -> Vocabulary {
    Vocabulary::new(vec!["sofa".to_string(), "lamp".to_string()]).unwrap()
}

/// Dimensions of the base64 PNG carried in a sidecar request
fn image_dims(body: &Value) -> (u32, u32) {
    let bytes = STANDARD.decode(body["image"].as_str().unwrap()).unwrap();
    let img = image::load_from_memory(&bytes).unwrap();
    (img.width(), img.height())
}

async fn detect_sofa_and_lamp(Json(body): Json<Value>) -> Json<Value> {
    assert_eq!(body["classes"], json!(["sofa", "lamp"]));
    assert!(body["box_threshold"].is_number());
    assert!(body["text_threshold"].is_number());
    Json(json!({
        "detections": [
            {"xyxy": [10.0, 10.0, 30.0, 40.0], "confidence": 0.05, "class_id": 1},
            {"xyxy": [0.2, 0.4, 99.6, 50.0], "confidence": 0.9, "class_id": 0}
        ]
    }))
}

/// Echoes the class hint and crop size behind the fixed prompt
async fn caption_crop(Json(body): Json<Value>) -> Json<Value> {
    let (w, h) = image_dims(&body);
    let prefix = body["text"].as_str().unwrap();
    let hint = body["class_hint"].as_str().unwrap();
    Json(json!({"caption": format!("{}{} {}x{}.", prefix, hint, w, h)}))
}

#[tokio::test]
async fn test_detector_sends_vocabulary_and_parses_detections() {
    let base = spawn(Router::new().route("/detect", post(detect_sofa_and_lamp))).await;
    let detector = HttpDetector::new(&base, TIMEOUT).unwrap();

    let raw = detector
        .detect(&room(120, 80), &vocabulary(), DetectionThresholds::default())
        .await
        .unwrap();

    assert_eq!(raw.len(), 2);
    assert_eq!(raw[1].class_id, Some(0));
    assert_eq!(raw[1].xyxy, [0.2, 0.4, 99.6, 50.0]);
}

#[tokio::test]
async fn test_detector_error_status() {
    let base = spawn(Router::new().route(
        "/detect",
        post(|| async { StatusCode::BAD_GATEWAY }),
    ))
    .await;
    let detector = HttpDetector::new(&base, TIMEOUT).unwrap();

    let err = detector
        .detect(&room(8, 8), &vocabulary(), DetectionThresholds::default())
        .await
        .unwrap_err();
    assert!(matches!(err, DetectorError::Status(502)));
}

#[tokio::test]
async fn test_fixed_prefix_caption_is_stripped_and_capitalized() {
    let base = spawn(Router::new().route(
        "/caption",
        post(|| async {
            Json(json!({
                "caption": "a detailed description of the furniture is a red leather sofa."
            }))
        }),
    ))
    .await;
    let captioner = HttpCaptioner::new(&base, CaptionStrategy::FixedPrefix, TIMEOUT).unwrap();

    let caption = captioner.caption(&room(16, 16), Some("sofa")).await.unwrap();
    assert_eq!(caption, "Red leather sofa.");
}

#[tokio::test]
async fn test_open_vocabulary_keeps_first_clause() {
    let base = spawn(Router::new().route(
        "/interrogate",
        post(|| async {
            Json(json!({"caption": "a wooden chair, trending on artstation, 4k"}))
        }),
    ))
    .await;
    let captioner = HttpCaptioner::new(&base, CaptionStrategy::OpenVocabulary, TIMEOUT).unwrap();

    let caption = captioner.caption(&room(16, 16), None).await.unwrap();
    assert_eq!(caption, "a wooden chair");
}

#[tokio::test]
async fn test_empty_caption_is_rejected() {
    let base = spawn(Router::new().route(
        "/caption",
        post(|| async { Json(json!({"caption": ""})) }),
    ))
    .await;
    let captioner = HttpCaptioner::new(&base, CaptionStrategy::FixedPrefix, TIMEOUT).unwrap();

    let err = captioner.caption(&room(16, 16), None).await.unwrap_err();
    assert!(matches!(err, CaptionError::EmptyCaption));
}

fn pipeline_against(base: &str, confidence_threshold: f64) -> Pipeline {
    let settings = PipelineSettings {
        confidence_threshold,
        ..PipelineSettings::default()
    };
    Pipeline::new(
        Arc::new(HttpDetector::new(base, TIMEOUT).unwrap()),
        Arc::new(HttpCaptioner::new(base, CaptionStrategy::FixedPrefix, TIMEOUT).unwrap()),
        vocabulary(),
        settings,
    )
}

fn data_uri(image: &DynamicImage) -> ImagePayload {
    let mut buf = std::io::Cursor::new(Vec::new());
    image.write_to(&mut buf, image::ImageFormat::Png).unwrap();
    ImagePayload::DataUri(format!(
        "data:image/png;base64,{}",
        STANDARD.encode(buf.into_inner())
    ))
}

#[tokio::test]
async fn test_full_pipeline_over_http() {
    let base = spawn(
        Router::new()
            .route("/detect", post(detect_sofa_and_lamp))
            .route("/caption", post(caption_crop)),
    )
    .await;
    let pipeline = pipeline_against(&base, 0.0);

    let records = pipeline.process(&data_uri(&room(120, 80))).await.unwrap();

    let out = serde_json::to_value(&records).unwrap();
    assert_eq!(
        out,
        json!([
            {"box": [0, 0, 100, 50], "prompt": "Sofa 100x50."},
            {"box": [10, 10, 30, 40], "prompt": "Lamp 20x30."}
        ])
    );
}

#[tokio::test]
async fn test_full_pipeline_threshold_keeps_sofa_only() {
    let base = spawn(
        Router::new()
            .route("/detect", post(detect_sofa_and_lamp))
            .route("/caption", post(caption_crop)),
    )
    .await;
    let pipeline = pipeline_against(&base, 0.5);

    let records = pipeline.process(&data_uri(&room(120, 80))).await.unwrap();

    assert_eq!(records.len(), 1);
    assert_eq!(records[0].prompt, "Sofa 100x50.");
}

#[tokio::test]
async fn test_full_pipeline_with_translation_and_links() {
    let base = spawn(
        Router::new()
            .route("/detect", post(detect_sofa_and_lamp))
            .route("/caption", post(caption_crop))
            .route(
                "/translate_a/t",
                get(|Query(params): Query<HashMap<String, String>>| async move {
                    Json(json!([format!("ES {}", params["q"])]))
                }),
            )
            .route(
                "/products/search",
                get(|| async { Json(json!({"results": [{"id": "MLA42"}]})) }),
            ),
    )
    .await;

    let pipeline = pipeline_against(&base, 0.5)
        .with_translator(Arc::new(
            GoogleDictTranslator::new(&format!("{}/translate_a/t", base), "en", "es", TIMEOUT)
                .unwrap(),
        ))
        .with_recommendations(Arc::new(
            MercadoLibreProvider::new("key".to_string(), &base, "MLA", TIMEOUT).unwrap(),
        ));

    let records = pipeline.process(&data_uri(&room(120, 80))).await.unwrap();

    let out = serde_json::to_value(&records).unwrap();
    assert_eq!(
        out,
        json!([{
            "box": [0, 0, 100, 50],
            "prompt": "ES Sofa 100x50.",
            "links": [
                "https://mercadolibre.com.ar/p/MLA42",
                "no link available",
                "no link available"
            ]
        }])
    );
}

#[tokio::test]
async fn test_translation_outage_aborts_request() {
    let base = spawn(
        Router::new()
            .route("/detect", post(detect_sofa_and_lamp))
            .route("/caption", post(caption_crop))
            .route(
                "/translate_a/t",
                get(|| async { StatusCode::SERVICE_UNAVAILABLE }),
            ),
    )
    .await;

    let pipeline = pipeline_against(&base, 0.0).with_translator(Arc::new(
        GoogleDictTranslator::new(&format!("{}/translate_a/t", base), "en", "es", TIMEOUT)
            .unwrap(),
    ));

    let err = pipeline
        .process(&data_uri(&room(120, 80)))
        .await
        .unwrap_err();
    assert!(matches!(err, PipelineError::Translation(_)));
}
