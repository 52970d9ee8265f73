// Copyright (c) 2025 Fabstir
// SPDX-License-Identifier: BUSL-1.1
//! Vision side of the pipeline
//!
//! This module provides:
//! - Image ingestion (multipart bytes or base64 data URIs) into RGB bitmaps
//! - The detection vocabulary
//! - Adapters for the detection and captioning model sidecars

pub mod captioner;
pub mod detector;
pub mod image_utils;
pub mod vocabulary;

pub use captioner::{CaptionError, CaptionStrategy, Captioner, HttpCaptioner};
pub use detector::{
    BoundingBox, Detection, DetectionThresholds, Detector, DetectorError, HttpDetector,
    RawDetection,
};
pub use image_utils::{decode_data_uri, decode_image_bytes, ImageError, ImageInfo, ImagePayload};
pub use vocabulary::{Vocabulary, VocabularyError};
