// Copyright (c) 2025 Fabstir
// SPDX-License-Identifier: BUSL-1.1
//! Image ingestion: data-URI validation, decoding and RGB normalization

use std::io::Cursor;
use std::sync::OnceLock;

use base64::{engine::general_purpose::STANDARD, Engine as _};
use image::{DynamicImage, ImageFormat};
use regex::Regex;
use thiserror::Error;

/// Maximum decoded image size (10MB)
pub const MAX_IMAGE_SIZE: usize = 10 * 1024 * 1024;

/// Custom error types for image ingestion
#[derive(Debug, Error)]
pub enum ImageError {
    #[error("Data URI metadata must match data:image/<type>;base64")]
    InvalidDataUri,

    #[error("Invalid base64 payload: {0}")]
    InvalidBase64(String),

    #[error("Image data is too large: {0} bytes (max: {1} bytes)")]
    TooLarge(usize, usize),

    #[error("Unsupported image format")]
    UnsupportedFormat,

    #[error("Failed to decode image: {0}")]
    DecodeFailed(String),

    #[error("Failed to encode image: {0}")]
    EncodeFailed(String),

    #[error("Image data is empty")]
    EmptyData,
}

impl ImageError {
    /// True for failures detected before any decode was attempted
    pub fn is_validation_error(&self) -> bool {
        matches!(self, ImageError::InvalidDataUri | ImageError::InvalidBase64(_))
    }
}

impl From<base64::DecodeError> for ImageError {
    fn from(e: base64::DecodeError) -> Self {
        ImageError::InvalidBase64(e.to_string())
    }
}

/// Image information extracted during loading
#[derive(Debug, Clone)]
pub struct ImageInfo {
    /// Width in pixels
    pub width: u32,
    /// Height in pixels
    pub height: u32,
    /// Detected format
    pub format: ImageFormat,
    /// Size in bytes
    pub size_bytes: usize,
}

/// An incoming image, as received by the HTTP layer
#[derive(Debug, Clone)]
pub enum ImagePayload {
    /// Raw file bytes from a multipart upload
    Upload(Vec<u8>),
    /// `data:image/<type>;base64,<payload>` string
    DataUri(String),
}

impl ImagePayload {
    /// Decode the payload into an RGB bitmap
    pub fn decode(&self) -> Result<(DynamicImage, ImageInfo), ImageError> {
        let (img, info) = match self {
            ImagePayload::Upload(bytes) => decode_image_bytes(bytes)?,
            ImagePayload::DataUri(uri) => decode_data_uri(uri)?,
        };
        Ok((normalize_to_rgb(img), info))
    }
}

fn metadata_pattern() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    PATTERN.get_or_init(|| {
        Regex::new(r"^data:image/[^;,/]+;base64$").expect("static regex is valid")
    })
}

fn base64_pattern() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    PATTERN.get_or_init(|| Regex::new(r"^[A-Za-z0-9+/]*={0,2}$").expect("static regex is valid"))
}

/// Validate a data URI and return its base64 payload
///
/// Both the metadata prefix and the payload alphabet/padding are checked
/// before anything is decoded.
pub fn parse_data_uri(uri: &str) -> Result<&str, ImageError> {
    let (metadata, payload) = uri.trim().split_once(',').ok_or(ImageError::InvalidDataUri)?;

    if !metadata_pattern().is_match(metadata) {
        return Err(ImageError::InvalidDataUri);
    }

    if payload.len() % 4 != 0 || !base64_pattern().is_match(payload) {
        return Err(ImageError::InvalidBase64(
            "payload is not padded base64".to_string(),
        ));
    }

    Ok(payload)
}

/// Decode a `data:image/...;base64,...` string
pub fn decode_data_uri(uri: &str) -> Result<(DynamicImage, ImageInfo), ImageError> {
    let payload = parse_data_uri(uri)?;
    if payload.is_empty() {
        return Err(ImageError::EmptyData);
    }

    let bytes = STANDARD.decode(payload)?;
    decode_image_bytes(&bytes)
}

/// Decode raw image bytes (for multipart uploads)
pub fn decode_image_bytes(bytes: &[u8]) -> Result<(DynamicImage, ImageInfo), ImageError> {
    if bytes.len() > MAX_IMAGE_SIZE {
        return Err(ImageError::TooLarge(bytes.len(), MAX_IMAGE_SIZE));
    }

    if bytes.is_empty() {
        return Err(ImageError::EmptyData);
    }

    let format = detect_format(bytes)?;

    let img = image::load_from_memory_with_format(bytes, format)
        .map_err(|e| ImageError::DecodeFailed(e.to_string()))?;

    let info = ImageInfo {
        width: img.width(),
        height: img.height(),
        format,
        size_bytes: bytes.len(),
    };

    Ok((img, info))
}

/// Convert any color mode (grayscale, alpha, 16-bit) to 8-bit RGB
pub fn normalize_to_rgb(img: DynamicImage) -> DynamicImage {
    match img {
        DynamicImage::ImageRgb8(_) => img,
        other => DynamicImage::ImageRgb8(other.to_rgb8()),
    }
}

/// Encode an image as base64 PNG for transport to model sidecars
pub fn encode_png_base64(img: &DynamicImage) -> Result<String, ImageError> {
    let mut buffer = Cursor::new(Vec::new());
    img.write_to(&mut buffer, ImageFormat::Png)
        .map_err(|e| ImageError::EncodeFailed(e.to_string()))?;
    Ok(STANDARD.encode(buffer.into_inner()))
}

/// Detect image format from magic bytes
pub fn detect_format(bytes: &[u8]) -> Result<ImageFormat, ImageError> {
    if bytes.len() < 4 {
        return Err(ImageError::UnsupportedFormat);
    }

    match bytes {
        // PNG: 89 50 4E 47
        [0x89, 0x50, 0x4E, 0x47, ..] => Ok(ImageFormat::Png),

        // JPEG: FF D8 FF
        [0xFF, 0xD8, 0xFF, ..] => Ok(ImageFormat::Jpeg),

        // WebP: RIFF .... WEBP
        [0x52, 0x49, 0x46, 0x46, _, _, _, _, 0x57, 0x45, 0x42, 0x50, ..] => Ok(ImageFormat::WebP),

        // GIF87a / GIF89a
        [0x47, 0x49, 0x46, 0x38, x, ..] if *x == 0x37 || *x == 0x39 => Ok(ImageFormat::Gif),

        // BMP: BM
        [0x42, 0x4D, ..] => Ok(ImageFormat::Bmp),

        // TIFF: II or MM
        [0x49, 0x49, 0x2A, 0x00, ..] | [0x4D, 0x4D, 0x00, 0x2A, ..] => Ok(ImageFormat::Tiff),

        _ => Err(ImageError::UnsupportedFormat),
    }
}
