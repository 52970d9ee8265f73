// Copyright (c) 2025 Fabstir
// SPDX-License-Identifier: BUSL-1.1
//! Service configuration loaded from environment variables

use std::env;
use std::fmt;
use std::path::PathBuf;
use std::str::FromStr;
use std::time::Duration;

use url::Url;

use crate::marketplace::mercadolibre::{DEFAULT_MERCADO_LIBRE_URL, DEFAULT_SITE_ID};
use crate::pipeline::PipelineSettings;
use crate::translation::google::DEFAULT_TRANSLATE_URL;
use crate::vision::detector::{DEFAULT_BOX_THRESHOLD, DEFAULT_TEXT_THRESHOLD};
use crate::vision::{CaptionStrategy, DetectionThresholds};

pub const DEFAULT_HOST: &str = "0.0.0.0";
pub const DEFAULT_PORT: u16 = 8000;
pub const DEFAULT_DETECTOR_ENDPOINT: &str = "http://127.0.0.1:8001";
pub const DEFAULT_CAPTIONER_ENDPOINT: &str = "http://127.0.0.1:8002";
pub const DEFAULT_CORS_ORIGIN: &str = "https://desaigner.vercel.app";
pub const DEFAULT_EXTERNAL_TIMEOUT_SECS: u64 = 30;

/// Top-level service configuration
#[derive(Debug, Clone)]
pub struct ServiceConfig {
    pub host: String,
    pub port: u16,
    /// JSON class list; the built-in furniture list is used when unset
    pub vocabulary_path: Option<PathBuf>,
    /// Exclusive lower bound on detection scores, within `[0, 1)`
    pub confidence_threshold: f64,
    pub box_threshold: f32,
    pub text_threshold: f32,
    pub round_boxes: bool,
    pub caption_strategy: CaptionStrategy,
    pub detector_endpoint: String,
    pub captioner_endpoint: String,
    pub translation: TranslationConfig,
    pub marketplace: MarketplaceConfig,
    /// Timeout applied to every outbound HTTP call
    pub external_timeout_secs: u64,
    pub cors_allowed_origins: Vec<String>,
}

#[derive(Debug, Clone)]
pub struct TranslationConfig {
    pub enabled: bool,
    pub url: String,
    pub source_language: String,
    pub target_language: String,
}

#[derive(Debug, Clone)]
pub struct MarketplaceConfig {
    pub enabled: bool,
    pub url: String,
    /// Bearer token; required when `enabled`
    pub api_key: Option<String>,
    pub site_id: String,
}

fn parse_bool(value: &str) -> Option<bool> {
    match value.trim().to_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Some(true),
        "0" | "false" | "no" | "off" => Some(false),
        _ => None,
    }
}

/// Parse an optional variable; a present but malformed value is an error
fn parse_var<T>(key: &str, value: Option<String>) -> Result<Option<T>, String>
where
    T: FromStr,
    T::Err: fmt::Display,
{
    value
        .map(|v| {
            v.trim()
                .parse::<T>()
                .map_err(|e| format!("Invalid {} '{}': {}", key, v, e))
        })
        .transpose()
}

fn parse_flag(key: &str, value: Option<String>) -> Result<Option<bool>, String> {
    value
        .map(|v| {
            parse_bool(&v).ok_or_else(|| format!("Invalid {} '{}': expected a boolean", key, v))
        })
        .transpose()
}

fn parse_list(value: &str) -> Vec<String> {
    value
        .split(',')
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(str::to_string)
        .collect()
}

impl ServiceConfig {
    /// Load configuration from environment variables
    pub fn from_env() -> Result<Self, String> {
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Load configuration through an arbitrary variable lookup
    pub fn from_lookup<F>(lookup: F) -> Result<Self, String>
    where
        F: Fn(&str) -> Option<String>,
    {
        let defaults = Self::default();
        let number = |key: &str| parse_var::<f32>(key, lookup(key));
        let flag = |key: &str| parse_flag(key, lookup(key));
        let timeout = parse_var::<u64>("EXTERNAL_TIMEOUT_SECS", lookup("EXTERNAL_TIMEOUT_SECS"))?;
        let threshold = parse_var::<f64>("CONFIDENCE_THRESHOLD", lookup("CONFIDENCE_THRESHOLD"))?;

        let caption_strategy = match lookup("CAPTION_STRATEGY") {
            Some(value) => value.parse()?,
            None => defaults.caption_strategy,
        };

        Ok(Self {
            host: lookup("API_HOST").unwrap_or(defaults.host),
            port: parse_var("API_PORT", lookup("API_PORT"))?.unwrap_or(defaults.port),
            vocabulary_path: lookup("VOCABULARY_PATH")
                .filter(|v| !v.trim().is_empty())
                .map(PathBuf::from),
            confidence_threshold: threshold.unwrap_or(defaults.confidence_threshold),
            box_threshold: number("BOX_THRESHOLD")?.unwrap_or(defaults.box_threshold),
            text_threshold: number("TEXT_THRESHOLD")?.unwrap_or(defaults.text_threshold),
            round_boxes: flag("ROUND_BOXES")?.unwrap_or(defaults.round_boxes),
            caption_strategy,
            detector_endpoint: lookup("DETECTOR_ENDPOINT").unwrap_or(defaults.detector_endpoint),
            captioner_endpoint: lookup("CAPTIONER_ENDPOINT")
                .unwrap_or(defaults.captioner_endpoint),
            translation: TranslationConfig {
                enabled: flag("TRANSLATION_ENABLED")?.unwrap_or(defaults.translation.enabled),
                url: lookup("TRANSLATE_URL").unwrap_or(defaults.translation.url),
                source_language: defaults.translation.source_language,
                target_language: lookup("TRANSLATION_TARGET_LANGUAGE")
                    .unwrap_or(defaults.translation.target_language),
            },
            marketplace: MarketplaceConfig {
                enabled: flag("RECOMMENDATIONS_ENABLED")?.unwrap_or(defaults.marketplace.enabled),
                url: lookup("MERCADO_LIBRE_URL").unwrap_or(defaults.marketplace.url),
                api_key: lookup("MERCADO_LIBRE_KEY").filter(|k| !k.trim().is_empty()),
                site_id: lookup("MERCADO_LIBRE_SITE_ID").unwrap_or(defaults.marketplace.site_id),
            },
            external_timeout_secs: timeout.unwrap_or(defaults.external_timeout_secs),
            cors_allowed_origins: lookup("CORS_ALLOWED_ORIGINS")
                .map(|v| parse_list(&v))
                .unwrap_or(defaults.cors_allowed_origins),
        })
    }

    /// Validate the configuration
    pub fn validate(&self) -> Result<(), String> {
        if !(0.0..1.0).contains(&self.confidence_threshold) {
            return Err(format!(
                "confidence threshold must be within [0, 1), got {}",
                self.confidence_threshold
            ));
        }

        for (name, value) in [
            ("box threshold", self.box_threshold),
            ("text threshold", self.text_threshold),
        ] {
            if !(0.0..=1.0).contains(&value) {
                return Err(format!("{} must be within [0, 1], got {}", name, value));
            }
        }

        if self.external_timeout_secs == 0 {
            return Err("External timeout must be greater than 0".to_string());
        }

        let mut endpoints = vec![
            ("detector endpoint", &self.detector_endpoint),
            ("captioner endpoint", &self.captioner_endpoint),
        ];
        if self.translation.enabled {
            endpoints.push(("translate URL", &self.translation.url));
        }
        if self.marketplace.enabled {
            endpoints.push(("Mercado Libre URL", &self.marketplace.url));
        }
        for (name, value) in endpoints {
            Url::parse(value).map_err(|e| format!("Invalid {} '{}': {}", name, value, e))?;
        }

        if self.marketplace.enabled && self.marketplace.api_key.is_none() {
            return Err("MERCADO_LIBRE_KEY is required when recommendations are enabled".to_string());
        }

        Ok(())
    }

    pub fn external_timeout(&self) -> Duration {
        Duration::from_secs(self.external_timeout_secs)
    }

    pub fn pipeline_settings(&self) -> PipelineSettings {
        PipelineSettings {
            confidence_threshold: self.confidence_threshold,
            thresholds: DetectionThresholds {
                box_threshold: self.box_threshold,
                text_threshold: self.text_threshold,
            },
            round_boxes: self.round_boxes,
        }
    }
}

impl Default for ServiceConfig {
    fn default() -> Self {
        Self {
            host: DEFAULT_HOST.to_string(),
            port: DEFAULT_PORT,
            vocabulary_path: None,
            confidence_threshold: 0.0,
            box_threshold: DEFAULT_BOX_THRESHOLD,
            text_threshold: DEFAULT_TEXT_THRESHOLD,
            round_boxes: true,
            caption_strategy: CaptionStrategy::FixedPrefix,
            detector_endpoint: DEFAULT_DETECTOR_ENDPOINT.to_string(),
            captioner_endpoint: DEFAULT_CAPTIONER_ENDPOINT.to_string(),
            translation: TranslationConfig {
                enabled: true,
                url: DEFAULT_TRANSLATE_URL.to_string(),
                source_language: "en".to_string(),
                target_language: "es".to_string(),
            },
            marketplace: MarketplaceConfig {
                enabled: false,
                url: DEFAULT_MERCADO_LIBRE_URL.to_string(),
                api_key: None,
                site_id: DEFAULT_SITE_ID.to_string(),
            },
            external_timeout_secs: DEFAULT_EXTERNAL_TIMEOUT_SECS,
            cors_allowed_origins: vec![DEFAULT_CORS_ORIGIN.to_string()],
        }
    }
}
