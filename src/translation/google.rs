// Copyright (c) 2025 Fabstir
// SPDX-License-Identifier: BUSL-1.1
//! Google dictionary-extension translation endpoint
//!
//! `GET /translate_a/t?client=dict-chrome-ex&sl=<src>&tl=<dst>&q=<text>`
//! answers with a JSON array whose first element is the translation.

use std::time::Duration;

use anyhow::Result;
use async_trait::async_trait;
use reqwest::Client;
use tracing::debug;

use super::provider::{TranslationError, Translator};

pub const DEFAULT_TRANSLATE_URL: &str = "https://clients5.google.com/translate_a/t";

const CLIENT_ID: &str = "dict-chrome-ex";

pub struct GoogleDictTranslator {
    client: Client,
    url: String,
    source_language: String,
    target_language: String,
    timeout: Duration,
}

impl GoogleDictTranslator {
    pub fn new(
        url: &str,
        source_language: &str,
        target_language: &str,
        timeout: Duration,
    ) -> Result<Self> {
        let client = Client::builder().timeout(timeout).build()?;

        Ok(Self {
            client,
            url: url.to_string(),
            source_language: source_language.to_string(),
            target_language: target_language.to_string(),
            timeout,
        })
    }

    pub fn target_language(&self) -> &str {
        &self.target_language
    }
}

/// Pull the translated string out of the endpoint's JSON array
///
/// The first element is either the string itself or a `[text, lang]` pair.
pub fn parse_translation(body: &serde_json::Value) -> Result<String, TranslationError> {
    let first = body
        .as_array()
        .and_then(|items| items.first())
        .ok_or_else(|| TranslationError::MalformedResponse("expected a non-empty array".into()))?;

    let text = match first {
        serde_json::Value::String(s) => Some(s.as_str()),
        serde_json::Value::Array(pair) => pair.first().and_then(|v| v.as_str()),
        _ => None,
    }
    .ok_or_else(|| {
        TranslationError::MalformedResponse("first element is not a string".into())
    })?;

    if text.is_empty() {
        return Err(TranslationError::MalformedResponse(
            "translation is empty".into(),
        ));
    }

    Ok(text.to_string())
}

#[async_trait]
impl Translator for GoogleDictTranslator {
    async fn translate(&self, text: &str) -> Result<String, TranslationError> {
        let response = self
            .client
            .get(&self.url)
            .query(&[
                ("client", CLIENT_ID),
                ("sl", self.source_language.as_str()),
                ("tl", self.target_language.as_str()),
                ("q", text),
            ])
            .send()
            .await
            .map_err(|e| {
                if e.is_timeout() {
                    TranslationError::Timeout {
                        timeout_ms: self.timeout.as_millis() as u64,
                    }
                } else {
                    TranslationError::Request(e.to_string())
                }
            })?;

        let status = response.status();
        if !status.is_success() {
            return Err(TranslationError::Status {
                status: status.as_u16(),
            });
        }

        let body: serde_json::Value = response
            .json()
            .await
            .map_err(|e| TranslationError::MalformedResponse(e.to_string()))?;

        let translated = parse_translation(&body)?;
        debug!("Translated {:?} -> {:?}", text, translated);
        Ok(translated)
    }

    fn name(&self) -> &'static str {
        "google-dict"
    }
}
