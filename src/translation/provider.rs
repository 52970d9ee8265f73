// Copyright (c) 2025 Fabstir
// SPDX-License-Identifier: BUSL-1.1
//! Translator trait definition

use async_trait::async_trait;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum TranslationError {
    /// Endpoint answered with a non-success status
    #[error("Translation API returned status {status}")]
    Status { status: u16 },

    #[error("Translation request failed: {0}")]
    Request(String),

    #[error("Translation timed out after {timeout_ms}ms")]
    Timeout { timeout_ms: u64 },

    #[error("Malformed translation response: {0}")]
    MalformedResponse(String),
}

impl TranslationError {
    /// HTTP status reported by the endpoint, if any
    pub fn status(&self) -> Option<u16> {
        match self {
            TranslationError::Status { status } => Some(*status),
            _ => None,
        }
    }
}

/// Text translation capability
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait Translator: Send + Sync {
    /// Translate an English caption into the configured target language
    async fn translate(&self, text: &str) -> Result<String, TranslationError>;

    /// Provider name for logging
    fn name(&self) -> &'static str;
}
