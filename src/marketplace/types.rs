// Copyright (c) 2025 Fabstir
// SPDX-License-Identifier: BUSL-1.1
//! Core types for marketplace lookups

use serde::{Serialize, Serializer};
use thiserror::Error;

/// Number of links returned per caption
pub const LINKS_PER_CAPTION: usize = 3;

/// Filler for captions with fewer than [`LINKS_PER_CAPTION`] results
pub const LINK_PLACEHOLDER: &str = "no link available";

/// Exactly three product links (or placeholders), in marketplace order
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LinkSet([String; LINKS_PER_CAPTION]);

impl LinkSet {
    /// Build from ranked links, truncating or padding to three entries
    pub fn from_links<I>(links: I) -> Self
    where
        I: IntoIterator<Item = String>,
    {
        let mut links = links.into_iter();
        Self(std::array::from_fn(|_| {
            links.next().unwrap_or_else(|| LINK_PLACEHOLDER.to_string())
        }))
    }

    pub fn as_slice(&self) -> &[String] {
        &self.0
    }

    /// Number of real (non-placeholder) links
    pub fn found(&self) -> usize {
        self.0.iter().filter(|l| *l != LINK_PLACEHOLDER).count()
    }
}

impl Serialize for LinkSet {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        self.0.serialize(serializer)
    }
}

/// Errors that can occur during a marketplace lookup
#[derive(Debug, Error)]
pub enum MarketplaceError {
    /// API answered with a non-success status
    #[error("Marketplace API error: {status}")]
    ApiError { status: u16 },

    #[error("Marketplace request failed: {0}")]
    Request(String),

    #[error("Marketplace timeout after {timeout_ms}ms")]
    Timeout { timeout_ms: u64 },

    #[error("Malformed marketplace response: {0}")]
    MalformedResponse(String),
}

impl MarketplaceError {
    pub fn status(&self) -> Option<u16> {
        match self {
            MarketplaceError::ApiError { status } => Some(*status),
            _ => None,
        }
    }
}
