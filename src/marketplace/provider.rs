// Copyright (c) 2025 Fabstir
// SPDX-License-Identifier: BUSL-1.1
//! Recommendation provider trait definition

use async_trait::async_trait;

use super::types::{LinkSet, MarketplaceError};

/// Trait for marketplace search backends
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait RecommendationProvider: Send + Sync {
    /// Look up products matching `caption`
    ///
    /// # Returns
    /// Exactly three links in the marketplace's ranking, placeholder-padded
    async fn lookup(&self, caption: &str) -> Result<LinkSet, MarketplaceError>;

    /// Provider name for logging
    fn name(&self) -> &'static str;
}
