// Copyright (c) 2025 Fabstir
// SPDX-License-Identifier: BUSL-1.1
//! Marketplace product recommendations
//!
//! Each caption is turned into exactly three product links:
//! - ranking is the marketplace's own, nothing is re-ranked locally
//! - extra results are truncated, missing ones padded with a placeholder
//! - a failed lookup aborts the whole request

pub mod mercadolibre;
pub mod provider;
pub mod types;

pub use mercadolibre::MercadoLibreProvider;
pub use provider::RecommendationProvider;
pub use types::{LinkSet, MarketplaceError, LINKS_PER_CAPTION, LINK_PLACEHOLDER};
