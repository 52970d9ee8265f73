// Copyright (c) 2025 Fabstir
// SPDX-License-Identifier: BUSL-1.1
//! Mercado Libre product search provider
//!
//! Uses `GET /products/search` with bearer-token auth and turns each result
//! id into a public product page link.

use std::time::Duration;

use anyhow::Result;
use async_trait::async_trait;
use reqwest::Client;
use tracing::debug;

use super::provider::RecommendationProvider;
use super::types::{LinkSet, MarketplaceError, LINKS_PER_CAPTION};

pub const DEFAULT_MERCADO_LIBRE_URL: &str = "https://api.mercadolibre.com";
pub const DEFAULT_SITE_ID: &str = "MLA";

const PRODUCT_URL_PREFIX: &str = "https://mercadolibre.com.ar/p/";

/// Mercado Libre products API provider
pub struct MercadoLibreProvider {
    api_key: String,
    base_url: String,
    site_id: String,
    client: Client,
    timeout: Duration,
}

impl MercadoLibreProvider {
    /// Create a new provider
    ///
    /// # Arguments
    /// * `api_key` - Bearer token for the products API
    /// * `base_url` - API root, normally [`DEFAULT_MERCADO_LIBRE_URL`]
    /// * `site_id` - Marketplace site (e.g. `MLA` for Argentina)
    pub fn new(api_key: String, base_url: &str, site_id: &str, timeout: Duration) -> Result<Self> {
        let client = Client::builder().timeout(timeout).build()?;

        Ok(Self {
            api_key,
            base_url: base_url.trim_end_matches('/').to_string(),
            site_id: site_id.to_string(),
            client,
            timeout,
        })
    }
}

/// Build public product links from search results, in API order
fn product_links(data: ProductSearchResponse) -> Vec<String> {
    data.results
        .into_iter()
        .take(LINKS_PER_CAPTION)
        .map(|item| format!("{}{}", PRODUCT_URL_PREFIX, item.id))
        .collect()
}

#[async_trait]
impl RecommendationProvider for MercadoLibreProvider {
    async fn lookup(&self, caption: &str) -> Result<LinkSet, MarketplaceError> {
        let limit = LINKS_PER_CAPTION.to_string();
        let response = self
            .client
            .get(format!("{}/products/search", self.base_url))
            .bearer_auth(&self.api_key)
            .query(&[
                ("status", "active"),
                ("site_id", self.site_id.as_str()),
                ("q", caption),
                ("limit", limit.as_str()),
            ])
            .send()
            .await
            .map_err(|e| {
                if e.is_timeout() {
                    MarketplaceError::Timeout {
                        timeout_ms: self.timeout.as_millis() as u64,
                    }
                } else {
                    MarketplaceError::Request(e.to_string())
                }
            })?;

        let status = response.status();
        if !status.is_success() {
            return Err(MarketplaceError::ApiError {
                status: status.as_u16(),
            });
        }

        let data: ProductSearchResponse = response
            .json()
            .await
            .map_err(|e| MarketplaceError::MalformedResponse(e.to_string()))?;

        let links = product_links(data);
        debug!("Marketplace returned {} links for {:?}", links.len(), caption);
        Ok(LinkSet::from_links(links))
    }

    fn name(&self) -> &'static str {
        "mercadolibre"
    }
}

#[derive(Debug, serde::Deserialize)]
struct ProductSearchResponse {
    results: Vec<ProductResult>,
}

#[derive(Debug, serde::Deserialize)]
struct ProductResult {
    id: String,
}
