// Copyright (c) 2025 Fabstir
// SPDX-License-Identifier: BUSL-1.1
use axum::{
    extract::Query,
    http::{HeaderMap, StatusCode},
    routing::get,
    Json, Router,
};
use desaigner_api::marketplace::{
    MarketplaceError, MercadoLibreProvider, RecommendationProvider, LINK_PLACEHOLDER,
};
use serde_json::json;
use std::collections::HashMap;
use std::time::Duration;

use super::fake_server::spawn;

fn search_results(ids: &'static [&'static str]) -> Router {
    Router::new().route(
        "/products/search",
        get(move || async move {
            let results: Vec<_> = ids.iter().map(|id| json!({"id": id, "name": "x"})).collect();
            Json(json!({"results": results}))
        }),
    )
}

async fn provider_for(router: Router) -> MercadoLibreProvider {
    let base = spawn(router).await;
    MercadoLibreProvider::new("secret".to_string(), &base, "MLA", Duration::from_secs(5)).unwrap()
}

#[tokio::test]
async fn test_sends_bearer_token_and_query() {
    let router = Router::new().route(
        "/products/search",
        get(
            |headers: HeaderMap, Query(params): Query<HashMap<String, String>>| async move {
                assert_eq!(
                    headers.get("authorization").unwrap().to_str().unwrap(),
                    "Bearer secret"
                );
                assert_eq!(params.get("status").map(String::as_str), Some("active"));
                assert_eq!(params.get("site_id").map(String::as_str), Some("MLA"));
                assert_eq!(params.get("q").map(String::as_str), Some("Sofá rojo."));
                assert_eq!(params.get("limit").map(String::as_str), Some("3"));
                Json(json!({"results": [{"id": "MLA1"}, {"id": "MLA2"}, {"id": "MLA3"}]}))
            },
        ),
    );
    let provider = provider_for(router).await;

    let links = provider.lookup("Sofá rojo.").await.unwrap();
    assert_eq!(
        links.as_slice(),
        &[
            "https://mercadolibre.com.ar/p/MLA1",
            "https://mercadolibre.com.ar/p/MLA2",
            "https://mercadolibre.com.ar/p/MLA3",
        ]
    );
    assert_eq!(links.found(), 3);
}

#[tokio::test]
async fn test_single_result_is_padded() {
    let provider = provider_for(search_results(&["MLA9"])).await;

    let links = provider.lookup("Lamp.").await.unwrap();
    assert_eq!(
        links.as_slice(),
        &[
            "https://mercadolibre.com.ar/p/MLA9",
            LINK_PLACEHOLDER,
            LINK_PLACEHOLDER,
        ]
    );
    assert_eq!(links.found(), 1);
}

#[tokio::test]
async fn test_no_results_is_all_placeholders() {
    let provider = provider_for(search_results(&[])).await;

    let links = provider.lookup("Lamp.").await.unwrap();
    assert!(links.as_slice().iter().all(|l| l == LINK_PLACEHOLDER));
    assert_eq!(links.found(), 0);
}

#[tokio::test]
async fn test_extra_results_are_truncated() {
    let provider = provider_for(search_results(&["A", "B", "C", "D", "E"])).await;

    let links = provider.lookup("Chair.").await.unwrap();
    assert_eq!(links.as_slice().len(), 3);
    assert_eq!(links.as_slice()[2], "https://mercadolibre.com.ar/p/C");
}

#[tokio::test]
async fn test_unauthorized_is_error() {
    let router = Router::new().route(
        "/products/search",
        get(|| async { (StatusCode::UNAUTHORIZED, Json(json!({"message": "invalid token"}))) }),
    );
    let provider = provider_for(router).await;

    let err = provider.lookup("Chair.").await.unwrap_err();
    assert!(matches!(err, MarketplaceError::ApiError { status: 401 }));
}
