// Copyright (c) 2025 Fabstir
// SPDX-License-Identifier: BUSL-1.1
use anyhow::{anyhow, Context, Result};
use clap::Parser;
use desaigner_api::{
    api::{create_app, start_server, AppState},
    cli::Args,
    config::ServiceConfig,
    marketplace::MercadoLibreProvider,
    pipeline::Pipeline,
    translation::GoogleDictTranslator,
    vision::{HttpCaptioner, HttpDetector, Vocabulary},
};
use std::{env, net::SocketAddr, sync::Arc};
use tracing::{info, warn};

fn load_vocabulary(config: &ServiceConfig) -> Result<Vocabulary> {
    match &config.vocabulary_path {
        Some(path) => Vocabulary::load(path)
            .with_context(|| format!("Failed to load vocabulary from {}", path.display())),
        None => {
            warn!("VOCABULARY_PATH not set, using built-in furniture classes");
            Ok(Vocabulary::builtin())
        }
    }
}

fn build_pipeline(config: &ServiceConfig, vocabulary: Vocabulary) -> Result<Pipeline> {
    let timeout = config.external_timeout();

    let detector = HttpDetector::new(&config.detector_endpoint, timeout)?;
    let captioner =
        HttpCaptioner::new(&config.captioner_endpoint, config.caption_strategy, timeout)?;
    info!(
        "Detector at {}, captioner at {} ({})",
        config.detector_endpoint, config.captioner_endpoint, config.caption_strategy
    );

    let mut pipeline = Pipeline::new(
        Arc::new(detector),
        Arc::new(captioner),
        vocabulary,
        config.pipeline_settings(),
    );

    if config.translation.enabled {
        let translator = GoogleDictTranslator::new(
            &config.translation.url,
            &config.translation.source_language,
            &config.translation.target_language,
            timeout,
        )?;
        info!(
            "Translation enabled: {} -> {}",
            config.translation.source_language, config.translation.target_language
        );
        pipeline = pipeline.with_translator(Arc::new(translator));
    } else {
        info!("Translation disabled");
    }

    if config.marketplace.enabled {
        let api_key = config
            .marketplace
            .api_key
            .clone()
            .ok_or_else(|| anyhow!("MERCADO_LIBRE_KEY not set"))?;
        let provider = MercadoLibreProvider::new(
            api_key,
            &config.marketplace.url,
            &config.marketplace.site_id,
            timeout,
        )?;
        info!("Mercado Libre links enabled (site {})", config.marketplace.site_id);
        pipeline = pipeline.with_recommendations(Arc::new(provider));
    } else {
        info!("Mercado Libre links disabled");
    }

    Ok(pipeline)
}

#[tokio::main]
async fn main() -> Result<()> {
    dotenv::dotenv().ok();

    if env::var("RUST_LOG").is_err() {
        env::set_var("RUST_LOG", "info");
    }
    tracing_subscriber::fmt::init();

    let args = Args::parse();

    info!(
        "Starting desAIgner API {} (built {})",
        desaigner_api::version::VERSION,
        desaigner_api::version::BUILD_DATE
    );

    let mut config = ServiceConfig::from_env().map_err(|e| anyhow!(e))?;
    config.host = args.host;
    config.port = args.port;
    if args.vocabulary.is_some() {
        config.vocabulary_path = args.vocabulary;
    }
    config
        .validate()
        .map_err(|e| anyhow!("Invalid configuration: {}", e))?;

    let vocabulary = load_vocabulary(&config)?;
    info!("Vocabulary loaded: {} classes", vocabulary.len());

    let pipeline = build_pipeline(&config, vocabulary)?;
    info!(
        "Confidence threshold {}, box threshold {}, text threshold {}",
        config.confidence_threshold, config.box_threshold, config.text_threshold
    );

    let addr: SocketAddr = format!("{}:{}", config.host, config.port)
        .parse()
        .with_context(|| format!("Invalid listen address {}:{}", config.host, config.port))?;
    let app = create_app(AppState::new(pipeline), &config.cors_allowed_origins);

    start_server(addr, app).await
}
