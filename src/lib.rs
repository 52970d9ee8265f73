// Copyright (c) 2025 Fabstir
// SPDX-License-Identifier: BUSL-1.1
pub mod api;
pub mod cli;
pub mod config;
pub mod marketplace;
pub mod pipeline;
pub mod translation;
pub mod version;
pub mod vision;

pub use api::{create_app, start_server, ApiError, AppState};
pub use config::ServiceConfig;
pub use pipeline::{OutputRecord, Pipeline, PipelineError, PipelineSettings};
