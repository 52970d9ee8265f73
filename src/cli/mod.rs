// Copyright (c) 2025 Fabstir
// SPDX-License-Identifier: BUSL-1.1
use clap::Parser;
use std::path::PathBuf;

use crate::config::{DEFAULT_HOST, DEFAULT_PORT};

/// desAIgner furniture recommendation API
#[derive(Parser, Debug)]
#[command(name = "desaigner-api")]
#[command(version = crate::version::VERSION_NUMBER)]
#[command(about = "Detects furniture in room images and describes each piece", long_about = None)]
pub struct Args {
    /// Address to bind
    #[arg(long, env = "API_HOST", default_value = DEFAULT_HOST)]
    pub host: String,

    /// Port to listen on
    #[arg(long, env = "API_PORT", default_value_t = DEFAULT_PORT)]
    pub port: u16,

    /// JSON file with the detection vocabulary (array of class names)
    #[arg(long, env = "VOCABULARY_PATH")]
    pub vocabulary: Option<PathBuf>,
}
