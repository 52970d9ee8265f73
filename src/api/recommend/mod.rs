// Copyright (c) 2025 Fabstir
// SPDX-License-Identifier: BUSL-1.1
//! Furniture recommendation endpoint
//!
//! Provides `POST /`, which accepts an image and returns one record per
//! detected piece of furniture.

pub mod handler;
pub mod request;

pub use handler::recommend_handler;
pub use request::{data_uri_from_body, ImageRequest, IMAGE_FIELD};
