// Copyright (c) 2025 Fabstir
// SPDX-License-Identifier: BUSL-1.1
//! Caption translation
//!
//! Captions are produced in English and rewritten into the deployment's
//! target language before the marketplace lookup. Any failure here is
//! terminal for the request.

pub mod google;
pub mod provider;

pub use google::GoogleDictTranslator;
pub use provider::{TranslationError, Translator};
