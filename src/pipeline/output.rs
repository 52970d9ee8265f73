// Copyright (c) 2025 Fabstir
// SPDX-License-Identifier: BUSL-1.1
//! Response records and their ordering

use serde::Serialize;

use crate::marketplace::LinkSet;
use crate::vision::BoundingBox;

/// One detected piece of furniture in the response
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct OutputRecord {
    #[serde(rename = "box")]
    pub bbox: BoundingBox,
    /// Caption (translated when translation is enabled)
    pub prompt: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub links: Option<LinkSet>,
}

/// Stable ascending sort by [`BoundingBox::signed_area`]
pub fn sort_by_signed_area(records: &mut [OutputRecord]) {
    records.sort_by(|a, b| a.bbox.signed_area().total_cmp(&b.bbox.signed_area()));
}
