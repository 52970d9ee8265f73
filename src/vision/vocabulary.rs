// Copyright (c) 2025 Fabstir
// SPDX-License-Identifier: BUSL-1.1
//! Detection vocabulary (class names the detector is prompted with)

use std::fs;
use std::path::Path;

use thiserror::Error;

/// Furniture classes used when no vocabulary file is configured
const BUILTIN_CLASSES: &[&str] = &[
    "armchair",
    "bed",
    "bench",
    "bookshelf",
    "cabinet",
    "chair",
    "coffee table",
    "desk",
    "dining table",
    "dresser",
    "lamp",
    "mirror",
    "nightstand",
    "ottoman",
    "plant",
    "rug",
    "shelf",
    "sofa",
    "stool",
    "table",
    "tv stand",
    "wardrobe",
];

#[derive(Debug, Error)]
pub enum VocabularyError {
    #[error("Failed to read vocabulary file {path}: {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("Vocabulary file must be a JSON array of strings: {0}")]
    Parse(#[from] serde_json::Error),

    #[error("Vocabulary is empty")]
    Empty,

    #[error("Vocabulary entry {0} is blank")]
    BlankEntry(usize),
}

/// Ordered list of class names; detection class ids index into it
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Vocabulary {
    classes: Vec<String>,
}

impl Vocabulary {
    pub fn new(classes: Vec<String>) -> Result<Self, VocabularyError> {
        if classes.is_empty() {
            return Err(VocabularyError::Empty);
        }
        if let Some(idx) = classes.iter().position(|c| c.trim().is_empty()) {
            return Err(VocabularyError::BlankEntry(idx));
        }
        Ok(Self { classes })
    }

    /// Load a vocabulary from a JSON array file (e.g. `furniture_list.json`)
    pub fn load(path: impl AsRef<Path>) -> Result<Self, VocabularyError> {
        let path = path.as_ref();
        let raw = fs::read_to_string(path).map_err(|source| VocabularyError::Io {
            path: path.display().to_string(),
            source,
        })?;
        Self::from_json(&raw)
    }

    pub fn from_json(raw: &str) -> Result<Self, VocabularyError> {
        let classes: Vec<String> = serde_json::from_str(raw)?;
        Self::new(classes)
    }

    pub fn builtin() -> Self {
        Self {
            classes: BUILTIN_CLASSES.iter().map(|c| c.to_string()).collect(),
        }
    }

    pub fn get(&self, class_id: usize) -> Option<&str> {
        self.classes.get(class_id).map(String::as_str)
    }

    pub fn classes(&self) -> &[String] {
        &self.classes
    }

    pub fn len(&self) -> usize {
        self.classes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.classes.is_empty()
    }
}
