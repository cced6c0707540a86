//! `Batch` and `CurrentTag` records (§3).

use std::collections::HashMap;

use serde::{Deserialize, Serialize};

use crate::{ids::BatchId, version::Versioned};

pub const BATCH_VERSION: u32 = 1;
pub const CURRENT_TAG_VERSION: u32 = 1;

/// A named grouping of messages/events (GLOSSARY).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Batch {
    #[serde(rename = "$VERSION")]
    pub version: u32,
    pub batch_id: BatchIdString,
    pub tags: Vec<String>,
    pub metadata: HashMap<String, String>,
}

/// `BatchId` as stored on the wire (a plain string); kept distinct from
/// [`BatchId`] so the model can `Deserialize` freely without route-tripping
/// through hex validation on every load.
pub type BatchIdString = String;

impl Batch {
    #[must_use]
    pub fn new(batch_id: BatchId, tags: Vec<String>, metadata: HashMap<String, String>) -> Self {
        Self {
            version: BATCH_VERSION,
            batch_id: batch_id.to_string(),
            tags,
            metadata,
        }
    }
}

impl Versioned for Batch {
    fn current_version() -> u32 {
        BATCH_VERSION
    }
}

/// Per-tag record holding a pointer to the currently-open batch for that
/// tag, if any (GLOSSARY).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CurrentTag {
    #[serde(rename = "$VERSION")]
    pub version: u32,
    /// The flattened `"scope:name"` key (§6).
    pub key: String,
    /// Foreign key to the currently open [`Batch`], modeled as a plain id
    /// string rather than a pointer (§9).
    pub current_batch: Option<BatchIdString>,
}

impl CurrentTag {
    #[must_use]
    pub fn new(key: String) -> Self {
        Self {
            version: CURRENT_TAG_VERSION,
            key,
            current_batch: None,
        }
    }
}

impl Versioned for CurrentTag {
    fn current_version() -> u32 {
        CURRENT_TAG_VERSION
    }
}
