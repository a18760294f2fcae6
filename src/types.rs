//! Core types for memory-sync

use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// Age hint attached to every code-derived item (0 = freshest)
pub const CODE_ITEM_AGE: u32 = 0;

/// Metadata key holding the absolute path of the summarized file
pub const META_FILE_PATH: &str = "filePath";

/// Metadata key holding the exported symbol names
pub const META_EXPORTS: &str = "exports";

/// Category of a memory item as understood by the memory service
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum MemoryItemType {
    /// Summary produced by code extraction
    #[default]
    Code,
}

impl MemoryItemType {
    pub fn as_str(&self) -> &'static str {
        match self {
            MemoryItemType::Code => "code",
        }
    }
}

impl std::fmt::Display for MemoryItemType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A single unit of upload to the memory service
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MemoryItem {
    /// Bounded summary text
    pub text: String,
    /// Item category tag
    #[serde(rename = "type")]
    pub item_type: MemoryItemType,
    /// Retention/priority hint
    pub age: u32,
    /// Batch classification supplied at startup
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub category: Option<String>,
    /// Ordered tags supplied at startup
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub tags: Vec<String>,
    /// Open metadata map (file path, exported names)
    #[serde(default, skip_serializing_if = "HashMap::is_empty")]
    pub metadata: HashMap<String, serde_json::Value>,
}

impl MemoryItem {
    /// Create a code item with no category, tags or metadata
    pub fn code(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            item_type: MemoryItemType::Code,
            age: CODE_ITEM_AGE,
            category: None,
            tags: Vec::new(),
            metadata: HashMap::new(),
        }
    }

    pub fn with_defaults(mut self, defaults: &ItemDefaults) -> Self {
        self.category = defaults.category.clone();
        self.tags = defaults.tags.clone();
        self
    }

    pub fn with_metadata(mut self, key: &str, value: serde_json::Value) -> Self {
        self.metadata.insert(key.to_string(), value);
        self
    }

    /// File path recorded in metadata, if any
    pub fn file_path(&self) -> Option<&str> {
        self.metadata.get(META_FILE_PATH).and_then(|v| v.as_str())
    }
}

/// Category and tags shared by every item of a run
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ItemDefaults {
    pub category: Option<String>,
    pub tags: Vec<String>,
}

/// Body of `POST /memory/batch/add`
#[derive(Debug, Serialize)]
pub struct BatchAddRequest<'a> {
    pub items: &'a [MemoryItem],
}
