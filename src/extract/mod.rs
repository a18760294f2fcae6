//! Source file summarization
//!
//! Turns a TypeScript/JavaScript file into a bounded plain-text summary for
//! semantic search ingestion:
//! - header naming the file
//! - exported symbol names
//! - the first lines of the file
//! - function/method signatures
//! - the first doc comment and a few `//` comments
//!
//! Extraction is best effort. Unreadable or unparsable files degrade to
//! "no summary" instead of failing the pipeline.

pub mod outline;

use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

use crate::types::{ItemDefaults, MemoryItem, META_EXPORTS, META_FILE_PATH};
pub use outline::{parse_outline, Dialect, Outline, ParseOutcome};

/// Extensions the extractor accepts
pub const SUPPORTED_EXTENSIONS: &[&str] = &["ts", "tsx", "js", "jsx"];

/// Default cap on the summary length, in characters
pub const DEFAULT_MAX_TEXT_CHARS: usize = 2000;

/// Caps applied while building a summary
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ExtractLimits {
    /// Hard cap on the final text, in characters
    pub max_text_chars: usize,
    /// Exported names listed
    pub max_exports: usize,
    /// Raw lines copied from the top of the file
    pub head_lines: usize,
    /// Signature lines listed
    pub max_signatures: usize,
    /// `//` comments listed
    pub max_comments: usize,
    /// Files larger than this are skipped without being read
    pub max_file_bytes: u64,
    /// Parse budget per file in milliseconds (0 = unlimited)
    pub parse_timeout_ms: u64,
}

impl Default for ExtractLimits {
    fn default() -> Self {
        Self {
            max_text_chars: DEFAULT_MAX_TEXT_CHARS,
            max_exports: 15,
            head_lines: 20,
            max_signatures: 10,
            max_comments: 5,
            max_file_bytes: 1024 * 1024, // 1MB
            parse_timeout_ms: 1000,
        }
    }
}

/// Check if a path has a supported source extension
pub fn is_supported(path: &Path) -> bool {
    path.extension()
        .and_then(|ext| ext.to_str())
        .is_some_and(|ext| SUPPORTED_EXTENSIONS.contains(&ext))
}

/// Summary of a single file
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Summary {
    /// Bounded summary text
    pub text: String,
    /// Exported names included in the text
    pub exports: Vec<String>,
}

impl Summary {
    /// Build the upload item for `path`
    pub fn into_item(self, path: &Path, defaults: &ItemDefaults) -> MemoryItem {
        MemoryItem::code(self.text)
            .with_defaults(defaults)
            .with_metadata(
                META_FILE_PATH,
                serde_json::Value::String(path.display().to_string()),
            )
            .with_metadata(META_EXPORTS, serde_json::json!(self.exports))
    }
}

/// Builds summaries for files under a root directory
#[derive(Debug, Clone)]
pub struct Extractor {
    root: PathBuf,
    limits: ExtractLimits,
}

impl Extractor {
    pub fn new(root: impl Into<PathBuf>, limits: ExtractLimits) -> Self {
        Self {
            root: root.into(),
            limits,
        }
    }

    /// Read `path` from disk and summarize it.
    ///
    /// Returns `None` for unsupported, oversized or unreadable files.
    pub fn extract_file(&self, path: &Path) -> Option<Summary> {
        if !is_supported(path) {
            return None;
        }

        let size = match fs::metadata(path) {
            Ok(metadata) => metadata.len(),
            Err(e) => {
                tracing::debug!("Skipping {}: {}", path.display(), e);
                return None;
            }
        };
        if size > self.limits.max_file_bytes {
            tracing::debug!(
                "Skipping {} (size {} > max {})",
                path.display(),
                size,
                self.limits.max_file_bytes
            );
            return None;
        }

        match fs::read_to_string(path) {
            Ok(content) => self.summarize(path, &content),
            Err(e) => {
                tracing::debug!("Skipping {}: {}", path.display(), e);
                None
            }
        }
    }

    /// Summarize already-loaded `content` for `path`
    pub fn summarize(&self, path: &Path, content: &str) -> Option<Summary> {
        let dialect = path
            .extension()
            .and_then(|ext| ext.to_str())
            .and_then(Dialect::from_extension)?;

        let limits = &self.limits;
        let timeout = Duration::from_millis(limits.parse_timeout_ms);
        let outline = match parse_outline(content, dialect, timeout) {
            ParseOutcome::Parsed(outline) => outline,
            ParseOutcome::Failed => {
                tracing::warn!(
                    "Parse of {} gave up after {}ms, summarizing without outline",
                    path.display(),
                    limits.parse_timeout_ms
                );
                Outline::default()
            }
        };

        let exports: Vec<String> = outline
            .exports
            .into_iter()
            .take(limits.max_exports)
            .collect();
        let signatures: Vec<String> = outline
            .signatures
            .into_iter()
            .take(limits.max_signatures)
            .collect();
        let comments: Vec<String> = outline
            .line_comments
            .into_iter()
            .take(limits.max_comments)
            .collect();
        let head = head_lines(content, limits.head_lines);

        let mut sections: Vec<String> = Vec::with_capacity(6);
        if !exports.is_empty() {
            sections.push(format!("Exports: {}", exports.join(", ")));
        }
        if let Some(head) = head {
            sections.push(head);
        }
        if !signatures.is_empty() {
            sections.push(format!("Signatures:\n{}", signatures.join("\n")));
        }
        if let Some(doc) = outline.doc_comment {
            sections.push(doc);
        }
        if !comments.is_empty() {
            sections.push(format!("Comments:\n{}", comments.join("\n")));
        }

        if sections.is_empty() {
            return None;
        }

        sections.insert(0, format!("File: {}", self.relative_display(path)));
        let text = truncate_chars(&sections.join("\n\n"), limits.max_text_chars);

        Some(Summary { text, exports })
    }

    fn relative_display(&self, path: &Path) -> String {
        path.strip_prefix(&self.root)
            .unwrap_or(path)
            .display()
            .to_string()
    }
}

/// First `count` lines, or `None` if they are all blank
fn head_lines(content: &str, count: usize) -> Option<String> {
    let head = content.lines().take(count).collect::<Vec<_>>().join("\n");
    if head.trim().is_empty() {
        None
    } else {
        Some(head.trim_end().to_string())
    }
}

/// Cut `text` to at most `max` characters
pub fn truncate_chars(text: &str, max: usize) -> String {
    match text.char_indices().nth(max) {
        Some((idx, _)) => text[..idx].to_string(),
        None => text.to_string(),
    }
}
