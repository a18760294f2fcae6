//! Watcher configuration
//!
//! Settings come from CLI flags, optionally layered over a TOML file that
//! carries the extraction caps and ignore list. Flags always win.

use serde::Deserialize;
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

use crate::error::{Result, SyncError};
use crate::extract::ExtractLimits;
use crate::types::ItemDefaults;
use crate::watch::default_ignore_dirs;

/// Optional TOML config file
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct FileConfig {
    /// Directory names to skip (replaces the default list)
    pub ignore_dirs: Option<Vec<String>>,
    /// API key used when none is given on the command line
    pub api_key: Option<String>,
    /// Extraction caps
    pub limits: ExtractLimits,
}

impl FileConfig {
    /// Load a config file; `~` is expanded
    pub fn load(path: &str) -> Result<Self> {
        let path = shellexpand::tilde(path).to_string();
        let content = fs::read_to_string(&path)
            .map_err(|e| SyncError::Config(format!("Cannot read config {}: {}", path, e)))?;
        Self::parse(&content)
    }

    pub fn parse(content: &str) -> Result<Self> {
        Ok(toml::from_str(content)?)
    }
}

/// Fully resolved settings for one watcher run
#[derive(Debug, Clone)]
pub struct WatcherConfig {
    pub root: PathBuf,
    pub api_url: String,
    pub api_key: Option<String>,
    pub defaults: ItemDefaults,
    pub debounce: Duration,
    pub ignore_dirs: Vec<String>,
    pub limits: ExtractLimits,
}

impl WatcherConfig {
    /// Resolve settings from raw CLI values and an optional config file.
    ///
    /// The root must be an existing directory; it is canonicalized.
    pub fn resolve(
        root: &str,
        api_url: String,
        api_key: Option<String>,
        tags: &str,
        category: &str,
        debounce_ms: u64,
        file: FileConfig,
    ) -> Result<Self> {
        let root = resolve_root(root)?;
        let category = category.trim();

        Ok(Self {
            root,
            api_url,
            api_key: api_key.or(file.api_key),
            defaults: ItemDefaults {
                category: (!category.is_empty()).then(|| category.to_string()),
                tags: parse_tags(tags),
            },
            debounce: Duration::from_millis(debounce_ms),
            ignore_dirs: file.ignore_dirs.unwrap_or_else(default_ignore_dirs),
            limits: file.limits,
        })
    }
}

/// Split a comma-separated tag list, dropping blanks
pub fn parse_tags(tags: &str) -> Vec<String> {
    tags.split(',')
        .map(|t| t.trim())
        .filter(|t| !t.is_empty())
        .map(|t| t.to_string())
        .collect()
}

fn resolve_root(root: &str) -> Result<PathBuf> {
    let expanded = shellexpand::tilde(root).to_string();
    let path = Path::new(&expanded);
    if !path.is_dir() {
        return Err(SyncError::Config(format!(
            "Root {} is not a directory",
            path.display()
        )));
    }
    Ok(path.canonicalize()?)
}
