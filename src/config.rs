//! Viewer configuration.
//!
//! Values come from the environment (after `.env` is loaded); every setting
//! has a default so the viewer runs against `db/index.json` out of the box.

use crate::tree::{FilterMode, RenderOptions, DEFAULT_MAX_DEPTH};
use anyhow::{Context, Result};
use std::path::PathBuf;

const DEFAULT_INDEX_SOURCE: &str = "db/index.json";
const DEFAULT_CONTENT_DIR: &str = "db";
const DEFAULT_PREVIEW_BASE: &str = "/content";
const DEFAULT_BIND_ADDR: &str = "0.0.0.0:3000";

#[derive(Debug, Clone, PartialEq)]
pub struct ViewerConfig {
    /// File path or `http(s)://` URL of `index.json`.
    pub index_source: String,
    /// Directory holding the saved pages, served under `/content`.
    pub content_dir: PathBuf,
    /// Prefix joined with `local_path` to build preview targets.
    pub preview_base: String,
    pub bind_addr: String,
    pub render: RenderOptions,
    pub missing_seeds_file: Option<PathBuf>,
}

impl Default for ViewerConfig {
    fn default() -> Self {
        Self {
            index_source: DEFAULT_INDEX_SOURCE.to_string(),
            content_dir: PathBuf::from(DEFAULT_CONTENT_DIR),
            preview_base: DEFAULT_PREVIEW_BASE.to_string(),
            bind_addr: DEFAULT_BIND_ADDR.to_string(),
            render: RenderOptions::default(),
            missing_seeds_file: None,
        }
    }
}

impl ViewerConfig {
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Build a config from an arbitrary key lookup.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self> {
        let defaults = Self::default();

        let mode = match lookup("FILTER_MODE") {
            Some(raw) => FilterMode::from_str(&raw).with_context(|| {
                format!("Invalid FILTER_MODE {:?}, expected shallow or subtree", raw)
            })?,
            None => defaults.render.mode,
        };

        let max_depth = match lookup("MAX_DEPTH") {
            Some(raw) => raw
                .parse::<usize>()
                .ok()
                .filter(|depth| *depth > 0)
                .with_context(|| format!("Invalid MAX_DEPTH {:?}", raw))?,
            None => DEFAULT_MAX_DEPTH,
        };

        Ok(Self {
            index_source: lookup("INDEX_SOURCE").unwrap_or(defaults.index_source),
            content_dir: lookup("CONTENT_DIR")
                .map(PathBuf::from)
                .unwrap_or(defaults.content_dir),
            preview_base: lookup("PREVIEW_BASE").unwrap_or(defaults.preview_base),
            bind_addr: lookup("BIND_ADDR").unwrap_or(defaults.bind_addr),
            render: RenderOptions { mode, max_depth },
            missing_seeds_file: lookup("MISSING_SEEDS_FILE").map(PathBuf::from),
        })
    }
}
