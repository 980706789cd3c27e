//! Checks that every indexed page has its saved HTML on disk.

use crate::schema::NodeMap;
use anyhow::{Context, Result};
use serde::Serialize;
use std::path::Path;
use tracing::info;

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct ValidationReport {
    pub total: usize,
    /// URLs without a `local_path` or whose file is absent, in map order.
    pub missing: Vec<String>,
}

/// Compare `local_path` of each node against files under `content_root`.
pub fn validate_content(nodes: &NodeMap, content_root: &Path) -> ValidationReport {
    let missing = nodes
        .iter()
        .filter(|(_, node)| match node.content_path() {
            Some(rel) => !content_root.join(rel.trim_start_matches('/')).is_file(),
            None => true,
        })
        .map(|(url, _)| url.clone())
        .collect();

    ValidationReport {
        total: nodes.len(),
        missing,
    }
}

/// Write missing URLs one per line, for re-seeding the scraper.
pub fn write_missing_seeds(report: &ValidationReport, path: &Path) -> Result<()> {
    let mut content = report.missing.join("\n");
    if !content.is_empty() {
        content.push('\n');
    }
    std::fs::write(path, content)
        .with_context(|| format!("Failed to write missing seeds: {:?}", path))?;
    info!("Wrote {} missing URLs to {:?}", report.missing.len(), path);
    Ok(())
}
