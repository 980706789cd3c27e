//! Index document types.
//!
//! These types match the `index.json` written by the site scraper:
//! `{ "start_urls": [...], "nodes": { "<url>": { ... } } }`.

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};

/// URL → node, in document key order.
pub type NodeMap = IndexMap<String, Node>;

/// Top-level index payload. Unknown fields are ignored.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct IndexDocument {
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub start_urls: Vec<String>,
    #[serde(default)]
    pub nodes: NodeMap,
}

/// A scraped page.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Node {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub local_path: Option<String>,
    /// Written by the scraper for reference only; roots are derived from `children`.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub parent: Option<String>,
    #[serde(default, deserialize_with = "nullable_vec")]
    pub children: Vec<String>,
}

impl Node {
    /// Title shown in the tree, falling back to the URL.
    pub fn display_title<'a>(&'a self, url: &'a str) -> &'a str {
        match self.title.as_deref() {
            Some(title) if !title.is_empty() => title,
            _ => url,
        }
    }

    /// The content path, if one is recorded and names more than the root.
    pub fn content_path(&self) -> Option<&str> {
        self.local_path
            .as_deref()
            .filter(|p| !p.trim_start_matches('/').is_empty())
    }
}

// The scraper writes `"children": null` for some pages.
fn nullable_vec<'de, D>(deserializer: D) -> Result<Vec<String>, D::Error>
where
    D: serde::Deserializer<'de>,
{
    Ok(Option::<Vec<String>>::deserialize(deserializer)?.unwrap_or_default())
}
