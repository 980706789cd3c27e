//! Selection of a node for the preview pane.

use crate::schema::Node;
use serde::Serialize;

/// What the preview pane and breadcrumb show for a selected node.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Selection {
    pub url: String,
    /// `None` when the node has no content to preview.
    pub preview: Option<String>,
    pub breadcrumb: String,
}

/// Resolve a selected node against the content base path.
pub fn select(base: &str, url: &str, node: &Node) -> Selection {
    Selection {
        url: url.to_string(),
        preview: node.content_path().map(|path| join_base(base, path)),
        breadcrumb: breadcrumb(url, node),
    }
}

/// `title — url`, or just the url for untitled nodes.
pub fn breadcrumb(url: &str, node: &Node) -> String {
    match node.title.as_deref() {
        Some(title) if !title.is_empty() => format!("{} — {}", title, url),
        _ => url.to_string(),
    }
}

fn join_base(base: &str, path: &str) -> String {
    let base = base.trim_end_matches('/');
    let path = path.trim_start_matches('/');
    if base.is_empty() {
        path.to_string()
    } else {
        format!("{}/{}", base, path)
    }
}
