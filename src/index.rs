//! The loaded index: node map plus its computed roots.

use crate::preview::{self, Selection};
use crate::schema::NodeMap;
use crate::tree::{self, RenderOptions, VisibleTree};

/// Built once after a successful load and read-only afterwards.
#[derive(Debug, Clone, Default)]
pub struct ViewerIndex {
    nodes: NodeMap,
    roots: Vec<String>,
}

impl ViewerIndex {
    pub fn new(nodes: NodeMap) -> Self {
        let roots = tree::build_roots(&nodes);
        Self { nodes, roots }
    }

    pub fn nodes(&self) -> &NodeMap {
        &self.nodes
    }

    pub fn roots(&self) -> &[String] {
        &self.roots
    }

    pub fn render(&self, filter: &str, options: &RenderOptions) -> VisibleTree {
        tree::compute_visible(&self.nodes, &self.roots, filter, options)
    }

    /// `None` if `url` is not in the index.
    pub fn select(&self, url: &str, preview_base: &str) -> Option<Selection> {
        self.nodes
            .get(url)
            .map(|node| preview::select(preview_base, url, node))
    }
}
