//! Tree reconstruction and filtering over the flat node map.
//!
//! The index only records `children` URLs per node. Roots are the keys never
//! referenced as a child, and the visible tree is recomputed from scratch for
//! every filter value.

use crate::schema::{Node, NodeMap};
use serde::Serialize;
use std::collections::{HashMap, HashSet};
use tracing::{debug, warn};

/// Indentation stops growing past this many levels.
pub const MAX_INDENT: usize = 16;

/// Traversal stops below this depth.
pub const DEFAULT_MAX_DEPTH: usize = 64;

/// How a filter match propagates to ancestors.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum FilterMode {
    /// A node is shown if its own title or a direct child's title matches.
    /// A matching grandchild alone does not reveal the grandparent.
    #[default]
    Shallow,
    /// A node is shown if its own title or any descendant's title matches.
    Subtree,
}

impl FilterMode {
    pub fn from_str(s: &str) -> Option<Self> {
        match s {
            "shallow" => Some(Self::Shallow),
            "subtree" => Some(Self::Subtree),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RenderOptions {
    pub mode: FilterMode,
    pub max_depth: usize,
}

impl Default for RenderOptions {
    fn default() -> Self {
        Self {
            mode: FilterMode::Shallow,
            max_depth: DEFAULT_MAX_DEPTH,
        }
    }
}

/// One clickable row of the rendered tree.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TreeRow {
    pub url: String,
    pub title: String,
    /// Nesting level, roots are 0.
    pub depth: usize,
    /// Visual indentation, `depth` capped at [`MAX_INDENT`].
    pub indent: usize,
    /// Whether the node's own title matched a non-empty filter.
    pub matched: bool,
    pub has_children: bool,
}

/// Depth-first, pre-order rows for one filter value.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct VisibleTree {
    pub filter: String,
    pub rows: Vec<TreeRow>,
}

impl VisibleTree {
    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }
}

/// Keys of `nodes` that never appear in another node's `children`, in map order.
pub fn build_roots(nodes: &NodeMap) -> Vec<String> {
    let has_parent: HashSet<&str> = nodes
        .values()
        .flat_map(|node| node.children.iter().map(String::as_str))
        .collect();

    nodes
        .keys()
        .filter(|url| !has_parent.contains(url.as_str()))
        .cloned()
        .collect()
}

/// Render the visible tree for `filter`.
///
/// Children are visited in `children` order and dangling references are
/// skipped. A node hidden by the filter is still descended into, so a match
/// further down is emitted at its own depth. Each path carries the set of
/// ancestors already on it, so a cycle is cut at the first repeated node.
pub fn compute_visible(
    nodes: &NodeMap,
    roots: &[String],
    filter: &str,
    options: &RenderOptions,
) -> VisibleTree {
    let mut walker = Walker {
        nodes,
        needle: filter.to_lowercase(),
        options: *options,
        path: HashSet::new(),
        subtree_memo: HashMap::new(),
        rows: Vec::new(),
    };

    for root in roots {
        walker.visit(root, 0);
    }

    debug!(
        "Rendered {} rows for filter {:?} ({:?})",
        walker.rows.len(),
        filter,
        options.mode
    );

    VisibleTree {
        filter: filter.to_string(),
        rows: walker.rows,
    }
}

struct Walker<'a> {
    nodes: &'a NodeMap,
    needle: String,
    options: RenderOptions,
    path: HashSet<&'a str>,
    subtree_memo: HashMap<(&'a str, usize), bool>,
    rows: Vec<TreeRow>,
}

impl<'a> Walker<'a> {
    fn visit(&mut self, url: &'a str, depth: usize) {
        let nodes = self.nodes;
        let Some(node) = nodes.get(url) else {
            return;
        };

        if depth >= self.options.max_depth {
            warn!("Depth limit {} reached at {}", self.options.max_depth, url);
            return;
        }

        if !self.path.insert(url) {
            debug!("Cycle at {}, not descending", url);
            return;
        }

        let matched = !self.needle.is_empty() && self.title_matches(url, node);
        if self.is_visible(url, node, matched, depth) {
            self.rows.push(TreeRow {
                url: url.to_string(),
                title: node.display_title(url).to_string(),
                depth,
                indent: depth.min(MAX_INDENT),
                matched,
                has_children: node.children.iter().any(|c| nodes.contains_key(c)),
            });
        }

        for child in &node.children {
            self.visit(child, depth + 1);
        }

        self.path.remove(url);
    }

    fn is_visible(&mut self, url: &'a str, node: &'a Node, matched: bool, depth: usize) -> bool {
        if self.needle.is_empty() || matched {
            return true;
        }

        match self.options.mode {
            FilterMode::Shallow => node.children.iter().any(|child| {
                self.nodes
                    .get(child)
                    .is_some_and(|c| self.title_matches(child, c))
            }),
            FilterMode::Subtree => {
                let mut stack = HashSet::from([url]);
                node.children
                    .iter()
                    .any(|child| self.subtree_matches(child, &mut stack, depth + 1).0)
            }
        }
    }

    fn title_matches(&self, url: &str, node: &Node) -> bool {
        node.display_title(url).to_lowercase().contains(&self.needle)
    }

    /// Returns `(found, cut)`; `cut` is set when a cycle or the depth limit
    /// pruned the search. `depth` is absolute, so the cutoff matches `visit`.
    /// Results are memoised per `(url, depth)` and only when they do not
    /// depend on a cut.
    fn subtree_matches(
        &mut self,
        url: &'a str,
        stack: &mut HashSet<&'a str>,
        depth: usize,
    ) -> (bool, bool) {
        let nodes = self.nodes;
        let Some(node) = nodes.get(url) else {
            return (false, false);
        };
        if let Some(&found) = self.subtree_memo.get(&(url, depth)) {
            return (found, false);
        }
        if depth >= self.options.max_depth || !stack.insert(url) {
            return (false, true);
        }

        let mut found = self.title_matches(url, node);
        let mut cut = false;
        for child in &node.children {
            if found {
                break;
            }
            let (child_found, child_cut) = self.subtree_matches(child, stack, depth + 1);
            found = child_found;
            cut |= child_cut;
        }

        stack.remove(url);
        if found || !cut {
            self.subtree_memo.insert((url, depth), found);
        }
        (found, cut)
    }
}
