//! HTML fragments for the tree pane.

use crate::tree::VisibleTree;
use std::fmt::Write;

/// Pixels of padding per indent level.
const INDENT_PX: usize = 16;

/// One `<div>` row per visible node. The front end handles clicks through
/// the `data-url` attribute.
pub fn render_tree(tree: &VisibleTree) -> String {
    if tree.is_empty() {
        return r#"<div class="tree-empty">No matching documents</div>"#.to_string();
    }

    let mut out = String::from(r#"<div class="tree">"#);
    for row in &tree.rows {
        let class = if row.matched { "tree-row match" } else { "tree-row" };
        let _ = write!(
            out,
            r#"<div class="{}" data-url="{}" data-depth="{}" style="padding-left: {}px">{}</div>"#,
            class,
            escape(&row.url),
            row.depth,
            row.indent * INDENT_PX,
            escape(&row.title),
        );
    }
    out.push_str("</div>");
    out
}

/// Inline error block shown in place of the tree.
pub fn render_error(message: &str) -> String {
    format!(
        r#"<div class="alert alert-danger" role="alert">{}</div>"#,
        escape(message)
    )
}

fn escape(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    for c in text.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&#39;"),
            _ => out.push(c),
        }
    }
    out
}
