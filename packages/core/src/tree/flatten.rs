//! Nested tree to flat rows
//!
//! Produces one [`FlatNode`] per input node in pre-order (a folder's row
//! comes before its descendants), so the first row is always the first
//! top-level node. Within every sibling list `next_node` links each node to
//! the following one; a folder's `first_child` names the head of its own
//! sibling list.

use crate::models::{FlatNode, NodeType, TreeNode};
use crate::tree::ids::force_uuid;

/// Flatten a nested tree into pointer-linked rows.
///
/// Meant to run after [`assign_ids`](crate::tree::assign_ids). A node that
/// still has no identifier gets a fresh one here so the output is always
/// internally consistent.
///
/// # Examples
///
/// ```
/// # use marksync_core::models::{NodeType, TreeNode};
/// # use marksync_core::tree::flatten_tree;
/// let rows = flatten_tree(vec![
///     TreeNode::bookmark("A", "https://a.example").with_id("a"),
///     TreeNode::folder("F", vec![TreeNode::bookmark("B", "https://b.example").with_id("b")])
///         .with_id("f"),
/// ]);
///
/// assert_eq!(rows[0].next_node.as_deref(), Some("f"));
/// assert_eq!(rows[1].node_type, NodeType::Folder);
/// assert_eq!(rows[1].first_child.as_deref(), Some("b"));
/// assert_eq!(rows[2].next_node, None);
/// ```
pub fn flatten_tree(nodes: Vec<TreeNode>) -> Vec<FlatNode> {
    let mut rows = Vec::new();
    flatten_siblings(nodes, &mut rows);
    rows
}

/// Append one sibling list (and everything below it) to `rows`.
///
/// Returns the id of the list's first node, which the caller records as
/// its folder's `first_child`.
fn flatten_siblings(nodes: Vec<TreeNode>, rows: &mut Vec<FlatNode>) -> Option<String> {
    let ids: Vec<String> = nodes
        .iter()
        .map(|node| match node.id.as_deref() {
            Some(id) => id.to_string(),
            None => force_uuid(None),
        })
        .collect();

    for (idx, node) in nodes.into_iter().enumerate() {
        let TreeNode {
            add_date,
            last_modified,
            ns_root,
            title,
            icon,
            url,
            tags,
            contents,
            ..
        } = node;

        let row_idx = rows.len();
        rows.push(FlatNode {
            id: ids[idx].clone(),
            add_date,
            last_modified,
            ns_root,
            title,
            node_type: if contents.is_some() {
                NodeType::Folder
            } else {
                NodeType::Bookmark
            },
            icon,
            url,
            tags,
            next_node: ids.get(idx + 1).cloned(),
            first_child: None,
        });

        if let Some(children) = contents {
            let first_child = flatten_siblings(children, rows);
            rows[row_idx].first_child = first_child;
        }
    }

    ids.into_iter().next()
}

#[cfg(test)]
#[path = "flatten_test.rs"]
mod flatten_test;
