//! Flat rows back to ordered or nested form
//!
//! Two reconstruction modes share the same chain semantics:
//!
//! - [`build_flat_list`]: one list without folder nesting (flat export).
//!   The head is found by elimination: the only node never named as any
//!   row's `next_node`.
//! - [`build_tree`]: full hierarchy below a synthetic root folder whose
//!   first child is the list's stored `head`.
//!
//! Rows live in an arena (`Vec<Option<FlatNode>>`) addressed through an
//! id-to-index map. Taking a row out of its slot marks it visited, which is
//! what turns a cycle into an error instead of an endless walk.

use crate::models::{FlatNode, NodeType, TreeNode};
use crate::tree::StructureError;
use std::collections::{HashMap, HashSet};

/// Identifier of the synthetic root folder returned by [`build_tree`].
///
/// Stored ids are UUID-v4, so this can never clash with a real node.
pub const ROOT_NODE_ID: &str = "root";

struct Arena {
    ids: Vec<String>,
    index: HashMap<String, usize>,
    slots: Vec<Option<FlatNode>>,
}

impl Arena {
    fn new(rows: Vec<FlatNode>) -> Self {
        let ids: Vec<String> = rows.iter().map(|r| r.id.clone()).collect();
        let index = ids
            .iter()
            .enumerate()
            .map(|(idx, id)| (id.clone(), idx))
            .collect();
        Self {
            ids,
            index,
            slots: rows.into_iter().map(Some).collect(),
        }
    }

    /// Take the row `to`, reached from the node `from`
    fn take(&mut self, from: &str, to: &str) -> Result<FlatNode, StructureError> {
        let idx = *self
            .index
            .get(to)
            .ok_or_else(|| StructureError::dangling(from, to))?;
        self.slots[idx]
            .take()
            .ok_or_else(|| StructureError::cycle(&self.ids[idx]))
    }

    fn remaining(&self) -> impl Iterator<Item = &FlatNode> {
        self.slots.iter().flatten()
    }
}

/// Order the rows of a single flat list by following `next_node` from the head.
///
/// # Errors
///
/// - [`StructureError::NoHead`] for empty input, or when every node is
///   referenced (a cycle through all rows)
/// - [`StructureError::MultipleHeads`] for disjoint chains
/// - [`StructureError::Cycle`] when the walk revisits a node or rows are
///   left over that only reference each other
/// - [`StructureError::DanglingPointer`] when `next_node` names a missing row
pub fn build_flat_list(rows: Vec<FlatNode>) -> Result<Vec<FlatNode>, StructureError> {
    let heads: Vec<String> = {
        let referenced: HashSet<&str> = rows.iter().filter_map(|r| r.next_node.as_deref()).collect();
        rows.iter()
            .filter(|r| !referenced.contains(r.id.as_str()))
            .map(|r| r.id.clone())
            .collect()
    };

    let head = match heads.as_slice() {
        [] => return Err(StructureError::NoHead),
        [head] => head.clone(),
        _ => return Err(StructureError::multiple_heads(heads.len())),
    };

    let total = rows.len();
    let mut arena = Arena::new(rows);
    let mut ordered = Vec::with_capacity(total);

    let mut cursor = Some(head);
    let mut previous = String::new();
    while let Some(id) = cursor {
        let node = arena.take(&previous, &id)?;
        cursor = node.next_node.clone();
        previous = id;
        ordered.push(node);
    }

    if let Some(stray) = arena.remaining().next() {
        return Err(StructureError::cycle(stray.id.clone()));
    }

    Ok(ordered)
}

/// Rebuild the nested tree of a list below a synthetic root folder.
///
/// The root has id [`ROOT_NODE_ID`], an empty title and the list's
/// top-level nodes as `contents`. Every node that is a folder (or carries a
/// `first_child`) gets its own `contents`, possibly empty. `next_node` and
/// `first_child` are dropped from the output.
///
/// Rows unreachable from `head` are skipped: they are left over from an
/// earlier, larger version of the list.
///
/// # Errors
///
/// [`StructureError::Cycle`] if any node is reached twice, and
/// [`StructureError::DanglingPointer`] if a pointer names a missing row.
pub fn build_tree(rows: Vec<FlatNode>, head: Option<&str>) -> Result<TreeNode, StructureError> {
    let mut arena = Arena::new(rows);
    let contents = collect_chain(&mut arena, ROOT_NODE_ID, head)?;

    let skipped = arena.remaining().count();
    if skipped > 0 {
        tracing::debug!(
            "Skipped {} row(s) not reachable from list head {:?}",
            skipped,
            head
        );
    }

    Ok(TreeNode {
        id: Some(ROOT_NODE_ID.to_string()),
        title: Some(String::new()),
        node_type: Some(NodeType::Folder),
        contents: Some(contents),
        ..Default::default()
    })
}

/// Walk one sibling chain starting at `first`, recursing into folders
fn collect_chain(
    arena: &mut Arena,
    parent_id: &str,
    first: Option<&str>,
) -> Result<Vec<TreeNode>, StructureError> {
    let mut children = Vec::new();
    let mut previous = parent_id.to_string();
    let mut cursor = first.map(str::to_string);

    while let Some(id) = cursor {
        let row = arena.take(&previous, &id)?;
        cursor = row.next_node.clone();

        let nested = if row.node_type == NodeType::Folder || row.first_child.is_some() {
            Some(collect_chain(arena, &row.id, row.first_child.as_deref())?)
        } else {
            None
        };

        previous = id;
        children.push(row.into_tree_node(nested));
    }

    Ok(children)
}

#[cfg(test)]
#[path = "build_test.rs"]
mod build_test;
