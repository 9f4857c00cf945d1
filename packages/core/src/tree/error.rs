//! Structural corruption errors
//!
//! Raised when stored pointer chains do not form proper singly linked
//! lists. Callers never receive a partial reconstruction alongside one.

use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum StructureError {
    /// No node is free of incoming `next_node` pointers (empty input or a cycle)
    #[error("Bookmark structure corrupted: no chain head found")]
    NoHead,

    /// More than one node is free of incoming `next_node` pointers
    #[error("Bookmark structure corrupted: {count} chain heads found")]
    MultipleHeads { count: usize },

    /// A node was reached twice while walking chains
    #[error("Bookmark structure corrupted: cycle through node {node_id}")]
    Cycle { node_id: String },

    /// A pointer names a node that is not part of the list
    #[error("Bookmark structure corrupted: {from} points to missing node {to}")]
    DanglingPointer { from: String, to: String },
}

impl StructureError {
    pub fn multiple_heads(count: usize) -> Self {
        Self::MultipleHeads { count }
    }

    pub fn cycle(node_id: impl Into<String>) -> Self {
        Self::Cycle {
            node_id: node_id.into(),
        }
    }

    pub fn dangling(from: impl Into<String>, to: impl Into<String>) -> Self {
        Self::DanglingPointer {
            from: from.into(),
            to: to.into(),
        }
    }
}
