//! Node identifier assignment
//!
//! Every stored node is keyed by a UUID-v4 string. Identifiers that already
//! match the canonical pattern are kept as-is so that re-submitting a tree
//! updates the same rows; anything else is replaced by a fresh UUID-v4.

use crate::models::TreeNode;
use regex::Regex;
use std::sync::OnceLock;
use uuid::Uuid;

/// Canonical UUID-v4 text form (version nibble fixed to 4, case-insensitive)
pub const UUID_V4_PATTERN: &str =
    r"(?i)^[0-9a-f]{8}-[0-9a-f]{4}-4[0-9a-f]{3}-[0-9a-f]{4}-[0-9a-f]{12}$";

/// Check whether `id` is a canonical UUID-v4 string
///
/// # Examples
///
/// ```
/// # use marksync_core::tree::is_valid_node_id;
/// assert!(is_valid_node_id("9b2f6c1e-3d4a-4f5b-8c7d-1e2f3a4b5c6d"));
/// assert!(!is_valid_node_id("550e8400-e29b-11d4-a716-446655440000")); // v1
/// assert!(!is_valid_node_id("0"));
/// ```
pub fn is_valid_node_id(id: &str) -> bool {
    static UUID_REGEX: OnceLock<Regex> = OnceLock::new();
    let uuid_regex =
        UUID_REGEX.get_or_init(|| Regex::new(UUID_V4_PATTERN).expect("valid UUID-v4 pattern"));

    uuid_regex.is_match(id)
}

/// Keep a valid identifier, otherwise generate a new UUID-v4
pub fn force_uuid(id: Option<&str>) -> String {
    match id {
        Some(id) if is_valid_node_id(id) => id.to_string(),
        _ => Uuid::new_v4().to_string(),
    }
}

/// Give every node of the tree, at any depth, a valid identifier.
///
/// Returns how many identifiers were generated. Running it on a tree it
/// already processed changes nothing and returns 0.
pub fn assign_ids(nodes: &mut [TreeNode]) -> usize {
    let mut generated = 0;

    for node in nodes.iter_mut() {
        if let Some(children) = node.contents.as_mut() {
            generated += assign_ids(children);
        }

        if !node.id.as_deref().is_some_and(is_valid_node_id) {
            node.id = Some(force_uuid(None));
            generated += 1;
        }
    }

    generated
}

#[cfg(test)]
#[path = "ids_test.rs"]
mod ids_test;
