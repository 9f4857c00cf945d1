//! Tree Codec
//!
//! Conversion between the nested form clients exchange and the flat,
//! pointer-linked form the database stores:
//!
//! - [`ids`] - guarantees every node carries a UUID-v4 identifier
//! - [`flatten`] - nested tree to flat rows with `next_node`/`first_child`
//! - [`build`] - flat rows back to a chain (export) or a nested tree (read-back)
//!
//! Everything here is pure and synchronous; the database layer only ever
//! sees the output of this module.

pub mod build;
mod error;
pub mod flatten;
pub mod ids;

pub use build::{build_flat_list, build_tree, ROOT_NODE_ID};
pub use error::StructureError;
pub use flatten::flatten_tree;
pub use ids::{assign_ids, force_uuid, is_valid_node_id};
