//! Data Models
//!
//! This module contains the data structures exchanged with clients and
//! persisted by the store:
//!
//! - `TreeNode` - Nested bookmark/folder node (client and import form)
//! - `FlatNode` - One node of a list with its sibling/child pointers
//! - `NodeRecord`, `ListRecord` - Plain rows of the `nodes` and `lists` tables
//! - `ExportDocument` - Flat bookmarks-bar export document

mod export;
mod node;

pub use export::{ExportDocument, ExportFolder, ExportNode};
pub use node::{
    FlatNode, ListDocument, ListRecord, NodeRecord, NodeType, TreeNode, ValidationError,
};
