//! Flat export document
//!
//! Shape of the single-flat-list export. Field order is significant: the
//! serialized text must match byte for byte what bookmark importers receive,
//! so every struct lists its fields in output order and absent values are
//! written as `null` rather than skipped.

use crate::models::{FlatNode, NodeType};
use serde::{Deserialize, Serialize};

/// `ns_root` of the export wrapper folder
pub const EXPORT_NS_ROOT: &str = "toolbar";

/// Title of the export wrapper folder
pub const EXPORT_TITLE: &str = "Bookmarks bar";

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ExportDocument {
    pub bookmarks: ExportFolder,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ExportFolder {
    pub ns_root: String,
    pub title: String,
    #[serde(rename = "type")]
    pub node_type: NodeType,
    pub children: Vec<ExportNode>,
}

/// A stored node as it appears in the export, pointers included
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ExportNode {
    pub id: String,
    pub add_date: Option<i64>,
    pub last_modified: Option<i64>,
    pub ns_root: Option<String>,
    pub title: Option<String>,
    #[serde(rename = "type")]
    pub node_type: NodeType,
    pub icon: Option<String>,
    pub url: Option<String>,
    pub next_node: Option<String>,
    pub first_child: Option<String>,
}

impl From<FlatNode> for ExportNode {
    fn from(node: FlatNode) -> Self {
        Self {
            id: node.id,
            add_date: node.add_date,
            last_modified: node.last_modified,
            ns_root: node.ns_root,
            title: node.title,
            node_type: node.node_type,
            icon: node.icon,
            url: node.url,
            next_node: node.next_node,
            first_child: node.first_child,
        }
    }
}

impl ExportDocument {
    /// Wrap nodes, already in chain order, in the bookmarks-bar folder
    pub fn toolbar(chain: Vec<FlatNode>) -> Self {
        Self {
            bookmarks: ExportFolder {
                ns_root: EXPORT_NS_ROOT.to_string(),
                title: EXPORT_TITLE.to_string(),
                node_type: NodeType::Folder,
                children: chain.into_iter().map(ExportNode::from).collect(),
            },
        }
    }
}
