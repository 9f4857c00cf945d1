//! Bookmark Node Data Structures
//!
//! A bookmark collection travels in two shapes:
//!
//! - **Nested** (`TreeNode`): folders own their children in `contents`
//!   (`children` is accepted as an alias on input). This is what clients and
//!   import files send and what read-back returns.
//! - **Flat** (`FlatNode`): one row per node, with `next_node` pointing at the
//!   next sibling and `first_child` pointing into a folder. This is what the
//!   `nodes` and `listnode` tables hold.
//!
//! # Examples
//!
//! ```rust
//! use marksync_core::models::TreeNode;
//!
//! let tree = vec![
//!     TreeNode::bookmark("Rust", "https://www.rust-lang.org"),
//!     TreeNode::folder("Docs", vec![TreeNode::bookmark("std", "https://doc.rust-lang.org/std")]),
//! ];
//! assert!(tree[1].is_folder());
//! ```

use serde::{Deserialize, Deserializer, Serialize};
use std::fmt;
use std::str::FromStr;
use thiserror::Error;

/// Validation errors for node data read from storage or clients
#[derive(Error, Debug)]
pub enum ValidationError {
    #[error("Invalid node type: {0}")]
    InvalidNodeType(String),
}

/// Kind of a node: a folder holds other nodes, a bookmark holds a URL
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum NodeType {
    Folder,
    Bookmark,
}

impl NodeType {
    /// Storage representation used in the `nodes.type` column
    pub fn as_str(&self) -> &'static str {
        match self {
            NodeType::Folder => "folder",
            NodeType::Bookmark => "bookmark",
        }
    }
}

impl fmt::Display for NodeType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for NodeType {
    type Err = ValidationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "folder" => Ok(NodeType::Folder),
            "bookmark" => Ok(NodeType::Bookmark),
            other => Err(ValidationError::InvalidNodeType(other.to_string())),
        }
    }
}

/// Nested bookmark tree node.
///
/// A node is a folder when it carries a children list (`contents`, or
/// `children` on input), even an empty one. Otherwise it is a bookmark.
/// `id` may be absent or malformed on input; the write pipeline replaces it
/// with a fresh UUID-v4 before anything is stored.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct TreeNode {
    #[serde(default, deserialize_with = "lenient_id")]
    pub id: Option<String>,

    #[serde(default)]
    pub add_date: Option<i64>,

    #[serde(default)]
    pub last_modified: Option<i64>,

    #[serde(default)]
    pub ns_root: Option<String>,

    #[serde(default)]
    pub title: Option<String>,

    /// Ignored on write: the type is derived from the presence of children
    #[serde(rename = "type", default)]
    pub node_type: Option<NodeType>,

    #[serde(default)]
    pub icon: Option<String>,

    #[serde(default)]
    pub url: Option<String>,

    #[serde(default, deserialize_with = "null_as_empty")]
    pub tags: Vec<String>,

    #[serde(default, alias = "children", skip_serializing_if = "Option::is_none")]
    pub contents: Option<Vec<TreeNode>>,
}

/// Accept any JSON scalar as an id. Strings are kept as they are, numbers
/// become their decimal text, anything else counts as absent. Non-UUID
/// values are replaced later by `assign_ids`.
fn lenient_id<'de, D>(deserializer: D) -> Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(match Option::<serde_json::Value>::deserialize(deserializer)? {
        Some(serde_json::Value::String(id)) => Some(id),
        Some(serde_json::Value::Number(n)) => Some(n.to_string()),
        _ => None,
    })
}

/// `null` reads as an empty list
fn null_as_empty<'de, D>(deserializer: D) -> Result<Vec<String>, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(Option::<Vec<String>>::deserialize(deserializer)?.unwrap_or_default())
}

impl TreeNode {
    /// Create a bookmark node without an id
    pub fn bookmark(title: impl Into<String>, url: impl Into<String>) -> Self {
        Self {
            title: Some(title.into()),
            node_type: Some(NodeType::Bookmark),
            url: Some(url.into()),
            ..Default::default()
        }
    }

    /// Create a folder node without an id
    pub fn folder(title: impl Into<String>, contents: Vec<TreeNode>) -> Self {
        Self {
            title: Some(title.into()),
            node_type: Some(NodeType::Folder),
            contents: Some(contents),
            ..Default::default()
        }
    }

    pub fn with_id(mut self, id: impl Into<String>) -> Self {
        self.id = Some(id.into());
        self
    }

    pub fn with_tags<I, S>(mut self, tags: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.tags = tags.into_iter().map(Into::into).collect();
        self
    }

    pub fn is_folder(&self) -> bool {
        self.contents.is_some()
    }

    /// Children of a folder, empty for bookmarks
    pub fn children(&self) -> &[TreeNode] {
        self.contents.as_deref().unwrap_or(&[])
    }
}

/// Import document: `{ "contents": [...] }`, `{ "children": [...] }` or a bare array
#[derive(Debug, Clone, Deserialize)]
#[serde(untagged)]
pub enum ListDocument {
    Bare(Vec<TreeNode>),
    Wrapped {
        #[serde(alias = "children")]
        contents: Vec<TreeNode>,
    },
}

impl ListDocument {
    /// Top-level nodes of the document
    pub fn into_nodes(self) -> Vec<TreeNode> {
        match self {
            ListDocument::Wrapped { contents } => contents,
            ListDocument::Bare(nodes) => nodes,
        }
    }
}

/// One row of the `nodes` table
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NodeRecord {
    pub id: String,
    pub add_date: Option<i64>,
    pub last_modified: Option<i64>,
    pub ns_root: Option<String>,
    pub title: Option<String>,
    #[serde(rename = "type")]
    pub node_type: NodeType,
    pub icon: Option<String>,
    pub url: Option<String>,
}

/// A node in flat form: content, tags and the pointers of one list.
///
/// `first_child` is only meaningful for folders. Both pointers are
/// storage bookkeeping and disappear when the nested form is rebuilt.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FlatNode {
    pub id: String,
    pub add_date: Option<i64>,
    pub last_modified: Option<i64>,
    pub ns_root: Option<String>,
    pub title: Option<String>,
    #[serde(rename = "type")]
    pub node_type: NodeType,
    pub icon: Option<String>,
    pub url: Option<String>,
    #[serde(default)]
    pub tags: Vec<String>,
    pub next_node: Option<String>,
    pub first_child: Option<String>,
}

impl FlatNode {
    /// Content columns of this node, as written to `nodes`
    pub fn record(&self) -> NodeRecord {
        NodeRecord {
            id: self.id.clone(),
            add_date: self.add_date,
            last_modified: self.last_modified,
            ns_root: self.ns_root.clone(),
            title: self.title.clone(),
            node_type: self.node_type,
            icon: self.icon.clone(),
            url: self.url.clone(),
        }
    }

    /// Drop the pointers and attach the rebuilt children (if any)
    pub fn into_tree_node(self, contents: Option<Vec<TreeNode>>) -> TreeNode {
        TreeNode {
            id: Some(self.id),
            add_date: self.add_date,
            last_modified: self.last_modified,
            ns_root: self.ns_root,
            title: self.title,
            node_type: Some(self.node_type),
            icon: self.icon,
            url: self.url,
            tags: self.tags,
            contents,
        }
    }
}

/// One row of the `lists` table
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ListRecord {
    pub id: i64,
    pub name: String,
    /// First top-level node, `None` for an empty list
    pub head: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_children_alias_is_accepted() {
        let node: TreeNode = serde_json::from_value(json!({
            "title": "Folder",
            "children": [{ "title": "Inner", "url": "https://example.com" }]
        }))
        .unwrap();

        assert!(node.is_folder());
        assert_eq!(node.children().len(), 1);
        assert_eq!(node.children()[0].url.as_deref(), Some("https://example.com"));
        assert!(!node.children()[0].is_folder());
    }

    #[test]
    fn test_empty_children_list_is_still_a_folder() {
        let node: TreeNode = serde_json::from_value(json!({ "title": "Empty", "contents": [] }))
            .unwrap();
        assert!(node.is_folder());
        assert!(node.children().is_empty());
    }

    #[test]
    fn test_list_document_shapes() {
        let wrapped: ListDocument =
            serde_json::from_value(json!({ "contents": [{ "title": "A" }] })).unwrap();
        let aliased: ListDocument =
            serde_json::from_value(json!({ "children": [{ "title": "A" }, { "title": "B" }] }))
                .unwrap();
        let bare: ListDocument = serde_json::from_value(json!([{ "title": "A" }])).unwrap();

        assert_eq!(wrapped.into_nodes().len(), 1);
        assert_eq!(aliased.into_nodes().len(), 2);
        assert_eq!(bare.into_nodes()[0].title.as_deref(), Some("A"));
    }

    #[test]
    fn test_non_string_ids_are_read_leniently() {
        let doc: ListDocument = serde_json::from_str(
            r#"[
                {"id": 0, "title": "A", "url": "https://a"},
                {"id": 17, "title": "B", "url": "https://b"},
                {"id": null, "title": "C"},
                {"id": {"nested": true}, "title": "D"},
                {"id": "kept", "title": "E"}
            ]"#,
        )
        .unwrap();

        let ids: Vec<Option<String>> = doc.into_nodes().into_iter().map(|n| n.id).collect();
        assert_eq!(
            ids,
            vec![
                Some("0".to_string()),
                Some("17".to_string()),
                None,
                None,
                Some("kept".to_string())
            ]
        );
    }

    #[test]
    fn test_null_tags_are_empty() {
        let doc: ListDocument = serde_json::from_str(
            r#"{"children": [{"title": "A", "url": "https://a", "tags": null}]}"#,
        )
        .unwrap();

        assert!(doc.into_nodes()[0].tags.is_empty());
    }

    #[test]
    fn test_node_type_storage_strings() {
        assert_eq!("folder".parse::<NodeType>().unwrap(), NodeType::Folder);
        assert_eq!(NodeType::Bookmark.to_string(), "bookmark");
        assert!(matches!(
            "separator".parse::<NodeType>(),
            Err(ValidationError::InvalidNodeType(t)) if t == "separator"
        ));
    }

    #[test]
    fn test_into_tree_node_drops_pointers() {
        let flat = FlatNode {
            id: "a".to_string(),
            add_date: Some(1),
            last_modified: None,
            ns_root: None,
            title: Some("A".to_string()),
            node_type: NodeType::Bookmark,
            icon: None,
            url: Some("https://a.example".to_string()),
            tags: vec!["work".to_string()],
            next_node: Some("b".to_string()),
            first_child: None,
        };

        let value = serde_json::to_value(flat.into_tree_node(None)).unwrap();
        assert!(value.get("next_node").is_none());
        assert!(value.get("first_child").is_none());
        assert_eq!(value["tags"], json!(["work"]));
        assert_eq!(value["type"], json!("bookmark"));
    }
}
