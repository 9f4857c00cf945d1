//! List Service - Structured List Persistence
//!
//! This module provides the business logic layer for bookmark lists:
//!
//! - `insert_structured_list`: nested tree in, atomic multi-table write out
//! - Read-back as a nested tree (`create_structure`) or as the flat
//!   bookmarks-bar export (`serialize_list`)
//! - Plain lookups of lists and nodes by id
//!
//! The service owns every tree conversion; the [`ListStore`] behind it only
//! ever sees flat rows.

use crate::db::{ListStore, ListWriteBatch, NodeTagRow, PointerRow};
use crate::models::{ExportDocument, FlatNode, ListRecord, NodeRecord, TreeNode};
use crate::services::error::ListServiceError;
use crate::tree::{assign_ids, build_flat_list, build_tree, flatten_tree};
use std::collections::{BTreeSet, HashMap};
use std::sync::Arc;

/// Derive everything a list write touches from flattened rows.
///
/// `head` is the first row's id (rows come out of the flattener in
/// pre-order), tag names are deduplicated and sorted, and every
/// `(node, tag)` pair appears once.
pub(crate) fn derive_write_batch(
    rows: Vec<FlatNode>,
    list_name: &str,
    owner_user_id: i64,
    existing_list_id: Option<i64>,
) -> ListWriteBatch {
    let head = rows.first().map(|row| row.id.clone());
    let mut nodes = Vec::with_capacity(rows.len());
    let mut pointers = Vec::with_capacity(rows.len());
    let mut tag_names = BTreeSet::new();
    let mut node_tags = BTreeSet::new();

    for row in rows {
        nodes.push(row.record());

        for tag in &row.tags {
            tag_names.insert(tag.clone());
            node_tags.insert(NodeTagRow {
                node_id: row.id.clone(),
                tag: tag.clone(),
            });
        }

        pointers.push(PointerRow {
            node_id: row.id,
            next_node: row.next_node,
            first_child: row.first_child,
        });
    }

    ListWriteBatch {
        list_id: existing_list_id,
        name: list_name.to_string(),
        head,
        owner_user_id,
        nodes,
        pointers,
        tag_names: tag_names.into_iter().collect(),
        node_tags: node_tags.into_iter().collect(),
    }
}

/// Core service for bookmark list operations
///
/// # Examples
///
/// ```no_run
/// # use marksync_core::db::{DatabaseService, TursoListStore};
/// # use marksync_core::models::TreeNode;
/// # use marksync_core::services::ListService;
/// # use std::path::PathBuf;
/// # use std::sync::Arc;
/// # #[tokio::main]
/// # async fn main() -> Result<(), Box<dyn std::error::Error>> {
/// let db = Arc::new(DatabaseService::new(PathBuf::from("./data/marksync.db")).await?);
/// let service = ListService::new(Arc::new(TursoListStore::new(db)));
///
/// let tree = vec![TreeNode::bookmark("Rust", "https://www.rust-lang.org")];
/// let list_id = service.insert_structured_list(tree, "Reading", 1, None).await?;
/// let root = service.create_structure(list_id).await?;
/// assert_eq!(root.children().len(), 1);
/// # Ok(())
/// # }
/// ```
#[derive(Clone)]
pub struct ListService {
    store: Arc<dyn ListStore>,
}

impl ListService {
    pub fn new(store: Arc<dyn ListStore>) -> Self {
        Self { store }
    }

    /// Persist a nested tree as a list and return the effective list id.
    ///
    /// Missing or non-UUID-v4 ids are replaced, existing valid ids are kept
    /// so a resubmitted tree updates its rows in place. With
    /// `existing_list_id` the list's name and head are overwritten;
    /// without it a new list is created. All rows are written in one
    /// transaction.
    ///
    /// # Errors
    ///
    /// - [`ListServiceError::ListNotFound`] if `existing_list_id` names no list
    /// - [`ListServiceError::DatabaseError`] if any statement fails; nothing
    ///   from this call is persisted in either case
    pub async fn insert_structured_list(
        &self,
        mut tree: Vec<TreeNode>,
        list_name: &str,
        owner_user_id: i64,
        existing_list_id: Option<i64>,
    ) -> Result<i64, ListServiceError> {
        let generated = assign_ids(&mut tree);
        if generated > 0 {
            tracing::debug!("Generated {} node id(s) for list '{}'", generated, list_name);
        }

        let rows = flatten_tree(tree);
        let batch = derive_write_batch(rows, list_name, owner_user_id, existing_list_id);

        tracing::debug!(
            "Writing list '{}': {} node(s), {} tag(s), {} association(s)",
            list_name,
            batch.nodes.len(),
            batch.tag_names.len(),
            batch.node_tags.len()
        );

        let list_id = self.store.write_list(batch).await?;
        tracing::info!("Committed list {} ('{}')", list_id, list_name);

        Ok(list_id)
    }

    /// Rebuild a list as a nested tree under a synthetic root folder,
    /// with every node's tags attached
    pub async fn create_structure(&self, list_id: i64) -> Result<TreeNode, ListServiceError> {
        let list = self.require_list(list_id).await?;

        let mut rows = self.store.get_nodes_from_list(list_id).await?;
        self.attach_tags(&mut rows).await?;

        Ok(build_tree(rows, list.head.as_deref())?)
    }

    /// The list's single top-level chain in export form
    ///
    /// # Errors
    ///
    /// [`ListServiceError::CorruptedStructure`] if the stored rows are not
    /// exactly one chain (including an empty list).
    pub async fn export_list(&self, list_id: i64) -> Result<ExportDocument, ListServiceError> {
        self.require_list(list_id).await?;

        let rows = self.store.get_nodes_from_list(list_id).await?;
        let chain = build_flat_list(rows).map_err(|e| {
            tracing::warn!("List {} cannot be exported: {}", list_id, e);
            e
        })?;

        Ok(ExportDocument::toolbar(chain))
    }

    /// [`export_list`](Self::export_list) as JSON text
    pub async fn serialize_list(&self, list_id: i64) -> Result<String, ListServiceError> {
        let document = self.export_list(list_id).await?;

        serde_json::to_string(&document)
            .map_err(|e| ListServiceError::serialization_error(e.to_string()))
    }

    /// Fill each node's `tags`, keeping node order.
    ///
    /// Tags come back sorted by name; nodes without tags end up with an
    /// empty set. A node id listed twice gets the same tags both times.
    pub async fn attach_tags(&self, nodes: &mut [FlatNode]) -> Result<(), ListServiceError> {
        if nodes.is_empty() {
            return Ok(());
        }

        let ids: Vec<String> = nodes
            .iter()
            .map(|node| node.id.clone())
            .collect::<BTreeSet<_>>()
            .into_iter()
            .collect();
        let mut by_node: HashMap<String, Vec<String>> = HashMap::new();

        for NodeTagRow { node_id, tag } in self.store.get_tags_for_nodes(&ids).await? {
            by_node.entry(node_id).or_default().push(tag);
        }

        for node in nodes.iter_mut() {
            node.tags = by_node.get(&node.id).cloned().unwrap_or_default();
        }

        Ok(())
    }

    pub async fn get_list_ids(&self, user_id: i64) -> Result<Vec<i64>, ListServiceError> {
        Ok(self.store.get_list_ids(user_id).await?)
    }

    pub async fn get_lists(&self, list_ids: &[i64]) -> Result<Vec<ListRecord>, ListServiceError> {
        Ok(self.store.get_lists(list_ids).await?)
    }

    pub async fn get_node_ids(&self, list_ids: &[i64]) -> Result<Vec<String>, ListServiceError> {
        Ok(self.store.get_node_ids(list_ids).await?)
    }

    pub async fn get_nodes(&self, node_ids: &[String]) -> Result<Vec<NodeRecord>, ListServiceError> {
        Ok(self.store.get_nodes(node_ids).await?)
    }

    /// Node rows of one list with their pointers and tags, in storage order
    pub async fn get_nodes_from_list(
        &self,
        list_id: i64,
    ) -> Result<Vec<FlatNode>, ListServiceError> {
        let mut rows = self.store.get_nodes_from_list(list_id).await?;
        self.attach_tags(&mut rows).await?;
        Ok(rows)
    }

    async fn require_list(&self, list_id: i64) -> Result<ListRecord, ListServiceError> {
        self.store
            .get_list(list_id)
            .await?
            .ok_or_else(|| ListServiceError::list_not_found(list_id))
    }
}

#[cfg(test)]
#[path = "list_service_test.rs"]
mod list_service_test;
