//! ListStore Trait - Persistence Abstraction
//!
//! `ListStore` is the seam between `ListService` (tree conversion, business
//! rules) and the database. The service hands over a fully derived
//! [`ListWriteBatch`]; the store owns the transaction that writes it.
//!
//! # Design Decisions
//!
//! 1. **Async-First**: All methods are async
//! 2. **One call, one transaction**: `write_list` is atomic; reads are not
//!    transactional and carry no freshness guarantee against a concurrent write
//! 3. **Ownership Semantics**: The write batch is taken by value

use crate::db::DatabaseError;
use crate::models::{FlatNode, ListRecord, NodeRecord};
use async_trait::async_trait;

/// Pointer row of one node within one list
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PointerRow {
    pub node_id: String,
    pub next_node: Option<String>,
    pub first_child: Option<String>,
}

/// Association of a node with a tag, by tag name
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord)]
pub struct NodeTagRow {
    pub node_id: String,
    pub tag: String,
}

/// Everything one structured-list write touches, derived up front
#[derive(Debug, Clone, PartialEq)]
pub struct ListWriteBatch {
    /// `None` creates a new list, `Some` overwrites name and head of that list
    pub list_id: Option<i64>,
    pub name: String,
    pub head: Option<String>,
    pub owner_user_id: i64,
    pub nodes: Vec<NodeRecord>,
    pub pointers: Vec<PointerRow>,
    /// Distinct tag names, sorted
    pub tag_names: Vec<String>,
    pub node_tags: Vec<NodeTagRow>,
}

/// Abstraction layer for bookmark list persistence
///
/// # Thread Safety
///
/// Implementations must be `Send + Sync` to allow usage in async contexts where
/// futures may be moved between threads.
#[async_trait]
pub trait ListStore: Send + Sync {
    /// Write a structured list atomically and return the effective list id.
    ///
    /// In one transaction: upsert the list row, ensure ownership, upsert
    /// node and pointer rows, insert missing tags, resolve tag ids and
    /// insert node/tag associations. Any failure rolls everything back.
    ///
    /// # Errors
    ///
    /// [`DatabaseError::ListNotFound`] when `batch.list_id` names no list,
    /// otherwise whatever the failing statement reported.
    async fn write_list(&self, batch: ListWriteBatch) -> Result<i64, DatabaseError>;

    /// List ids owned by a user, ascending
    async fn get_list_ids(&self, user_id: i64) -> Result<Vec<i64>, DatabaseError>;

    /// List rows for the given ids (missing ids are skipped)
    async fn get_lists(&self, list_ids: &[i64]) -> Result<Vec<ListRecord>, DatabaseError>;

    /// A single list row
    async fn get_list(&self, list_id: i64) -> Result<Option<ListRecord>, DatabaseError>;

    /// Ids of all nodes placed in any of the given lists
    async fn get_node_ids(&self, list_ids: &[i64]) -> Result<Vec<String>, DatabaseError>;

    /// Plain node rows for the given ids (missing ids are skipped)
    async fn get_nodes(&self, node_ids: &[String]) -> Result<Vec<NodeRecord>, DatabaseError>;

    /// Node rows of one list joined with that list's pointers, tags empty
    async fn get_nodes_from_list(&self, list_id: i64) -> Result<Vec<FlatNode>, DatabaseError>;

    /// `(node_id, tag_name)` pairs for the given nodes
    async fn get_tags_for_nodes(
        &self,
        node_ids: &[String],
    ) -> Result<Vec<NodeTagRow>, DatabaseError>;
}
