//! TursoListStore - ListStore Implementation for libsql
//!
//! Implements [`ListStore`] on top of [`DatabaseService`]. The write path
//! runs the whole structured-list write inside one [`UnitOfWork`]:
//!
//! 1. insert or update the `lists` row
//! 2. ensure the `userlist` ownership row
//! 3. upsert `nodes` rows keyed by node id
//! 4. upsert `listnode` rows keyed by (list id, node id)
//! 5. insert tag names, ignoring names that already exist
//! 6. resolve every tag name to its id (sees rows from step 5)
//! 7. insert `nodetag` rows, ignoring existing associations
//!
//! Multi-row statements are chunked to `max_batch_rows` rows each.

use crate::db::list_store::{ListStore, ListWriteBatch, NodeTagRow};
use crate::db::{DatabaseError, DatabaseService, UnitOfWork};
use crate::models::{FlatNode, ListRecord, NodeRecord, NodeType};
use async_trait::async_trait;
use libsql::params::Params;
use libsql::{Connection, Row, Value};
use std::collections::{BTreeSet, HashMap};
use std::sync::Arc;

const NODE_COLUMNS: &str = "id, add_date, last_modified, ns_root, title, type, icon, url";

/// TursoListStore implements ListStore for the libsql backend
pub struct TursoListStore {
    db: Arc<DatabaseService>,
}

impl TursoListStore {
    pub fn new(db: Arc<DatabaseService>) -> Self {
        Self { db }
    }

    /// Convert the leading node columns (see `NODE_COLUMNS`) of a row
    fn row_to_record(row: &Row) -> Result<NodeRecord, DatabaseError> {
        let node_type: String = row.get(5)?;
        let node_type: NodeType = node_type
            .parse()
            .map_err(|e: crate::models::ValidationError| {
                DatabaseError::invalid_row("nodes", e.to_string())
            })?;

        Ok(NodeRecord {
            id: row.get(0)?,
            add_date: row.get(1)?,
            last_modified: row.get(2)?,
            ns_root: row.get(3)?,
            title: row.get(4)?,
            node_type,
            icon: row.get(6)?,
            url: row.get(7)?,
        })
    }

    /// Node columns followed by `next_node`, `first_child`
    fn row_to_flat_node(row: &Row) -> Result<FlatNode, DatabaseError> {
        let record = Self::row_to_record(row)?;

        Ok(FlatNode {
            id: record.id,
            add_date: record.add_date,
            last_modified: record.last_modified,
            ns_root: record.ns_root,
            title: record.title,
            node_type: record.node_type,
            icon: record.icon,
            url: record.url,
            tags: Vec::new(),
            next_node: row.get(8)?,
            first_child: row.get(9)?,
        })
    }

    /// Run `INSERT ... VALUES (...), (...) <suffix>` over `rows`, chunked
    async fn execute_batched(
        &self,
        conn: &Connection,
        insert: &str,
        suffix: &str,
        rows: Vec<Vec<Value>>,
        step: &str,
    ) -> Result<u64, DatabaseError> {
        let mut affected = 0;
        let mut rows = rows.into_iter().peekable();

        while rows.peek().is_some() {
            let chunk: Vec<Vec<Value>> = rows.by_ref().take(self.db.max_batch_rows()).collect();
            let values = chunk
                .iter()
                .map(|row| format!("({})", placeholders(row.len())))
                .collect::<Vec<_>>()
                .join(", ");
            let sql = format!("{} VALUES {} {}", insert, values, suffix);
            let params: Vec<Value> = chunk.into_iter().flatten().collect();

            affected += conn
                .execute(&sql, Params::Positional(params))
                .await
                .map_err(|e| DatabaseError::sql_execution(format!("{}: {}", step, e)))?;
        }

        Ok(affected)
    }

    /// Run `<select> WHERE <column> IN (...) <tail>` over `keys`, chunked,
    /// converting every returned row with `convert`
    async fn select_in<T, F>(
        &self,
        conn: &Connection,
        select: &str,
        tail: &str,
        keys: Vec<Value>,
        convert: F,
    ) -> Result<Vec<T>, DatabaseError>
    where
        F: Fn(&Row) -> Result<T, DatabaseError> + Send + Sync,
        T: Send,
    {
        let mut out = Vec::new();

        for chunk in keys.chunks(self.db.max_batch_rows()) {
            let sql = format!("{} ({}) {}", select, placeholders(chunk.len()), tail);
            let mut rows = conn
                .query(&sql, Params::Positional(chunk.to_vec()))
                .await
                .map_err(|e| DatabaseError::sql_execution(format!("{}: {}", select, e)))?;

            while let Some(row) = rows.next().await? {
                out.push(convert(&row)?);
            }
        }

        Ok(out)
    }

    /// Steps 1-7 of the write path, on a connection inside a transaction
    async fn apply_batch(
        &self,
        conn: &Connection,
        batch: ListWriteBatch,
    ) -> Result<i64, DatabaseError> {
        let ListWriteBatch {
            list_id,
            name,
            head,
            owner_user_id,
            nodes,
            pointers,
            tag_names,
            node_tags,
        } = batch;

        // 1. list row
        let list_id = match list_id {
            Some(list_id) => {
                let updated = conn
                    .execute(
                        "UPDATE lists SET name = ?, head = ? WHERE id = ?",
                        (name.as_str(), head.as_deref(), list_id),
                    )
                    .await
                    .map_err(|e| {
                        DatabaseError::sql_execution(format!("Failed to update list: {}", e))
                    })?;
                if updated == 0 {
                    return Err(DatabaseError::list_not_found(list_id));
                }
                list_id
            }
            None => {
                conn.execute(
                    "INSERT INTO lists (name, head) VALUES (?, ?)",
                    (name.as_str(), head.as_deref()),
                )
                .await
                .map_err(|e| {
                    DatabaseError::sql_execution(format!("Failed to insert list: {}", e))
                })?;
                conn.last_insert_rowid()
            }
        };

        // 2. ownership
        conn.execute(
            "INSERT INTO userlist (user_id, list_id) VALUES (?, ?) ON CONFLICT DO NOTHING",
            (owner_user_id, list_id),
        )
        .await
        .map_err(|e| DatabaseError::sql_execution(format!("Failed to insert userlist: {}", e)))?;

        // 3. node content
        let node_rows: Vec<Vec<Value>> = nodes
            .into_iter()
            .map(|node| {
                vec![
                    Value::Text(node.id),
                    opt_int(node.add_date),
                    opt_int(node.last_modified),
                    opt_text(node.ns_root),
                    opt_text(node.title),
                    Value::Text(node.node_type.as_str().to_string()),
                    opt_text(node.icon),
                    opt_text(node.url),
                ]
            })
            .collect();
        let node_count = node_rows.len();
        self.execute_batched(
            conn,
            &format!("INSERT INTO nodes ({})", NODE_COLUMNS),
            "ON CONFLICT (id) DO UPDATE SET \
                add_date = excluded.add_date, \
                last_modified = excluded.last_modified, \
                ns_root = excluded.ns_root, \
                title = excluded.title, \
                type = excluded.type, \
                icon = excluded.icon, \
                url = excluded.url",
            node_rows,
            "Failed to upsert nodes",
        )
        .await?;

        // 4. pointers
        let pointer_rows: Vec<Vec<Value>> = pointers
            .into_iter()
            .map(|ptr| {
                vec![
                    Value::Integer(list_id),
                    Value::Text(ptr.node_id),
                    opt_text(ptr.next_node),
                    opt_text(ptr.first_child),
                ]
            })
            .collect();
        self.execute_batched(
            conn,
            "INSERT INTO listnode (list_id, node_id, next_node, first_child)",
            "ON CONFLICT (list_id, node_id) DO UPDATE SET \
                next_node = excluded.next_node, \
                first_child = excluded.first_child",
            pointer_rows,
            "Failed to upsert listnode",
        )
        .await?;

        // 5. tags
        let tag_rows: Vec<Vec<Value>> = tag_names
            .iter()
            .map(|tag| vec![Value::Text(tag.clone())])
            .collect();
        let new_tags = self
            .execute_batched(
                conn,
                "INSERT INTO tags (name)",
                "ON CONFLICT DO NOTHING",
                tag_rows,
                "Failed to insert tags",
            )
            .await?;

        // 6. tag ids, including the ones inserted above
        let tag_keys: Vec<Value> = tag_names.into_iter().map(Value::Text).collect();
        let tag_ids: HashMap<String, i64> = self
            .select_in(
                conn,
                "SELECT name, id FROM tags WHERE name IN",
                "",
                tag_keys,
                |row| Ok((row.get::<String>(0)?, row.get::<i64>(1)?)),
            )
            .await?
            .into_iter()
            .collect();

        // 7. associations
        let association_rows = node_tags
            .into_iter()
            .map(|NodeTagRow { node_id, tag }| {
                let tag_id = tag_ids.get(&tag).copied().ok_or_else(|| {
                    DatabaseError::sql_execution(format!("Tag '{}' did not resolve to an id", tag))
                })?;
                Ok(vec![Value::Text(node_id), Value::Integer(tag_id)])
            })
            .collect::<Result<Vec<_>, DatabaseError>>()?;
        self.execute_batched(
            conn,
            "INSERT INTO nodetag (node_id, tag_id)",
            "ON CONFLICT DO NOTHING",
            association_rows,
            "Failed to insert nodetag",
        )
        .await?;

        tracing::debug!(
            "List {}: wrote {} node(s), {} new tag(s) of {}",
            list_id,
            node_count,
            new_tags,
            tag_ids.len()
        );

        Ok(list_id)
    }
}

#[async_trait]
impl ListStore for TursoListStore {
    async fn write_list(&self, batch: ListWriteBatch) -> Result<i64, DatabaseError> {
        let conn = self.db.connect_with_timeout().await?;
        let uow = UnitOfWork::begin(&conn).await?;

        match self.apply_batch(&conn, batch).await {
            Ok(list_id) => {
                uow.commit().await?;
                Ok(list_id)
            }
            Err(e) => {
                tracing::warn!("Rolling back list write: {}", e);
                uow.rollback().await;
                Err(e)
            }
        }
    }

    async fn get_list_ids(&self, user_id: i64) -> Result<Vec<i64>, DatabaseError> {
        let conn = self.db.connect_with_timeout().await?;
        let mut rows = conn
            .query(
                "SELECT list_id FROM userlist WHERE user_id = ? ORDER BY list_id",
                [user_id],
            )
            .await
            .map_err(|e| {
                DatabaseError::sql_execution(format!("Failed to query userlist: {}", e))
            })?;

        let mut ids = Vec::new();
        while let Some(row) = rows.next().await? {
            ids.push(row.get::<i64>(0)?);
        }
        Ok(ids)
    }

    async fn get_lists(&self, list_ids: &[i64]) -> Result<Vec<ListRecord>, DatabaseError> {
        let conn = self.db.connect_with_timeout().await?;
        let keys = list_ids.iter().copied().map(Value::Integer).collect();

        let mut lists = self
            .select_in(
                &conn,
                "SELECT id, name, head FROM lists WHERE id IN",
                "",
                keys,
                row_to_list,
            )
            .await?;
        lists.sort_by_key(|list| list.id);
        Ok(lists)
    }

    async fn get_list(&self, list_id: i64) -> Result<Option<ListRecord>, DatabaseError> {
        let conn = self.db.connect_with_timeout().await?;
        let mut rows = conn
            .query("SELECT id, name, head FROM lists WHERE id = ?", [list_id])
            .await
            .map_err(|e| DatabaseError::sql_execution(format!("Failed to query lists: {}", e)))?;

        match rows.next().await? {
            Some(row) => Ok(Some(row_to_list(&row)?)),
            None => Ok(None),
        }
    }

    async fn get_node_ids(&self, list_ids: &[i64]) -> Result<Vec<String>, DatabaseError> {
        let conn = self.db.connect_with_timeout().await?;
        let keys = list_ids.iter().copied().map(Value::Integer).collect();

        let ids: BTreeSet<String> = self
            .select_in(
                &conn,
                "SELECT DISTINCT node_id FROM listnode WHERE list_id IN",
                "",
                keys,
                |row| Ok(row.get::<String>(0)?),
            )
            .await?
            .into_iter()
            .collect();
        Ok(ids.into_iter().collect())
    }

    async fn get_nodes(&self, node_ids: &[String]) -> Result<Vec<NodeRecord>, DatabaseError> {
        let conn = self.db.connect_with_timeout().await?;
        let keys = node_ids.iter().cloned().map(Value::Text).collect();

        self.select_in(
            &conn,
            &format!("SELECT {} FROM nodes WHERE id IN", NODE_COLUMNS),
            "",
            keys,
            Self::row_to_record,
        )
        .await
    }

    async fn get_nodes_from_list(&self, list_id: i64) -> Result<Vec<FlatNode>, DatabaseError> {
        let conn = self.db.connect_with_timeout().await?;
        let mut rows = conn
            .query(
                "SELECT n.id, n.add_date, n.last_modified, n.ns_root, n.title, n.type, n.icon, n.url,
                        ln.next_node, ln.first_child
                 FROM listnode ln
                 JOIN nodes n ON n.id = ln.node_id
                 WHERE ln.list_id = ?",
                [list_id],
            )
            .await
            .map_err(|e| {
                DatabaseError::sql_execution(format!("Failed to query list nodes: {}", e))
            })?;

        let mut nodes = Vec::new();
        while let Some(row) = rows.next().await? {
            nodes.push(Self::row_to_flat_node(&row)?);
        }
        Ok(nodes)
    }

    async fn get_tags_for_nodes(
        &self,
        node_ids: &[String],
    ) -> Result<Vec<NodeTagRow>, DatabaseError> {
        let conn = self.db.connect_with_timeout().await?;
        let keys = node_ids.iter().cloned().map(Value::Text).collect();

        let mut pairs = self
            .select_in(
                &conn,
                "SELECT nt.node_id, t.name FROM nodetag nt JOIN tags t ON t.id = nt.tag_id \
                 WHERE nt.node_id IN",
                "",
                keys,
                |row| {
                    Ok(NodeTagRow {
                        node_id: row.get(0)?,
                        tag: row.get(1)?,
                    })
                },
            )
            .await?;
        pairs.sort();
        Ok(pairs)
    }
}

fn row_to_list(row: &Row) -> Result<ListRecord, DatabaseError> {
    Ok(ListRecord {
        id: row.get(0)?,
        name: row.get(1)?,
        head: row.get(2)?,
    })
}

/// `?, ?, ?` with `count` markers
fn placeholders(count: usize) -> String {
    vec!["?"; count].join(", ")
}

fn opt_text(value: Option<String>) -> Value {
    value.map_or(Value::Null, Value::Text)
}

fn opt_int(value: Option<i64>) -> Value {
    value.map_or(Value::Null, Value::Integer)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::StoreConfig;
    use crate::db::list_store::PointerRow;
    use tempfile::TempDir;

    async fn setup(max_batch_rows: usize) -> (TursoListStore, Arc<DatabaseService>, TempDir) {
        let temp_dir = TempDir::new().unwrap();
        let mut config = StoreConfig::for_path(temp_dir.path().join("test.db"));
        config.max_batch_rows = max_batch_rows;
        let db = Arc::new(DatabaseService::with_config(&config).await.unwrap());
        (TursoListStore::new(db.clone()), db, temp_dir)
    }

    fn record(id: &str, node_type: NodeType) -> NodeRecord {
        NodeRecord {
            id: id.to_string(),
            add_date: Some(1),
            last_modified: None,
            ns_root: None,
            title: Some(id.to_uppercase()),
            node_type,
            icon: None,
            url: None,
        }
    }

    fn chain_batch(count: usize) -> ListWriteBatch {
        let ids: Vec<String> = (0..count).map(|i| format!("n{:03}", i)).collect();
        ListWriteBatch {
            list_id: None,
            name: "chain".to_string(),
            head: ids.first().cloned(),
            owner_user_id: 1,
            nodes: ids.iter().map(|id| record(id, NodeType::Bookmark)).collect(),
            pointers: ids
                .iter()
                .enumerate()
                .map(|(i, id)| PointerRow {
                    node_id: id.clone(),
                    next_node: ids.get(i + 1).cloned(),
                    first_child: None,
                })
                .collect(),
            tag_names: vec!["bulk".to_string()],
            node_tags: ids
                .iter()
                .map(|id| NodeTagRow {
                    node_id: id.clone(),
                    tag: "bulk".to_string(),
                })
                .collect(),
        }
    }

    #[tokio::test]
    async fn test_write_spans_multiple_chunks() {
        let (store, _db, _temp) = setup(7).await;

        let list_id = store.write_list(chain_batch(50)).await.unwrap();

        let nodes = store.get_nodes_from_list(list_id).await.unwrap();
        assert_eq!(nodes.len(), 50);
        let ids: Vec<String> = nodes.iter().map(|n| n.id.clone()).collect();
        let tags = store.get_tags_for_nodes(&ids).await.unwrap();
        assert_eq!(tags.len(), 50);
        assert!(tags.iter().all(|t| t.tag == "bulk"));
    }

    #[tokio::test]
    async fn test_empty_batch_creates_empty_list() {
        let (store, _db, _temp) = setup(100).await;

        let list_id = store.write_list(chain_batch(0)).await.unwrap();

        let list = store.get_list(list_id).await.unwrap().unwrap();
        assert_eq!(list.head, None);
        assert!(store.get_nodes_from_list(list_id).await.unwrap().is_empty());
        assert_eq!(store.get_list_ids(1).await.unwrap(), vec![list_id]);
    }

    #[tokio::test]
    async fn test_update_of_missing_list_rolls_back() {
        let (store, db, _temp) = setup(100).await;

        let mut batch = chain_batch(3);
        batch.list_id = Some(999);
        let result = store.write_list(batch).await;
        assert!(matches!(
            result,
            Err(DatabaseError::ListNotFound { list_id: 999 })
        ));

        let conn = db.connect_with_timeout().await.unwrap();
        let mut rows = conn.query("SELECT COUNT(*) FROM nodes", ()).await.unwrap();
        let count: i64 = rows.next().await.unwrap().unwrap().get(0).unwrap();
        assert_eq!(count, 0);
    }

    #[tokio::test]
    async fn test_get_nodes_and_lists_skip_missing_ids() {
        let (store, _db, _temp) = setup(100).await;
        let list_id = store.write_list(chain_batch(2)).await.unwrap();

        let nodes = store
            .get_nodes(&["n000".to_string(), "missing".to_string()])
            .await
            .unwrap();
        assert_eq!(nodes.len(), 1);
        assert_eq!(nodes[0].title.as_deref(), Some("N000"));

        let lists = store.get_lists(&[list_id, list_id + 100]).await.unwrap();
        assert_eq!(lists.len(), 1);
        assert_eq!(lists[0].name, "chain");

        assert_eq!(
            store.get_node_ids(&[list_id]).await.unwrap(),
            vec!["n000".to_string(), "n001".to_string()]
        );
    }

    #[tokio::test]
    async fn test_unknown_node_type_is_reported() {
        let (store, db, _temp) = setup(100).await;
        let list_id = store.write_list(chain_batch(1)).await.unwrap();

        // Bypass the CHECK constraint to simulate a row written by another tool
        let conn = db.connect_with_timeout().await.unwrap();
        conn.execute("PRAGMA ignore_check_constraints = ON", ())
            .await
            .unwrap();
        conn.execute("UPDATE nodes SET type = 'separator' WHERE id = 'n000'", ())
            .await
            .unwrap();

        let result = store.get_nodes_from_list(list_id).await;
        assert!(matches!(
            result,
            Err(DatabaseError::InvalidRow { table: "nodes", .. })
        ));
    }

    #[tokio::test]
    async fn test_empty_key_sets_return_nothing() {
        let (store, _db, _temp) = setup(100).await;

        assert!(store.get_lists(&[]).await.unwrap().is_empty());
        assert!(store.get_nodes(&[]).await.unwrap().is_empty());
        assert!(store.get_node_ids(&[]).await.unwrap().is_empty());
        assert!(store.get_tags_for_nodes(&[]).await.unwrap().is_empty());
    }
}
