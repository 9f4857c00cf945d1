//! Database Connection Management
//!
//! This module provides database connection and schema initialization for
//! Marksync using libsql.
//!
//! # Architecture
//!
//! - **Path-agnostic**: Accepts any valid PathBuf
//! - **Flat tree schema**: nodes, per-list pointer rows, tags, ownership
//! - **WAL mode**: Write-Ahead Logging for better concurrency
//! - **Foreign keys**: Enabled on every connection handed out
//!
//! # Database Connection Patterns
//!
//! **Use `connect_with_timeout()` in async functions.** It applies the busy
//! timeout and `foreign_keys` pragma to the new connection, so concurrent
//! writers wait for the lock instead of failing with `SQLITE_BUSY`.
//!
//! ```no_run
//! # use marksync_core::db::DatabaseService;
//! # use std::path::PathBuf;
//! # #[tokio::main]
//! # async fn main() -> Result<(), Box<dyn std::error::Error>> {
//! let db_service = DatabaseService::new(PathBuf::from("./data/marksync.db")).await?;
//! let conn = db_service.connect_with_timeout().await?;
//! # Ok(())
//! # }
//! ```

use crate::config::StoreConfig;
use crate::db::error::DatabaseError;
use libsql::{Builder, Database};
use std::path::PathBuf;
use std::sync::Arc;

/// Tables, in dependency order
const SCHEMA_TABLES: &[(&str, &str)] = &[
    (
        "nodes",
        "CREATE TABLE IF NOT EXISTS nodes (
            id TEXT PRIMARY KEY,
            add_date INTEGER,
            last_modified INTEGER,
            ns_root TEXT,
            title TEXT,
            type TEXT NOT NULL CHECK (type IN ('folder', 'bookmark')),
            icon TEXT,
            url TEXT
        )",
    ),
    (
        "lists",
        "CREATE TABLE IF NOT EXISTS lists (
            id INTEGER PRIMARY KEY AUTOINCREMENT,
            name TEXT NOT NULL,
            -- First top-level node; NULL for an empty list
            head TEXT
        )",
    ),
    (
        "listnode",
        "CREATE TABLE IF NOT EXISTS listnode (
            list_id INTEGER NOT NULL,
            node_id TEXT NOT NULL,
            next_node TEXT,
            first_child TEXT,
            PRIMARY KEY (list_id, node_id),
            FOREIGN KEY (list_id) REFERENCES lists(id) ON DELETE CASCADE,
            FOREIGN KEY (node_id) REFERENCES nodes(id) ON DELETE CASCADE,
            -- Pointer targets going away null the pointer
            FOREIGN KEY (next_node) REFERENCES nodes(id) ON DELETE SET NULL,
            FOREIGN KEY (first_child) REFERENCES nodes(id) ON DELETE SET NULL
        )",
    ),
    (
        "tags",
        "CREATE TABLE IF NOT EXISTS tags (
            id INTEGER PRIMARY KEY AUTOINCREMENT,
            name TEXT NOT NULL UNIQUE
        )",
    ),
    (
        "nodetag",
        "CREATE TABLE IF NOT EXISTS nodetag (
            node_id TEXT NOT NULL,
            tag_id INTEGER NOT NULL,
            PRIMARY KEY (node_id, tag_id),
            FOREIGN KEY (node_id) REFERENCES nodes(id) ON DELETE CASCADE,
            FOREIGN KEY (tag_id) REFERENCES tags(id) ON DELETE CASCADE
        )",
    ),
    (
        "userlist",
        "CREATE TABLE IF NOT EXISTS userlist (
            user_id INTEGER NOT NULL,
            list_id INTEGER NOT NULL,
            PRIMARY KEY (user_id, list_id),
            FOREIGN KEY (list_id) REFERENCES lists(id) ON DELETE CASCADE
        )",
    ),
];

/// Secondary indexes (composite primary keys already cover their prefixes)
const SCHEMA_INDEXES: &[(&str, &str)] = &[
    (
        "idx_listnode_node",
        "CREATE INDEX IF NOT EXISTS idx_listnode_node ON listnode(node_id)",
    ),
    (
        "idx_nodetag_tag",
        "CREATE INDEX IF NOT EXISTS idx_nodetag_tag ON nodetag(tag_id)",
    ),
    (
        "idx_userlist_list",
        "CREATE INDEX IF NOT EXISTS idx_userlist_list ON userlist(list_id)",
    ),
];

/// Database service for managing libsql connection and schema
///
/// # Examples
///
/// ```no_run
/// use marksync_core::db::DatabaseService;
/// use std::path::PathBuf;
///
/// #[tokio::main]
/// async fn main() -> Result<(), Box<dyn std::error::Error>> {
///     let db_path = PathBuf::from("/path/to/marksync.db");
///     let db_service = DatabaseService::new(db_path).await?;
///     Ok(())
/// }
/// ```
#[derive(Debug, Clone)]
pub struct DatabaseService {
    /// libsql database handle (wrapped in Arc for sharing)
    pub db: Arc<Database>,

    /// Path to the database file
    pub db_path: PathBuf,

    /// Busy timeout applied to every connection
    busy_timeout_ms: u64,

    /// Rows per multi-row statement; validated at open, never 0
    max_batch_rows: usize,
}

impl DatabaseService {
    /// Open (or create) the database at `db_path` with default settings
    pub async fn new(db_path: PathBuf) -> Result<Self, DatabaseError> {
        Self::with_config(&StoreConfig::for_path(db_path)).await
    }

    /// Open (or create) the database described by `config`
    ///
    /// This will:
    /// 1. Validate the configuration
    /// 2. Ensure the parent directory exists (create if needed)
    /// 3. Open/create the database file
    /// 4. Initialize the schema (CREATE TABLE IF NOT EXISTS)
    ///
    /// # Errors
    ///
    /// Returns `DatabaseError` if:
    /// - The configuration is invalid
    /// - Parent directory cannot be created
    /// - Database connection fails
    /// - Schema initialization fails
    pub async fn with_config(config: &StoreConfig) -> Result<Self, DatabaseError> {
        config
            .validate()
            .map_err(DatabaseError::initialization_failed)?;

        let db_path = config.database_path.clone();

        if let Some(parent) = db_path.parent() {
            if !parent.as_os_str().is_empty() && !parent.exists() {
                std::fs::create_dir_all(parent).map_err(|e| {
                    if e.kind() == std::io::ErrorKind::PermissionDenied {
                        DatabaseError::permission_denied(db_path.clone())
                    } else {
                        DatabaseError::DirectoryCreationFailed(e)
                    }
                })?;
            }
        }

        let db = Builder::new_local(&db_path)
            .build()
            .await
            .map_err(|e| DatabaseError::connection_failed(db_path.clone(), e))?;

        let service = Self {
            db: Arc::new(db),
            db_path,
            busy_timeout_ms: config.busy_timeout_ms,
            max_batch_rows: config.max_batch_rows,
        };

        service.initialize_schema().await?;

        tracing::debug!("Opened database at {}", service.db_path.display());

        Ok(service)
    }

    /// Execute a PRAGMA statement
    ///
    /// PRAGMA statements return rows, so we must use query() instead of execute().
    async fn execute_pragma(
        &self,
        conn: &libsql::Connection,
        pragma: &str,
    ) -> Result<(), DatabaseError> {
        let mut stmt = conn.prepare(pragma).await.map_err(|e| {
            DatabaseError::sql_execution(format!("Failed to execute '{}': {}", pragma, e))
        })?;
        let _ = stmt.query(()).await.map_err(|e| {
            DatabaseError::sql_execution(format!("Failed to execute '{}': {}", pragma, e))
        })?;
        Ok(())
    }

    /// Initialize database schema and configuration
    ///
    /// Creates tables and indexes using IF NOT EXISTS, so opening an existing
    /// database is safe and changes nothing.
    async fn initialize_schema(&self) -> Result<(), DatabaseError> {
        let conn = self.connect_with_timeout().await?;

        // WAL lets readers proceed while a write transaction is open
        self.execute_pragma(&conn, "PRAGMA journal_mode = WAL")
            .await?;

        for (name, sql) in SCHEMA_TABLES.iter().chain(SCHEMA_INDEXES) {
            conn.execute(sql, ()).await.map_err(|e| {
                DatabaseError::initialization_failed(format!("Failed to create '{}': {}", name, e))
            })?;
        }

        Ok(())
    }

    pub fn busy_timeout_ms(&self) -> u64 {
        self.busy_timeout_ms
    }

    /// Rows per multi-row statement, at least 1
    pub fn max_batch_rows(&self) -> usize {
        self.max_batch_rows
    }

    /// Get a raw connection to the database
    ///
    /// No pragmas are applied. Prefer `connect_with_timeout()`.
    pub fn connect(&self) -> Result<libsql::Connection, DatabaseError> {
        self.db.connect().map_err(DatabaseError::LibsqlError)
    }

    /// Get a connection with busy timeout and foreign keys configured
    ///
    /// Both pragmas are per-connection in SQLite, so they are applied to
    /// every connection handed out here.
    pub async fn connect_with_timeout(&self) -> Result<libsql::Connection, DatabaseError> {
        let conn = self.connect()?;

        self.execute_pragma(
            &conn,
            &format!("PRAGMA busy_timeout = {}", self.busy_timeout_ms),
        )
        .await?;
        self.execute_pragma(&conn, "PRAGMA foreign_keys = ON")
            .await?;

        Ok(conn)
    }
}
