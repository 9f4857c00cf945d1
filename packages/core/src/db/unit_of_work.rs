//! Unit of work over a single connection
//!
//! Wraps `BEGIN IMMEDIATE` / `COMMIT` / `ROLLBACK` so that multi-statement
//! writes are all-or-nothing. `BEGIN IMMEDIATE` takes the write lock up
//! front: a second writer waits on the busy timeout instead of failing
//! later when it tries to upgrade a read lock.
//!
//! # Usage
//!
//! ```no_run
//! # use marksync_core::db::{DatabaseError, DatabaseService, UnitOfWork};
//! # async fn example(db: &DatabaseService) -> Result<(), DatabaseError> {
//! let conn = db.connect_with_timeout().await?;
//! let uow = UnitOfWork::begin(&conn).await?;
//! match conn.execute("INSERT INTO tags (name) VALUES ('work')", ()).await {
//!     Ok(_) => uow.commit().await?,
//!     Err(e) => {
//!         uow.rollback().await;
//!         return Err(e.into());
//!     }
//! }
//! # Ok(())
//! # }
//! ```

use crate::db::DatabaseError;
use libsql::Connection;

/// An open transaction on a borrowed connection.
///
/// Must end in [`commit`](Self::commit) or [`rollback`](Self::rollback).
/// If it is dropped while still open, SQLite discards the transaction when
/// the connection closes.
pub struct UnitOfWork<'c> {
    conn: &'c Connection,
    open: bool,
}

impl<'c> UnitOfWork<'c> {
    /// Start a write transaction
    pub async fn begin(conn: &'c Connection) -> Result<Self, DatabaseError> {
        conn.execute("BEGIN IMMEDIATE", ()).await.map_err(|e| {
            DatabaseError::transaction_failed(format!("Failed to begin transaction: {}", e))
        })?;

        Ok(Self { conn, open: true })
    }

    /// Make every statement since `begin` durable
    pub async fn commit(mut self) -> Result<(), DatabaseError> {
        self.open = false;

        if let Err(e) = self.conn.execute("COMMIT", ()).await {
            let _rollback = self.conn.execute("ROLLBACK", ()).await;
            return Err(DatabaseError::transaction_failed(format!(
                "Failed to commit transaction: {}",
                e
            )));
        }

        Ok(())
    }

    /// Discard every statement since `begin`.
    ///
    /// Called on an error path, so a failing ROLLBACK is logged rather than
    /// returned: the caller reports the original error.
    pub async fn rollback(mut self) {
        self.open = false;

        if let Err(e) = self.conn.execute("ROLLBACK", ()).await {
            tracing::warn!("Failed to roll back transaction: {}", e);
        }
    }
}

impl Drop for UnitOfWork<'_> {
    fn drop(&mut self) {
        if self.open {
            tracing::warn!("Unit of work dropped without commit or rollback");
        }
    }
}
