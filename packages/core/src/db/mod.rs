//! Database Layer
//!
//! This module handles all database interactions using libsql:
//!
//! - Database initialization, schema and connection management
//! - Transaction control through [`UnitOfWork`]
//! - The [`ListStore`] abstraction and its libsql implementation
//!
//! # Architecture
//!
//! Trees are never stored nested. A list is a `lists` row pointing at its
//! head node; every node placed in the list has a `listnode` row carrying
//! its `next_node`/`first_child` pointers. Node content lives in `nodes`,
//! shared across lists by id. Tags are deduplicated by name in `tags` and
//! linked through `nodetag`; `userlist` records ownership.

mod database;
mod error;
mod list_store;
mod turso_store;
mod unit_of_work;

pub use database::DatabaseService;
pub use error::DatabaseError;
pub use list_store::{ListStore, ListWriteBatch, NodeTagRow, PointerRow};
pub use turso_store::TursoListStore;
pub use unit_of_work::UnitOfWork;
