//! Marksync Core
//!
//! Persistence core for hierarchical bookmark collections stored in a
//! relational database that has no native tree type.
//!
//! # Architecture
//!
//! - **Nested form**: clients exchange trees of folders and bookmarks
//! - **Flat form**: each list is stored as rows linked by `next_node`
//!   (sibling order) and `first_child` (descent into a folder)
//! - **libsql**: embedded SQLite-compatible database, one transaction per write
//!
//! # Modules
//!
//! - [`models`] - Node, list and export document structures
//! - [`tree`] - Identifier assignment, flattening and tree reconstruction
//! - [`db`] - Database layer with libsql integration
//! - [`services`] - `ListService`, the write pipeline and read paths
//! - [`config`] - Store configuration

pub mod config;
pub mod db;
pub mod models;
pub mod services;
pub mod tree;

// Re-export commonly used types
pub use config::StoreConfig;
pub use models::*;
pub use services::*;
