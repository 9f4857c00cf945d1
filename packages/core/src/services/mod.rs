//! Business Services
//!
//! - `ListService` - persisting nested bookmark trees as lists and reading
//!   them back as trees or as the flat export document
//!
//! Services coordinate between the tree codec and the database layer,
//! implementing business rules and orchestrating multi-step operations.

pub mod error;
pub mod list_service;

pub use error::ListServiceError;
pub use list_service::ListService;
