//! In-memory repositories for engine state.
//!
//! # Repositories
//!
//! - `stores` - Store records, one lock per record
//! - `notifications` - Expiration notifications per owner
//! - `selections` - Each user's active store pointer
//!
//! Repositories are plain objects injected into [`crate::StoreEngine`]; there is
//! no process-wide state.

pub mod notifications;
pub mod selections;
pub mod stores;

use thiserror::Error;

pub use notifications::NotificationRepository;
pub use selections::ActiveStoreSelections;
pub use stores::StoreRepository;

/// Errors that can occur during repository operations.
#[derive(Debug, Error)]
pub enum RepositoryError {
    /// Requested entity was not found.
    #[error("not found")]
    NotFound,

    /// Constraint violation (e.g., duplicate ID on import).
    #[error("constraint violation: {0}")]
    Conflict(String),
}
