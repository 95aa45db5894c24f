//! Listing query capability.
//!
//! The engine does not own listings. It only needs to know whether a store
//! still has live ones before the store may be deleted, and asks through
//! this trait.

use async_trait::async_trait;
use thiserror::Error;

use storekeeper_core::StoreId;

/// Errors from the listing collaborator.
#[derive(Debug, Error)]
pub enum ListingQueryError {
    /// The listing service could not be reached.
    #[error("listing service unavailable: {0}")]
    Unavailable(String),
}

/// Read-only view of listings, implemented by the listing module.
#[async_trait]
pub trait ListingQuery: Send + Sync {
    /// Whether the store has at least one listing that is not deleted.
    async fn has_active_listings(&self, store_id: StoreId) -> Result<bool, ListingQueryError>;
}
