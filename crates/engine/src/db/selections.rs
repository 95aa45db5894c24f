//! Active store pointers.
//!
//! A pointer says which of a user's stores the UI is working with. It is not
//! an ownership record: the pointed-to store may since have been archived.

use std::collections::HashMap;

use tokio::sync::RwLock;

use storekeeper_core::{StoreId, UserId};

/// Map of user to their currently selected store.
#[derive(Debug, Default)]
pub struct ActiveStoreSelections {
    pointers: RwLock<HashMap<UserId, StoreId>>,
}

impl ActiveStoreSelections {
    /// Create an empty selection map.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// The user's selected store, if any.
    pub async fn get(&self, user_id: UserId) -> Option<StoreId> {
        self.pointers.read().await.get(&user_id).copied()
    }

    /// Point the user at `store_id`, replacing any previous selection.
    pub async fn set(&self, user_id: UserId, store_id: StoreId) {
        self.pointers.write().await.insert(user_id, store_id);
    }

    /// Point the user at `store_id` only if nothing is selected yet.
    ///
    /// Returns `true` if the pointer was set.
    pub async fn set_if_unset(&self, user_id: UserId, store_id: StoreId) -> bool {
        let mut pointers = self.pointers.write().await;
        if pointers.contains_key(&user_id) {
            return false;
        }
        pointers.insert(user_id, store_id);
        true
    }
}
