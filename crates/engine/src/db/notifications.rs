//! Expiration notification repository.

use std::collections::HashMap;

use tokio::sync::RwLock;

use storekeeper_core::{NotificationId, StoreId, UserId};

use super::RepositoryError;
use crate::models::ExpirationNotification;

/// Repository of expiration notifications, grouped by owner.
#[derive(Debug, Default)]
pub struct NotificationRepository {
    by_owner: RwLock<HashMap<UserId, Vec<ExpirationNotification>>>,
}

impl NotificationRepository {
    /// Create an empty repository.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Store a newly emitted notification.
    pub async fn insert(&self, notification: ExpirationNotification) {
        self.by_owner
            .write()
            .await
            .entry(notification.owner_id)
            .or_default()
            .push(notification);
    }

    /// List an owner's notifications, newest first.
    pub async fn list_for_owner(&self, owner_id: UserId) -> Vec<ExpirationNotification> {
        let mut notifications = self
            .by_owner
            .read()
            .await
            .get(&owner_id)
            .cloned()
            .unwrap_or_default();
        notifications.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        notifications
    }

    /// List the notifications emitted for one store, oldest first.
    pub async fn list_for_store(
        &self,
        owner_id: UserId,
        store_id: StoreId,
    ) -> Vec<ExpirationNotification> {
        let mut notifications: Vec<ExpirationNotification> = self
            .list_for_owner(owner_id)
            .await
            .into_iter()
            .filter(|notification| notification.store_id == store_id)
            .collect();
        notifications.reverse();
        notifications
    }

    /// Set the read flag on one of the owner's notifications.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::NotFound` if the owner has no such notification.
    pub async fn set_read(
        &self,
        owner_id: UserId,
        id: NotificationId,
        read: bool,
    ) -> Result<ExpirationNotification, RepositoryError> {
        let mut by_owner = self.by_owner.write().await;
        let notification = by_owner
            .get_mut(&owner_id)
            .and_then(|list| list.iter_mut().find(|notification| notification.id == id))
            .ok_or(RepositoryError::NotFound)?;
        notification.read = read;
        Ok(notification.clone())
    }

    /// Number of unread notifications for an owner.
    pub async fn unread_count(&self, owner_id: UserId) -> usize {
        self.by_owner
            .read()
            .await
            .get(&owner_id)
            .map_or(0, |list| list.iter().filter(|n| !n.read).count())
    }
}
