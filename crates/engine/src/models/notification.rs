//! Expiration notifications delivered to store owners.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use storekeeper_core::{NotificationId, NotificationKind, StoreId, UserId};

/// A notification telling an owner their store is expiring or has expired.
///
/// Created only by the scheduler; the only later mutation is the read flag.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExpirationNotification {
    /// Unique notification ID.
    pub id: NotificationId,
    /// Store the notification is about.
    pub store_id: StoreId,
    /// Recipient.
    pub owner_id: UserId,
    /// What triggered the notification.
    pub kind: NotificationKind,
    /// When it was emitted.
    pub created_at: DateTime<Utc>,
    /// Whether the owner has read it.
    pub read: bool,
    /// Localized message text.
    pub message: String,
}
