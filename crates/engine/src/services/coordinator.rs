//! Multi-store coordination.
//!
//! Selection and limit rules over the set of stores one user owns. Statuses
//! are evaluated with [`compute_status`], so these queries never write.

use chrono::{DateTime, Utc};

use storekeeper_core::StoreId;

use super::lifecycle::{LifecyclePolicy, compute_status};
use crate::models::Store;

/// Pick the store a user is working in.
///
/// `owned` must be ordered oldest first. Preference: the selected store if it
/// is still owned and operational, then the oldest operational store, then
/// the oldest store of any status.
#[must_use]
pub fn pick_active_store(
    owned: &[Store],
    selected: Option<StoreId>,
    now: DateTime<Utc>,
    policy: &LifecyclePolicy,
) -> Option<StoreId> {
    let operational = |store: &&Store| compute_status(store, now, policy).status.is_operational();

    selected
        .and_then(|id| owned.iter().find(|store| store.id == id))
        .filter(operational)
        .or_else(|| owned.iter().find(operational))
        .or_else(|| owned.first())
        .map(|store| store.id)
}

/// Number of stores that count toward the per-user limit.
#[must_use]
pub fn open_store_count(owned: &[Store], now: DateTime<Utc>, policy: &LifecyclePolicy) -> usize {
    owned
        .iter()
        .filter(|store| {
            compute_status(store, now, policy)
                .status
                .counts_toward_limit()
        })
        .count()
}

/// Whether the user may open one more store.
#[must_use]
pub fn can_open_store(
    owned: &[Store],
    limit: usize,
    now: DateTime<Utc>,
    policy: &LifecyclePolicy,
) -> bool {
    open_store_count(owned, now, policy) < limit
}
