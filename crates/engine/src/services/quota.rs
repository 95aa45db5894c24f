//! Listing quota rules.
//!
//! These functions operate on an already reconciled store; the engine holds
//! the store's write lock across the reconcile and the quota update.

use serde::{Deserialize, Serialize};

use storekeeper_core::{ListingId, StoreStatus};

use crate::error::EngineError;
use crate::models::Store;

/// Listing usage of a store.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Usage {
    pub used: u32,
    pub max: u32,
    pub remaining: u32,
    /// Listings taken down early (still counted in `used`).
    pub deleted_count: usize,
}

/// Whether the store may publish another listing while in `status`.
#[must_use]
pub const fn can_add_listing(store: &Store, status: StoreStatus) -> bool {
    status.is_operational() && store.ads_used < store.plan.max_ads
}

/// Count one more listing against the quota.
///
/// # Errors
///
/// Returns `EngineError::QuotaExceeded` without touching the store if the
/// quota is used up or the store is not operational.
pub fn record_listing_added(store: &mut Store) -> Result<(), EngineError> {
    if !can_add_listing(store, store.status) {
        return Err(EngineError::QuotaExceeded {
            store_id: store.id,
            used: store.ads_used,
            max: store.plan.max_ads,
        });
    }
    store.ads_used += 1;
    Ok(())
}

/// Release one listing from the quota, never going below zero.
pub const fn record_listing_removed(store: &mut Store) {
    store.ads_used = store.ads_used.saturating_sub(1);
}

/// Mark a listing as taken down early.
///
/// The listing keeps counting toward `ads_used`. Returns `false` if it was
/// already marked.
pub fn record_listing_deleted_early(store: &mut Store, listing_id: ListingId) -> bool {
    store.deleted_listing_ids.insert(listing_id)
}

/// Usage projection.
#[must_use]
pub fn usage(store: &Store) -> Usage {
    Usage {
        used: store.ads_used,
        max: store.plan.max_ads,
        remaining: store.plan.max_ads.saturating_sub(store.ads_used),
        deleted_count: store.deleted_listing_ids.len(),
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use chrono::{TimeZone, Utc};
    use storekeeper_core::{CurrencyCode, PlanId, Price, StoreId, UserId};

    use super::*;
    use crate::models::{CreateStore, Plan};

    fn store_with(max_ads: u32, ads_used: u32) -> Store {
        let plan = Plan {
            id: PlanId::new(2),
            name: "Basic".to_string(),
            price: Price::from_cents(999, CurrencyCode::USD),
            max_ads,
            duration_days: 30,
        };
        let mut store = Store::open(
            StoreId::new(1),
            CreateStore {
                owner_id: UserId::new(1),
                name: "Casa Verde".to_string(),
                description: None,
                plan_id: plan.id,
            },
            &plan,
            Utc.with_ymd_and_hms(2026, 1, 1, 0, 0, 0).unwrap(),
        );
        store.ads_used = ads_used;
        store
    }

    #[test]
    fn test_can_add_listing_requires_room_and_operational_status() {
        let store = store_with(10, 9);
        assert!(can_add_listing(&store, StoreStatus::Active));
        assert!(can_add_listing(&store, StoreStatus::GracePeriod));
        assert!(!can_add_listing(&store, StoreStatus::Deactivated));
        assert!(!can_add_listing(&store, StoreStatus::Archived));

        let full = store_with(10, 10);
        assert!(!can_add_listing(&full, StoreStatus::Active));
    }

    #[test]
    fn test_add_increments_by_one() {
        let mut store = store_with(10, 3);
        record_listing_added(&mut store).unwrap();
        assert_eq!(store.ads_used, 4);
    }

    #[test]
    fn test_add_at_limit_fails_without_change() {
        let mut store = store_with(10, 10);
        let err = record_listing_added(&mut store).unwrap_err();
        assert!(matches!(
            err,
            EngineError::QuotaExceeded { used: 10, max: 10, .. }
        ));
        assert_eq!(store.ads_used, 10);
    }

    #[test]
    fn test_add_on_deactivated_store_fails() {
        let mut store = store_with(10, 0);
        store.status = StoreStatus::Deactivated;
        assert!(record_listing_added(&mut store).is_err());
        assert_eq!(store.ads_used, 0);
    }

    #[test]
    fn test_remove_floors_at_zero() {
        let mut store = store_with(10, 1);
        record_listing_removed(&mut store);
        record_listing_removed(&mut store);
        assert_eq!(store.ads_used, 0);
    }

    #[test]
    fn test_early_deletion_keeps_quota_consumed() {
        let mut store = store_with(10, 4);
        assert!(record_listing_deleted_early(&mut store, ListingId::new(7)));
        assert!(!record_listing_deleted_early(&mut store, ListingId::new(7)));

        let usage = usage(&store);
        assert_eq!(usage.used, 4);
        assert_eq!(usage.remaining, 6);
        assert_eq!(usage.deleted_count, 1);
    }

    #[test]
    fn test_usage_when_over_limit_after_downgrade() {
        let store = store_with(3, 5);
        let usage = usage(&store);
        assert_eq!(usage.remaining, 0);
        assert_eq!(usage.max, 3);
    }
}
