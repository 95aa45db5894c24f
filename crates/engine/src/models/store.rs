//! Store domain model.

use std::collections::{BTreeMap, BTreeSet};

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use storekeeper_core::{ListingId, NotificationKind, StoreId, StoreStatus, UserId};

use super::plan::{Plan, PlanSnapshot};

/// A merchant storefront with a bounded lifetime and a listing quota.
///
/// `status` is a cache of what the lifecycle evaluator last settled on. The
/// authoritative state is the set of timestamps; see
/// [`crate::services::lifecycle`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Store {
    /// Unique store ID.
    pub id: StoreId,
    /// User who owns the store.
    pub owner_id: UserId,
    /// Display name.
    pub name: String,
    /// Optional storefront description.
    #[serde(default)]
    pub description: Option<String>,
    /// Plan terms of the current period.
    pub plan: PlanSnapshot,
    /// When the store was opened.
    pub created_at: DateTime<Utc>,
    /// When the store record last changed.
    pub updated_at: DateTime<Utc>,
    /// End of the current plan period.
    pub expires_at: DateTime<Utc>,
    /// Last settled lifecycle status.
    #[serde(default)]
    pub status: StoreStatus,
    /// Whether buyers can see the store.
    pub is_active: bool,
    /// End of the grace period, set on first entry into it.
    #[serde(default)]
    pub grace_period_ends_at: Option<DateTime<Utc>>,
    /// First time the store was observed deactivated.
    #[serde(default)]
    pub deactivated_at: Option<DateTime<Utc>>,
    /// When the store was archived (by age or by deletion).
    #[serde(default)]
    pub archived_at: Option<DateTime<Utc>>,
    /// Listings counted against the quota.
    #[serde(default)]
    pub ads_used: u32,
    /// Listings taken down before their natural end.
    #[serde(default)]
    pub deleted_listing_ids: BTreeSet<ListingId>,
    /// Followers and when they started following.
    #[serde(default)]
    pub followers: BTreeMap<UserId, DateTime<Utc>>,
    /// When the last expiration notification was emitted.
    #[serde(default)]
    pub last_notification_at: Option<DateTime<Utc>>,
    /// Kind of the last expiration notification.
    #[serde(default)]
    pub last_notification_kind: Option<NotificationKind>,
    /// Day threshold of the last expiry warning in this plan period.
    #[serde(default)]
    pub last_warning_threshold: Option<i64>,
    /// Buyer ratings.
    #[serde(default)]
    pub rating: RatingSummary,
}

/// Parameters for opening a new store.
#[derive(Debug, Clone)]
pub struct CreateStore {
    /// Owner of the new store.
    pub owner_id: UserId,
    /// Display name.
    pub name: String,
    /// Optional description.
    pub description: Option<String>,
    /// Plan to open the store with.
    pub plan_id: storekeeper_core::PlanId,
}

/// Explicit owner edits. `None` leaves a field untouched.
#[derive(Debug, Clone, Default)]
pub struct StoreUpdate {
    /// New display name.
    pub name: Option<String>,
    /// New description; `Some(None)` clears it.
    pub description: Option<Option<String>>,
}

impl Store {
    /// Open a new store on `plan`, starting its first period at `now`.
    #[must_use]
    pub fn open(id: StoreId, params: CreateStore, plan: &Plan, now: DateTime<Utc>) -> Self {
        Self {
            id,
            owner_id: params.owner_id,
            name: params.name,
            description: params.description,
            plan: PlanSnapshot::from(plan),
            created_at: now,
            updated_at: now,
            expires_at: now + plan.duration(),
            status: StoreStatus::Active,
            is_active: true,
            grace_period_ends_at: None,
            deactivated_at: None,
            archived_at: None,
            ads_used: 0,
            deleted_listing_ids: BTreeSet::new(),
            followers: BTreeMap::new(),
            last_notification_at: None,
            last_notification_kind: None,
            last_warning_threshold: None,
            rating: RatingSummary::default(),
        }
    }

    /// IDs of users following the store.
    #[must_use]
    pub fn follower_ids(&self) -> Vec<UserId> {
        self.followers.keys().copied().collect()
    }

    /// Apply owner edits.
    pub fn apply_update(&mut self, update: StoreUpdate, now: DateTime<Utc>) {
        if let Some(name) = update.name {
            self.name = name;
        }
        if let Some(description) = update.description {
            self.description = description;
        }
        self.updated_at = now;
    }
}

/// Aggregate of buyer ratings (1 to 5 stars).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct RatingSummary {
    /// Number of ratings received.
    pub count: u32,
    /// Sum of all star values.
    pub total: u32,
}

impl RatingSummary {
    /// Record one rating.
    pub fn record(&mut self, stars: u8) {
        self.count = self.count.saturating_add(1);
        self.total = self.total.saturating_add(u32::from(stars));
    }

    /// Mean rating, if any ratings exist.
    #[must_use]
    pub fn average(&self) -> Option<f64> {
        (self.count > 0).then(|| f64::from(self.total) / f64::from(self.count))
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use chrono::TimeZone;
    use storekeeper_core::{CurrencyCode, PlanId, Price};

    use super::*;

    fn plan() -> Plan {
        Plan {
            id: PlanId::new(1),
            name: "Basic".to_string(),
            price: Price::from_cents(999, CurrencyCode::USD),
            max_ads: 10,
            duration_days: 30,
        }
    }

    #[test]
    fn test_open_starts_first_period() {
        let now = Utc.with_ymd_and_hms(2026, 1, 1, 0, 0, 0).unwrap();
        let store = Store::open(
            StoreId::new(1),
            CreateStore {
                owner_id: UserId::new(5),
                name: "Casa Verde".to_string(),
                description: None,
                plan_id: PlanId::new(1),
            },
            &plan(),
            now,
        );

        assert_eq!(store.expires_at, Utc.with_ymd_and_hms(2026, 1, 31, 0, 0, 0).unwrap());
        assert_eq!(store.status, StoreStatus::Active);
        assert!(store.is_active);
        assert_eq!(store.plan.max_ads, 10);
        assert_eq!(store.ads_used, 0);
    }

    #[test]
    fn test_apply_update_only_touches_given_fields() {
        let now = Utc.with_ymd_and_hms(2026, 1, 1, 0, 0, 0).unwrap();
        let later = now + chrono::TimeDelta::hours(1);
        let mut store = Store::open(
            StoreId::new(1),
            CreateStore {
                owner_id: UserId::new(5),
                name: "Casa Verde".to_string(),
                description: Some("Plants".to_string()),
                plan_id: PlanId::new(1),
            },
            &plan(),
            now,
        );

        store.apply_update(
            StoreUpdate {
                name: Some("Casa Azul".to_string()),
                description: None,
            },
            later,
        );
        assert_eq!(store.name, "Casa Azul");
        assert_eq!(store.description.as_deref(), Some("Plants"));
        assert_eq!(store.updated_at, later);

        store.apply_update(
            StoreUpdate {
                name: None,
                description: Some(None),
            },
            later,
        );
        assert_eq!(store.description, None);
    }

    #[test]
    fn test_rating_average() {
        let mut rating = RatingSummary::default();
        assert_eq!(rating.average(), None);

        rating.record(5);
        rating.record(4);
        assert_eq!(rating.count, 2);
        assert!((rating.average().unwrap() - 4.5).abs() < f64::EPSILON);
    }
}
