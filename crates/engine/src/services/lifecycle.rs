//! Lifecycle evaluator.
//!
//! Maps a store's timestamps and the current instant to a [`StoreStatus`].
//! [`compute_status`] is pure; [`reconcile`] writes the markers the
//! evaluation settles on back into the store. Every write sets a field to the
//! value it would settle to anyway, so reconciling twice with the same `now`
//! is a no-op.
//!
//! Decision order, first match wins:
//!
//! 1. `archived_at` set: `Archived` (only reactivation leaves this state)
//! 2. deactivated for at least `archive_after`: `Archived`, stamping `archived_at`
//! 3. `now <= expires_at`: `Active`
//! 4. expired, within the grace window: `GracePeriod`, stamping `grace_period_ends_at`
//! 5. expired, past the grace window: `Deactivated`, stamping `deactivated_at`

use chrono::{DateTime, TimeDelta, Utc};
use serde::{Deserialize, Serialize};

use storekeeper_core::StoreStatus;

use crate::models::Store;

const SECONDS_PER_DAY: i64 = 86_400;

/// Time thresholds driving lifecycle transitions.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LifecyclePolicy {
    /// How long an expired store stays visible.
    pub grace_period: TimeDelta,
    /// How long a deactivated store waits before being archived.
    pub archive_after: TimeDelta,
}

impl Default for LifecyclePolicy {
    fn default() -> Self {
        Self {
            grace_period: TimeDelta::days(7),
            archive_after: TimeDelta::days(90),
        }
    }
}

/// Result of evaluating a store at an instant.
///
/// Carries the status together with the marker values the store settles on.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Evaluation {
    pub status: StoreStatus,
    pub grace_period_ends_at: Option<DateTime<Utc>>,
    pub deactivated_at: Option<DateTime<Utc>>,
    pub archived_at: Option<DateTime<Utc>>,
}

/// What [`reconcile`] changed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Transition {
    /// Cached status before reconciling.
    pub from: StoreStatus,
    /// Status after reconciling.
    pub to: StoreStatus,
    /// Whether any field was written.
    pub changed: bool,
}

impl Transition {
    /// Whether this reconcile moved the store into `status`.
    #[must_use]
    pub fn entered(&self, status: StoreStatus) -> bool {
        self.from != status && self.to == status
    }
}

/// Evaluate a store without modifying it.
#[must_use]
pub fn compute_status(store: &Store, now: DateTime<Utc>, policy: &LifecyclePolicy) -> Evaluation {
    let settled = |status: StoreStatus| Evaluation {
        status,
        grace_period_ends_at: store.grace_period_ends_at,
        deactivated_at: store.deactivated_at,
        archived_at: store.archived_at,
    };

    if store.archived_at.is_some() {
        return settled(StoreStatus::Archived);
    }

    let archive_due = store
        .deactivated_at
        .is_some_and(|deactivated_at| now - deactivated_at >= policy.archive_after);
    if archive_due {
        return Evaluation {
            archived_at: Some(now),
            ..settled(StoreStatus::Archived)
        };
    }

    if now <= store.expires_at {
        return settled(StoreStatus::Active);
    }

    // A store first seen after its whole grace window elapsed goes straight
    // to deactivated without a grace marker.
    let grace_end = store.grace_period_ends_at.or_else(|| {
        store
            .deactivated_at
            .is_none()
            .then(|| store.expires_at + policy.grace_period)
    });

    match grace_end {
        Some(end) if now <= end => Evaluation {
            grace_period_ends_at: Some(end),
            ..settled(StoreStatus::GracePeriod)
        },
        _ => Evaluation {
            deactivated_at: store.deactivated_at.or(Some(now)),
            ..settled(StoreStatus::Deactivated)
        },
    }
}

/// Evaluate a store and persist the result into it.
pub fn reconcile(store: &mut Store, now: DateTime<Utc>, policy: &LifecyclePolicy) -> Transition {
    let evaluation = compute_status(store, now, policy);
    let from = store.status;
    let is_active = evaluation.status.is_operational();

    let changed = store.status != evaluation.status
        || store.grace_period_ends_at != evaluation.grace_period_ends_at
        || store.deactivated_at != evaluation.deactivated_at
        || store.archived_at != evaluation.archived_at
        || store.is_active != is_active;

    if changed {
        store.status = evaluation.status;
        store.grace_period_ends_at = evaluation.grace_period_ends_at;
        store.deactivated_at = evaluation.deactivated_at;
        store.archived_at = evaluation.archived_at;
        store.is_active = is_active;
        store.updated_at = now;
    }

    Transition {
        from,
        to: evaluation.status,
        changed,
    }
}

/// What the owner should do next.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum NextAction {
    /// Nothing is due yet.
    None,
    /// Renew before the store stops being visible.
    Renew,
    /// Reactivate with a new plan.
    Reactivate,
}

/// Expiration summary for display.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExpirationInfo {
    pub status: StoreStatus,
    /// Whole days (rounded up) until the plan period ends; 0 once expired.
    pub days_until_expiration: i64,
    /// Days (rounded up) left in the grace period, while in it.
    pub days_in_grace_period: Option<i64>,
    /// Days (rounded up) since deactivation, once it has been recorded.
    pub days_since_deactivation: Option<i64>,
    pub can_reactivate: bool,
    pub next_action: NextAction,
    /// When the next action becomes pressing (expiry, grace end, archive).
    /// The archive date is only known once deactivation has been recorded.
    pub next_action_date: Option<DateTime<Utc>>,
}

/// Days before expiry from which renewal is suggested.
const RENEWAL_HORIZON_DAYS: i64 = 7;

/// Summarize a store's expiration state at `now`. Pure.
#[must_use]
pub fn expiration_info(
    store: &Store,
    now: DateTime<Utc>,
    policy: &LifecyclePolicy,
) -> ExpirationInfo {
    let evaluation = compute_status(store, now, policy);
    let days_until_expiration = ceil_days(store.expires_at - now);

    // Only a recorded deactivation starts the archive clock. An evaluation
    // past the grace window that was never persisted would stamp `now`.
    let recorded_deactivation = store.deactivated_at;
    let days_since_deactivation = recorded_deactivation
        .filter(|_| {
            matches!(
                evaluation.status,
                StoreStatus::Deactivated | StoreStatus::Archived
            )
        })
        .map(|at| ceil_days(now - at));

    let (days_in_grace_period, next_action, next_action_date) = match evaluation.status {
        StoreStatus::Active => {
            let action = if days_until_expiration <= RENEWAL_HORIZON_DAYS {
                NextAction::Renew
            } else {
                NextAction::None
            };
            (None, action, Some(store.expires_at))
        }
        StoreStatus::GracePeriod => {
            let end = evaluation.grace_period_ends_at;
            (
                end.map(|end| ceil_days(end - now)),
                NextAction::Renew,
                end,
            )
        }
        StoreStatus::Deactivated => (
            None,
            NextAction::Reactivate,
            recorded_deactivation.map(|at| at + policy.archive_after),
        ),
        StoreStatus::Archived => (None, NextAction::Reactivate, None),
    };

    ExpirationInfo {
        status: evaluation.status,
        days_until_expiration,
        days_in_grace_period,
        days_since_deactivation,
        can_reactivate: !evaluation.status.is_operational(),
        next_action,
        next_action_date,
    }
}

/// Whole days in `delta`, rounded up. Zero or negative spans count as 0.
#[must_use]
pub fn ceil_days(delta: TimeDelta) -> i64 {
    let seconds = delta.num_seconds();
    if seconds <= 0 {
        return 0;
    }
    (seconds + SECONDS_PER_DAY - 1) / SECONDS_PER_DAY
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use chrono::TimeZone;
    use storekeeper_core::{CurrencyCode, PlanId, Price, StoreId, UserId};

    use super::*;
    use crate::models::{CreateStore, Plan};

    /// Day `n` of the test calendar, 1-based like the store's creation day.
    fn day(n: i64) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2026, 1, 1, 0, 0, 0).unwrap() + TimeDelta::days(n - 1)
    }

    fn store_created_on(n: i64) -> Store {
        let plan = Plan {
            id: PlanId::new(2),
            name: "Basic".to_string(),
            price: Price::from_cents(999, CurrencyCode::USD),
            max_ads: 10,
            duration_days: 30,
        };
        Store::open(
            StoreId::new(1),
            CreateStore {
                owner_id: UserId::new(1),
                name: "Casa Verde".to_string(),
                description: None,
                plan_id: plan.id,
            },
            &plan,
            day(n),
        )
    }

    #[test]
    fn test_active_until_expiry_inclusive() {
        let policy = LifecyclePolicy::default();
        let store = store_created_on(1);

        assert_eq!(compute_status(&store, day(1), &policy).status, StoreStatus::Active);
        assert_eq!(
            compute_status(&store, store.expires_at, &policy).status,
            StoreStatus::Active
        );
    }

    #[test]
    fn test_first_grace_entry_sets_marker() {
        let policy = LifecyclePolicy::default();
        let mut store = store_created_on(1);
        let now = day(31) + TimeDelta::hours(1);

        let transition = reconcile(&mut store, now, &policy);

        assert_eq!(transition.to, StoreStatus::GracePeriod);
        assert!(transition.entered(StoreStatus::GracePeriod));
        assert_eq!(store.grace_period_ends_at, Some(day(38)));
        assert!(store.is_active);
        assert_eq!(store.deactivated_at, None);
    }

    #[test]
    fn test_grace_marker_is_not_moved_by_later_evaluations() {
        let policy = LifecyclePolicy::default();
        let mut store = store_created_on(1);
        reconcile(&mut store, day(32), &policy);
        let marker = store.grace_period_ends_at;

        reconcile(&mut store, day(36), &policy);
        assert_eq!(store.grace_period_ends_at, marker);
        assert_eq!(store.status, StoreStatus::GracePeriod);
    }

    #[test]
    fn test_grace_ends_inclusive_then_deactivates() {
        let policy = LifecyclePolicy::default();
        let mut store = store_created_on(1);
        reconcile(&mut store, day(32), &policy);

        assert_eq!(
            compute_status(&store, day(38), &policy).status,
            StoreStatus::GracePeriod
        );

        let after = day(38) + TimeDelta::seconds(1);
        let transition = reconcile(&mut store, after, &policy);
        assert_eq!(transition.to, StoreStatus::Deactivated);
        assert_eq!(store.deactivated_at, Some(after));
        assert!(!store.is_active);
    }

    #[test]
    fn test_sparse_evaluation_skips_grace() {
        let policy = LifecyclePolicy::default();
        let mut store = store_created_on(1);
        let now = day(50);

        let transition = reconcile(&mut store, now, &policy);
        assert_eq!(transition.from, StoreStatus::Active);
        assert_eq!(transition.to, StoreStatus::Deactivated);
        assert_eq!(store.grace_period_ends_at, None);
        assert_eq!(store.deactivated_at, Some(now));
    }

    #[test]
    fn test_archive_after_ninety_days() {
        let policy = LifecyclePolicy::default();
        let mut store = store_created_on(1);
        let t0 = day(40);
        reconcile(&mut store, t0, &policy);
        assert_eq!(store.deactivated_at, Some(t0));

        let transition = reconcile(&mut store, t0 + TimeDelta::days(89), &policy);
        assert_eq!(transition.to, StoreStatus::Deactivated);
        assert_eq!(store.archived_at, None);

        let archive_time = t0 + TimeDelta::days(90);
        let transition = reconcile(&mut store, archive_time, &policy);
        assert_eq!(transition.to, StoreStatus::Archived);
        assert_eq!(store.archived_at, Some(archive_time));

        // Later evaluations keep the first archive timestamp.
        reconcile(&mut store, archive_time + TimeDelta::days(10), &policy);
        assert_eq!(store.archived_at, Some(archive_time));
        assert_eq!(store.status, StoreStatus::Archived);
    }

    #[test]
    fn test_archived_is_sticky_even_before_expiry() {
        let policy = LifecyclePolicy::default();
        let mut store = store_created_on(1);
        store.archived_at = Some(day(2));

        assert_eq!(
            compute_status(&store, day(3), &policy).status,
            StoreStatus::Archived
        );
    }

    #[test]
    fn test_reconcile_is_idempotent() {
        let policy = LifecyclePolicy::default();
        let mut store = store_created_on(1);
        for now in [day(10), day(32), day(45), day(140)] {
            let first = reconcile(&mut store, now, &policy);
            let snapshot = store.clone();
            let second = reconcile(&mut store, now, &policy);

            assert_eq!(first.to, second.to);
            assert!(!second.changed);
            assert_eq!(store, snapshot);
        }
    }

    #[test]
    fn test_compute_status_is_pure() {
        let policy = LifecyclePolicy::default();
        let store = store_created_on(1);
        let before = store.clone();

        let evaluation = compute_status(&store, day(33), &policy);
        assert_eq!(evaluation.status, StoreStatus::GracePeriod);
        assert_eq!(store, before);
    }

    #[test]
    fn test_custom_policy() {
        let policy = LifecyclePolicy {
            grace_period: TimeDelta::days(2),
            archive_after: TimeDelta::days(10),
        };
        let mut store = store_created_on(1);

        reconcile(&mut store, day(32), &policy);
        assert_eq!(store.grace_period_ends_at, Some(day(33)));

        reconcile(&mut store, day(34), &policy);
        assert_eq!(store.status, StoreStatus::Deactivated);

        reconcile(&mut store, day(44), &policy);
        assert_eq!(store.status, StoreStatus::Archived);
    }

    #[test]
    fn test_ceil_days() {
        assert_eq!(ceil_days(TimeDelta::zero()), 0);
        assert_eq!(ceil_days(TimeDelta::hours(-5)), 0);
        assert_eq!(ceil_days(TimeDelta::seconds(1)), 1);
        assert_eq!(ceil_days(TimeDelta::days(1)), 1);
        assert_eq!(ceil_days(TimeDelta::days(1) + TimeDelta::seconds(1)), 2);
        assert_eq!(ceil_days(TimeDelta::days(7)), 7);
    }

    #[test]
    fn test_expiration_info_active() {
        let policy = LifecyclePolicy::default();
        let store = store_created_on(1);

        let info = expiration_info(&store, day(11), &policy);
        assert_eq!(info.status, StoreStatus::Active);
        assert_eq!(info.days_until_expiration, 20);
        assert_eq!(info.next_action, NextAction::None);
        assert_eq!(info.next_action_date, Some(store.expires_at));
        assert!(!info.can_reactivate);

        let info = expiration_info(&store, day(26), &policy);
        assert_eq!(info.days_until_expiration, 5);
        assert_eq!(info.next_action, NextAction::Renew);
    }

    #[test]
    fn test_expiration_info_grace_and_deactivated() {
        let policy = LifecyclePolicy::default();
        let mut store = store_created_on(1);
        reconcile(&mut store, day(31) + TimeDelta::hours(1), &policy);

        let info = expiration_info(&store, day(31) + TimeDelta::hours(1), &policy);
        assert_eq!(info.status, StoreStatus::GracePeriod);
        assert_eq!(info.days_until_expiration, 0);
        assert_eq!(info.days_in_grace_period, Some(7));
        assert_eq!(info.next_action, NextAction::Renew);
        assert_eq!(info.next_action_date, Some(day(38)));

        let deactivation = day(39);
        reconcile(&mut store, deactivation, &policy);
        let info = expiration_info(&store, day(41), &policy);
        assert_eq!(info.status, StoreStatus::Deactivated);
        assert_eq!(info.days_since_deactivation, Some(2));
        assert!(info.can_reactivate);
        assert_eq!(info.next_action, NextAction::Reactivate);
        assert_eq!(
            info.next_action_date,
            Some(deactivation + TimeDelta::days(90))
        );
    }

    #[test]
    fn test_expiration_info_stable_before_deactivation_recorded() {
        let policy = LifecyclePolicy::default();
        let store = store_created_on(1);

        let first = expiration_info(&store, day(45), &policy);
        let later = expiration_info(&store, day(50), &policy);
        assert_eq!(first.status, StoreStatus::Deactivated);
        assert_eq!(first.days_since_deactivation, None);
        assert_eq!(first.next_action_date, None);
        assert_eq!(first.next_action, NextAction::Reactivate);
        assert_eq!(later.days_since_deactivation, None);
        assert_eq!(later.next_action_date, None);
        assert_eq!(store.deactivated_at, None);
    }
}
