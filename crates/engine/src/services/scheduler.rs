//! Expiration notification scheduler.
//!
//! Decides, right after a store has been reconciled, whether its owner should
//! hear about it:
//!
//! | Condition                                   | Kind           |
//! |---------------------------------------------|----------------|
//! | active, 7, 3 or 1 day(s) before expiry      | `warning`      |
//! | just moved into the grace period            | `grace_period` |
//! | just deactivated                            | `deactivated`  |
//!
//! Grace and deactivation notices key off the detected transition, not an
//! exact day count, so a store that is evaluated rarely still gets them. Any
//! notice is suppressed if another went out within the dedup window, whatever
//! its kind, and each warning threshold fires at most once per plan period.

use chrono::{DateTime, TimeDelta, Utc};
use tracing::debug;

use storekeeper_core::{Locale, NotificationId, NotificationKind, StoreStatus};

use super::lifecycle::{Transition, ceil_days};
use super::messages::{self, MessageKey};
use crate::models::{ExpirationNotification, Store};

/// Days-before-expiry at which warnings go out.
pub const WARNING_DAYS: [i64; 3] = [7, 3, 1];

/// Notification scheduling rules.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NotificationPolicy {
    /// Minimum spacing between two notices to the same store.
    pub dedup_window: TimeDelta,
    /// Days-before-expiry that trigger a warning.
    pub warning_days: Vec<i64>,
    /// Language of the rendered message.
    pub locale: Locale,
}

impl Default for NotificationPolicy {
    fn default() -> Self {
        Self {
            dedup_window: TimeDelta::hours(12),
            warning_days: WARNING_DAYS.to_vec(),
            locale: Locale::default(),
        }
    }
}

/// A notice that should be emitted.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DueNotification {
    pub kind: NotificationKind,
    /// Day count shown in the message (days left, or days since).
    pub days: i64,
}

/// Decide whether the reconciled store needs a notice. Pure.
#[must_use]
pub fn due_notification(
    store: &Store,
    transition: &Transition,
    now: DateTime<Utc>,
    policy: &NotificationPolicy,
) -> Option<DueNotification> {
    let candidate = match transition.to {
        StoreStatus::Active => {
            let days = ceil_days(store.expires_at - now);
            let due = days > 0
                && policy.warning_days.contains(&days)
                && store.last_warning_threshold != Some(days);
            due.then_some(DueNotification {
                kind: NotificationKind::Warning,
                days,
            })
        }
        StoreStatus::GracePeriod if transition.entered(StoreStatus::GracePeriod) => {
            Some(DueNotification {
                kind: NotificationKind::GracePeriod,
                days: store
                    .grace_period_ends_at
                    .map_or(0, |end| ceil_days(end - now)),
            })
        }
        StoreStatus::Deactivated if transition.entered(StoreStatus::Deactivated) => {
            Some(DueNotification {
                kind: NotificationKind::Deactivated,
                days: store.deactivated_at.map_or(0, |at| ceil_days(now - at)),
            })
        }
        _ => None,
    }?;

    if is_suppressed(store, now, policy) {
        debug!(
            store_id = %store.id,
            kind = %candidate.kind,
            "Suppressing duplicate expiration notification"
        );
        return None;
    }

    Some(candidate)
}

fn is_suppressed(store: &Store, now: DateTime<Utc>, policy: &NotificationPolicy) -> bool {
    store
        .last_notification_at
        .is_some_and(|at| now - at < policy.dedup_window)
}

/// Record the notice on the store and build the notification.
pub fn emit(
    store: &mut Store,
    due: DueNotification,
    now: DateTime<Utc>,
    policy: &NotificationPolicy,
) -> ExpirationNotification {
    store.last_notification_at = Some(now);
    store.last_notification_kind = Some(due.kind);
    if due.kind == NotificationKind::Warning {
        store.last_warning_threshold = Some(due.days);
    }

    ExpirationNotification {
        id: NotificationId::generate(),
        store_id: store.id,
        owner_id: store.owner_id,
        kind: due.kind,
        created_at: now,
        read: false,
        message: messages::render(
            MessageKey::Expiration(due.kind),
            policy.locale,
            &store.name,
            due.days,
        ),
    }
}

/// Decide and, if due, emit a notice for a freshly reconciled store.
pub fn schedule(
    store: &mut Store,
    transition: &Transition,
    now: DateTime<Utc>,
    policy: &NotificationPolicy,
) -> Option<ExpirationNotification> {
    let due = due_notification(store, transition, now, policy)?;
    Some(emit(store, due, now, policy))
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use chrono::TimeZone;
    use storekeeper_core::{CurrencyCode, PlanId, Price, StoreId, UserId};

    use super::*;
    use crate::models::{CreateStore, Plan};
    use crate::services::lifecycle::{LifecyclePolicy, reconcile};

    fn start() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2026, 1, 1, 0, 0, 0).unwrap()
    }

    fn store() -> Store {
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
                owner_id: UserId::new(9),
                name: "Casa Verde".to_string(),
                description: None,
                plan_id: plan.id,
            },
            &plan,
            start(),
        )
    }

    fn evaluate(store: &mut Store, now: DateTime<Utc>) -> Option<ExpirationNotification> {
        let transition = reconcile(store, now, &LifecyclePolicy::default());
        schedule(store, &transition, now, &NotificationPolicy::default())
    }

    #[test]
    fn test_no_warning_far_from_expiry() {
        let mut store = store();
        assert!(evaluate(&mut store, start() + TimeDelta::days(10)).is_none());
    }

    #[test]
    fn test_warning_at_seven_days() {
        let mut store = store();
        let now = store.expires_at - TimeDelta::days(7);

        let notification = evaluate(&mut store, now).unwrap();
        assert_eq!(notification.kind, NotificationKind::Warning);
        assert_eq!(notification.owner_id, UserId::new(9));
        assert!(notification.message.contains("7 day(s)"));
        assert!(!notification.read);
        assert_eq!(store.last_notification_at, Some(now));
        assert_eq!(store.last_warning_threshold, Some(7));
    }

    #[test]
    fn test_two_evaluations_within_window_emit_once() {
        let mut store = store();
        let first = store.expires_at - TimeDelta::days(7);

        assert!(evaluate(&mut store, first).is_some());
        assert!(evaluate(&mut store, first + TimeDelta::hours(11)).is_none());
    }

    #[test]
    fn test_same_threshold_not_repeated_after_window() {
        let mut store = store();
        let first = store.expires_at - TimeDelta::days(7);

        assert!(evaluate(&mut store, first).is_some());
        // Still in the 7-day bucket but past the dedup window.
        assert!(evaluate(&mut store, first + TimeDelta::hours(13)).is_none());
    }

    #[test]
    fn test_each_threshold_fires_once() {
        let mut store = store();
        let mut kinds = Vec::new();
        let mut now = start();
        while now <= store.expires_at {
            if let Some(notification) = evaluate(&mut store, now) {
                kinds.push((notification.kind, ceil_days(store.expires_at - now)));
            }
            now += TimeDelta::hours(6);
        }
        assert_eq!(
            kinds,
            vec![
                (NotificationKind::Warning, 7),
                (NotificationKind::Warning, 3),
                (NotificationKind::Warning, 1),
            ]
        );
    }

    #[test]
    fn test_grace_notice_on_transition() {
        let mut store = store();
        let now = store.expires_at + TimeDelta::hours(2);

        let notification = evaluate(&mut store, now).unwrap();
        assert_eq!(notification.kind, NotificationKind::GracePeriod);
        assert!(notification.message.contains("7 more day(s)"));

        // Staying in grace does not repeat it.
        assert!(evaluate(&mut store, now + TimeDelta::days(2)).is_none());
    }

    #[test]
    fn test_grace_entry_suppressed_by_recent_warning() {
        let mut store = store();
        let warning_time = store.expires_at - TimeDelta::hours(2);
        assert_eq!(
            evaluate(&mut store, warning_time).unwrap().kind,
            NotificationKind::Warning
        );

        let grace_time = store.expires_at + TimeDelta::hours(1);
        assert!(evaluate(&mut store, grace_time).is_none());
        assert_eq!(store.status, StoreStatus::GracePeriod);
        assert_eq!(store.last_notification_at, Some(warning_time));
        assert_eq!(store.last_notification_kind, Some(NotificationKind::Warning));
    }

    #[test]
    fn test_any_kind_allowed_after_window() {
        let mut store = store();
        let warning_time = store.expires_at - TimeDelta::hours(13);
        assert!(evaluate(&mut store, warning_time).is_some());

        let grace_time = store.expires_at + TimeDelta::minutes(1);
        assert_eq!(
            evaluate(&mut store, grace_time).unwrap().kind,
            NotificationKind::GracePeriod
        );
    }

    #[test]
    fn test_sparse_evaluation_still_notifies_deactivation() {
        let mut store = store();
        let now = store.expires_at + TimeDelta::days(20);

        let notification = evaluate(&mut store, now).unwrap();
        assert_eq!(notification.kind, NotificationKind::Deactivated);
        assert!(evaluate(&mut store, now + TimeDelta::days(1)).is_none());
    }

    #[test]
    fn test_archive_is_silent() {
        let mut store = store();
        let deactivation = store.expires_at + TimeDelta::days(8);
        evaluate(&mut store, deactivation);

        assert!(evaluate(&mut store, deactivation + TimeDelta::days(90)).is_none());
        assert_eq!(store.status, StoreStatus::Archived);
    }

    #[test]
    fn test_spanish_messages() {
        let mut store = store();
        let now = store.expires_at - TimeDelta::days(3);
        let transition = reconcile(&mut store, now, &LifecyclePolicy::default());
        let policy = NotificationPolicy {
            locale: Locale::Es,
            ..NotificationPolicy::default()
        };

        let notification = schedule(&mut store, &transition, now, &policy).unwrap();
        assert!(notification.message.starts_with("Tu tienda \"Casa Verde\" vence en 3"));
    }
}
