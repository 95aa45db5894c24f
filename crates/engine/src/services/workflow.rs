//! Renewal, reactivation and deletion.
//!
//! | From                              | Action     | To       |
//! |-----------------------------------|------------|----------|
//! | active, grace period              | renew      | active   |
//! | deactivated, archived             | reactivate | active   |
//! | active, grace period, deactivated | delete     | archived |
//!
//! All functions expect a store that was reconciled at `now` under the same
//! write lock. Checks that need I/O (live listings, store limit) belong to
//! the caller.

use chrono::{DateTime, Utc};
use tracing::info;

use storekeeper_core::StoreStatus;

use crate::error::{EngineError, StoreAction};
use crate::models::{Plan, PlanSnapshot, Store};

/// Start a new plan period for a store that is still operational.
///
/// # Errors
///
/// Returns `EngineError::InvalidTransition` if the store is deactivated or
/// archived.
pub fn renew(store: &mut Store, plan: &Plan, now: DateTime<Utc>) -> Result<(), EngineError> {
    ensure(store, StoreAction::Renew, StoreStatus::is_operational)?;
    let from = store.status;
    start_period(store, plan, now);
    info!(store_id = %store.id, plan = %plan.name, %from, expires_at = %store.expires_at, "Renewed store");
    Ok(())
}

/// Bring a deactivated or archived store back on a new plan period.
///
/// # Errors
///
/// Returns `EngineError::InvalidTransition` if the store is still
/// operational (renew it instead).
pub fn reactivate(store: &mut Store, plan: &Plan, now: DateTime<Utc>) -> Result<(), EngineError> {
    ensure(store, StoreAction::Reactivate, |status| !status.is_operational())?;
    let from = store.status;
    start_period(store, plan, now);
    info!(store_id = %store.id, plan = %plan.name, %from, expires_at = %store.expires_at, "Reactivated store");
    Ok(())
}

/// Soft-delete a store by archiving it.
///
/// # Errors
///
/// Returns `EngineError::InvalidTransition` if the store is already archived.
pub fn close(store: &mut Store, now: DateTime<Utc>) -> Result<(), EngineError> {
    ensure(store, StoreAction::Delete, |status| *status != StoreStatus::Archived)?;
    store.archived_at = Some(now);
    store.status = StoreStatus::Archived;
    store.is_active = false;
    store.updated_at = now;
    info!(store_id = %store.id, "Closed store");
    Ok(())
}

/// Reject `action` unless the store's status satisfies `allowed`.
///
/// # Errors
///
/// Returns `EngineError::InvalidTransition` naming the action and status.
pub fn ensure(
    store: &Store,
    action: StoreAction,
    allowed: impl FnOnce(&StoreStatus) -> bool,
) -> Result<(), EngineError> {
    if allowed(&store.status) {
        Ok(())
    } else {
        Err(EngineError::InvalidTransition {
            action,
            status: store.status,
        })
    }
}

/// Reset the store onto a fresh period of `plan`.
///
/// Followers, ratings and the early-deletion history carry over; the dedup
/// timestamps stay so a renewal does not reopen the 12-hour window.
fn start_period(store: &mut Store, plan: &Plan, now: DateTime<Utc>) {
    store.plan = PlanSnapshot::from(plan);
    store.expires_at = now + plan.duration();
    store.status = StoreStatus::Active;
    store.is_active = true;
    store.grace_period_ends_at = None;
    store.deactivated_at = None;
    store.archived_at = None;
    store.ads_used = store.ads_used.min(plan.max_ads);
    store.last_warning_threshold = None;
    store.updated_at = now;
}
