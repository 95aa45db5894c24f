//! Store engine facade.
//!
//! [`StoreEngine`] is the single entry point callers use. Every mutating
//! operation follows the same shape:
//!
//! 1. take the store's write lock
//! 2. reconcile its lifecycle at `now` and decide on an expiration notice
//! 3. apply the operation
//! 4. release the lock, then record the notice and publish events
//!
//! Queries (`get_status`, `get_usage`, ...) evaluate a snapshot and never
//! write. Collaborator I/O (the listing query) happens before the lock is
//! taken.

use std::sync::Arc;

use chrono::{DateTime, Utc};
use serde::Serialize;
use tracing::{debug, info, instrument, warn};

use storekeeper_core::{ListingId, NotificationId, PlanId, StoreId, StoreStatus, UserId};

use crate::catalog::PlanCatalog;
use crate::config::EngineConfig;
use crate::db::{ActiveStoreSelections, NotificationRepository, RepositoryError, StoreRepository};
use crate::error::{EngineError, StoreAction};
use crate::models::{CreateStore, ExpirationNotification, Plan, RatingSummary, Store, StoreUpdate};
use crate::services::coordinator;
use crate::services::dispatch::{DomainEvent, EventPublisher};
use crate::services::lifecycle::{
    self, ExpirationInfo, LifecyclePolicy, Transition, compute_status,
};
use crate::services::listings::ListingQuery;
use crate::services::quota::{self, Usage};
use crate::services::scheduler::{self, NotificationPolicy};
use crate::services::workflow;

/// Status change observed by a sweep.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct StatusChange {
    pub store_id: StoreId,
    pub from: StoreStatus,
    pub to: StoreStatus,
}

/// Outcome of [`StoreEngine::sweep`].
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct SweepReport {
    /// Stores evaluated.
    pub evaluated: usize,
    /// Stores whose status changed.
    pub changes: Vec<StatusChange>,
    /// Expiration notices emitted.
    pub notifications: usize,
}

/// The store lifecycle and quota engine.
pub struct StoreEngine {
    config: EngineConfig,
    lifecycle: LifecyclePolicy,
    notification_policy: NotificationPolicy,
    catalog: Arc<PlanCatalog>,
    stores: StoreRepository,
    notifications: NotificationRepository,
    selections: ActiveStoreSelections,
    listings: Arc<dyn ListingQuery>,
    events: EventPublisher,
}

impl StoreEngine {
    /// Create an engine with empty repositories.
    #[must_use]
    pub fn new(
        config: EngineConfig,
        catalog: Arc<PlanCatalog>,
        listings: Arc<dyn ListingQuery>,
        events: EventPublisher,
    ) -> Self {
        Self {
            lifecycle: config.lifecycle_policy(),
            notification_policy: config.notification_policy(),
            config,
            catalog,
            stores: StoreRepository::new(),
            notifications: NotificationRepository::new(),
            selections: ActiveStoreSelections::new(),
            listings,
            events,
        }
    }

    /// Configuration the engine was built with.
    #[must_use]
    pub const fn config(&self) -> &EngineConfig {
        &self.config
    }

    /// Plans available for opening and renewing stores.
    #[must_use]
    pub fn plans(&self) -> Vec<Plan> {
        self.catalog.iter().cloned().collect()
    }

    // =========================================================================
    // Store records
    // =========================================================================

    /// Open a new store for `params.owner_id`.
    ///
    /// The store becomes the owner's active selection if they have none.
    ///
    /// # Errors
    ///
    /// Returns `PlanNotFound` for an unknown plan, or `StoreLimitReached` if
    /// the owner already holds the maximum number of non-archived stores.
    #[instrument(skip(self, params), fields(owner_id = %params.owner_id, plan_id = %params.plan_id))]
    pub async fn create_store(
        &self,
        params: CreateStore,
        now: DateTime<Utc>,
    ) -> Result<Store, EngineError> {
        let plan = self.plan(params.plan_id)?;
        let owner_id = params.owner_id;
        let limit = self.config.max_stores_per_user;

        let store = self
            .stores
            .create(
                owner_id,
                |owned| {
                    if coordinator::can_open_store(owned, limit, now, &self.lifecycle) {
                        Ok(())
                    } else {
                        Err(EngineError::StoreLimitReached {
                            user_id: owner_id,
                            limit,
                        })
                    }
                },
                |id| Store::open(id, params, plan, now),
            )
            .await?;

        if self.selections.set_if_unset(owner_id, store.id).await {
            debug!(store_id = %store.id, "Selected new store as active");
        }
        info!(store_id = %store.id, expires_at = %store.expires_at, "Created store");
        Ok(store)
    }

    /// Load an existing store record, keeping its ID and timestamps.
    ///
    /// # Errors
    ///
    /// Returns `Repository(Conflict)` if the ID is already taken.
    #[instrument(skip(self, store), fields(store_id = %store.id))]
    pub async fn import_store(&self, store: Store) -> Result<(), EngineError> {
        let owner_id = store.owner_id;
        let store_id = store.id;
        self.stores.import(store).await?;
        self.selections.set_if_unset(owner_id, store_id).await;
        debug!("Imported store");
        Ok(())
    }

    /// Apply owner edits to a store.
    ///
    /// # Errors
    ///
    /// Returns `StoreNotFound`, or `InvalidTransition` for an archived store.
    #[instrument(skip(self, update))]
    pub async fn update_store(
        &self,
        store_id: StoreId,
        update: StoreUpdate,
        now: DateTime<Utc>,
    ) -> Result<Store, EngineError> {
        let store = self
            .mutate(store_id, now, |store, _| {
                workflow::ensure(store, StoreAction::Edit, not_archived)?;
                store.apply_update(update, now);
                Ok(())
            })
            .await?
            .store;
        Ok(store)
    }

    /// Current store record, as last reconciled.
    ///
    /// # Errors
    ///
    /// Returns `StoreNotFound`.
    pub async fn get_store(&self, store_id: StoreId) -> Result<Store, EngineError> {
        self.stores
            .snapshot(store_id)
            .await
            .ok_or(EngineError::StoreNotFound(store_id))
    }

    /// Every store, ordered by ID.
    pub async fn all_stores(&self) -> Vec<Store> {
        self.stores.list_all().await
    }

    // =========================================================================
    // Lifecycle
    // =========================================================================

    /// Status of the store at `now`. Does not write.
    ///
    /// # Errors
    ///
    /// Returns `StoreNotFound`.
    pub async fn get_status(
        &self,
        store_id: StoreId,
        now: DateTime<Utc>,
    ) -> Result<StoreStatus, EngineError> {
        let store = self.get_store(store_id).await?;
        Ok(compute_status(&store, now, &self.lifecycle).status)
    }

    /// Expiration summary at `now`. Does not write.
    ///
    /// # Errors
    ///
    /// Returns `StoreNotFound`.
    pub async fn get_expiration_info(
        &self,
        store_id: StoreId,
        now: DateTime<Utc>,
    ) -> Result<ExpirationInfo, EngineError> {
        let store = self.get_store(store_id).await?;
        Ok(lifecycle::expiration_info(&store, now, &self.lifecycle))
    }

    /// Persist the store's lifecycle state at `now` and emit any due notice.
    ///
    /// # Errors
    ///
    /// Returns `StoreNotFound`.
    #[instrument(skip(self))]
    pub async fn reconcile(
        &self,
        store_id: StoreId,
        now: DateTime<Utc>,
    ) -> Result<Store, EngineError> {
        Ok(self.mutate(store_id, now, |_, _| Ok(())).await?.store)
    }

    /// Reconcile every store at `now`.
    ///
    /// Stores are visited one at a time, each under its own lock.
    #[instrument(skip(self))]
    pub async fn sweep(&self, now: DateTime<Utc>) -> SweepReport {
        let mut report = SweepReport::default();

        for store_id in self.stores.ids().await {
            match self.mutate(store_id, now, |_, transition| Ok(*transition)).await {
                Ok(applied) => {
                    report.evaluated += 1;
                    if applied.notified {
                        report.notifications += 1;
                    }
                    let transition = applied.value;
                    if transition.from != transition.to {
                        report.changes.push(StatusChange {
                            store_id,
                            from: transition.from,
                            to: transition.to,
                        });
                    }
                }
                Err(e) => warn!(store_id = %store_id, error = %e, "Skipping store in sweep"),
            }
        }

        info!(
            evaluated = report.evaluated,
            changed = report.changes.len(),
            notifications = report.notifications,
            "Sweep complete"
        );
        report
    }

    // =========================================================================
    // Quota
    // =========================================================================

    /// Listing usage of a store.
    ///
    /// # Errors
    ///
    /// Returns `StoreNotFound`.
    pub async fn get_usage(&self, store_id: StoreId) -> Result<Usage, EngineError> {
        let store = self.get_store(store_id).await?;
        Ok(quota::usage(&store))
    }

    /// Whether the store may publish another listing at `now`. Does not write.
    ///
    /// # Errors
    ///
    /// Returns `StoreNotFound`.
    pub async fn can_add_listing(
        &self,
        store_id: StoreId,
        now: DateTime<Utc>,
    ) -> Result<bool, EngineError> {
        let store = self.get_store(store_id).await?;
        let status = compute_status(&store, now, &self.lifecycle).status;
        Ok(quota::can_add_listing(&store, status))
    }

    /// Count a newly published listing and tell the store's followers.
    ///
    /// Follower notification is best effort and never fails this call.
    ///
    /// # Errors
    ///
    /// Returns `StoreNotFound`, or `QuotaExceeded` with usage unchanged.
    #[instrument(skip(self))]
    pub async fn add_listing(
        &self,
        store_id: StoreId,
        listing_id: ListingId,
        now: DateTime<Utc>,
    ) -> Result<Usage, EngineError> {
        let store = self
            .mutate(store_id, now, |store, _| quota::record_listing_added(store))
            .await?
            .store;

        info!(used = store.ads_used, max = store.plan.max_ads, "Listing added");
        self.events.publish(DomainEvent::ListingPublished {
            store_id,
            store_name: store.name.clone(),
            listing_id,
            follower_ids: store.follower_ids(),
        });
        Ok(quota::usage(&store))
    }

    /// Release a listing from the quota.
    ///
    /// # Errors
    ///
    /// Returns `StoreNotFound`.
    #[instrument(skip(self))]
    pub async fn remove_listing(
        &self,
        store_id: StoreId,
        listing_id: ListingId,
        now: DateTime<Utc>,
    ) -> Result<Usage, EngineError> {
        let store = self
            .mutate(store_id, now, |store, _| {
                quota::record_listing_removed(store);
                Ok(())
            })
            .await?
            .store;
        debug!(used = store.ads_used, "Listing removed");
        Ok(quota::usage(&store))
    }

    /// Record a listing taken down early. Its quota stays consumed.
    ///
    /// # Errors
    ///
    /// Returns `StoreNotFound`.
    #[instrument(skip(self))]
    pub async fn delete_listing_early(
        &self,
        store_id: StoreId,
        listing_id: ListingId,
        now: DateTime<Utc>,
    ) -> Result<Usage, EngineError> {
        let applied = self
            .mutate(store_id, now, |store, _| {
                Ok(quota::record_listing_deleted_early(store, listing_id))
            })
            .await?;
        if !applied.value {
            debug!("Listing already recorded as deleted");
        }
        Ok(quota::usage(&applied.store))
    }

    // =========================================================================
    // Renewal / reactivation / deletion
    // =========================================================================

    /// Start a new plan period on an active or grace-period store.
    ///
    /// # Errors
    ///
    /// Returns `StoreNotFound`, `PlanNotFound`, or `InvalidTransition` once
    /// the store is deactivated or archived.
    #[instrument(skip(self))]
    pub async fn renew(
        &self,
        store_id: StoreId,
        plan_id: PlanId,
        now: DateTime<Utc>,
    ) -> Result<Store, EngineError> {
        let plan = self.plan(plan_id)?;
        let store = self
            .mutate(store_id, now, |store, _| workflow::renew(store, plan, now))
            .await?
            .store;
        Ok(store)
    }

    /// Bring a deactivated or archived store back on a new plan period.
    ///
    /// # Errors
    ///
    /// Returns `StoreNotFound`, `PlanNotFound`, `InvalidTransition` for an
    /// operational store, or `StoreLimitReached` if reopening an archived
    /// store would put the owner over the limit.
    #[instrument(skip(self))]
    pub async fn reactivate(
        &self,
        store_id: StoreId,
        plan_id: PlanId,
        now: DateTime<Utc>,
    ) -> Result<Store, EngineError> {
        let plan = self.plan(plan_id)?;
        let limit = self.config.max_stores_per_user;

        let store = self
            .mutate_with_owner(store_id, now, |others, store, transition| {
                if transition.to == StoreStatus::Archived
                    && !coordinator::can_open_store(others, limit, now, &self.lifecycle)
                {
                    return Err(EngineError::StoreLimitReached {
                        user_id: store.owner_id,
                        limit,
                    });
                }
                workflow::reactivate(store, plan, now)
            })
            .await?
            .store;
        Ok(store)
    }

    /// Soft-delete a store by archiving it, then tell its followers.
    ///
    /// # Errors
    ///
    /// Returns `StoreNotFound`, `InvalidTransition` if already archived,
    /// `HasActiveListings` while live listings remain, or `ListingQuery` if
    /// that cannot be determined.
    #[instrument(skip(self))]
    pub async fn delete_store(
        &self,
        store_id: StoreId,
        now: DateTime<Utc>,
    ) -> Result<Store, EngineError> {
        let current = self.get_store(store_id).await?;
        if compute_status(&current, now, &self.lifecycle).status == StoreStatus::Archived {
            return Err(EngineError::InvalidTransition {
                action: StoreAction::Delete,
                status: StoreStatus::Archived,
            });
        }

        if self.listings.has_active_listings(store_id).await? {
            return Err(EngineError::HasActiveListings(store_id));
        }

        let store = self
            .mutate(store_id, now, |store, _| workflow::close(store, now))
            .await?
            .store;

        self.events.publish(DomainEvent::StoreClosed {
            store_id,
            store_name: store.name.clone(),
            follower_ids: store.follower_ids(),
        });
        Ok(store)
    }

    // =========================================================================
    // Multi-store coordination
    // =========================================================================

    /// The store the user is currently working in.
    pub async fn get_active_store_for_user(
        &self,
        user_id: UserId,
        now: DateTime<Utc>,
    ) -> Option<Store> {
        let owned = self.stores.list_by_owner(user_id).await;
        let selected = self.selections.get(user_id).await;
        let pick = coordinator::pick_active_store(&owned, selected, now, &self.lifecycle)?;
        owned.into_iter().find(|store| store.id == pick)
    }

    /// Point the user at one of their stores.
    ///
    /// # Errors
    ///
    /// Returns `StoreNotFound`, or `NotOwned` if the store belongs to
    /// someone else.
    #[instrument(skip(self))]
    pub async fn switch_active_store(
        &self,
        user_id: UserId,
        store_id: StoreId,
    ) -> Result<(), EngineError> {
        let store = self.get_store(store_id).await?;
        if store.owner_id != user_id {
            return Err(EngineError::NotOwned { user_id, store_id });
        }
        self.selections.set(user_id, store_id).await;
        debug!("Switched active store");
        Ok(())
    }

    /// Whether the user may open another store at `now`.
    pub async fn can_create_new_store(&self, user_id: UserId, now: DateTime<Utc>) -> bool {
        let owned = self.stores.list_by_owner(user_id).await;
        coordinator::can_open_store(&owned, self.config.max_stores_per_user, now, &self.lifecycle)
    }

    /// The user's stores, oldest first.
    pub async fn stores_for_user(&self, user_id: UserId) -> Vec<Store> {
        self.stores.list_by_owner(user_id).await
    }

    // =========================================================================
    // Followers and ratings
    // =========================================================================

    /// Follow a store. Following twice keeps the first timestamp.
    ///
    /// # Errors
    ///
    /// Returns `StoreNotFound`, or `InvalidTransition` for an archived store.
    #[instrument(skip(self))]
    pub async fn follow_store(
        &self,
        user_id: UserId,
        store_id: StoreId,
        now: DateTime<Utc>,
    ) -> Result<(), EngineError> {
        self.mutate(store_id, now, |store, _| {
            workflow::ensure(store, StoreAction::Follow, not_archived)?;
            store.followers.entry(user_id).or_insert(now);
            Ok(())
        })
        .await?;
        Ok(())
    }

    /// Stop following a store. Returns whether the user was following it.
    ///
    /// # Errors
    ///
    /// Returns `StoreNotFound`.
    #[instrument(skip(self))]
    pub async fn unfollow_store(
        &self,
        user_id: UserId,
        store_id: StoreId,
    ) -> Result<bool, EngineError> {
        let record = self
            .stores
            .record(store_id)
            .await
            .ok_or(EngineError::StoreNotFound(store_id))?;
        let removed = record.write().await.followers.remove(&user_id).is_some();
        Ok(removed)
    }

    /// Users following a store.
    ///
    /// # Errors
    ///
    /// Returns `StoreNotFound`.
    pub async fn followers_of(&self, store_id: StoreId) -> Result<Vec<UserId>, EngineError> {
        Ok(self.get_store(store_id).await?.follower_ids())
    }

    /// Stores a user follows, ordered by ID.
    pub async fn stores_followed_by(&self, user_id: UserId) -> Vec<StoreId> {
        self.stores
            .list_all()
            .await
            .into_iter()
            .filter(|store| store.followers.contains_key(&user_id))
            .map(|store| store.id)
            .collect()
    }

    /// Record a 1 to 5 star rating.
    ///
    /// # Errors
    ///
    /// Returns `InvalidRating`, `StoreNotFound`, or `InvalidTransition` for an
    /// archived store.
    #[instrument(skip(self))]
    pub async fn rate_store(
        &self,
        store_id: StoreId,
        stars: u8,
        now: DateTime<Utc>,
    ) -> Result<RatingSummary, EngineError> {
        if !(1..=5).contains(&stars) {
            return Err(EngineError::InvalidRating(stars));
        }
        let store = self
            .mutate(store_id, now, |store, _| {
                workflow::ensure(store, StoreAction::Rate, not_archived)?;
                store.rating.record(stars);
                Ok(())
            })
            .await?
            .store;
        Ok(store.rating)
    }

    // =========================================================================
    // Notifications
    // =========================================================================

    /// An owner's expiration notifications, newest first.
    pub async fn list_notifications(&self, owner_id: UserId) -> Vec<ExpirationNotification> {
        self.notifications.list_for_owner(owner_id).await
    }

    /// Expiration notifications emitted for one store, oldest first.
    ///
    /// # Errors
    ///
    /// Returns `StoreNotFound`.
    pub async fn store_notifications(
        &self,
        store_id: StoreId,
    ) -> Result<Vec<ExpirationNotification>, EngineError> {
        let store = self.get_store(store_id).await?;
        Ok(self.notifications.list_for_store(store.owner_id, store_id).await)
    }

    /// Mark one of the owner's notifications as read.
    ///
    /// # Errors
    ///
    /// Returns `NotificationNotFound` if the owner has no such notification.
    #[instrument(skip(self))]
    pub async fn mark_notification_read(
        &self,
        owner_id: UserId,
        notification_id: NotificationId,
    ) -> Result<ExpirationNotification, EngineError> {
        self.notifications
            .set_read(owner_id, notification_id, true)
            .await
            .map_err(|e| match e {
                RepositoryError::NotFound => EngineError::NotificationNotFound(notification_id),
                other => EngineError::Repository(other),
            })
    }

    /// Number of unread notifications for an owner.
    pub async fn unread_count(&self, owner_id: UserId) -> usize {
        self.notifications.unread_count(owner_id).await
    }

    // =========================================================================
    // Internals
    // =========================================================================

    fn plan(&self, plan_id: PlanId) -> Result<&Plan, EngineError> {
        self.catalog
            .get(plan_id)
            .ok_or(EngineError::PlanNotFound(plan_id))
    }

    /// Reconcile a store under its write lock, apply `op`, then deliver any
    /// expiration notice once the lock is released.
    ///
    /// Reconciliation is kept even when `op` fails.
    async fn mutate<T>(
        &self,
        store_id: StoreId,
        now: DateTime<Utc>,
        op: impl FnOnce(&mut Store, &Transition) -> Result<T, EngineError>,
    ) -> Result<Applied<T>, EngineError> {
        let record = self
            .stores
            .record(store_id)
            .await
            .ok_or(EngineError::StoreNotFound(store_id))?;

        let (result, notice) = {
            let mut store = record.write().await;
            self.apply_locked(&mut store, now, op)
        };
        self.finish(result, notice).await
    }

    /// Like [`Self::mutate`], but with the repository map lock held so `op`
    /// can check the owner's other stores without racing creations.
    async fn mutate_with_owner<T>(
        &self,
        store_id: StoreId,
        now: DateTime<Utc>,
        op: impl FnOnce(&[Store], &mut Store, &Transition) -> Result<T, EngineError>,
    ) -> Result<Applied<T>, EngineError> {
        let (result, notice) = self
            .stores
            .with_owner_stores(store_id, |others, store| {
                self.apply_locked(store, now, |store, transition| {
                    op(others, store, transition)
                })
            })
            .await
            .ok_or(EngineError::StoreNotFound(store_id))?;
        self.finish(result, notice).await
    }

    /// Reconcile, schedule and run `op` on a store whose lock is held.
    fn apply_locked<T>(
        &self,
        store: &mut Store,
        now: DateTime<Utc>,
        op: impl FnOnce(&mut Store, &Transition) -> Result<T, EngineError>,
    ) -> (Result<(T, Store), EngineError>, Option<ExpirationNotification>) {
        let transition = lifecycle::reconcile(store, now, &self.lifecycle);
        if transition.from != transition.to {
            info!(
                store_id = %store.id,
                from = %transition.from,
                to = %transition.to,
                "Store status changed"
            );
        }
        let notice = scheduler::schedule(store, &transition, now, &self.notification_policy);
        let result = op(store, &transition).map(|value| (value, store.clone()));
        (result, notice)
    }

    async fn finish<T>(
        &self,
        result: Result<(T, Store), EngineError>,
        notice: Option<ExpirationNotification>,
    ) -> Result<Applied<T>, EngineError> {
        let notified = notice.is_some();
        if let Some(notification) = notice {
            self.deliver(notification).await;
        }
        result.map(|(value, store)| Applied {
            value,
            store,
            notified,
        })
    }

    async fn deliver(&self, notification: ExpirationNotification) {
        info!(
            store_id = %notification.store_id,
            kind = %notification.kind,
            "Expiration notification emitted"
        );
        self.notifications.insert(notification.clone()).await;
        self.events.publish(DomainEvent::ExpirationNotice(notification));
    }
}

/// Result of a locked mutation.
struct Applied<T> {
    value: T,
    /// Store as left by the mutation.
    store: Store,
    /// Whether an expiration notice went out.
    notified: bool,
}

#[allow(clippy::trivially_copy_pass_by_ref)]
fn not_archived(status: &StoreStatus) -> bool {
    *status != StoreStatus::Archived
}
