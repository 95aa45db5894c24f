//! Integration tests for Storekeeper.
//!
//! # Running Tests
//!
//! ```bash
//! cargo test -p storekeeper-integration-tests
//! ```
//!
//! # Test Categories
//!
//! - `store_lifecycle` - Time-driven transitions, renewal and reactivation
//! - `quota` - Listing quota gating and usage
//! - `notifications` - Expiration notices, dedup and the notification worker
//! - `multi_store` - Store limits and active store selection
//!
//! This crate provides the shared [`TestContext`]: an engine wired to fake
//! collaborators, plus a calendar helper so scenarios read in plan days.

#![cfg_attr(not(test), forbid(unsafe_code))]

use std::collections::HashSet;
use std::sync::Arc;

use async_trait::async_trait;
use chrono::{DateTime, TimeDelta, TimeZone, Utc};
use tokio::sync::Mutex;

use storekeeper_core::{PlanId, StoreId, UserId};
use storekeeper_engine::{
    CreateStore, Dispatch, EngineConfig, EventReceiver, ListingQuery, ListingQueryError,
    NotificationSink, PlanCatalog, SinkError, StoreEngine, event_channel,
};

/// Starter plan: free, 3 listings, 15 days.
pub const STARTER: PlanId = PlanId::new(1);
/// Basic plan: 10 listings, 30 days.
pub const BASIC: PlanId = PlanId::new(2);
/// Professional plan: 50 listings, 30 days.
pub const PROFESSIONAL: PlanId = PlanId::new(3);

/// Day `n` of the test calendar (day 1 is 2026-01-01, midnight UTC).
///
/// # Panics
///
/// Never; the base date is valid.
#[must_use]
#[allow(clippy::unwrap_used)]
pub fn day(n: i64) -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2026, 1, 1, 0, 0, 0).unwrap() + TimeDelta::days(n - 1)
}

/// Listing query backed by a set of stores with live listings.
#[derive(Debug, Default)]
pub struct FakeListings {
    live: Mutex<HashSet<StoreId>>,
    unavailable: Mutex<bool>,
}

impl FakeListings {
    /// Mark whether a store has live listings.
    pub async fn set_live(&self, store_id: StoreId, live: bool) {
        let mut stores = self.live.lock().await;
        if live {
            stores.insert(store_id);
        } else {
            stores.remove(&store_id);
        }
    }

    /// Make every query fail.
    pub async fn set_unavailable(&self, unavailable: bool) {
        *self.unavailable.lock().await = unavailable;
    }
}

#[async_trait]
impl ListingQuery for FakeListings {
    async fn has_active_listings(&self, store_id: StoreId) -> Result<bool, ListingQueryError> {
        if *self.unavailable.lock().await {
            return Err(ListingQueryError::Unavailable("connection refused".to_string()));
        }
        Ok(self.live.lock().await.contains(&store_id))
    }
}

/// Sink recording every dispatch, optionally failing for chosen recipients.
#[derive(Debug, Default)]
pub struct RecordingSink {
    delivered: Mutex<Vec<Dispatch>>,
    failing: Mutex<HashSet<UserId>>,
}

impl RecordingSink {
    /// Make deliveries to `user_id` fail.
    pub async fn fail_for(&self, user_id: UserId) {
        self.failing.lock().await.insert(user_id);
    }

    /// Dispatches delivered so far.
    pub async fn delivered(&self) -> Vec<Dispatch> {
        self.delivered.lock().await.clone()
    }
}

#[async_trait]
impl NotificationSink for RecordingSink {
    async fn dispatch(&self, dispatch: &Dispatch) -> Result<(), SinkError> {
        if self.failing.lock().await.contains(&dispatch.recipient) {
            return Err(SinkError::Delivery("push token expired".to_string()));
        }
        self.delivered.lock().await.push(dispatch.clone());
        Ok(())
    }
}

/// Engine under test plus its fake collaborators.
pub struct TestContext {
    pub engine: StoreEngine,
    pub listings: Arc<FakeListings>,
    /// Events published by the engine; tests drain or hand it to a worker.
    pub events: EventReceiver,
}

impl TestContext {
    /// Engine with default configuration and the standard plan catalog.
    #[must_use]
    pub fn new() -> Self {
        Self::with_config(EngineConfig::default())
    }

    /// Engine with the given configuration.
    #[must_use]
    pub fn with_config(config: EngineConfig) -> Self {
        let listings = Arc::new(FakeListings::default());
        let (publisher, events) = event_channel();
        let engine = StoreEngine::new(
            config,
            Arc::new(PlanCatalog::standard()),
            listings.clone(),
            publisher,
        );
        Self {
            engine,
            listings,
            events,
        }
    }

    /// Open a store for `owner` on `plan` at `now`.
    ///
    /// # Panics
    ///
    /// Panics if the engine refuses the store.
    #[allow(clippy::expect_used)]
    pub async fn open_store(
        &self,
        owner: i32,
        name: &str,
        plan: PlanId,
        now: DateTime<Utc>,
    ) -> StoreId {
        self.engine
            .create_store(
                CreateStore {
                    owner_id: UserId::new(owner),
                    name: name.to_string(),
                    description: None,
                    plan_id: plan,
                },
                now,
            )
            .await
            .expect("store should be created")
            .id
    }

    /// Names of events queued so far, draining them.
    pub fn drain_event_names(&mut self) -> Vec<&'static str> {
        std::iter::from_fn(|| self.events.try_recv())
            .map(|event| event.name())
            .collect()
    }
}

impl Default for TestContext {
    fn default() -> Self {
        Self::new()
    }
}
