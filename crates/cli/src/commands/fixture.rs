//! YAML store fixtures.
//!
//! A fixture describes stores as an operator would see them in the database,
//! and which of them still have live listings:
//!
//! ```yaml
//! active_listings: [2]
//! stores:
//!   - id: 1
//!     owner_id: 10
//!     name: Casa Verde
//!     plan_id: 2
//!     created_at: 2026-01-01T00:00:00Z
//!     ads_used: 4
//!     followers: [11, 12]
//!   - id: 2
//!     owner_id: 10
//!     name: Casa Azul
//!     plan_id: 1
//!     created_at: 2025-10-01T00:00:00Z
//!     deactivated_at: 2025-10-25T00:00:00Z
//! ```
//!
//! Omitted lifecycle markers are left unset; `expires_at` defaults to
//! `created_at` plus the plan duration.

use std::collections::HashSet;
use std::path::Path;
use std::sync::Arc;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::Deserialize;
use thiserror::Error;
use tracing::info;

use storekeeper_core::{PlanId, StoreId, StoreStatus, UserId};
use storekeeper_engine::{
    CreateStore, EngineConfig, EngineError, EventPublisher, ListingQuery, ListingQueryError,
    PlanCatalog, Store, StoreEngine,
};

/// Errors that can occur while loading a fixture.
#[derive(Debug, Error)]
pub enum FixtureError {
    /// Fixture file could not be read.
    #[error("Failed to read fixture: {0}")]
    Read(#[from] std::io::Error),

    /// Fixture is not valid YAML for the expected shape.
    #[error("Invalid fixture: {0}")]
    Parse(#[from] serde_yaml::Error),

    /// A store references a plan missing from the catalog.
    #[error("Store {store_id} uses unknown plan {plan_id}")]
    UnknownPlan { store_id: StoreId, plan_id: PlanId },

    /// The engine rejected a store.
    #[error(transparent)]
    Engine(#[from] EngineError),
}

/// Top-level fixture document.
#[derive(Debug, Deserialize)]
pub struct Fixture {
    /// Stores that still have live listings (blocks deletion).
    #[serde(default)]
    pub active_listings: Vec<StoreId>,
    pub stores: Vec<StoreFixture>,
}

/// One store as recorded in a fixture.
#[derive(Debug, Deserialize)]
pub struct StoreFixture {
    pub id: StoreId,
    pub owner_id: UserId,
    pub name: String,
    #[serde(default)]
    pub description: Option<String>,
    pub plan_id: PlanId,
    pub created_at: DateTime<Utc>,
    #[serde(default)]
    pub expires_at: Option<DateTime<Utc>>,
    #[serde(default)]
    pub grace_period_ends_at: Option<DateTime<Utc>>,
    #[serde(default)]
    pub deactivated_at: Option<DateTime<Utc>>,
    #[serde(default)]
    pub archived_at: Option<DateTime<Utc>>,
    #[serde(default)]
    pub ads_used: u32,
    #[serde(default)]
    pub followers: Vec<UserId>,
}

impl StoreFixture {
    /// Build the store record with the status its markers imply.
    fn into_store(self, catalog: &PlanCatalog) -> Result<Store, FixtureError> {
        let plan = catalog.get(self.plan_id).ok_or(FixtureError::UnknownPlan {
            store_id: self.id,
            plan_id: self.plan_id,
        })?;

        let mut store = Store::open(
            self.id,
            CreateStore {
                owner_id: self.owner_id,
                name: self.name,
                description: self.description,
                plan_id: self.plan_id,
            },
            plan,
            self.created_at,
        );
        if let Some(expires_at) = self.expires_at {
            store.expires_at = expires_at;
        }
        store.grace_period_ends_at = self.grace_period_ends_at;
        store.deactivated_at = self.deactivated_at;
        store.archived_at = self.archived_at;
        store.ads_used = self.ads_used;
        store.followers = self
            .followers
            .into_iter()
            .map(|follower| (follower, self.created_at))
            .collect();

        store.status = match (store.archived_at, store.deactivated_at, store.grace_period_ends_at) {
            (Some(_), _, _) => StoreStatus::Archived,
            (None, Some(_), _) => StoreStatus::Deactivated,
            (None, None, Some(_)) => StoreStatus::GracePeriod,
            (None, None, None) => StoreStatus::Active,
        };
        store.is_active = store.status.is_operational();
        Ok(store)
    }
}

/// Listing query answering from the fixture's `active_listings`.
#[derive(Debug, Default)]
pub struct FixtureListings {
    live: HashSet<StoreId>,
}

#[async_trait]
impl ListingQuery for FixtureListings {
    async fn has_active_listings(&self, store_id: StoreId) -> Result<bool, ListingQueryError> {
        Ok(self.live.contains(&store_id))
    }
}

/// Read and parse a fixture file.
///
/// # Errors
///
/// Returns `FixtureError` if the file cannot be read or parsed.
pub async fn read(path: &Path) -> Result<Fixture, FixtureError> {
    info!(path = %path.display(), "Loading fixture");
    let content = tokio::fs::read_to_string(path).await?;
    let fixture: Fixture = serde_yaml::from_str(&content)?;
    info!(stores = fixture.stores.len(), "Parsed fixture");
    Ok(fixture)
}

/// Build an engine holding every store from the fixture.
///
/// # Errors
///
/// Returns `FixtureError` for unknown plans or duplicate store IDs.
pub async fn load_engine(
    fixture: Fixture,
    config: EngineConfig,
    events: EventPublisher,
) -> Result<StoreEngine, FixtureError> {
    let catalog = Arc::new(PlanCatalog::standard());
    let listings = Arc::new(FixtureListings {
        live: fixture.active_listings.into_iter().collect(),
    });

    let mut stores = Vec::with_capacity(fixture.stores.len());
    for store in fixture.stores {
        stores.push(store.into_store(&catalog)?);
    }

    let engine = StoreEngine::new(config, catalog, listings, events);
    for store in stores {
        engine.import_store(store).await?;
    }
    Ok(engine)
}
