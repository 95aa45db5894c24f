//! Store repository.
//!
//! Each store sits behind its own `RwLock`, so writes to one store are
//! serialized while reads and writes to different stores proceed in parallel.
//! The outer map lock is held to look up or insert records, and for the whole
//! of any write whose validity depends on the owner's other stores.

use std::collections::HashMap;
use std::sync::Arc;
use std::sync::atomic::{AtomicI32, Ordering};

use tokio::sync::RwLock;

use storekeeper_core::{StoreId, UserId};

use super::RepositoryError;
use crate::models::Store;

/// Shared handle to a single store record.
pub type StoreRecord = Arc<RwLock<Store>>;

/// Repository holding every store record in memory.
#[derive(Debug, Default)]
pub struct StoreRepository {
    records: RwLock<HashMap<StoreId, StoreRecord>>,
    last_id: AtomicI32,
}

impl StoreRepository {
    /// Create an empty repository.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert a new store built from a freshly assigned ID.
    ///
    /// `check` sees the owner's existing stores and may veto the insert. The
    /// map lock is held from the check until the insert, so two concurrent
    /// creations for one owner cannot both pass a count-based check.
    ///
    /// # Errors
    ///
    /// Returns whatever `check` returns.
    pub async fn create<E>(
        &self,
        owner_id: UserId,
        check: impl FnOnce(&[Store]) -> Result<(), E>,
        build: impl FnOnce(StoreId) -> Store,
    ) -> Result<Store, E> {
        let mut records = self.records.write().await;
        let owned = owned_snapshots(&records, owner_id, None).await;
        check(&owned)?;

        let id = StoreId::new(self.last_id.fetch_add(1, Ordering::Relaxed) + 1);
        let store = build(id);
        records.insert(id, Arc::new(RwLock::new(store.clone())));
        Ok(store)
    }

    /// Update one store while the map lock is held.
    ///
    /// `apply` gets the owner's other stores alongside the store itself. No
    /// creation or other owner-scoped update can run until it returns, so a
    /// count-based check inside `apply` stays valid for the write it guards.
    ///
    /// Returns `None` if the store does not exist.
    pub async fn with_owner_stores<T>(
        &self,
        id: StoreId,
        apply: impl FnOnce(&[Store], &mut Store) -> T,
    ) -> Option<T> {
        let records = self.records.write().await;
        let handle = records.get(&id)?.clone();
        let owner_id = handle.read().await.owner_id;
        let others = owned_snapshots(&records, owner_id, Some(id)).await;

        let mut store = handle.write().await;
        Some(apply(&others, &mut store))
    }

    /// Insert an existing store record, keeping its ID.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Conflict` if the ID is already taken.
    pub async fn import(&self, store: Store) -> Result<(), RepositoryError> {
        let mut records = self.records.write().await;
        if records.contains_key(&store.id) {
            return Err(RepositoryError::Conflict(format!(
                "store {} already exists",
                store.id
            )));
        }
        self.last_id.fetch_max(store.id.as_i32(), Ordering::Relaxed);
        records.insert(store.id, Arc::new(RwLock::new(store)));
        Ok(())
    }

    /// Get the lock handle for a store.
    pub async fn record(&self, id: StoreId) -> Option<StoreRecord> {
        self.records.read().await.get(&id).cloned()
    }

    /// Get a point-in-time copy of a store.
    pub async fn snapshot(&self, id: StoreId) -> Option<Store> {
        let handle = self.record(id).await?;
        let store = handle.read().await.clone();
        Some(store)
    }

    /// List a user's stores, oldest first.
    pub async fn list_by_owner(&self, owner_id: UserId) -> Vec<Store> {
        let mut stores: Vec<Store> = self
            .list_all()
            .await
            .into_iter()
            .filter(|store| store.owner_id == owner_id)
            .collect();
        stores.sort_by_key(|store| (store.created_at, store.id));
        stores
    }

    /// List every store, ordered by ID.
    pub async fn list_all(&self) -> Vec<Store> {
        let handles: Vec<StoreRecord> = self.records.read().await.values().cloned().collect();
        let mut stores = Vec::with_capacity(handles.len());
        for handle in handles {
            stores.push(handle.read().await.clone());
        }
        stores.sort_by_key(|store| store.id);
        stores
    }

    /// IDs of every store, ordered.
    pub async fn ids(&self) -> Vec<StoreId> {
        let mut ids: Vec<StoreId> = self.records.read().await.keys().copied().collect();
        ids.sort();
        ids
    }
}

/// Copies of an owner's stores, optionally leaving one out.
async fn owned_snapshots(
    records: &HashMap<StoreId, StoreRecord>,
    owner_id: UserId,
    skip: Option<StoreId>,
) -> Vec<Store> {
    let mut owned = Vec::new();
    for (id, handle) in records {
        if Some(*id) == skip {
            continue;
        }
        let store = handle.read().await;
        if store.owner_id == owner_id {
            owned.push(store.clone());
        }
    }
    owned.sort_by_key(|store| (store.created_at, store.id));
    owned
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use chrono::{TimeDelta, TimeZone, Utc};
    use storekeeper_core::{CurrencyCode, PlanId, Price};

    use super::*;
    use crate::models::{CreateStore, Plan};

    fn plan() -> Plan {
        Plan {
            id: PlanId::new(1),
            name: "Basic".to_string(),
            price: Price::from_cents(999, CurrencyCode::USD),
            max_ads: 10,
            duration_days: 30,
        }
    }

    fn build(owner: i32, name: &str, offset_hours: i64) -> impl FnOnce(StoreId) -> Store {
        let name = name.to_string();
        move |id| {
            Store::open(
                id,
                CreateStore {
                    owner_id: UserId::new(owner),
                    name,
                    description: None,
                    plan_id: PlanId::new(1),
                },
                &plan(),
                Utc.with_ymd_and_hms(2026, 1, 1, 0, 0, 0).unwrap()
                    + TimeDelta::hours(offset_hours),
            )
        }
    }

    #[tokio::test]
    async fn test_create_assigns_sequential_ids() {
        let repo = StoreRepository::new();
        let first = repo
            .create(UserId::new(1), |_| Ok::<_, ()>(()), build(1, "A", 0))
            .await
            .unwrap();
        let second = repo
            .create(UserId::new(2), |_| Ok::<_, ()>(()), build(2, "B", 0))
            .await
            .unwrap();

        assert_eq!(first.id, StoreId::new(1));
        assert_eq!(second.id, StoreId::new(2));
        assert_eq!(repo.ids().await, vec![StoreId::new(1), StoreId::new(2)]);
    }

    #[tokio::test]
    async fn test_create_check_sees_only_owned_stores() {
        let repo = StoreRepository::new();
        repo.create(UserId::new(1), |_| Ok::<_, ()>(()), build(1, "A", 0))
            .await
            .unwrap();
        repo.create(UserId::new(2), |_| Ok::<_, ()>(()), build(2, "B", 0))
            .await
            .unwrap();

        let result = repo
            .create(
                UserId::new(1),
                |owned| if owned.is_empty() { Ok(()) } else { Err("limit") },
                build(1, "C", 0),
            )
            .await;
        assert_eq!(result.unwrap_err(), "limit");
        assert_eq!(repo.ids().await.len(), 2);
    }

    #[tokio::test]
    async fn test_import_rejects_duplicates_and_advances_ids() {
        let repo = StoreRepository::new();
        let store = build(1, "Imported", 0)(StoreId::new(7));
        repo.import(store.clone()).await.unwrap();

        assert!(matches!(
            repo.import(store).await,
            Err(RepositoryError::Conflict(_))
        ));

        let next = repo
            .create(UserId::new(1), |_| Ok::<_, ()>(()), build(1, "Next", 0))
            .await
            .unwrap();
        assert_eq!(next.id, StoreId::new(8));
    }

    #[tokio::test]
    async fn test_list_by_owner_orders_by_creation() {
        let repo = StoreRepository::new();
        repo.create(UserId::new(1), |_| Ok::<_, ()>(()), build(1, "Late", 5))
            .await
            .unwrap();
        repo.create(UserId::new(1), |_| Ok::<_, ()>(()), build(1, "Early", 1))
            .await
            .unwrap();

        let names: Vec<String> = repo
            .list_by_owner(UserId::new(1))
            .await
            .into_iter()
            .map(|store| store.name)
            .collect();
        assert_eq!(names, vec!["Early".to_string(), "Late".to_string()]);
    }

    #[tokio::test]
    async fn test_with_owner_stores_sees_siblings_only() {
        let repo = StoreRepository::new();
        let target = repo
            .create(UserId::new(1), |_| Ok::<_, ()>(()), build(1, "A", 0))
            .await
            .unwrap();
        repo.create(UserId::new(1), |_| Ok::<_, ()>(()), build(1, "B", 1))
            .await
            .unwrap();
        repo.create(UserId::new(2), |_| Ok::<_, ()>(()), build(2, "C", 2))
            .await
            .unwrap();

        let siblings = repo
            .with_owner_stores(target.id, |others, store| {
                store.ads_used = 2;
                others
                    .iter()
                    .map(|other| other.name.clone())
                    .collect::<Vec<_>>()
            })
            .await
            .unwrap();

        assert_eq!(siblings, vec!["B".to_string()]);
        assert_eq!(repo.snapshot(target.id).await.unwrap().ads_used, 2);
        assert!(
            repo.with_owner_stores(StoreId::new(99), |_, _| ())
                .await
                .is_none()
        );
    }

    #[tokio::test]
    async fn test_record_writes_are_visible_in_snapshots() {
        let repo = StoreRepository::new();
        let store = repo
            .create(UserId::new(1), |_| Ok::<_, ()>(()), build(1, "A", 0))
            .await
            .unwrap();

        let handle = repo.record(store.id).await.unwrap();
        handle.write().await.ads_used = 4;

        assert_eq!(repo.snapshot(store.id).await.unwrap().ads_used, 4);
        assert!(repo.snapshot(StoreId::new(99)).await.is_none());
    }
}
