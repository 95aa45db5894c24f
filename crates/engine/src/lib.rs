//! Storekeeper engine.
//!
//! Governs the lifecycle of merchant stores (active, grace period,
//! deactivated, archived), enforces per-store listing quotas, schedules
//! expiration notifications and coordinates how many stores one user may
//! hold.
//!
//! # Modules
//!
//! - [`engine`] - The [`StoreEngine`] facade callers use
//! - [`services`] - Lifecycle, quota, scheduling and workflow rules
//! - [`db`] - In-memory repositories
//! - [`models`] - Stores, plans and notifications
//! - [`catalog`] - Read-only plan catalog
//! - [`config`] - Environment-driven configuration
//! - [`error`] - Engine error type

#![cfg_attr(not(test), forbid(unsafe_code))]

pub mod catalog;
pub mod config;
pub mod db;
pub mod engine;
pub mod error;
pub mod models;
pub mod services;

pub use catalog::PlanCatalog;
pub use config::{ConfigError, EngineConfig};
pub use engine::{StatusChange, StoreEngine, SweepReport};
pub use error::{EngineError, StoreAction};
pub use models::{CreateStore, ExpirationNotification, Plan, Store, StoreUpdate};
pub use services::{
    Dispatch, DomainEvent, EventPublisher, EventReceiver, ExpirationInfo, ListingQuery,
    ListingQueryError, NextAction, NotificationSink, NotificationWorker, SinkError, TracingSink,
    Usage, event_channel,
};
