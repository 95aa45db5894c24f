//! Domain models for the store engine.

pub mod notification;
pub mod plan;
pub mod store;

pub use notification::ExpirationNotification;
pub use plan::{Plan, PlanSnapshot};
pub use store::{CreateStore, RatingSummary, Store, StoreUpdate};
