//! Store lifecycle services.
//!
//! # Services
//!
//! - `lifecycle` - Status evaluation and reconciliation
//! - `quota` - Listing quota rules
//! - `scheduler` - Expiration notification decisions and dedup
//! - `messages` - Localized notification text
//! - `coordinator` - Multi-store selection and limits
//! - `workflow` - Renewal, reactivation and deletion
//! - `dispatch` - Domain events and the notification worker
//! - `listings` - Listing query collaborator

pub mod coordinator;
pub mod dispatch;
pub mod lifecycle;
pub mod listings;
pub mod messages;
pub mod quota;
pub mod scheduler;
pub mod workflow;

pub use dispatch::{
    Dispatch, DomainEvent, EventPublisher, EventReceiver, NotificationSink, NotificationWorker,
    SinkError, TracingSink, event_channel,
};
pub use lifecycle::{
    Evaluation, ExpirationInfo, LifecyclePolicy, NextAction, Transition, compute_status,
    expiration_info, reconcile,
};
pub use listings::{ListingQuery, ListingQueryError};
pub use quota::Usage;
pub use scheduler::NotificationPolicy;
