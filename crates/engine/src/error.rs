//! Unified error handling for the store engine.

use thiserror::Error;

use storekeeper_core::{Locale, NotificationId, PlanId, StoreId, StoreStatus, UserId};

use crate::db::RepositoryError;
use crate::services::listings::ListingQueryError;

/// Operation requested on a store, used to describe rejected transitions.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StoreAction {
    Renew,
    Reactivate,
    Delete,
    Edit,
    Follow,
    Rate,
}

impl std::fmt::Display for StoreAction {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Renew => write!(f, "renew"),
            Self::Reactivate => write!(f, "reactivate"),
            Self::Delete => write!(f, "delete"),
            Self::Edit => write!(f, "edit"),
            Self::Follow => write!(f, "follow"),
            Self::Rate => write!(f, "rate"),
        }
    }
}

/// Engine-level error type.
///
/// Every variant is recoverable by the caller; none leaves the engine in a
/// state that needs repair.
#[derive(Debug, Error)]
pub enum EngineError {
    /// No store with this ID.
    #[error("Store not found: {0}")]
    StoreNotFound(StoreId),

    /// No plan with this ID in the catalog.
    #[error("Plan not found: {0}")]
    PlanNotFound(PlanId),

    /// No notification with this ID for the user.
    #[error("Notification not found: {0}")]
    NotificationNotFound(NotificationId),

    /// The store's listing quota is used up, or the store is not operational.
    #[error("Quota exceeded for store {store_id}: {used}/{max} listings")]
    QuotaExceeded {
        store_id: StoreId,
        used: u32,
        max: u32,
    },

    /// The action is not allowed in the store's current status.
    #[error("Cannot {action} a store in status {status}")]
    InvalidTransition {
        action: StoreAction,
        status: StoreStatus,
    },

    /// The user does not own the store.
    #[error("User {user_id} does not own store {store_id}")]
    NotOwned { user_id: UserId, store_id: StoreId },

    /// The store still has live listings.
    #[error("Store {0} still has active listings")]
    HasActiveListings(StoreId),

    /// The user already holds the maximum number of open stores.
    #[error("User {user_id} already has {limit} open stores")]
    StoreLimitReached { user_id: UserId, limit: usize },

    /// Ratings must be between 1 and 5 stars.
    #[error("Invalid rating: {0} (expected 1-5)")]
    InvalidRating(u8),

    /// The listing collaborator could not answer.
    #[error("Listing query failed: {0}")]
    ListingQuery(#[from] ListingQueryError),

    /// Repository operation failed.
    #[error("Repository error: {0}")]
    Repository(#[from] RepositoryError),
}

impl EngineError {
    /// User-facing message for the error in the given locale.
    #[must_use]
    pub fn localized_message(&self, locale: Locale) -> String {
        match (self, locale) {
            (Self::StoreNotFound(_), Locale::En) => "This store does not exist.".to_string(),
            (Self::StoreNotFound(_), Locale::Es) => "Esta tienda no existe.".to_string(),
            (Self::PlanNotFound(_), Locale::En) => "The selected plan is not available.".to_string(),
            (Self::PlanNotFound(_), Locale::Es) => {
                "El plan seleccionado no está disponible.".to_string()
            }
            (Self::NotificationNotFound(_), Locale::En) => {
                "This notification no longer exists.".to_string()
            }
            (Self::NotificationNotFound(_), Locale::Es) => {
                "Esta notificación ya no existe.".to_string()
            }
            (Self::QuotaExceeded { max, .. }, Locale::En) => {
                format!("You have reached your plan limit of {max} listings.")
            }
            (Self::QuotaExceeded { max, .. }, Locale::Es) => {
                format!("Has alcanzado el límite de {max} anuncios de tu plan.")
            }
            (Self::InvalidTransition { .. }, Locale::En) => {
                "This action is not available for the store right now.".to_string()
            }
            (Self::InvalidTransition { .. }, Locale::Es) => {
                "Esta acción no está disponible para la tienda en este momento.".to_string()
            }
            (Self::NotOwned { .. }, Locale::En) => "You do not own this store.".to_string(),
            (Self::NotOwned { .. }, Locale::Es) => "Esta tienda no te pertenece.".to_string(),
            (Self::HasActiveListings(_), Locale::En) => {
                "Remove all active listings before deleting the store.".to_string()
            }
            (Self::HasActiveListings(_), Locale::Es) => {
                "Elimina todos los anuncios activos antes de borrar la tienda.".to_string()
            }
            (Self::StoreLimitReached { limit, .. }, Locale::En) => {
                format!("You can have at most {limit} open stores.")
            }
            (Self::StoreLimitReached { limit, .. }, Locale::Es) => {
                format!("Puedes tener como máximo {limit} tiendas abiertas.")
            }
            (Self::InvalidRating(_), Locale::En) => "Ratings go from 1 to 5 stars.".to_string(),
            (Self::InvalidRating(_), Locale::Es) => {
                "Las calificaciones van de 1 a 5 estrellas.".to_string()
            }
            (Self::ListingQuery(_) | Self::Repository(_), Locale::En) => {
                "Something went wrong. Please try again.".to_string()
            }
            (Self::ListingQuery(_) | Self::Repository(_), Locale::Es) => {
                "Algo salió mal. Inténtalo de nuevo.".to_string()
            }
        }
    }
}
