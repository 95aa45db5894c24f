//! Status enums for stores and their notifications.

use serde::{Deserialize, Serialize};

/// Error returned when parsing an unknown store status.
#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
#[error("invalid store status: {0}")]
pub struct StatusParseError(pub String);

/// Lifecycle status of a store.
///
/// A store moves `Active -> GracePeriod -> Deactivated -> Archived` as time
/// passes, and only renewal or reactivation moves it back to `Active`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum StoreStatus {
    /// Within the paid plan period.
    #[default]
    Active,
    /// Expired, but still visible while the owner renews.
    GracePeriod,
    /// Hidden from buyers; can be reactivated.
    Deactivated,
    /// Closed for good unless explicitly reactivated.
    Archived,
}

impl StoreStatus {
    /// Whether the store may publish listings and is visible to buyers.
    #[must_use]
    pub const fn is_operational(&self) -> bool {
        matches!(self, Self::Active | Self::GracePeriod)
    }

    /// Whether the store counts toward the owner's store limit.
    #[must_use]
    pub const fn counts_toward_limit(&self) -> bool {
        !matches!(self, Self::Archived)
    }
}

impl std::fmt::Display for StoreStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Active => write!(f, "ACTIVE"),
            Self::GracePeriod => write!(f, "GRACE_PERIOD"),
            Self::Deactivated => write!(f, "DEACTIVATED"),
            Self::Archived => write!(f, "ARCHIVED"),
        }
    }
}

impl std::str::FromStr for StoreStatus {
    type Err = StatusParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "ACTIVE" => Ok(Self::Active),
            "GRACE_PERIOD" => Ok(Self::GracePeriod),
            "DEACTIVATED" => Ok(Self::Deactivated),
            "ARCHIVED" => Ok(Self::Archived),
            _ => Err(StatusParseError(s.to_owned())),
        }
    }
}

/// Kind of expiration notification sent to a store owner.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum NotificationKind {
    /// The plan expires soon.
    Warning,
    /// The plan expired and the grace period started.
    GracePeriod,
    /// The grace period ended and the store was hidden.
    Deactivated,
}

impl std::fmt::Display for NotificationKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Warning => write!(f, "warning"),
            Self::GracePeriod => write!(f, "grace_period"),
            Self::Deactivated => write!(f, "deactivated"),
        }
    }
}
