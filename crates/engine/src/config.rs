//! Engine configuration loaded from environment variables.
//!
//! # Environment Variables
//!
//! ## Optional
//! - `STORE_MAX_PER_USER` - Open (non-archived) stores a user may hold (default: 3)
//! - `STORE_GRACE_PERIOD_DAYS` - Days a store stays visible after expiring (default: 7)
//! - `STORE_ARCHIVE_AFTER_DAYS` - Days from deactivation to archive (default: 90)
//! - `NOTIFICATION_DEDUP_HOURS` - Minimum hours between notifications of one kind (default: 12)
//! - `NOTIFICATION_LOCALE` - Language for notification text, `en` or `es` (default: en)

use chrono::TimeDelta;
use thiserror::Error;

use storekeeper_core::Locale;

use crate::services::lifecycle::LifecyclePolicy;
use crate::services::scheduler::NotificationPolicy;

const DEFAULT_MAX_STORES_PER_USER: usize = 3;
const DEFAULT_GRACE_PERIOD_DAYS: u32 = 7;
const DEFAULT_ARCHIVE_AFTER_DAYS: u32 = 90;
const DEFAULT_DEDUP_HOURS: u32 = 12;

/// Configuration errors that can occur during loading.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Invalid environment variable {0}: {1}")]
    InvalidEnvVar(String, String),
}

/// Store engine configuration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EngineConfig {
    /// Maximum number of non-archived stores per user (1 = single-store mode)
    pub max_stores_per_user: usize,
    /// Grace period length in days
    pub grace_period_days: u32,
    /// Days between deactivation and archiving
    pub archive_after_days: u32,
    /// Notification dedup window in hours
    pub notification_dedup_hours: u32,
    /// Locale for notification messages
    pub locale: Locale,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            max_stores_per_user: DEFAULT_MAX_STORES_PER_USER,
            grace_period_days: DEFAULT_GRACE_PERIOD_DAYS,
            archive_after_days: DEFAULT_ARCHIVE_AFTER_DAYS,
            notification_dedup_hours: DEFAULT_DEDUP_HOURS,
            locale: Locale::default(),
        }
    }
}

impl EngineConfig {
    /// Load configuration from environment variables.
    ///
    /// Calls `dotenvy::dotenv()` to load from `.env` file if present.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError` if a variable is set but cannot be parsed, or if
    /// a limit is zero.
    pub fn from_env() -> Result<Self, ConfigError> {
        // Load .env file if present (ignore errors if not found)
        let _ = dotenvy::dotenv();

        let max_stores_per_user = parse_env_or_default(
            "STORE_MAX_PER_USER",
            DEFAULT_MAX_STORES_PER_USER,
        )?;
        if max_stores_per_user == 0 {
            return Err(ConfigError::InvalidEnvVar(
                "STORE_MAX_PER_USER".to_string(),
                "must be at least 1".to_string(),
            ));
        }

        let locale = get_optional_env("NOTIFICATION_LOCALE")
            .map(|value| {
                value.parse::<Locale>().map_err(|e| {
                    ConfigError::InvalidEnvVar("NOTIFICATION_LOCALE".to_string(), e.to_string())
                })
            })
            .transpose()?
            .unwrap_or_default();

        Ok(Self {
            max_stores_per_user,
            grace_period_days: parse_env_or_default(
                "STORE_GRACE_PERIOD_DAYS",
                DEFAULT_GRACE_PERIOD_DAYS,
            )?,
            archive_after_days: parse_env_or_default(
                "STORE_ARCHIVE_AFTER_DAYS",
                DEFAULT_ARCHIVE_AFTER_DAYS,
            )?,
            notification_dedup_hours: parse_env_or_default(
                "NOTIFICATION_DEDUP_HOURS",
                DEFAULT_DEDUP_HOURS,
            )?,
            locale,
        })
    }

    /// Lifecycle thresholds derived from this configuration.
    #[must_use]
    pub fn lifecycle_policy(&self) -> LifecyclePolicy {
        LifecyclePolicy {
            grace_period: TimeDelta::days(i64::from(self.grace_period_days)),
            archive_after: TimeDelta::days(i64::from(self.archive_after_days)),
        }
    }

    /// Notification scheduling rules derived from this configuration.
    #[must_use]
    pub fn notification_policy(&self) -> NotificationPolicy {
        NotificationPolicy {
            dedup_window: TimeDelta::hours(i64::from(self.notification_dedup_hours)),
            locale: self.locale,
            ..NotificationPolicy::default()
        }
    }
}

fn get_optional_env(key: &str) -> Option<String> {
    std::env::var(key).ok().filter(|value| !value.trim().is_empty())
}

fn parse_env_or_default<T>(key: &str, default: T) -> Result<T, ConfigError>
where
    T: std::str::FromStr,
    T::Err: std::fmt::Display,
{
    get_optional_env(key).map_or(Ok(default), |value| {
        value
            .trim()
            .parse::<T>()
            .map_err(|e| ConfigError::InvalidEnvVar(key.to_string(), e.to_string()))
    })
}
