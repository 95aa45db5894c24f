//! Plan catalog entries.

use chrono::TimeDelta;
use serde::{Deserialize, Serialize};

use storekeeper_core::{PlanId, Price};

/// A subscription plan a store can be opened or renewed with.
///
/// Plans are immutable; changing an offer means adding a new plan.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Plan {
    /// Catalog ID.
    pub id: PlanId,
    /// Display name.
    pub name: String,
    /// Price charged per plan period.
    pub price: Price,
    /// Maximum number of listings the store may hold.
    pub max_ads: u32,
    /// Length of one plan period in days.
    pub duration_days: u32,
}

impl Plan {
    /// Length of one plan period.
    #[must_use]
    pub fn duration(&self) -> TimeDelta {
        TimeDelta::days(i64::from(self.duration_days))
    }
}

/// Copy of the plan terms a store was last opened or renewed with.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PlanSnapshot {
    /// Plan the terms were taken from.
    pub plan_id: PlanId,
    /// Plan name at the time of purchase.
    pub name: String,
    /// Listing quota.
    pub max_ads: u32,
    /// Period length in days.
    pub duration_days: u32,
    /// Price paid.
    pub price: Price,
}

impl From<&Plan> for PlanSnapshot {
    fn from(plan: &Plan) -> Self {
        Self {
            plan_id: plan.id,
            name: plan.name.clone(),
            max_ads: plan.max_ads,
            duration_days: plan.duration_days,
            price: plan.price,
        }
    }
}
