//! Read-only plan catalog.

use std::collections::BTreeMap;

use storekeeper_core::{CurrencyCode, PlanId, Price};

use crate::models::Plan;

/// The set of plans stores can be opened or renewed with.
#[derive(Debug, Clone, Default)]
pub struct PlanCatalog {
    plans: BTreeMap<PlanId, Plan>,
}

impl PlanCatalog {
    /// Build a catalog from explicit plans. Later duplicates replace earlier ones.
    #[must_use]
    pub fn from_plans(plans: impl IntoIterator<Item = Plan>) -> Self {
        Self {
            plans: plans.into_iter().map(|plan| (plan.id, plan)).collect(),
        }
    }

    /// The standard marketplace plans.
    #[must_use]
    pub fn standard() -> Self {
        Self::from_plans([
            Plan {
                id: PlanId::new(1),
                name: "Starter".to_string(),
                price: Price::from_cents(0, CurrencyCode::USD),
                max_ads: 3,
                duration_days: 15,
            },
            Plan {
                id: PlanId::new(2),
                name: "Basic".to_string(),
                price: Price::from_cents(999, CurrencyCode::USD),
                max_ads: 10,
                duration_days: 30,
            },
            Plan {
                id: PlanId::new(3),
                name: "Professional".to_string(),
                price: Price::from_cents(2499, CurrencyCode::USD),
                max_ads: 50,
                duration_days: 30,
            },
            Plan {
                id: PlanId::new(4),
                name: "Premium".to_string(),
                price: Price::from_cents(5999, CurrencyCode::USD),
                max_ads: 200,
                duration_days: 90,
            },
        ])
    }

    /// Look up a plan.
    #[must_use]
    pub fn get(&self, id: PlanId) -> Option<&Plan> {
        self.plans.get(&id)
    }

    /// All plans, ordered by ID.
    pub fn iter(&self) -> impl Iterator<Item = &Plan> {
        self.plans.values()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_standard_catalog() {
        let catalog = PlanCatalog::standard();
        assert_eq!(catalog.iter().count(), 4);

        let basic = catalog.get(PlanId::new(2));
        assert!(matches!(basic, Some(plan) if plan.max_ads == 10 && plan.duration_days == 30));
        assert!(catalog.get(PlanId::new(99)).is_none());
    }

    #[test]
    fn test_from_plans_orders_by_id() {
        let standard = PlanCatalog::standard();
        let mut plans: Vec<Plan> = standard.iter().cloned().collect();
        plans.reverse();

        let catalog = PlanCatalog::from_plans(plans);
        let ids: Vec<i32> = catalog.iter().map(|plan| plan.id.as_i32()).collect();
        assert_eq!(ids, vec![1, 2, 3, 4]);
    }
}
