//! Plan catalog listing.

use storekeeper_engine::PlanCatalog;

/// Print the standard plan catalog.
#[allow(clippy::print_stdout)]
pub fn list() {
    println!("{:<4} {:<14} {:>9} {:>8} {:>6}", "ID", "PLAN", "PRICE", "LISTINGS", "DAYS");
    for plan in PlanCatalog::standard().iter() {
        println!(
            "{:<4} {:<14} {:>9} {:>8} {:>6}",
            plan.id.to_string(),
            plan.name,
            plan.price.to_string(),
            plan.max_ads,
            plan.duration_days
        );
    }
}
