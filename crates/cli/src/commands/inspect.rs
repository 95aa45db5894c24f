//! Read-only fixture inspection.
//!
//! Evaluates every store at the given instant without reconciling, so the
//! output shows what the engine would settle on.

use std::path::Path;

use chrono::{DateTime, Utc};
use tracing::info;

use storekeeper_core::StoreId;
use storekeeper_engine::{EngineConfig, NextAction, StoreEngine, event_channel};

use super::fixture;

/// Print status, expiration info and usage for fixture stores.
///
/// # Errors
///
/// Returns an error if configuration or the fixture cannot be loaded, or if
/// `only` names a store missing from the fixture.
pub async fn run(
    path: &Path,
    now: DateTime<Utc>,
    only: Option<i32>,
) -> Result<(), Box<dyn std::error::Error>> {
    let config = EngineConfig::from_env()?;
    let fixture = fixture::read(path).await?;
    let (events, _receiver) = event_channel();
    let engine = fixture::load_engine(fixture, config, events).await?;

    let ids: Vec<StoreId> = match only {
        Some(id) => vec![StoreId::new(id)],
        None => engine.all_stores().await.into_iter().map(|store| store.id).collect(),
    };

    info!(at = %now, stores = ids.len(), "Inspecting stores");
    for id in ids {
        print_store(&engine, id, now).await?;
    }
    Ok(())
}

#[allow(clippy::print_stdout)]
async fn print_store(
    engine: &StoreEngine,
    id: StoreId,
    now: DateTime<Utc>,
) -> Result<(), Box<dyn std::error::Error>> {
    let store = engine.get_store(id).await?;
    let info = engine.get_expiration_info(id, now).await?;
    let usage = engine.get_usage(id).await?;

    println!("#{} {} (owner {})", store.id, store.name, store.owner_id);
    println!("  plan:        {} ({})", store.plan.name, store.plan.price);
    println!("  status:      {}", info.status);
    println!("  expires:     {} ({} day(s) left)", store.expires_at, info.days_until_expiration);
    if let Some(days) = info.days_in_grace_period {
        println!("  grace:       {days} day(s) left");
    }
    if let Some(days) = info.days_since_deactivation {
        println!("  deactivated: {days} day(s) ago");
    }
    println!(
        "  listings:    {}/{} ({} remaining, {} taken down early)",
        usage.used, usage.max, usage.remaining, usage.deleted_count
    );
    let action = match info.next_action {
        NextAction::None => "none",
        NextAction::Renew => "renew",
        NextAction::Reactivate => "reactivate",
    };
    match info.next_action_date {
        Some(date) => println!("  next action: {action} by {date}"),
        None => println!("  next action: {action}"),
    }
    Ok(())
}
