//! Lifecycle sweep over a fixture.

use std::path::Path;
use std::sync::Arc;

use chrono::{DateTime, Utc};
use tracing::info;

use storekeeper_engine::{
    EngineConfig, NotificationWorker, SweepReport, TracingSink, event_channel,
};

use super::fixture;

/// Reconcile every fixture store at `now` and print the report.
///
/// Expiration notices go through a notification worker that logs them.
///
/// # Errors
///
/// Returns an error if configuration or the fixture cannot be loaded.
pub async fn run(
    path: &Path,
    now: DateTime<Utc>,
    json: bool,
) -> Result<(), Box<dyn std::error::Error>> {
    let config = EngineConfig::from_env()?;
    let locale = config.locale;
    let fixture = fixture::read(path).await?;

    let (events, receiver) = event_channel();
    let worker = NotificationWorker::new(receiver, Arc::new(TracingSink), locale).spawn();

    let engine = fixture::load_engine(fixture, config, events).await?;
    info!(at = %now, "Running sweep");
    let report = engine.sweep(now).await;

    // Dropping the engine closes the channel so the worker can drain and exit.
    drop(engine);
    worker.await?;

    if json {
        print_json(&report)?;
    } else {
        print_text(&report);
    }
    Ok(())
}

#[allow(clippy::print_stdout)]
fn print_json(report: &SweepReport) -> Result<(), serde_json::Error> {
    println!("{}", serde_json::to_string_pretty(report)?);
    Ok(())
}

#[allow(clippy::print_stdout)]
fn print_text(report: &SweepReport) {
    println!("Evaluated {} store(s)", report.evaluated);
    for change in &report.changes {
        println!("  #{}: {} -> {}", change.store_id, change.from, change.to);
    }
    println!("Notifications emitted: {}", report.notifications);
}
