//! Fixed-interval driver for the recurring engine and the threshold
//! notifier.
//!
//! Each tick is a stateless full sweep bounded by the due-rule and
//! active-user predicates; there is no persisted tick state. Failures are
//! logged and whatever is still due is retried on the next tick.

use std::sync::Arc;
use std::time::Duration;

use chrono::Utc;
use tokio::time::MissedTickBehavior;

use crate::Engine;

pub const DEFAULT_PERIOD: Duration = Duration::from_secs(60 * 60);

/// Runs the periodic sweep until the task is dropped.
pub async fn run(engine: Arc<Engine>, period: Duration) {
    let mut ticker = tokio::time::interval(period);
    ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
    // An interval's first tick completes immediately; consume it so the
    // first sweep happens one full period after startup.
    ticker.tick().await;

    tracing::info!(period_secs = period.as_secs(), "scheduler started");
    loop {
        ticker.tick().await;
        tick(&engine).await;
    }
}

/// One scheduler tick: materialize due rules, then run a threshold pass for
/// every user. Also the unit of work behind the administrative trigger, so
/// it must stay safe to run concurrently with the periodic sweep.
pub async fn tick(engine: &Engine) {
    match engine.process_due_rules(Utc::now()).await {
        Ok(0) => {}
        Ok(count) => tracing::info!(count, "materialized recurring transactions"),
        Err(err) => tracing::error!("recurring pass failed: {err}"),
    }

    let usernames = match engine.usernames().await {
        Ok(usernames) => usernames,
        Err(err) => {
            tracing::error!("failed to list users for threshold pass: {err}");
            return;
        }
    };
    for username in usernames {
        if let Err(err) = engine.check_budget_thresholds(&username).await {
            tracing::warn!(user = %username, "threshold pass failed: {err}");
        }
    }
}
