//! Manual trigger for the recurring sweep, equivalent to one scheduler tick.

use api_types::admin::ProcessedResponse;
use axum::{Extension, Json, extract::State};
use chrono::Utc;

use crate::{ServerError, server::ServerState};
use engine::users;

pub async fn process_recurring(
    _: Extension<users::Model>,
    State(state): State<ServerState>,
) -> Result<Json<ProcessedResponse>, ServerError> {
    let processed_count = state.engine.process_due_rules(Utc::now()).await?;
    // Same unit of work as a scheduler tick: the sweep can push any user's
    // budget over a threshold, so every user gets a pass.
    for username in state.engine.usernames().await? {
        if let Err(err) = state.engine.check_budget_thresholds(&username).await {
            tracing::warn!(user = %username, "threshold pass after manual trigger failed: {err}");
        }
    }

    Ok(Json(ProcessedResponse { processed_count }))
}
