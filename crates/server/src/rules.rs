//! Recurring rules API endpoints
//!
//! The schedule fields are engine-owned: updates never move
//! `next_execute_date` and only the toggle endpoint flips `is_active`.

use api_types::rule::{Frequency as ApiFrequency, RuleUpsert, RuleView};
use axum::{
    Extension, Json,
    extract::{Path, State},
    http::StatusCode,
};
use uuid::Uuid;

use crate::{ServerError, server::ServerState};
use engine::{RecurringRule, RuleNew, RuleUpdate, users};

fn map_frequency(frequency: ApiFrequency) -> engine::Frequency {
    match frequency {
        ApiFrequency::Daily => engine::Frequency::Daily,
        ApiFrequency::Weekly => engine::Frequency::Weekly,
        ApiFrequency::Monthly => engine::Frequency::Monthly,
        ApiFrequency::Yearly => engine::Frequency::Yearly,
    }
}

fn view(rule: RecurringRule) -> RuleView {
    RuleView {
        id: rule.id,
        amount_minor: rule.amount_minor,
        description: rule.description,
        category_id: rule.category_id,
        frequency: match rule.frequency {
            engine::Frequency::Daily => ApiFrequency::Daily,
            engine::Frequency::Weekly => ApiFrequency::Weekly,
            engine::Frequency::Monthly => ApiFrequency::Monthly,
            engine::Frequency::Yearly => ApiFrequency::Yearly,
        },
        start_date: rule.start_date,
        end_date: rule.end_date,
        next_execute_date: rule.next_execute_date,
        is_active: rule.is_active,
    }
}

pub async fn list(
    Extension(user): Extension<users::Model>,
    State(state): State<ServerState>,
) -> Result<Json<Vec<RuleView>>, ServerError> {
    let rules = state.engine.list_rules(&user.username).await?;
    Ok(Json(rules.into_iter().map(view).collect()))
}

pub async fn get_one(
    Extension(user): Extension<users::Model>,
    State(state): State<ServerState>,
    Path(id): Path<Uuid>,
) -> Result<Json<RuleView>, ServerError> {
    let rule = state.engine.rule(&user.username, id).await?;
    Ok(Json(view(rule)))
}

pub async fn create(
    Extension(user): Extension<users::Model>,
    State(state): State<ServerState>,
    Json(payload): Json<RuleUpsert>,
) -> Result<(StatusCode, Json<RuleView>), ServerError> {
    let rule = state
        .engine
        .create_rule(
            &user.username,
            RuleNew {
                amount_minor: payload.amount_minor,
                description: payload.description,
                category_id: payload.category_id,
                frequency: map_frequency(payload.frequency),
                start_date: payload.start_date,
                end_date: payload.end_date,
            },
        )
        .await?;
    Ok((StatusCode::CREATED, Json(view(rule))))
}

pub async fn update(
    Extension(user): Extension<users::Model>,
    State(state): State<ServerState>,
    Path(id): Path<Uuid>,
    Json(payload): Json<RuleUpsert>,
) -> Result<Json<RuleView>, ServerError> {
    let rule = state
        .engine
        .update_rule(
            &user.username,
            id,
            RuleUpdate {
                amount_minor: payload.amount_minor,
                description: payload.description,
                category_id: payload.category_id,
                frequency: map_frequency(payload.frequency),
                start_date: payload.start_date,
                end_date: payload.end_date,
            },
        )
        .await?;
    Ok(Json(view(rule)))
}

pub async fn toggle(
    Extension(user): Extension<users::Model>,
    State(state): State<ServerState>,
    Path(id): Path<Uuid>,
) -> Result<Json<RuleView>, ServerError> {
    let rule = state.engine.toggle_rule(&user.username, id).await?;
    Ok(Json(view(rule)))
}

pub async fn delete(
    Extension(user): Extension<users::Model>,
    State(state): State<ServerState>,
    Path(id): Path<Uuid>,
) -> Result<StatusCode, ServerError> {
    state.engine.delete_rule(&user.username, id).await?;
    Ok(StatusCode::NO_CONTENT)
}
