//! Budgets API endpoints

use api_types::budget::{BudgetPeriod as ApiPeriod, BudgetUpsert, BudgetView};
use axum::{
    Extension, Json,
    extract::{Path, State},
    http::StatusCode,
};
use uuid::Uuid;

use crate::{ServerError, server::ServerState};
use engine::{Budget, BudgetNew, BudgetUpdate, users};

fn map_period(period: ApiPeriod) -> engine::BudgetPeriod {
    match period {
        ApiPeriod::Weekly => engine::BudgetPeriod::Weekly,
        ApiPeriod::Monthly => engine::BudgetPeriod::Monthly,
        ApiPeriod::Yearly => engine::BudgetPeriod::Yearly,
    }
}

fn view(budget: Budget) -> BudgetView {
    let usage_percent = budget.usage_percent();
    BudgetView {
        id: budget.id,
        name: budget.name,
        amount_minor: budget.amount_minor,
        spent_minor: budget.spent_minor,
        usage_percent,
        period: match budget.period {
            engine::BudgetPeriod::Weekly => ApiPeriod::Weekly,
            engine::BudgetPeriod::Monthly => ApiPeriod::Monthly,
            engine::BudgetPeriod::Yearly => ApiPeriod::Yearly,
        },
        start_date: budget.start_date,
        end_date: budget.end_date,
        category_id: budget.category_id,
    }
}

pub async fn list(
    Extension(user): Extension<users::Model>,
    State(state): State<ServerState>,
) -> Result<Json<Vec<BudgetView>>, ServerError> {
    let budgets = state.engine.list_budgets(&user.username).await?;
    Ok(Json(budgets.into_iter().map(view).collect()))
}

pub async fn get_one(
    Extension(user): Extension<users::Model>,
    State(state): State<ServerState>,
    Path(id): Path<Uuid>,
) -> Result<Json<BudgetView>, ServerError> {
    let budget = state.engine.budget(&user.username, id).await?;
    Ok(Json(view(budget)))
}

pub async fn create(
    Extension(user): Extension<users::Model>,
    State(state): State<ServerState>,
    Json(payload): Json<BudgetUpsert>,
) -> Result<(StatusCode, Json<BudgetView>), ServerError> {
    let budget = state
        .engine
        .create_budget(
            &user.username,
            BudgetNew {
                name: payload.name,
                amount_minor: payload.amount_minor,
                period: map_period(payload.period),
                start_date: payload.start_date,
                end_date: payload.end_date,
                category_id: payload.category_id,
            },
        )
        .await?;
    Ok((StatusCode::CREATED, Json(view(budget))))
}

pub async fn update(
    Extension(user): Extension<users::Model>,
    State(state): State<ServerState>,
    Path(id): Path<Uuid>,
    Json(payload): Json<BudgetUpsert>,
) -> Result<Json<BudgetView>, ServerError> {
    let budget = state
        .engine
        .update_budget(
            &user.username,
            id,
            BudgetUpdate {
                name: payload.name,
                amount_minor: payload.amount_minor,
                period: map_period(payload.period),
                start_date: payload.start_date,
                end_date: payload.end_date,
                category_id: payload.category_id,
            },
        )
        .await?;
    Ok(Json(view(budget)))
}

pub async fn delete(
    Extension(user): Extension<users::Model>,
    State(state): State<ServerState>,
    Path(id): Path<Uuid>,
) -> Result<StatusCode, ServerError> {
    state.engine.delete_budget(&user.username, id).await?;
    Ok(StatusCode::NO_CONTENT)
}
