//! Transactions API endpoints

use api_types::transaction::{TransactionUpsert, TransactionView, TransactionsBulk};
use axum::{
    Extension, Json,
    extract::{Path, State},
    http::StatusCode,
};
use uuid::Uuid;

use crate::{ServerError, server::ServerState};
use engine::{Transaction, TransactionNew, TransactionUpdate, users};

fn view(tx: Transaction) -> TransactionView {
    TransactionView {
        id: tx.id,
        amount_minor: tx.amount_minor,
        description: tx.description,
        date: tx.date,
        category_id: tx.category_id,
        recurring_rule_id: tx.recurring_rule_id,
        is_recurring: tx.is_recurring,
    }
}

fn to_new(body: TransactionUpsert) -> TransactionNew {
    TransactionNew {
        amount_minor: body.amount_minor,
        description: body.description,
        date: body.date,
        category_id: body.category_id,
    }
}

pub async fn list(
    Extension(user): Extension<users::Model>,
    State(state): State<ServerState>,
) -> Result<Json<Vec<TransactionView>>, ServerError> {
    let transactions = state.engine.list_transactions(&user.username).await?;
    Ok(Json(transactions.into_iter().map(view).collect()))
}

pub async fn get_one(
    Extension(user): Extension<users::Model>,
    State(state): State<ServerState>,
    Path(id): Path<Uuid>,
) -> Result<Json<TransactionView>, ServerError> {
    let tx = state.engine.transaction(&user.username, id).await?;
    Ok(Json(view(tx)))
}

pub async fn create(
    Extension(user): Extension<users::Model>,
    State(state): State<ServerState>,
    Json(payload): Json<TransactionUpsert>,
) -> Result<(StatusCode, Json<TransactionView>), ServerError> {
    let tx = state
        .engine
        .create_transaction(&user.username, to_new(payload))
        .await?;
    Ok((StatusCode::CREATED, Json(view(tx))))
}

pub async fn create_bulk(
    Extension(user): Extension<users::Model>,
    State(state): State<ServerState>,
    Json(payload): Json<TransactionsBulk>,
) -> Result<(StatusCode, Json<Vec<TransactionView>>), ServerError> {
    if payload.transactions.is_empty() {
        return Err(ServerError::Generic(
            "transactions must not be empty".to_string(),
        ));
    }

    let batch = payload.transactions.into_iter().map(to_new).collect();
    let created = state
        .engine
        .create_transactions_bulk(&user.username, batch)
        .await?;
    Ok((
        StatusCode::CREATED,
        Json(created.into_iter().map(view).collect()),
    ))
}

pub async fn update(
    Extension(user): Extension<users::Model>,
    State(state): State<ServerState>,
    Path(id): Path<Uuid>,
    Json(payload): Json<TransactionUpsert>,
) -> Result<Json<TransactionView>, ServerError> {
    let updated = state
        .engine
        .update_transaction(
            &user.username,
            id,
            TransactionUpdate {
                amount_minor: payload.amount_minor,
                description: payload.description,
                date: payload.date,
                category_id: payload.category_id,
            },
        )
        .await?;
    Ok(Json(view(updated)))
}

pub async fn delete(
    Extension(user): Extension<users::Model>,
    State(state): State<ServerState>,
    Path(id): Path<Uuid>,
) -> Result<StatusCode, ServerError> {
    state.engine.delete_transaction(&user.username, id).await?;
    Ok(StatusCode::NO_CONTENT)
}
