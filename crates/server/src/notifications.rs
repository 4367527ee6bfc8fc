//! Notifications API endpoints

use api_types::notification::{MarkedRead, NotificationView, NotificationsQuery};
use axum::{
    Extension, Json,
    extract::{Path, Query, State},
    http::StatusCode,
};
use uuid::Uuid;

use crate::{ServerError, server::ServerState};
use engine::users;

fn view(model: engine::notifications::Model) -> Result<NotificationView, ServerError> {
    let id = Uuid::parse_str(&model.id)
        .map_err(|_| ServerError::Generic("malformed notification id".to_string()))?;
    Ok(NotificationView {
        id,
        kind: model.kind,
        title: model.title,
        message: model.message,
        severity: model.severity,
        is_read: model.is_read,
        data: model.data,
        created_at: model.created_at,
    })
}

pub async fn list(
    Extension(user): Extension<users::Model>,
    State(state): State<ServerState>,
    Query(query): Query<NotificationsQuery>,
) -> Result<Json<Vec<NotificationView>>, ServerError> {
    let unread_only = query.unread.unwrap_or(false);
    let notifications = state
        .engine
        .list_notifications(&user.username, unread_only)
        .await?;
    let views = notifications
        .into_iter()
        .map(view)
        .collect::<Result<_, _>>()?;
    Ok(Json(views))
}

pub async fn mark_read(
    Extension(user): Extension<users::Model>,
    State(state): State<ServerState>,
    Path(id): Path<Uuid>,
) -> Result<StatusCode, ServerError> {
    state
        .engine
        .mark_notification_read(&user.username, id)
        .await?;
    Ok(StatusCode::NO_CONTENT)
}

pub async fn mark_all_read(
    Extension(user): Extension<users::Model>,
    State(state): State<ServerState>,
) -> Result<Json<MarkedRead>, ServerError> {
    let marked = state
        .engine
        .mark_all_notifications_read(&user.username)
        .await?;
    Ok(Json(MarkedRead { marked }))
}
