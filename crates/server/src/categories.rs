//! Categories API endpoints

use api_types::category::{CategoryNew as ApiCategoryNew, CategoryView};
use axum::{Extension, Json, extract::State, http::StatusCode};
use uuid::Uuid;

use crate::{ServerError, server::ServerState};
use engine::{CategoryKind, CategoryNew, users};

fn view(model: engine::categories::Model) -> Result<CategoryView, ServerError> {
    let id = Uuid::parse_str(&model.id)
        .map_err(|_| ServerError::Generic("malformed category id".to_string()))?;
    Ok(CategoryView {
        id,
        name: model.name,
        kind: model.kind,
    })
}

pub async fn list(
    Extension(user): Extension<users::Model>,
    State(state): State<ServerState>,
) -> Result<Json<Vec<CategoryView>>, ServerError> {
    let categories = state.engine.list_categories(&user.username).await?;
    let views = categories.into_iter().map(view).collect::<Result<_, _>>()?;
    Ok(Json(views))
}

pub async fn create(
    Extension(user): Extension<users::Model>,
    State(state): State<ServerState>,
    Json(payload): Json<ApiCategoryNew>,
) -> Result<(StatusCode, Json<CategoryView>), ServerError> {
    let kind = match payload.kind {
        api_types::category::CategoryKind::Expense => CategoryKind::Expense,
        api_types::category::CategoryKind::Income => CategoryKind::Income,
    };
    let created = state
        .engine
        .create_category(
            &user.username,
            CategoryNew {
                name: payload.name,
                kind,
            },
        )
        .await?;
    Ok((StatusCode::CREATED, Json(view(created)?)))
}
