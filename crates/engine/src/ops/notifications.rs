//! Notification queries and read-state updates.

use sea_orm::{
    ActiveModelTrait, ActiveValue, ColumnTrait, EntityTrait, QueryFilter, QueryOrder,
    sea_query::Expr,
};
use uuid::Uuid;

use crate::{Engine, EngineError, ResultEngine, notifications};

impl Engine {
    pub async fn list_notifications(
        &self,
        user_id: &str,
        unread_only: bool,
    ) -> ResultEngine<Vec<notifications::Model>> {
        let mut query = notifications::Entity::find()
            .filter(notifications::Column::UserId.eq(user_id))
            .order_by_desc(notifications::Column::CreatedAt);
        if unread_only {
            query = query.filter(notifications::Column::IsRead.eq(false));
        }

        Ok(query.all(&self.database).await?)
    }

    pub async fn mark_notification_read(
        &self,
        user_id: &str,
        notification_id: Uuid,
    ) -> ResultEngine<()> {
        let model = notifications::Entity::find_by_id(notification_id.to_string())
            .filter(notifications::Column::UserId.eq(user_id))
            .one(&self.database)
            .await?
            .ok_or_else(|| EngineError::KeyNotFound("notification not exists".to_string()))?;

        let active = notifications::ActiveModel {
            id: ActiveValue::Set(model.id),
            is_read: ActiveValue::Set(true),
            ..Default::default()
        };
        active.update(&self.database).await?;
        Ok(())
    }

    pub async fn mark_all_notifications_read(&self, user_id: &str) -> ResultEngine<u64> {
        let result = notifications::Entity::update_many()
            .col_expr(notifications::Column::IsRead, Expr::value(true))
            .filter(notifications::Column::UserId.eq(user_id))
            .filter(notifications::Column::IsRead.eq(false))
            .exec(&self.database)
            .await?;
        Ok(result.rows_affected)
    }
}
