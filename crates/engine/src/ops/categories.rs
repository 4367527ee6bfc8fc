//! Category operations.

use sea_orm::{ActiveModelTrait, ActiveValue, ColumnTrait, EntityTrait, QueryFilter};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::{
    Engine, EngineError, ResultEngine,
    categories::{self, CategoryKind},
};

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct CategoryNew {
    pub name: String,
    pub kind: CategoryKind,
}

impl Engine {
    pub async fn create_category(
        &self,
        user_id: &str,
        new: CategoryNew,
    ) -> ResultEngine<categories::Model> {
        let existing = categories::Entity::find()
            .filter(categories::Column::UserId.eq(user_id))
            .filter(categories::Column::Name.eq(&new.name))
            .one(&self.database)
            .await?;
        if existing.is_some() {
            return Err(EngineError::ExistingKey(new.name));
        }

        let model = categories::ActiveModel {
            id: ActiveValue::Set(Uuid::new_v4().to_string()),
            user_id: ActiveValue::Set(user_id.to_string()),
            name: ActiveValue::Set(new.name),
            kind: ActiveValue::Set(new.kind.as_str().to_string()),
        };
        Ok(model.insert(&self.database).await?)
    }

    pub async fn list_categories(&self, user_id: &str) -> ResultEngine<Vec<categories::Model>> {
        Ok(categories::Entity::find()
            .filter(categories::Column::UserId.eq(user_id))
            .all(&self.database)
            .await?)
    }
}
