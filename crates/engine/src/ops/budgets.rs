//! Budget operations.
//!
//! Create and update recompute the spend cache immediately so a budget is
//! never born (or resized) with a stale `spent_minor`.

use chrono::{DateTime, Utc};
use sea_orm::{ActiveModelTrait, ActiveValue, ColumnTrait, EntityTrait, QueryFilter};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::{
    Engine, EngineError, ResultEngine,
    budgets::{self, Budget, BudgetPeriod},
};

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct BudgetNew {
    pub name: String,
    pub amount_minor: i64,
    pub period: BudgetPeriod,
    pub start_date: DateTime<Utc>,
    pub end_date: DateTime<Utc>,
    pub category_id: Option<Uuid>,
}

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct BudgetUpdate {
    pub name: String,
    pub amount_minor: i64,
    pub period: BudgetPeriod,
    pub start_date: DateTime<Utc>,
    pub end_date: DateTime<Utc>,
    pub category_id: Option<Uuid>,
}

impl Engine {
    pub async fn create_budget(&self, user_id: &str, new: BudgetNew) -> ResultEngine<Budget> {
        if let Some(category_id) = new.category_id {
            self.category_of(user_id, category_id).await?;
        }

        let mut budget = Budget::new(
            user_id.to_string(),
            new.name,
            new.amount_minor,
            new.period,
            new.start_date,
            new.end_date,
            new.category_id,
        )?;
        budget.spent_minor = self.sum_budget_window(&budget).await?;

        budgets::ActiveModel::from(&budget)
            .insert(&self.database)
            .await?;
        Ok(budget)
    }

    pub async fn update_budget(
        &self,
        user_id: &str,
        budget_id: Uuid,
        update: BudgetUpdate,
    ) -> ResultEngine<Budget> {
        if update.amount_minor <= 0 {
            return Err(EngineError::InvalidAmount(
                "amount_minor must be > 0".to_string(),
            ));
        }
        if update.end_date <= update.start_date {
            return Err(EngineError::InvalidValue(
                "end_date must be after start_date".to_string(),
            ));
        }

        let model = self.owned_budget(user_id, budget_id).await?;
        let mut budget = Budget::try_from(model)?;
        if let Some(category_id) = update.category_id {
            self.category_of(user_id, category_id).await?;
        }

        budget.name = update.name;
        budget.amount_minor = update.amount_minor;
        budget.period = update.period;
        budget.start_date = update.start_date;
        budget.end_date = update.end_date;
        budget.category_id = update.category_id;
        // Window or category may have changed; rebuild the cache.
        budget.spent_minor = self.sum_budget_window(&budget).await?;

        let active = budgets::ActiveModel {
            id: ActiveValue::Set(budget.id.to_string()),
            name: ActiveValue::Set(budget.name.clone()),
            amount_minor: ActiveValue::Set(budget.amount_minor),
            period: ActiveValue::Set(budget.period.as_str().to_string()),
            spent_minor: ActiveValue::Set(budget.spent_minor),
            start_date: ActiveValue::Set(budget.start_date),
            end_date: ActiveValue::Set(budget.end_date),
            category_id: ActiveValue::Set(budget.category_id.map(|id| id.to_string())),
            ..Default::default()
        };
        active.update(&self.database).await?;

        Ok(budget)
    }

    pub async fn delete_budget(&self, user_id: &str, budget_id: Uuid) -> ResultEngine<()> {
        let model = self.owned_budget(user_id, budget_id).await?;
        budgets::Entity::delete_by_id(model.id)
            .exec(&self.database)
            .await?;
        Ok(())
    }

    pub async fn list_budgets(&self, user_id: &str) -> ResultEngine<Vec<Budget>> {
        let models = budgets::Entity::find()
            .filter(budgets::Column::UserId.eq(user_id))
            .all(&self.database)
            .await?;

        models.into_iter().map(Budget::try_from).collect()
    }

    pub async fn budget(&self, user_id: &str, budget_id: Uuid) -> ResultEngine<Budget> {
        let model = self.owned_budget(user_id, budget_id).await?;
        Budget::try_from(model)
    }

    async fn owned_budget(&self, user_id: &str, budget_id: Uuid) -> ResultEngine<budgets::Model> {
        budgets::Entity::find_by_id(budget_id.to_string())
            .filter(budgets::Column::UserId.eq(user_id))
            .one(&self.database)
            .await?
            .ok_or_else(|| EngineError::KeyNotFound("budget not exists".to_string()))
    }
}
