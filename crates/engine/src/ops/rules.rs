//! Recurring rule operations (user-facing CRUD).
//!
//! User edits never touch `next_execute_date`; creation seeds it with the
//! start date and only the engine advances it afterwards.

use chrono::{DateTime, Utc};
use sea_orm::{ActiveModelTrait, ActiveValue, ColumnTrait, EntityTrait, QueryFilter};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::{
    Engine, EngineError, Frequency, ResultEngine,
    recurring_rules::{self, RecurringRule},
};

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct RuleNew {
    pub amount_minor: i64,
    pub description: String,
    pub category_id: Uuid,
    pub frequency: Frequency,
    pub start_date: DateTime<Utc>,
    pub end_date: Option<DateTime<Utc>>,
}

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct RuleUpdate {
    pub amount_minor: i64,
    pub description: String,
    pub category_id: Uuid,
    pub frequency: Frequency,
    pub start_date: DateTime<Utc>,
    pub end_date: Option<DateTime<Utc>>,
}

impl Engine {
    pub async fn create_rule(&self, user_id: &str, new: RuleNew) -> ResultEngine<RecurringRule> {
        self.category_of(user_id, new.category_id).await?;

        let rule = RecurringRule::new(
            user_id.to_string(),
            new.category_id,
            new.amount_minor,
            new.description,
            new.frequency,
            new.start_date,
            new.end_date,
        )?;
        recurring_rules::ActiveModel::from(&rule)
            .insert(&self.database)
            .await?;
        Ok(rule)
    }

    pub async fn update_rule(
        &self,
        user_id: &str,
        rule_id: Uuid,
        update: RuleUpdate,
    ) -> ResultEngine<RecurringRule> {
        if update.amount_minor <= 0 {
            return Err(EngineError::InvalidAmount(
                "amount_minor must be > 0".to_string(),
            ));
        }

        let model = self.owned_rule(user_id, rule_id).await?;
        let mut rule = RecurringRule::try_from(model)?;
        self.category_of(user_id, update.category_id).await?;

        rule.amount_minor = update.amount_minor;
        rule.description = update.description;
        rule.category_id = update.category_id;
        rule.frequency = update.frequency;
        rule.start_date = update.start_date;
        rule.end_date = update.end_date;

        let active = recurring_rules::ActiveModel {
            id: ActiveValue::Set(rule.id.to_string()),
            amount_minor: ActiveValue::Set(rule.amount_minor),
            description: ActiveValue::Set(rule.description.clone()),
            category_id: ActiveValue::Set(rule.category_id.to_string()),
            frequency: ActiveValue::Set(rule.frequency.as_str().to_string()),
            start_date: ActiveValue::Set(rule.start_date),
            end_date: ActiveValue::Set(rule.end_date),
            ..Default::default()
        };
        active.update(&self.database).await?;

        Ok(rule)
    }

    /// Flips a rule between active and paused.
    pub async fn toggle_rule(&self, user_id: &str, rule_id: Uuid) -> ResultEngine<RecurringRule> {
        let model = self.owned_rule(user_id, rule_id).await?;
        let mut rule = RecurringRule::try_from(model)?;
        rule.is_active = !rule.is_active;

        let active = recurring_rules::ActiveModel {
            id: ActiveValue::Set(rule.id.to_string()),
            is_active: ActiveValue::Set(rule.is_active),
            ..Default::default()
        };
        active.update(&self.database).await?;

        Ok(rule)
    }

    pub async fn delete_rule(&self, user_id: &str, rule_id: Uuid) -> ResultEngine<()> {
        let model = self.owned_rule(user_id, rule_id).await?;
        recurring_rules::Entity::delete_by_id(model.id)
            .exec(&self.database)
            .await?;
        Ok(())
    }

    pub async fn list_rules(&self, user_id: &str) -> ResultEngine<Vec<RecurringRule>> {
        let models = recurring_rules::Entity::find()
            .filter(recurring_rules::Column::UserId.eq(user_id))
            .all(&self.database)
            .await?;

        models.into_iter().map(RecurringRule::try_from).collect()
    }

    pub async fn rule(&self, user_id: &str, rule_id: Uuid) -> ResultEngine<RecurringRule> {
        let model = self.owned_rule(user_id, rule_id).await?;
        RecurringRule::try_from(model)
    }

    async fn owned_rule(
        &self,
        user_id: &str,
        rule_id: Uuid,
    ) -> ResultEngine<recurring_rules::Model> {
        recurring_rules::Entity::find_by_id(rule_id.to_string())
            .filter(recurring_rules::Column::UserId.eq(user_id))
            .one(&self.database)
            .await?
            .ok_or_else(|| EngineError::KeyNotFound("rule not exists".to_string()))
    }
}
