//! Ledger entries.
//!
//! A `Transaction` is created either by a user action or by the recurring
//! rule engine (`is_recurring` plus a back-reference to the generating rule).

use chrono::{DateTime, Utc};
use sea_orm::{ActiveValue, entity::prelude::*};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::{EngineError, ResultEngine};

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Transaction {
    pub id: Uuid,
    pub user_id: String,
    pub category_id: Uuid,
    pub amount_minor: i64,
    pub description: String,
    pub date: DateTime<Utc>,
    pub recurring_rule_id: Option<Uuid>,
    pub is_recurring: bool,
}

impl Transaction {
    pub fn new(
        user_id: String,
        category_id: Uuid,
        amount_minor: i64,
        description: String,
        date: DateTime<Utc>,
    ) -> ResultEngine<Self> {
        if amount_minor <= 0 {
            return Err(EngineError::InvalidAmount(
                "amount_minor must be > 0".to_string(),
            ));
        }
        Ok(Self {
            id: Uuid::new_v4(),
            user_id,
            category_id,
            amount_minor,
            description,
            date,
            recurring_rule_id: None,
            is_recurring: false,
        })
    }
}

#[derive(Clone, Debug, PartialEq, DeriveEntityModel)]
#[sea_orm(table_name = "transactions")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: String,
    pub user_id: String,
    pub category_id: String,
    pub amount_minor: i64,
    pub description: String,
    pub date: DateTimeUtc,
    pub recurring_rule_id: Option<String>,
    pub is_recurring: bool,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(
        belongs_to = "super::categories::Entity",
        from = "Column::CategoryId",
        to = "super::categories::Column::Id",
        on_update = "NoAction",
        on_delete = "NoAction"
    )]
    Category,
    #[sea_orm(
        belongs_to = "super::recurring_rules::Entity",
        from = "Column::RecurringRuleId",
        to = "super::recurring_rules::Column::Id",
        on_update = "NoAction",
        on_delete = "NoAction"
    )]
    RecurringRule,
}

impl Related<super::categories::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Category.def()
    }
}

impl Related<super::recurring_rules::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::RecurringRule.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}

impl From<&Transaction> for ActiveModel {
    fn from(tx: &Transaction) -> Self {
        Self {
            id: ActiveValue::Set(tx.id.to_string()),
            user_id: ActiveValue::Set(tx.user_id.clone()),
            category_id: ActiveValue::Set(tx.category_id.to_string()),
            amount_minor: ActiveValue::Set(tx.amount_minor),
            description: ActiveValue::Set(tx.description.clone()),
            date: ActiveValue::Set(tx.date),
            recurring_rule_id: ActiveValue::Set(tx.recurring_rule_id.map(|id| id.to_string())),
            is_recurring: ActiveValue::Set(tx.is_recurring),
        }
    }
}

impl TryFrom<Model> for Transaction {
    type Error = EngineError;

    fn try_from(model: Model) -> Result<Self, Self::Error> {
        Ok(Self {
            id: Uuid::parse_str(&model.id)
                .map_err(|_| EngineError::KeyNotFound("transaction not exists".to_string()))?,
            user_id: model.user_id,
            category_id: Uuid::parse_str(&model.category_id)
                .map_err(|_| EngineError::KeyNotFound("category not exists".to_string()))?,
            amount_minor: model.amount_minor,
            description: model.description,
            date: model.date,
            recurring_rule_id: model
                .recurring_rule_id
                .and_then(|s| Uuid::parse_str(&s).ok()),
            is_recurring: model.is_recurring,
        })
    }
}
