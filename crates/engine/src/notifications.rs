//! In-app notifications.
//!
//! Budget-threshold notifications carry the `(budget_id, threshold)` pair in
//! dedicated columns; the unique index on that pair is what makes threshold
//! alerts one-shot.

use chrono::{DateTime, Utc};
use sea_orm::{ActiveValue, entity::prelude::*};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::EngineError;

pub const KIND_BUDGET: &str = "budget";

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Severity {
    Low,
    Normal,
    High,
}

impl Severity {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Low => "low",
            Self::Normal => "normal",
            Self::High => "high",
        }
    }
}

impl TryFrom<&str> for Severity {
    type Error = EngineError;

    fn try_from(value: &str) -> Result<Self, Self::Error> {
        match value {
            "low" => Ok(Self::Low),
            "normal" => Ok(Self::Normal),
            "high" => Ok(Self::High),
            other => Err(EngineError::InvalidValue(format!(
                "invalid severity: {other}"
            ))),
        }
    }
}

/// Structured payload stored with a budget-threshold notification.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BudgetAlertData {
    pub budget_id: Uuid,
    pub threshold: u32,
    pub usage: f64,
    pub amount_minor: i64,
    pub spent_minor: i64,
}

#[derive(Clone, Debug, PartialEq, DeriveEntityModel)]
#[sea_orm(table_name = "notifications")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: String,
    pub user_id: String,
    pub kind: String,
    pub title: String,
    pub message: String,
    pub severity: String,
    pub is_read: bool,
    pub budget_id: Option<String>,
    pub threshold: Option<i32>,
    pub data: Option<String>,
    pub created_at: DateTimeUtc,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(
        belongs_to = "super::users::Entity",
        from = "Column::UserId",
        to = "super::users::Column::Username",
        on_update = "NoAction",
        on_delete = "Cascade"
    )]
    User,
}

impl Related<super::users::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::User.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}

pub(crate) fn budget_alert_model(
    user_id: &str,
    title: String,
    message: String,
    severity: Severity,
    data: &BudgetAlertData,
    created_at: DateTime<Utc>,
) -> ActiveModel {
    ActiveModel {
        id: ActiveValue::Set(Uuid::new_v4().to_string()),
        user_id: ActiveValue::Set(user_id.to_string()),
        kind: ActiveValue::Set(KIND_BUDGET.to_string()),
        title: ActiveValue::Set(title),
        message: ActiveValue::Set(message),
        severity: ActiveValue::Set(severity.as_str().to_string()),
        is_read: ActiveValue::Set(false),
        budget_id: ActiveValue::Set(Some(data.budget_id.to_string())),
        threshold: ActiveValue::Set(Some(data.threshold as i32)),
        data: ActiveValue::Set(serde_json::to_string(data).ok()),
        created_at: ActiveValue::Set(created_at),
    }
}
