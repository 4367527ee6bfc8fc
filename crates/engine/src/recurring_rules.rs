//! Recurring rule primitives.
//!
//! A rule is a template that periodically materializes into a ledger
//! transaction. `next_execute_date` is the next occurrence to materialize; it
//! is seeded with `start_date` on creation and only ever advanced by the
//! engine, one calendar period at a time.

use chrono::{DateTime, Days, Months, Utc};
use sea_orm::{ActiveValue, entity::prelude::*};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::{EngineError, ResultEngine};

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Frequency {
    Daily,
    Weekly,
    Monthly,
    Yearly,
}

impl Frequency {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Daily => "daily",
            Self::Weekly => "weekly",
            Self::Monthly => "monthly",
            Self::Yearly => "yearly",
        }
    }

    /// One calendar period after `from`.
    ///
    /// Monthly/yearly steps clamp to the last day of a shorter month
    /// (Jan 31 + 1 month = Feb 28/29).
    pub fn advance(self, from: DateTime<Utc>) -> DateTime<Utc> {
        let next = match self {
            Self::Daily => from.checked_add_days(Days::new(1)),
            Self::Weekly => from.checked_add_days(Days::new(7)),
            Self::Monthly => from.checked_add_months(Months::new(1)),
            Self::Yearly => from.checked_add_months(Months::new(12)),
        };
        next.unwrap_or(from)
    }
}

impl TryFrom<&str> for Frequency {
    type Error = EngineError;

    fn try_from(value: &str) -> Result<Self, Self::Error> {
        match value {
            "daily" => Ok(Self::Daily),
            "weekly" => Ok(Self::Weekly),
            "monthly" => Ok(Self::Monthly),
            "yearly" => Ok(Self::Yearly),
            other => Err(EngineError::InvalidValue(format!(
                "invalid frequency: {other}"
            ))),
        }
    }
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct RecurringRule {
    pub id: Uuid,
    pub user_id: String,
    pub category_id: Uuid,
    pub amount_minor: i64,
    pub description: String,
    pub frequency: Frequency,
    pub start_date: DateTime<Utc>,
    pub end_date: Option<DateTime<Utc>>,
    pub next_execute_date: DateTime<Utc>,
    pub is_active: bool,
}

impl RecurringRule {
    pub fn new(
        user_id: String,
        category_id: Uuid,
        amount_minor: i64,
        description: String,
        frequency: Frequency,
        start_date: DateTime<Utc>,
        end_date: Option<DateTime<Utc>>,
    ) -> ResultEngine<Self> {
        if amount_minor <= 0 {
            return Err(EngineError::InvalidAmount(
                "amount_minor must be > 0".to_string(),
            ));
        }
        if let Some(end) = end_date {
            if end <= start_date {
                return Err(EngineError::InvalidValue(
                    "end_date must be after start_date".to_string(),
                ));
            }
        }
        Ok(Self {
            id: Uuid::new_v4(),
            user_id,
            category_id,
            amount_minor,
            description,
            frequency,
            start_date,
            end_date,
            next_execute_date: start_date,
            is_active: true,
        })
    }

    /// Whether this rule should materialize an occurrence right now.
    ///
    /// Re-checked at processing time: a rule selected as due may have been
    /// deactivated or expired by a concurrent tick in the meantime.
    pub fn is_due(&self, now: DateTime<Utc>) -> bool {
        self.is_active
            && self.next_execute_date < now
            && self.end_date.is_none_or(|end| end > now)
    }

    /// The occurrence after the current `next_execute_date`.
    ///
    /// Computed from the previous scheduled date, never from the clock, so a
    /// late tick does not drift the schedule.
    pub fn advanced_date(&self) -> DateTime<Utc> {
        self.frequency.advance(self.next_execute_date)
    }
}

#[derive(Clone, Debug, PartialEq, DeriveEntityModel)]
#[sea_orm(table_name = "recurring_rules")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: String,
    pub user_id: String,
    pub category_id: String,
    pub amount_minor: i64,
    pub description: String,
    pub frequency: String,
    pub start_date: DateTimeUtc,
    pub end_date: Option<DateTimeUtc>,
    pub next_execute_date: DateTimeUtc,
    pub is_active: bool,
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
    #[sea_orm(has_many = "super::transactions::Entity")]
    Transactions,
}

impl Related<super::categories::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Category.def()
    }
}

impl Related<super::transactions::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Transactions.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}

impl From<&RecurringRule> for ActiveModel {
    fn from(rule: &RecurringRule) -> Self {
        Self {
            id: ActiveValue::Set(rule.id.to_string()),
            user_id: ActiveValue::Set(rule.user_id.clone()),
            category_id: ActiveValue::Set(rule.category_id.to_string()),
            amount_minor: ActiveValue::Set(rule.amount_minor),
            description: ActiveValue::Set(rule.description.clone()),
            frequency: ActiveValue::Set(rule.frequency.as_str().to_string()),
            start_date: ActiveValue::Set(rule.start_date),
            end_date: ActiveValue::Set(rule.end_date),
            next_execute_date: ActiveValue::Set(rule.next_execute_date),
            is_active: ActiveValue::Set(rule.is_active),
        }
    }
}

impl TryFrom<Model> for RecurringRule {
    type Error = EngineError;

    fn try_from(model: Model) -> Result<Self, Self::Error> {
        Ok(Self {
            id: Uuid::parse_str(&model.id)
                .map_err(|_| EngineError::KeyNotFound("rule not exists".to_string()))?,
            user_id: model.user_id,
            category_id: Uuid::parse_str(&model.category_id)
                .map_err(|_| EngineError::KeyNotFound("category not exists".to_string()))?,
            amount_minor: model.amount_minor,
            description: model.description,
            frequency: Frequency::try_from(model.frequency.as_str())?,
            start_date: model.start_date,
            end_date: model.end_date,
            next_execute_date: model.next_execute_date,
            is_active: model.is_active,
        })
    }
}
