//! Budget primitives.
//!
//! `spent_minor` is a derived cache, always recomputable from the ledger. No
//! component other than the reconciler may treat it as authoritative.

use chrono::{DateTime, Utc};
use sea_orm::{ActiveValue, entity::prelude::*};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::{EngineError, ResultEngine};

/// Usage percentages that trigger a one-time notification, ascending.
pub const THRESHOLDS: [u32; 3] = [80, 100, 120];

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BudgetPeriod {
    Weekly,
    Monthly,
    Yearly,
}

impl BudgetPeriod {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Weekly => "weekly",
            Self::Monthly => "monthly",
            Self::Yearly => "yearly",
        }
    }
}

impl TryFrom<&str> for BudgetPeriod {
    type Error = EngineError;

    fn try_from(value: &str) -> Result<Self, Self::Error> {
        match value {
            "weekly" => Ok(Self::Weekly),
            "monthly" => Ok(Self::Monthly),
            "yearly" => Ok(Self::Yearly),
            other => Err(EngineError::InvalidValue(format!(
                "invalid budget period: {other}"
            ))),
        }
    }
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Budget {
    pub id: Uuid,
    pub user_id: String,
    pub name: String,
    pub amount_minor: i64,
    pub period: BudgetPeriod,
    pub spent_minor: i64,
    pub start_date: DateTime<Utc>,
    pub end_date: DateTime<Utc>,
    /// `None` applies the budget to all expense categories.
    pub category_id: Option<Uuid>,
}

impl Budget {
    pub fn new(
        user_id: String,
        name: String,
        amount_minor: i64,
        period: BudgetPeriod,
        start_date: DateTime<Utc>,
        end_date: DateTime<Utc>,
        category_id: Option<Uuid>,
    ) -> ResultEngine<Self> {
        if amount_minor <= 0 {
            return Err(EngineError::InvalidAmount(
                "amount_minor must be > 0".to_string(),
            ));
        }
        if end_date <= start_date {
            return Err(EngineError::InvalidValue(
                "end_date must be after start_date".to_string(),
            ));
        }
        Ok(Self {
            id: Uuid::new_v4(),
            user_id,
            name,
            amount_minor,
            period,
            spent_minor: 0,
            start_date,
            end_date,
            category_id,
        })
    }

    /// Spend as a percentage of the target amount. Zero-amount budgets read
    /// as 0% to avoid division errors.
    pub fn usage_percent(&self) -> f64 {
        if self.amount_minor == 0 {
            return 0.0;
        }
        self.spent_minor as f64 / self.amount_minor as f64 * 100.0
    }

    /// Thresholds the current usage has reached, ascending.
    pub fn exceeded_thresholds(&self) -> Vec<u32> {
        let usage = self.usage_percent();
        THRESHOLDS
            .into_iter()
            .filter(|t| usage >= f64::from(*t))
            .collect()
    }

    pub fn contains(&self, date: DateTime<Utc>) -> bool {
        self.start_date <= date && date <= self.end_date
    }
}

#[derive(Clone, Debug, PartialEq, DeriveEntityModel)]
#[sea_orm(table_name = "budgets")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: String,
    pub user_id: String,
    pub name: String,
    pub amount_minor: i64,
    pub period: String,
    pub spent_minor: i64,
    pub start_date: DateTimeUtc,
    pub end_date: DateTimeUtc,
    pub category_id: Option<String>,
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
}

impl Related<super::categories::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Category.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}

impl From<&Budget> for ActiveModel {
    fn from(budget: &Budget) -> Self {
        Self {
            id: ActiveValue::Set(budget.id.to_string()),
            user_id: ActiveValue::Set(budget.user_id.clone()),
            name: ActiveValue::Set(budget.name.clone()),
            amount_minor: ActiveValue::Set(budget.amount_minor),
            period: ActiveValue::Set(budget.period.as_str().to_string()),
            spent_minor: ActiveValue::Set(budget.spent_minor),
            start_date: ActiveValue::Set(budget.start_date),
            end_date: ActiveValue::Set(budget.end_date),
            category_id: ActiveValue::Set(budget.category_id.map(|id| id.to_string())),
        }
    }
}

impl TryFrom<Model> for Budget {
    type Error = EngineError;

    fn try_from(model: Model) -> Result<Self, Self::Error> {
        Ok(Self {
            id: Uuid::parse_str(&model.id)
                .map_err(|_| EngineError::KeyNotFound("budget not exists".to_string()))?,
            user_id: model.user_id,
            name: model.name,
            amount_minor: model.amount_minor,
            period: BudgetPeriod::try_from(model.period.as_str())?,
            spent_minor: model.spent_minor,
            start_date: model.start_date,
            end_date: model.end_date,
            category_id: model.category_id.and_then(|s| Uuid::parse_str(&s).ok()),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn budget(amount_minor: i64, spent_minor: i64) -> Budget {
        Budget {
            id: Uuid::new_v4(),
            user_id: "alice".to_string(),
            name: "Groceries".to_string(),
            amount_minor,
            period: BudgetPeriod::Monthly,
            spent_minor,
            start_date: Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap(),
            end_date: Utc.with_ymd_and_hms(2024, 1, 31, 23, 59, 59).unwrap(),
            category_id: None,
        }
    }

    #[test]
    fn usage_is_zero_for_zero_amount() {
        assert_eq!(budget(0, 5000).usage_percent(), 0.0);
    }

    #[test]
    fn usage_at_85_percent_exceeds_only_80() {
        let b = budget(100_000, 85_000);
        assert_eq!(b.exceeded_thresholds(), vec![80]);
    }

    #[test]
    fn usage_at_exactly_100_exceeds_80_and_100() {
        let b = budget(100_000, 100_000);
        assert_eq!(b.exceeded_thresholds(), vec![80, 100]);
    }

    #[test]
    fn usage_above_120_exceeds_all_thresholds() {
        let b = budget(100_000, 125_000);
        assert_eq!(b.exceeded_thresholds(), vec![80, 100, 120]);
    }

    #[test]
    fn usage_below_80_exceeds_nothing() {
        let b = budget(100_000, 70_000);
        assert!(b.exceeded_thresholds().is_empty());
    }

    #[test]
    fn window_bounds_are_inclusive() {
        let b = budget(100_000, 0);
        assert!(b.contains(b.start_date));
        assert!(b.contains(b.end_date));
        assert!(!b.contains(b.end_date + chrono::Duration::seconds(1)));
    }
}
