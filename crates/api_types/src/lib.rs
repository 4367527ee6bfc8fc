//! Request and response bodies shared between the HTTP server and its
//! clients. Amounts are integer minor units; dates are RFC 3339 UTC.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

pub mod category {
    use super::*;

    #[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
    #[serde(rename_all = "snake_case")]
    pub enum CategoryKind {
        Expense,
        Income,
    }

    impl CategoryKind {
        pub fn as_str(self) -> &'static str {
            match self {
                Self::Expense => "expense",
                Self::Income => "income",
            }
        }
    }

    #[derive(Debug, Serialize, Deserialize)]
    pub struct CategoryNew {
        pub name: String,
        pub kind: CategoryKind,
    }

    #[derive(Debug, Serialize, Deserialize)]
    pub struct CategoryView {
        pub id: Uuid,
        pub name: String,
        pub kind: String,
    }
}

pub mod transaction {
    use super::*;

    /// Body for create and update; the update replaces every field.
    #[derive(Debug, Serialize, Deserialize)]
    pub struct TransactionUpsert {
        pub amount_minor: i64,
        pub description: String,
        pub date: DateTime<Utc>,
        pub category_id: Uuid,
    }

    #[derive(Debug, Serialize, Deserialize)]
    pub struct TransactionsBulk {
        pub transactions: Vec<TransactionUpsert>,
    }

    #[derive(Debug, Serialize, Deserialize)]
    pub struct TransactionView {
        pub id: Uuid,
        pub amount_minor: i64,
        pub description: String,
        pub date: DateTime<Utc>,
        pub category_id: Uuid,
        pub recurring_rule_id: Option<Uuid>,
        pub is_recurring: bool,
    }
}

pub mod budget {
    use super::*;

    #[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
    #[serde(rename_all = "snake_case")]
    pub enum BudgetPeriod {
        Weekly,
        Monthly,
        Yearly,
    }

    #[derive(Debug, Serialize, Deserialize)]
    pub struct BudgetUpsert {
        pub name: String,
        pub amount_minor: i64,
        pub period: BudgetPeriod,
        pub start_date: DateTime<Utc>,
        pub end_date: DateTime<Utc>,
        pub category_id: Option<Uuid>,
    }

    #[derive(Debug, Serialize, Deserialize)]
    pub struct BudgetView {
        pub id: Uuid,
        pub name: String,
        pub amount_minor: i64,
        /// Derived from the ledger; never accepted from clients.
        pub spent_minor: i64,
        pub usage_percent: f64,
        pub period: BudgetPeriod,
        pub start_date: DateTime<Utc>,
        pub end_date: DateTime<Utc>,
        pub category_id: Option<Uuid>,
    }
}

pub mod rule {
    use super::*;

    #[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
    #[serde(rename_all = "snake_case")]
    pub enum Frequency {
        Daily,
        Weekly,
        Monthly,
        Yearly,
    }

    /// Body for create and update. The schedule fields
    /// (`next_execute_date`, `is_active`) are engine-owned and absent here.
    #[derive(Debug, Serialize, Deserialize)]
    pub struct RuleUpsert {
        pub amount_minor: i64,
        pub description: String,
        pub category_id: Uuid,
        pub frequency: Frequency,
        pub start_date: DateTime<Utc>,
        pub end_date: Option<DateTime<Utc>>,
    }

    #[derive(Debug, Serialize, Deserialize)]
    pub struct RuleView {
        pub id: Uuid,
        pub amount_minor: i64,
        pub description: String,
        pub category_id: Uuid,
        pub frequency: Frequency,
        pub start_date: DateTime<Utc>,
        pub end_date: Option<DateTime<Utc>>,
        pub next_execute_date: DateTime<Utc>,
        pub is_active: bool,
    }
}

pub mod notification {
    use super::*;

    #[derive(Debug, Serialize, Deserialize)]
    pub struct NotificationView {
        pub id: Uuid,
        pub kind: String,
        pub title: String,
        pub message: String,
        pub severity: String,
        pub is_read: bool,
        /// Kind-specific payload, raw JSON.
        pub data: Option<String>,
        pub created_at: DateTime<Utc>,
    }

    #[derive(Debug, Default, Serialize, Deserialize)]
    pub struct NotificationsQuery {
        pub unread: Option<bool>,
    }

    #[derive(Debug, Serialize, Deserialize)]
    pub struct MarkedRead {
        pub marked: u64,
    }
}

pub mod admin {
    use super::*;

    /// Response of the manual recurring-processing trigger.
    #[derive(Debug, Serialize, Deserialize)]
    pub struct ProcessedResponse {
        pub processed_count: u64,
    }
}
