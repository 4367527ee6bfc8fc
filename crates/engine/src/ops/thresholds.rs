//! Budget threshold notifier.
//!
//! Thresholds are checked in ascending order; each `(budget, threshold)`
//! pair notifies at most once for the budget's lifetime. The in-app record
//! is authoritative; the external push is best-effort.

use chrono::Utc;
use sea_orm::{ActiveModelTrait, ColumnTrait, EntityTrait, PaginatorTrait, QueryFilter};
use uuid::Uuid;

use crate::{
    Engine, ResultEngine,
    budgets::{self, Budget},
    categories,
    notifications::{self, BudgetAlertData, Severity},
    users,
};

impl Engine {
    /// Threshold pass over all budgets of one user. Per-budget failures are
    /// logged and do not stop the pass.
    pub async fn check_budget_thresholds(&self, user_id: &str) -> ResultEngine<()> {
        let models = budgets::Entity::find()
            .filter(budgets::Column::UserId.eq(user_id))
            .all(&self.database)
            .await?;

        for model in models {
            let budget = match Budget::try_from(model) {
                Ok(budget) => budget,
                Err(err) => {
                    tracing::warn!("skipping malformed budget: {err}");
                    continue;
                }
            };
            if let Err(err) = self.check_single_budget(&budget).await {
                tracing::warn!(budget_id = %budget.id, "threshold check failed: {err}");
            }
        }

        Ok(())
    }

    /// Evaluates one budget against the fixed thresholds and raises the
    /// missing notifications.
    pub async fn check_single_budget(&self, budget: &Budget) -> ResultEngine<()> {
        for threshold in budget.exceeded_thresholds() {
            if self.notification_exists(budget.id, threshold).await? {
                continue;
            }

            let category_name = self.budget_category_name(budget).await?;
            let (title, message, severity) = alert_content(budget, &category_name, threshold);
            let data = BudgetAlertData {
                budget_id: budget.id,
                threshold,
                usage: budget.usage_percent(),
                amount_minor: budget.amount_minor,
                spent_minor: budget.spent_minor,
            };

            notifications::budget_alert_model(
                &budget.user_id,
                title,
                message.clone(),
                severity,
                &data,
                Utc::now(),
            )
            .insert(&self.database)
            .await?;

            // The in-app record above is never rolled back on a failed push.
            self.push_external(&budget.user_id, &message).await;
        }

        Ok(())
    }

    pub(crate) async fn notification_exists(
        &self,
        budget_id: Uuid,
        threshold: u32,
    ) -> ResultEngine<bool> {
        let count = notifications::Entity::find()
            .filter(notifications::Column::Kind.eq(notifications::KIND_BUDGET))
            .filter(notifications::Column::BudgetId.eq(budget_id.to_string()))
            .filter(notifications::Column::Threshold.eq(threshold as i32))
            .count(&self.database)
            .await?;
        Ok(count > 0)
    }

    pub async fn usernames(&self) -> ResultEngine<Vec<String>> {
        Ok(users::Entity::find()
            .all(&self.database)
            .await?
            .into_iter()
            .map(|user| user.username)
            .collect())
    }

    async fn budget_category_name(&self, budget: &Budget) -> ResultEngine<String> {
        let name = match budget.category_id {
            Some(id) => categories::Entity::find_by_id(id.to_string())
                .one(&self.database)
                .await?
                .map(|category| category.name),
            None => None,
        };
        Ok(name.unwrap_or_else(|| "Overall".to_string()))
    }

    /// Best-effort external push; a no-op when the user has no chat identity.
    async fn push_external(&self, user_id: &str, text: &str) {
        let user = match users::Entity::find_by_id(user_id).one(&self.database).await {
            Ok(user) => user,
            Err(err) => {
                tracing::warn!(user_id, "failed to load user for external push: {err}");
                return;
            }
        };
        let Some(chat_id) = user
            .and_then(|user| user.telegram_chat_id)
            .filter(|chat_id| !chat_id.is_empty())
        else {
            return;
        };

        if let Err(err) = self.notifier().send(&chat_id, text).await {
            tracing::warn!(user_id, "external notification delivery failed: {err}");
        }
    }
}

fn alert_content(budget: &Budget, category: &str, threshold: u32) -> (String, String, Severity) {
    let usage = budget.usage_percent();
    let spent = fmt_minor(budget.spent_minor);
    let amount = fmt_minor(budget.amount_minor);
    let name = &budget.name;

    match threshold {
        80 => (
            "Budget at 80%".to_string(),
            format!(
                "Budget \"{name}\" ({category}) is at {usage:.1}%. Spent {spent} of {amount}."
            ),
            Severity::Normal,
        ),
        100 => (
            "Budget exceeded!".to_string(),
            format!(
                "Budget \"{name}\" ({category}) is over by {over:.1}%! Spent {spent} of {amount}.",
                over = usage - 100.0
            ),
            Severity::High,
        ),
        120 => (
            "Budget critically exceeded!".to_string(),
            format!(
                "Budget \"{name}\" ({category}) is critically over by {over:.1}%! Spent {spent} of {amount}.",
                over = usage - 100.0
            ),
            Severity::High,
        ),
        _ => (
            "Budget notice".to_string(),
            format!("Budget \"{name}\" ({category}) is at {usage:.1}%."),
            Severity::Normal,
        ),
    }
}

fn fmt_minor(minor: i64) -> String {
    format!("{}.{:02}", minor / 100, (minor % 100).abs())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::BudgetPeriod;
    use chrono::TimeZone;

    fn budget(spent_minor: i64) -> Budget {
        Budget {
            id: Uuid::new_v4(),
            user_id: "alice".to_string(),
            name: "Food".to_string(),
            amount_minor: 100_000,
            period: BudgetPeriod::Monthly,
            spent_minor,
            start_date: chrono::Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap(),
            end_date: chrono::Utc.with_ymd_and_hms(2024, 1, 31, 0, 0, 0).unwrap(),
            category_id: None,
        }
    }

    #[test]
    fn severity_is_normal_at_80_and_high_above() {
        let b = budget(85_000);
        let (_, _, severity) = alert_content(&b, "Overall", 80);
        assert_eq!(severity, Severity::Normal);
        let (_, _, severity) = alert_content(&b, "Overall", 100);
        assert_eq!(severity, Severity::High);
        let (_, _, severity) = alert_content(&b, "Overall", 120);
        assert_eq!(severity, Severity::High);
    }

    #[test]
    fn message_names_budget_and_amounts() {
        let b = budget(85_000);
        let (_, message, _) = alert_content(&b, "Overall", 80);
        assert!(message.contains("Food"));
        assert!(message.contains("850.00"));
        assert!(message.contains("1000.00"));
    }

    #[test]
    fn minor_units_format_with_two_decimals() {
        assert_eq!(fmt_minor(1), "0.01");
        assert_eq!(fmt_minor(100), "1.00");
        assert_eq!(fmt_minor(123_456), "1234.56");
    }
}
