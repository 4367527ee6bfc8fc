//! Budget spend reconciler.

use chrono::{DateTime, Utc};
use sea_orm::{
    ActiveModelTrait, ActiveValue, ColumnTrait, Condition, ConnectionTrait, EntityTrait,
    QueryFilter, Statement,
};
use uuid::Uuid;

use crate::{
    CategoryKind, Engine, ResultEngine,
    budgets::{self, Budget},
};

impl Engine {
    /// Recomputes `spent_minor` for every budget of `user_id` whose window
    /// contains `date` and whose category filter matches the mutated
    /// transaction's category.
    ///
    /// Full recompute rather than an incremental delta: edits and deletes
    /// make deltas error-prone, and the sum is bounded by the budget window.
    pub async fn reconcile_budgets(
        &self,
        category_id: Option<Uuid>,
        date: DateTime<Utc>,
        user_id: &str,
    ) -> ResultEngine<()> {
        let mut query = budgets::Entity::find()
            .filter(budgets::Column::UserId.eq(user_id))
            .filter(budgets::Column::StartDate.lte(date))
            .filter(budgets::Column::EndDate.gte(date));
        query = match category_id {
            // Category-less budgets track all expense spend, so they are
            // affected by every category.
            Some(id) => query.filter(
                Condition::any()
                    .add(budgets::Column::CategoryId.eq(id.to_string()))
                    .add(budgets::Column::CategoryId.is_null()),
            ),
            None => query.filter(budgets::Column::CategoryId.is_null()),
        };

        for model in query.all(&self.database).await? {
            let budget = Budget::try_from(model)?;
            let spent = self.sum_budget_window(&budget).await?;
            let update = budgets::ActiveModel {
                id: ActiveValue::Set(budget.id.to_string()),
                spent_minor: ActiveValue::Set(spent),
                ..Default::default()
            };
            update.update(&self.database).await?;
        }

        Ok(())
    }

    /// Sum of ledger amounts inside the budget window: the budget's category
    /// when one is set, otherwise every expense-kind category.
    pub(crate) async fn sum_budget_window(&self, budget: &Budget) -> ResultEngine<i64> {
        let backend = self.database.get_database_backend();
        let stmt = match budget.category_id {
            Some(category_id) => Statement::from_sql_and_values(
                backend,
                "SELECT COALESCE(SUM(amount_minor), 0) AS sum \
                 FROM transactions \
                 WHERE user_id = ? AND date >= ? AND date <= ? AND category_id = ?",
                vec![
                    budget.user_id.clone().into(),
                    budget.start_date.into(),
                    budget.end_date.into(),
                    category_id.to_string().into(),
                ],
            ),
            None => Statement::from_sql_and_values(
                backend,
                "SELECT COALESCE(SUM(t.amount_minor), 0) AS sum \
                 FROM transactions t \
                 INNER JOIN categories c ON c.id = t.category_id \
                 WHERE t.user_id = ? AND t.date >= ? AND t.date <= ? AND c.kind = ?",
                vec![
                    budget.user_id.clone().into(),
                    budget.start_date.into(),
                    budget.end_date.into(),
                    CategoryKind::Expense.as_str().into(),
                ],
            ),
        };

        let row = self.database.query_one(stmt).await?;
        Ok(row.and_then(|r| r.try_get("", "sum").ok()).unwrap_or(0))
    }
}
