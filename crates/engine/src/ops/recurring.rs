//! Recurring rule engine: materializes due rules into ledger transactions
//! and advances their schedules.

use chrono::{DateTime, Utc};
use sea_orm::{
    ActiveModelTrait, ColumnTrait, EntityTrait, QueryFilter, TransactionTrait, sea_query::Expr,
};

use crate::{
    Engine, ResultEngine,
    recurring_rules::{self, RecurringRule},
    transactions::{self, Transaction},
};

impl Engine {
    /// One materialization pass over every user's due rules.
    ///
    /// Each rule is processed independently; a failure is logged and the rule
    /// is retried on the next pass. Returns the number of rules that produced
    /// a transaction.
    pub async fn process_due_rules(&self, now: DateTime<Utc>) -> ResultEngine<u64> {
        let models = recurring_rules::Entity::find()
            .filter(recurring_rules::Column::IsActive.eq(true))
            .filter(recurring_rules::Column::NextExecuteDate.lte(now))
            .all(&self.database)
            .await?;

        let mut processed = 0;
        for model in models {
            let rule = match RecurringRule::try_from(model) {
                Ok(rule) => rule,
                Err(err) => {
                    tracing::warn!("skipping malformed recurring rule: {err}");
                    continue;
                }
            };
            // Eligibility re-check: the rule may have been deactivated or
            // expired between selection and processing.
            if !rule.is_due(now) {
                continue;
            }
            match self.materialize_rule(&rule).await {
                Ok(true) => processed += 1,
                Ok(false) => {
                    tracing::debug!(rule_id = %rule.id, "rule already advanced by a concurrent pass");
                }
                Err(err) => {
                    tracing::warn!(rule_id = %rule.id, "failed to materialize rule: {err}");
                }
            }
        }

        Ok(processed)
    }

    /// Materializes one occurrence of `rule`: the ledger insert and the
    /// schedule advance are a single database transaction.
    ///
    /// The advance is conditional on the `next_execute_date` read earlier
    /// (optimistic concurrency). Zero rows matched means another pass won the
    /// race; the whole transaction rolls back and the created ledger row is
    /// discarded, so one logical occurrence can never yield two entries.
    async fn materialize_rule(&self, rule: &RecurringRule) -> ResultEngine<bool> {
        let mut tx = Transaction::new(
            rule.user_id.clone(),
            rule.category_id,
            rule.amount_minor,
            rule.description.clone(),
            rule.next_execute_date,
        )?;
        tx.recurring_rule_id = Some(rule.id);
        tx.is_recurring = true;

        let next = rule.advanced_date();
        // An occurrence exactly on end_date is still produced; the rule
        // deactivates once the advanced date moves past it.
        let still_active = rule.end_date.is_none_or(|end| next <= end);

        let db_tx = self.database.begin().await?;
        transactions::ActiveModel::from(&tx).insert(&db_tx).await?;

        let update = recurring_rules::Entity::update_many()
            .col_expr(recurring_rules::Column::NextExecuteDate, Expr::value(next))
            .col_expr(recurring_rules::Column::IsActive, Expr::value(still_active))
            .filter(recurring_rules::Column::Id.eq(rule.id.to_string()))
            .filter(recurring_rules::Column::NextExecuteDate.eq(rule.next_execute_date))
            .exec(&db_tx)
            .await?;
        if update.rows_affected == 0 {
            db_tx.rollback().await?;
            return Ok(false);
        }
        db_tx.commit().await?;

        // The new ledger row counts towards budgets like any other entry. The
        // occurrence is committed at this point, so a reconcile failure only
        // leaves a stale cache for the next pass to correct; it must not
        // drop the rule from the processed count.
        if let Err(err) = self
            .reconcile_budgets(Some(rule.category_id), tx.date, &rule.user_id)
            .await
        {
            tracing::warn!(rule_id = %rule.id, "reconciliation after materialization failed: {err}");
        }

        Ok(true)
    }
}
