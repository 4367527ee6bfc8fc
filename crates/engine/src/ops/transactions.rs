//! Transaction operations.
//!
//! Every mutation ends with a reconciliation of the budgets the mutated
//! (category, date) pair can affect, followed by a threshold pass for the
//! owner; an update reconciles both the old and the new pair.

use chrono::{DateTime, Utc};
use sea_orm::{
    ActiveModelTrait, ActiveValue, ColumnTrait, EntityTrait, QueryFilter, QueryOrder,
};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::{
    Engine, EngineError, ResultEngine, categories,
    transactions::{self, Transaction},
};

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct TransactionNew {
    pub amount_minor: i64,
    pub description: String,
    pub date: DateTime<Utc>,
    pub category_id: Uuid,
}

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct TransactionUpdate {
    pub amount_minor: i64,
    pub description: String,
    pub date: DateTime<Utc>,
    pub category_id: Uuid,
}

impl Engine {
    /// Loads a category and checks it belongs to `user_id`.
    pub(crate) async fn category_of(
        &self,
        user_id: &str,
        category_id: Uuid,
    ) -> ResultEngine<categories::Model> {
        categories::Entity::find_by_id(category_id.to_string())
            .filter(categories::Column::UserId.eq(user_id))
            .one(&self.database)
            .await?
            .ok_or_else(|| EngineError::KeyNotFound("category not exists".to_string()))
    }

    pub async fn create_transaction(
        &self,
        user_id: &str,
        new: TransactionNew,
    ) -> ResultEngine<Transaction> {
        self.category_of(user_id, new.category_id).await?;

        let tx = Transaction::new(
            user_id.to_string(),
            new.category_id,
            new.amount_minor,
            new.description,
            new.date,
        )?;
        transactions::ActiveModel::from(&tx)
            .insert(&self.database)
            .await?;

        self.reconcile_after_mutation(Some(tx.category_id), tx.date, user_id)
            .await;
        Ok(tx)
    }

    /// Creates many transactions in one call, reconciling per entry.
    /// Returns the created transactions in input order.
    pub async fn create_transactions_bulk(
        &self,
        user_id: &str,
        batch: Vec<TransactionNew>,
    ) -> ResultEngine<Vec<Transaction>> {
        let mut created = Vec::with_capacity(batch.len());
        for new in batch {
            created.push(self.create_transaction(user_id, new).await?);
        }
        Ok(created)
    }

    pub async fn update_transaction(
        &self,
        user_id: &str,
        transaction_id: Uuid,
        update: TransactionUpdate,
    ) -> ResultEngine<Transaction> {
        if update.amount_minor <= 0 {
            return Err(EngineError::InvalidAmount(
                "amount_minor must be > 0".to_string(),
            ));
        }

        let model = self.owned_transaction(user_id, transaction_id).await?;
        let old = Transaction::try_from(model)?;
        self.category_of(user_id, update.category_id).await?;

        let active = transactions::ActiveModel {
            id: ActiveValue::Set(transaction_id.to_string()),
            amount_minor: ActiveValue::Set(update.amount_minor),
            description: ActiveValue::Set(update.description.clone()),
            date: ActiveValue::Set(update.date),
            category_id: ActiveValue::Set(update.category_id.to_string()),
            ..Default::default()
        };
        let updated = active.update(&self.database).await?;

        // The old pair loses the entry, the new pair gains it.
        self.reconcile_after_mutation(Some(old.category_id), old.date, user_id)
            .await;
        self.reconcile_after_mutation(Some(update.category_id), update.date, user_id)
            .await;

        Transaction::try_from(updated)
    }

    pub async fn delete_transaction(
        &self,
        user_id: &str,
        transaction_id: Uuid,
    ) -> ResultEngine<()> {
        let model = self.owned_transaction(user_id, transaction_id).await?;
        let tx = Transaction::try_from(model.clone())?;

        transactions::Entity::delete_by_id(model.id)
            .exec(&self.database)
            .await?;

        self.reconcile_after_mutation(Some(tx.category_id), tx.date, user_id)
            .await;
        Ok(())
    }

    pub async fn list_transactions(&self, user_id: &str) -> ResultEngine<Vec<Transaction>> {
        let models = transactions::Entity::find()
            .filter(transactions::Column::UserId.eq(user_id))
            .order_by_desc(transactions::Column::Date)
            .all(&self.database)
            .await?;

        models.into_iter().map(Transaction::try_from).collect()
    }

    pub async fn transaction(
        &self,
        user_id: &str,
        transaction_id: Uuid,
    ) -> ResultEngine<Transaction> {
        let model = self.owned_transaction(user_id, transaction_id).await?;
        Transaction::try_from(model)
    }

    async fn owned_transaction(
        &self,
        user_id: &str,
        transaction_id: Uuid,
    ) -> ResultEngine<transactions::Model> {
        transactions::Entity::find_by_id(transaction_id.to_string())
            .filter(transactions::Column::UserId.eq(user_id))
            .one(&self.database)
            .await?
            .ok_or_else(|| EngineError::KeyNotFound("transaction not exists".to_string()))
    }

    /// Reconciliation and the follow-up threshold pass never fail the
    /// originating request; a stale cache is corrected by the next pass.
    async fn reconcile_after_mutation(
        &self,
        category_id: Option<Uuid>,
        date: DateTime<Utc>,
        user_id: &str,
    ) {
        if let Err(err) = self.reconcile_budgets(category_id, date, user_id).await {
            tracing::error!(user_id, "budget reconciliation failed: {err}");
            return;
        }
        if let Err(err) = self.check_budget_thresholds(user_id).await {
            tracing::warn!(user_id, "threshold check after mutation failed: {err}");
        }
    }
}
