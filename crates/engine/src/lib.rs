//! Core engine: ledger operations, recurring-rule materialization, budget
//! spend reconciliation and threshold notifications.
//!
//! The engine is stateless over the database; every derived value
//! (`Budget::spent_minor`) is rederived from the ledger, never trusted as
//! independently mutable. External pushes go through [`ExternalNotifier`].

use std::sync::Arc;

use sea_orm::DatabaseConnection;

pub use budgets::{Budget, BudgetPeriod, THRESHOLDS};
pub use categories::CategoryKind;
pub use error::EngineError;
pub use notifications::{BudgetAlertData, Severity};
pub use notify::{ExternalNotifier, NotifyError, NullNotifier};
pub use ops::budgets::{BudgetNew, BudgetUpdate};
pub use ops::categories::CategoryNew;
pub use ops::rules::{RuleNew, RuleUpdate};
pub use ops::transactions::{TransactionNew, TransactionUpdate};
pub use recurring_rules::{Frequency, RecurringRule};
pub use transactions::Transaction;

pub mod budgets;
pub mod categories;
mod error;
pub mod notifications;
mod notify;
pub mod recurring_rules;
pub mod scheduler;
pub mod transactions;
pub mod users;

mod ops;

pub type ResultEngine<T> = Result<T, EngineError>;

pub struct Engine {
    database: DatabaseConnection,
    notifier: Arc<dyn ExternalNotifier>,
}

impl Engine {
    /// Return a builder for `Engine`. Help to build the struct.
    pub fn builder() -> EngineBuilder {
        EngineBuilder::default()
    }

    pub fn database(&self) -> &DatabaseConnection {
        &self.database
    }

    pub(crate) fn notifier(&self) -> &dyn ExternalNotifier {
        self.notifier.as_ref()
    }
}

/// The builder for `Engine`
#[derive(Default)]
pub struct EngineBuilder {
    database: DatabaseConnection,
    notifier: Option<Arc<dyn ExternalNotifier>>,
}

impl EngineBuilder {
    /// Pass the required database
    pub fn database(mut self, db: DatabaseConnection) -> EngineBuilder {
        self.database = db;
        self
    }

    /// Pass the external notification bridge. Defaults to a no-op sink.
    pub fn notifier(mut self, notifier: Arc<dyn ExternalNotifier>) -> EngineBuilder {
        self.notifier = Some(notifier);
        self
    }

    /// Construct `Engine`
    pub fn build(self) -> Engine {
        Engine {
            database: self.database,
            notifier: self.notifier.unwrap_or_else(|| Arc::new(NullNotifier)),
        }
    }
}
