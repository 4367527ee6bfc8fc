pub(crate) mod budgets;
pub(crate) mod categories;
pub(crate) mod notifications;
pub(crate) mod reconcile;
pub(crate) mod recurring;
pub(crate) mod rules;
pub(crate) mod thresholds;
pub(crate) mod transactions;
