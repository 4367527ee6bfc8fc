use axum::{Json, http::StatusCode, response::IntoResponse};
use engine::EngineError;

use serde::Serialize;
pub use server::{app, run, run_with_listener, spawn_with_listener};

mod admin;
mod budgets;
mod categories;
mod notifications;
mod rules;
mod server;
mod transactions;

pub mod types {
    pub mod category {
        pub use api_types::category::{CategoryKind, CategoryNew, CategoryView};
    }

    pub mod transaction {
        pub use api_types::transaction::{TransactionUpsert, TransactionView, TransactionsBulk};
    }

    pub mod budget {
        pub use api_types::budget::{BudgetPeriod, BudgetUpsert, BudgetView};
    }

    pub mod rule {
        pub use api_types::rule::{Frequency, RuleUpsert, RuleView};
    }

    pub mod notification {
        pub use api_types::notification::{MarkedRead, NotificationView, NotificationsQuery};
    }

    pub mod admin {
        pub use api_types::admin::ProcessedResponse;
    }
}

pub enum ServerError {
    Engine(EngineError),
    Generic(String),
}

#[derive(Serialize)]
struct Error {
    error: String,
}

fn status_for_engine_error(err: &EngineError) -> StatusCode {
    match err {
        EngineError::Forbidden(_) => StatusCode::FORBIDDEN,
        EngineError::KeyNotFound(_) => StatusCode::NOT_FOUND,
        EngineError::ExistingKey(_) => StatusCode::CONFLICT,
        EngineError::Database(_) => StatusCode::INTERNAL_SERVER_ERROR,
        EngineError::InvalidAmount(_) | EngineError::InvalidValue(_) => {
            StatusCode::UNPROCESSABLE_ENTITY
        }
    }
}

fn message_for_engine_error(err: EngineError) -> String {
    match err {
        EngineError::Database(db_err) => {
            tracing::error!("database error: {db_err}");
            "internal server error".to_string()
        }
        other => other.to_string(),
    }
}

impl IntoResponse for ServerError {
    fn into_response(self) -> axum::response::Response {
        let (status, error) = match self {
            ServerError::Engine(err) => {
                (status_for_engine_error(&err), message_for_engine_error(err))
            }
            ServerError::Generic(err) => (StatusCode::BAD_REQUEST, err),
        };

        (status, Json(Error { error })).into_response()
    }
}

impl From<EngineError> for ServerError {
    fn from(value: EngineError) -> Self {
        Self::Engine(value)
    }
}
