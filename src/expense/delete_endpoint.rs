use std::sync::{Arc, Mutex};

use axum::{
    Extension,
    extract::{FromRef, Path, State},
    http::StatusCode,
    response::{IntoResponse, Response},
};
use axum_htmx::HxRedirect;
use rusqlite::Connection;

use crate::{
    AppState, Error,
    auth::UserID,
    endpoints,
    expense::{
        ExpenseScope,
        core::{ExpenseId, delete_expense, get_expense},
    },
};

/// The state needed to delete an expense.
#[derive(Debug, Clone)]
pub struct DeleteExpenseState {
    pub expense_scope: ExpenseScope,
    pub db_connection: Arc<Mutex<Connection>>,
}

impl FromRef<AppState> for DeleteExpenseState {
    fn from_ref(state: &AppState) -> Self {
        Self {
            expense_scope: state.expense_scope,
            db_connection: state.db_connection.clone(),
        }
    }
}

/// A route handler for deleting an expense, redirects to the expense list on success.
pub async fn delete_expense_endpoint(
    State(state): State<DeleteExpenseState>,
    Extension(user_id): Extension<UserID>,
    Path(expense_id): Path<ExpenseId>,
) -> Response {
    let connection = match state.db_connection.lock() {
        Ok(connection) => connection,
        Err(error) => {
            tracing::error!("could not acquire database lock: {error}");
            return Error::DatabaseLockError.into_alert_response();
        }
    };

    match get_expense(expense_id, &connection) {
        Ok(expense) if state.expense_scope.can_access(user_id, expense.user_id) => {}
        Ok(_) | Err(Error::NotFound) => return Error::DeleteMissingExpense.into_alert_response(),
        Err(error) => {
            tracing::error!("could not get expense {expense_id}: {error}");
            return error.into_alert_response();
        }
    }

    if let Err(error) = delete_expense(expense_id, &connection) {
        tracing::error!("Could not delete expense {expense_id}: {error}");
        return error.into_alert_response();
    }

    tracing::info!("deleted expense {expense_id}");

    (
        HxRedirect(endpoints::EXPENSES_VIEW.to_owned()),
        StatusCode::SEE_OTHER,
    )
        .into_response()
}
