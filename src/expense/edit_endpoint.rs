use std::sync::{Arc, Mutex};

use axum::{
    Extension,
    extract::{FromRef, Path, State},
    http::StatusCode,
    response::{IntoResponse, Response},
};
use axum_extra::extract::Form;
use axum_htmx::HxRedirect;
use rusqlite::Connection;

use crate::{
    AppState, Error,
    auth::UserID,
    endpoints,
    expense::{
        ExpenseScope,
        core::{ExpenseId, get_expense, update_expense},
        form::ExpenseForm,
    },
};

/// The state needed to update an expense.
#[derive(Debug, Clone)]
pub struct UpdateExpenseState {
    pub expense_scope: ExpenseScope,
    pub db_connection: Arc<Mutex<Connection>>,
}

impl FromRef<AppState> for UpdateExpenseState {
    fn from_ref(state: &AppState) -> Self {
        Self {
            expense_scope: state.expense_scope,
            db_connection: state.db_connection.clone(),
        }
    }
}

/// A route handler for updating an expense, redirects to the expense list on success.
///
/// An empty or malformed date keeps the date already stored for the expense.
pub async fn update_expense_endpoint(
    State(state): State<UpdateExpenseState>,
    Extension(user_id): Extension<UserID>,
    Path(expense_id): Path<ExpenseId>,
    Form(form): Form<ExpenseForm>,
) -> Response {
    let connection = match state.db_connection.lock() {
        Ok(connection) => connection,
        Err(error) => {
            tracing::error!("could not acquire database lock: {error}");
            return Error::DatabaseLockError.into_alert_response();
        }
    };

    let stored_expense = match get_expense(expense_id, &connection) {
        Ok(expense) if state.expense_scope.can_access(user_id, expense.user_id) => expense,
        Ok(_) | Err(Error::NotFound) => return Error::UpdateMissingExpense.into_alert_response(),
        Err(error) => {
            tracing::error!("could not get expense {expense_id}: {error}");
            return error.into_alert_response();
        }
    };

    let expense = match form.validate(stored_expense.date) {
        Ok(expense) => expense,
        Err(error) => {
            tracing::debug!("rejected update to expense {expense_id}: {error}");
            return error.into_alert_response();
        }
    };

    if let Err(error) = update_expense(expense_id, &expense, &connection) {
        tracing::error!("could not update expense {expense_id}: {error}");
        return error.into_alert_response();
    }

    (
        HxRedirect(endpoints::EXPENSES_VIEW.to_owned()),
        StatusCode::SEE_OTHER,
    )
        .into_response()
}
