//! Defines the endpoint for recording a new expense.
use std::sync::{Arc, Mutex};

use axum::{
    Extension,
    extract::{FromRef, State},
    http::StatusCode,
    response::{IntoResponse, Response},
};
// Must use axum_extra's Form since that parses an empty string as None instead
// of crashing like axum::Form.
use axum_extra::extract::Form;
use axum_htmx::HxRedirect;
use rusqlite::Connection;

use crate::{
    AppState, Error,
    auth::UserID,
    endpoints,
    expense::{core::create_expense, form::ExpenseForm},
    timezone::local_today,
};

/// The state needed to record an expense.
#[derive(Debug, Clone)]
pub struct CreateExpenseState {
    /// The database connection for managing expenses.
    pub db_connection: Arc<Mutex<Connection>>,
    /// The local timezone as a canonical timezone name, e.g. "Asia/Kolkata".
    pub local_timezone: String,
}

impl FromRef<AppState> for CreateExpenseState {
    fn from_ref(state: &AppState) -> Self {
        Self {
            db_connection: state.db_connection.clone(),
            local_timezone: state.local_timezone.clone(),
        }
    }
}

/// A route handler for recording a new expense, redirects to the expense list on success.
///
/// A missing or malformed date is replaced with today's date in the local timezone.
pub async fn create_expense_endpoint(
    State(state): State<CreateExpenseState>,
    Extension(user_id): Extension<UserID>,
    Form(form): Form<ExpenseForm>,
) -> Response {
    let Some(today) = local_today(&state.local_timezone) else {
        tracing::error!("Invalid timezone {}", state.local_timezone);
        return Error::InvalidTimezoneError(state.local_timezone).into_alert_response();
    };

    let expense = match form.validate(today) {
        Ok(expense) => expense,
        Err(error) => {
            tracing::debug!("rejected new expense: {error}");
            return error.into_alert_response();
        }
    };

    let connection = match state.db_connection.lock() {
        Ok(connection) => connection,
        Err(error) => {
            tracing::error!("could not acquire database lock: {error}");
            return Error::DatabaseLockError.into_alert_response();
        }
    };

    if let Err(error) = create_expense(expense, Some(user_id), &connection) {
        tracing::error!("could not create expense: {error}");

        return error.into_alert_response();
    }

    (
        HxRedirect(endpoints::EXPENSES_VIEW.to_owned()),
        StatusCode::SEE_OTHER,
    )
        .into_response()
}
