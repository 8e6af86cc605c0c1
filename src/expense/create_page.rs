//! Defines the route handler for the page for recording a new expense.

use std::sync::{Arc, Mutex};

use axum::{
    Extension,
    extract::{FromRef, State},
    response::{IntoResponse, Response},
};
use maud::{Markup, html};
use rusqlite::Connection;
use time::Date;

use crate::{
    AppState, Error,
    auth::UserID,
    endpoints,
    expense::{
        ExpenseScope,
        core::get_categories,
        form::{ExpenseFormDefaults, expense_form_fields},
    },
    html::{
        BUTTON_PRIMARY_STYLE, FORM_CONTAINER_STYLE, base, currency_input_styles, loading_spinner,
    },
    navigation::NavBar,
    timezone::local_today,
};

fn create_expense_view(today: Date, categories: &[String]) -> Markup {
    let nav_bar = NavBar::new(endpoints::NEW_EXPENSE_VIEW).into_html();
    let spinner = loading_spinner();
    let fields = expense_form_fields(
        &ExpenseFormDefaults {
            title: None,
            amount: None,
            category: None,
            date: today,
            autofocus_title: true,
        },
        categories,
    );

    let content = html! {
        (nav_bar)

        div class=(FORM_CONTAINER_STYLE)
        {
            form
                hx-post=(endpoints::EXPENSES_API)
                hx-target-error="#alert-container"
                class="w-full space-y-4 md:space-y-6"
            {
                h2 class="text-xl font-bold" { "New Expense" }

                (fields)

                button type="submit" id="submit-button" tabindex="0" class=(BUTTON_PRIMARY_STYLE)
                {
                    span
                        id="indicator"
                        class="inline htmx-indicator"
                    {
                        (spinner)
                    }
                    " Add Expense"
                }
            }
        }
    };

    base("Add Expense", &[currency_input_styles()], &content)
}

/// The state needed for the new expense page.
#[derive(Debug, Clone)]
pub struct CreateExpensePageState {
    /// The local timezone as a canonical timezone name, e.g. "Asia/Kolkata".
    pub local_timezone: String,
    pub expense_scope: ExpenseScope,
    /// The database connection for listing the categories already in use.
    pub db_connection: Arc<Mutex<Connection>>,
}

impl FromRef<AppState> for CreateExpensePageState {
    fn from_ref(state: &AppState) -> Self {
        Self {
            local_timezone: state.local_timezone.clone(),
            expense_scope: state.expense_scope,
            db_connection: state.db_connection.clone(),
        }
    }
}

/// Renders the page for recording an expense.
pub async fn get_create_expense_page(
    State(state): State<CreateExpensePageState>,
    Extension(user_id): Extension<UserID>,
) -> Result<Response, Error> {
    let categories = {
        let connection = state
            .db_connection
            .lock()
            .inspect_err(|error| tracing::error!("could not acquire database lock: {error}"))
            .map_err(|_| Error::DatabaseLockError)?;

        get_categories(state.expense_scope.owner_filter(user_id), &connection).inspect_err(
            |error| tracing::error!("Failed to retrieve categories for new expense page: {error}"),
        )?
    };

    let today = local_today(&state.local_timezone).ok_or_else(|| {
        tracing::error!("Invalid timezone {}", state.local_timezone);
        Error::InvalidTimezoneError(state.local_timezone)
    })?;

    Ok(create_expense_view(today, &categories).into_response())
}
