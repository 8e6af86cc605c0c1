use std::sync::{Arc, Mutex};

use axum::{
    Extension,
    extract::{FromRef, Path, State},
    response::{IntoResponse, Response},
};
use maud::{Markup, html};
use rusqlite::Connection;

use crate::{
    AppState, Error,
    auth::UserID,
    endpoints::{self, format_endpoint},
    expense::{
        Expense, ExpenseScope,
        core::{ExpenseId, get_categories, get_expense},
        form::{ExpenseFormDefaults, expense_form_fields},
    },
    html::{
        BUTTON_PRIMARY_STYLE, BUTTON_SECONDARY_STYLE, FORM_CONTAINER_STYLE, base,
        currency_input_styles, loading_spinner,
    },
    navigation::NavBar,
};

fn edit_expense_view(expense: &Expense, categories: &[String]) -> Markup {
    let update_expense_endpoint = format_endpoint(endpoints::EXPENSE, expense.id);
    let nav_bar = NavBar::new(endpoints::EDIT_EXPENSE_VIEW).into_html();
    let spinner = loading_spinner();
    let fields = expense_form_fields(
        &ExpenseFormDefaults {
            title: Some(&expense.title),
            amount: Some(expense.amount),
            category: Some(&expense.category),
            date: expense.date,
            autofocus_title: false,
        },
        categories,
    );

    let content = html! {
        (nav_bar)

        div class=(FORM_CONTAINER_STYLE)
        {
            form
                hx-put=(update_expense_endpoint)
                hx-target-error="#alert-container"
                class="w-full space-y-4 md:space-y-6"
            {
                h2 class="text-xl font-bold" { "Edit Expense" }

                (fields)

                button type="submit" id="submit-button" tabindex="0" class=(BUTTON_PRIMARY_STYLE)
                {
                    span
                        id="indicator"
                        class="inline htmx-indicator"
                    {
                        (spinner)
                    }
                    " Update Expense"
                }
            }

            a href=(endpoints::EXPENSES_VIEW) class={ (BUTTON_SECONDARY_STYLE) " mt-4 text-center" }
            {
                "Cancel"
            }
        }
    };

    base("Edit Expense", &[currency_input_styles()], &content)
}

/// The state needed for the edit expense page.
#[derive(Debug, Clone)]
pub struct EditExpensePageState {
    pub expense_scope: ExpenseScope,
    pub db_connection: Arc<Mutex<Connection>>,
}

impl FromRef<AppState> for EditExpensePageState {
    fn from_ref(state: &AppState) -> Self {
        Self {
            expense_scope: state.expense_scope,
            db_connection: state.db_connection.clone(),
        }
    }
}

/// Renders the page for editing an expense.
///
/// Answers with the 404 page if the expense does not exist or belongs to
/// someone else when expenses are not shared.
pub async fn get_edit_expense_page(
    State(state): State<EditExpensePageState>,
    Extension(user_id): Extension<UserID>,
    Path(expense_id): Path<ExpenseId>,
) -> Result<Response, Error> {
    let connection = state
        .db_connection
        .lock()
        .inspect_err(|error| tracing::error!("could not acquire database lock: {error}"))
        .map_err(|_| Error::DatabaseLockError)?;

    let expense = get_expense(expense_id, &connection).inspect_err(|error| {
        if *error != Error::NotFound {
            tracing::error!("Failed to retrieve expense {expense_id}: {error}");
        }
    })?;

    if !state.expense_scope.can_access(user_id, expense.user_id) {
        tracing::debug!("user {user_id} tried to edit expense {expense_id} owned by someone else");
        return Err(Error::NotFound);
    }

    let categories = get_categories(state.expense_scope.owner_filter(user_id), &connection)
        .inspect_err(|error| tracing::error!("could not get categories: {error}"))?;

    Ok(edit_expense_view(&expense, &categories).into_response())
}
