//! The page asking the user to confirm deleting an expense.

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
        core::{ExpenseId, get_expense},
    },
    html::{
        BUTTON_DELETE_STYLE, BUTTON_SECONDARY_STYLE, CATEGORY_BADGE_STYLE, FORM_CONTAINER_STYLE,
        base, format_currency, loading_spinner,
    },
    navigation::NavBar,
};

fn delete_expense_view(expense: &Expense) -> Markup {
    let delete_expense_endpoint = format_endpoint(endpoints::EXPENSE, expense.id);
    let nav_bar = NavBar::new(endpoints::DELETE_EXPENSE_VIEW).into_html();
    let spinner = loading_spinner();

    let content = html! {
        (nav_bar)

        div class=(FORM_CONTAINER_STYLE)
        {
            form
                hx-delete=(delete_expense_endpoint)
                hx-target-error="#alert-container"
                class="w-full space-y-4 md:space-y-6"
            {
                h2 class="text-xl font-bold" { "Delete Expense" }

                p { "Are you sure you want to delete this expense? This cannot be undone." }

                dl class="grid grid-cols-2 gap-2 text-sm"
                {
                    dt class="font-semibold" { "Title" }
                    dd id="expense-title" { (expense.title) }

                    dt class="font-semibold" { "Amount" }
                    dd { (format_currency(expense.amount)) }

                    dt class="font-semibold" { "Category" }
                    dd { span class=(CATEGORY_BADGE_STYLE) { (expense.category) } }

                    dt class="font-semibold" { "Date" }
                    dd { time datetime=(expense.date) { (expense.date) } }
                }

                button type="submit" id="submit-button" tabindex="0" class=(BUTTON_DELETE_STYLE)
                {
                    span
                        id="indicator"
                        class="inline htmx-indicator"
                    {
                        (spinner)
                    }
                    " Delete"
                }
            }

            a href=(endpoints::EXPENSES_VIEW) class={ (BUTTON_SECONDARY_STYLE) " mt-4 text-center" }
            {
                "Cancel"
            }
        }
    };

    base("Delete Expense", &[], &content)
}

/// The state needed for the delete expense page.
#[derive(Debug, Clone)]
pub struct DeleteExpensePageState {
    pub expense_scope: ExpenseScope,
    pub db_connection: Arc<Mutex<Connection>>,
}

impl FromRef<AppState> for DeleteExpensePageState {
    fn from_ref(state: &AppState) -> Self {
        Self {
            expense_scope: state.expense_scope,
            db_connection: state.db_connection.clone(),
        }
    }
}

/// Renders the page for confirming the deletion of an expense.
pub async fn get_delete_expense_page(
    State(state): State<DeleteExpensePageState>,
    Extension(user_id): Extension<UserID>,
    Path(expense_id): Path<ExpenseId>,
) -> Result<Response, Error> {
    let expense = {
        let connection = state
            .db_connection
            .lock()
            .inspect_err(|error| tracing::error!("could not acquire database lock: {error}"))
            .map_err(|_| Error::DatabaseLockError)?;

        get_expense(expense_id, &connection)?
    };

    if !state.expense_scope.can_access(user_id, expense.user_id) {
        return Err(Error::NotFound);
    }

    Ok(delete_expense_view(&expense).into_response())
}

#[cfg(test)]
mod delete_page_tests {
    use std::sync::{Arc, Mutex};

    use axum::{
        Extension,
        extract::{Path, State},
        http::StatusCode,
        response::IntoResponse,
    };
    use rusqlite::Connection;
    use scraper::Selector;
    use time::macros::date;

    use crate::{
        auth::UserID,
        db::initialize,
        expense::{ExpenseScope, NewExpense, create_expense},
        test_utils::{
            assert_hx_endpoint, assert_status_ok, assert_valid_html, must_get_form,
            parse_html_document,
        },
    };

    use super::{DeleteExpensePageState, get_delete_expense_page};

    fn get_test_state(expense_scope: ExpenseScope) -> DeleteExpensePageState {
        let conn = Connection::open_in_memory().unwrap();
        initialize(&conn).unwrap();
        // Owner-less expenses are only visible when expenses are shared.
        create_expense(
            NewExpense {
                title: "Lunch".to_owned(),
                amount: 250.0,
                category: "Food".to_owned(),
                date: date!(2025 - 10 - 04),
            },
            None,
            &conn,
        )
        .unwrap();

        DeleteExpensePageState {
            expense_scope,
            db_connection: Arc::new(Mutex::new(conn)),
        }
    }

    #[tokio::test]
    async fn render_confirmation() {
        let state = get_test_state(ExpenseScope::Shared);

        let response = get_delete_expense_page(State(state), Extension(UserID::new(1)), Path(1))
            .await
            .unwrap();

        assert_status_ok(&response);
        let html = parse_html_document(response).await;
        assert_valid_html(&html);
        let form = must_get_form(&html);
        assert_hx_endpoint(&form, "/api/expenses/1", "hx-delete");
        let title = html
            .select(&Selector::parse("#expense-title").unwrap())
            .next()
            .unwrap()
            .text()
            .collect::<String>();
        assert_eq!(title, "Lunch");
    }

    #[tokio::test]
    async fn hidden_expense_gives_not_found() {
        let state = get_test_state(ExpenseScope::PerUser);

        let response = get_delete_expense_page(State(state), Extension(UserID::new(1)), Path(1))
            .await
            .into_response();

        assert_eq!(response.status(), StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn missing_expense_gives_not_found() {
        let state = get_test_state(ExpenseScope::Shared);

        let response = get_delete_expense_page(State(state), Extension(UserID::new(1)), Path(9))
            .await
            .into_response();

        assert_eq!(response.status(), StatusCode::NOT_FOUND);
    }
}
