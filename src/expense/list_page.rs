//! Displays the expenses as a table with filters for the title, category and month.

use std::sync::{Arc, Mutex};

use axum::{
    Extension,
    extract::{FromRef, Query, State},
    response::{IntoResponse, Response},
};
use maud::{Markup, html};
use rusqlite::Connection;
use serde::Deserialize;
use time::Month;

use crate::{
    AppState, Error,
    auth::UserID,
    endpoints::{self, format_endpoint},
    expense::{
        Expense, ExpenseScope,
        core::{ExpenseFilter, get_categories, query_expenses, sum_expenses},
    },
    html::{
        BUTTON_PRIMARY_STYLE, CATEGORY_BADGE_STYLE, FORM_LABEL_STYLE, FORM_TEXT_INPUT_STYLE,
        LINK_STYLE, PAGE_CONTAINER_STYLE, TABLE_CELL_STYLE, TABLE_HEADER_STYLE, TABLE_ROW_STYLE,
        base, edit_delete_action_links, format_currency,
    },
    navigation::NavBar,
    summary::{Period, round_money},
};

/// The state needed for the [get_expenses_page](crate::expense::get_expenses_page) route handler.
#[derive(Debug, Clone)]
pub struct ExpenseListState {
    pub db_connection: Arc<Mutex<Connection>>,
    pub expense_scope: ExpenseScope,
}

impl FromRef<AppState> for ExpenseListState {
    fn from_ref(state: &AppState) -> Self {
        Self {
            db_connection: state.db_connection.clone(),
            expense_scope: state.expense_scope,
        }
    }
}

/// The filters of the expense list as given in the URL query string.
///
/// The month and year are kept as text so that an empty select box does not
/// reject the whole request.
#[derive(Debug, Default, Deserialize)]
pub struct ExpenseListQuery {
    /// Text to search for in expense titles.
    pub q: Option<String>,
    /// The category to show, "all" shows every category.
    pub category: Option<String>,
    pub month: Option<String>,
    pub year: Option<String>,
}

impl ExpenseListQuery {
    fn to_filter(&self, owner: Option<UserID>) -> ExpenseFilter {
        let non_empty = |field: &Option<String>| {
            field
                .as_deref()
                .map(str::trim)
                .filter(|text| !text.is_empty())
                .map(str::to_owned)
        };

        let category = non_empty(&self.category).filter(|category| category != "all");

        // The month filter only applies when both the month and year are given.
        let period = match (
            non_empty(&self.month).and_then(|month| month.parse::<u8>().ok()),
            non_empty(&self.year).and_then(|year| year.parse::<i32>().ok()),
        ) {
            (Some(month), Some(year)) => Period::new(month, year)
                .inspect_err(|error| tracing::debug!("ignoring month filter: {error}"))
                .ok(),
            _ => None,
        };

        ExpenseFilter {
            title_query: non_empty(&self.q),
            category,
            period,
            owner,
        }
    }
}

/// An expense with the links for its row in the table.
struct ExpenseTableRow {
    expense: Expense,
    edit_url: String,
    delete_url: String,
}

impl From<Expense> for ExpenseTableRow {
    fn from(expense: Expense) -> Self {
        Self {
            edit_url: format_endpoint(endpoints::EDIT_EXPENSE_VIEW, expense.id),
            delete_url: format_endpoint(endpoints::DELETE_EXPENSE_VIEW, expense.id),
            expense,
        }
    }
}

fn filter_form(filter: &ExpenseFilter, categories: &[String]) -> Markup {
    let selected_category = filter.category.as_deref().unwrap_or("all");
    let selected_month = filter.period.map(|period| period.month());
    let selected_year = filter.period.map(|period| period.year());
    let months = (1..=12u8)
        .filter_map(|number| Month::try_from(number).ok().map(|month| (number, month)));

    html!(
        form
            method="get"
            action=(endpoints::EXPENSES_VIEW)
            class="grid grid-cols-1 sm:grid-cols-5 gap-3 items-end w-full"
        {
            div class="sm:col-span-2"
            {
                label for="q" class=(FORM_LABEL_STYLE) { "Search" }

                input
                    name="q"
                    id="q"
                    type="search"
                    placeholder="Search titles"
                    value=[filter.title_query.as_deref()]
                    class=(FORM_TEXT_INPUT_STYLE);
            }

            div
            {
                label for="category-filter" class=(FORM_LABEL_STYLE) { "Category" }

                select name="category" id="category-filter" class=(FORM_TEXT_INPUT_STYLE)
                {
                    option value="all" selected[selected_category == "all"] { "All" }

                    @for category in categories {
                        option value=(category) selected[selected_category == category.as_str()] { (category) }
                    }
                }
            }

            div
            {
                label for="month" class=(FORM_LABEL_STYLE) { "Month" }

                select name="month" id="month" class=(FORM_TEXT_INPUT_STYLE)
                {
                    option value="" selected[selected_month.is_none()] { "Any" }

                    @for (number, month) in months {
                        option value=(number) selected[selected_month == Some(number)] { (month) }
                    }
                }
            }

            div
            {
                label for="year" class=(FORM_LABEL_STYLE) { "Year" }

                input
                    name="year"
                    id="year"
                    type="number"
                    placeholder="2025"
                    value=[selected_year]
                    class=(FORM_TEXT_INPUT_STYLE);
            }

            button type="submit" class=(BUTTON_PRIMARY_STYLE) { "Filter" }
        }
    )
}

fn expenses_view(
    rows: &[ExpenseTableRow],
    total: f64,
    filter: &ExpenseFilter,
    categories: &[String],
) -> Markup {
    let create_expense_page_url = endpoints::NEW_EXPENSE_VIEW;
    let nav_bar = NavBar::new(endpoints::EXPENSES_VIEW).into_html();

    let table_row = |row: &ExpenseTableRow| {
        let expense = &row.expense;

        html!(
            tr class=(TABLE_ROW_STYLE) data-expense-row="true"
            {
                th
                    scope="row"
                    class="px-6 py-4 font-medium text-gray-900 whitespace-nowrap dark:text-white"
                {
                    (expense.title)
                }

                td class=(TABLE_CELL_STYLE)
                {
                    span class=(CATEGORY_BADGE_STYLE) { (expense.category) }
                }

                td class="px-6 py-4 text-right tabular-nums"
                {
                    (format_currency(expense.amount))
                }

                td class=(TABLE_CELL_STYLE)
                {
                    time datetime=(expense.date) { (expense.date) }
                }

                td class=(TABLE_CELL_STYLE)
                {
                    div class="flex gap-4"
                    {
                        (edit_delete_action_links(&row.edit_url, &row.delete_url))
                    }
                }
            }
        )
    };

    let content = html!(
        (nav_bar)

        main class=(PAGE_CONTAINER_STYLE)
        {
            section class="space-y-4 w-full lg:max-w-5xl"
            {
                header class="flex justify-between flex-wrap items-end"
                {
                    h1 class="text-xl font-bold" { "Expenses" }

                    a href=(create_expense_page_url) class=(LINK_STYLE)
                    {
                        "Add Expense"
                    }
                }

                (filter_form(filter, categories))

                section class="w-full overflow-x-auto dark:bg-gray-800"
                {
                    table class="w-full text-sm text-left rtl:text-right
                        text-gray-500 dark:text-gray-400"
                    {
                        thead class=(TABLE_HEADER_STYLE)
                        {
                            tr
                            {
                                th scope="col" class=(TABLE_CELL_STYLE) { "Title" }
                                th scope="col" class=(TABLE_CELL_STYLE) { "Category" }
                                th scope="col" class="px-6 py-3 text-right" { "Amount" }
                                th scope="col" class=(TABLE_CELL_STYLE) { "Date" }
                                th scope="col" class=(TABLE_CELL_STYLE) { "Actions" }
                            }
                        }

                        tbody
                        {
                            @for row in rows {
                                (table_row(row))
                            }

                            @if rows.is_empty() {
                                tr
                                {
                                    td
                                        colspan="5"
                                        class="px-6 py-4 text-center
                                            text-gray-500 dark:text-gray-400"
                                    {
                                        "No expenses found. Record an expense "
                                        a href=(create_expense_page_url) class=(LINK_STYLE)
                                        {
                                            "here"
                                        }
                                        "."
                                    }
                                }
                            }
                        }

                        tfoot
                        {
                            tr class="font-semibold text-gray-900 dark:text-white"
                            {
                                th scope="row" colspan="2" class=(TABLE_CELL_STYLE) { "Total" }
                                td id="expenses-total" class="px-6 py-4 text-right tabular-nums"
                                {
                                    (format_currency(total))
                                }
                                td colspan="2" {}
                            }
                        }
                    }
                }
            }
        }
    );

    base("Expenses", &[], &content)
}

/// Renders the expense list, filtered by the URL query.
pub async fn get_expenses_page(
    State(state): State<ExpenseListState>,
    Extension(user_id): Extension<UserID>,
    Query(query): Query<ExpenseListQuery>,
) -> Result<Response, Error> {
    let owner = state.expense_scope.owner_filter(user_id);
    let filter = query.to_filter(owner);

    let connection = state
        .db_connection
        .lock()
        .inspect_err(|error| tracing::error!("could not acquire database lock: {error}"))
        .map_err(|_| Error::DatabaseLockError)?;

    let expenses = query_expenses(&filter, &connection)
        .inspect_err(|error| tracing::error!("could not query expenses: {error}"))?;
    let total = sum_expenses(&filter, &connection)
        .inspect_err(|error| tracing::error!("could not sum expenses: {error}"))?;
    let categories = get_categories(owner, &connection)
        .inspect_err(|error| tracing::error!("could not get categories: {error}"))?;

    let rows = expenses
        .into_iter()
        .map(ExpenseTableRow::from)
        .collect::<Vec<_>>();

    Ok(expenses_view(&rows, round_money(total), &filter, &categories).into_response())
}

#[cfg(test)]
mod expenses_page_tests {
    use std::sync::{Arc, Mutex};

    use axum::{
        Extension,
        extract::{Query, State},
    };
    use rusqlite::Connection;
    use scraper::{Html, Selector};
    use time::macros::date;

    use crate::{
        auth::{PasswordHash, UserID, Username, create_user},
        db::initialize,
        expense::{ExpenseScope, NewExpense, create_expense},
        summary::Period,
        test_utils::{assert_status_ok, assert_valid_html, parse_html_document},
    };

    use super::{ExpenseListQuery, ExpenseListState, get_expenses_page};

    fn get_test_state(expense_scope: ExpenseScope) -> (ExpenseListState, UserID, UserID) {
        let conn = Connection::open_in_memory().unwrap();
        initialize(&conn).unwrap();
        let alice = create_user(
            Username::new_unchecked("alice"),
            PasswordHash::new_unchecked("hash"),
            &conn,
        )
        .unwrap()
        .id;
        let bob = create_user(
            Username::new_unchecked("bob"),
            PasswordHash::new_unchecked("hash"),
            &conn,
        )
        .unwrap()
        .id;

        let expenses = [
            ("Lunch", 250.0, "Food", date!(2025 - 10 - 04), alice),
            ("Bus", 30.1, "Travel", date!(2025 - 10 - 05), alice),
            ("Dinner", 400.2, "Food", date!(2025 - 09 - 20), bob),
        ];
        for (title, amount, category, date, owner) in expenses {
            create_expense(
                NewExpense {
                    title: title.to_owned(),
                    amount,
                    category: category.to_owned(),
                    date,
                },
                Some(owner),
                &conn,
            )
            .unwrap();
        }

        (
            ExpenseListState {
                db_connection: Arc::new(Mutex::new(conn)),
                expense_scope,
            },
            alice,
            bob,
        )
    }

    fn query(q: &str, category: &str, month: &str, year: &str) -> ExpenseListQuery {
        ExpenseListQuery {
            q: Some(q.to_owned()),
            category: Some(category.to_owned()),
            month: Some(month.to_owned()),
            year: Some(year.to_owned()),
        }
    }

    fn row_titles(html: &Html) -> Vec<String> {
        html.select(&Selector::parse("tr[data-expense-row] th").unwrap())
            .map(|th| th.text().collect::<String>().trim().to_owned())
            .collect()
    }

    #[track_caller]
    fn assert_total(html: &Html, want: &str) {
        let got = total_text(html);

        assert!(got.ends_with(want), "want total {want}, got {got}");
    }

    fn total_text(html: &Html) -> String {
        html.select(&Selector::parse("#expenses-total").unwrap())
            .next()
            .expect("No total found")
            .text()
            .collect::<String>()
            .trim()
            .to_owned()
    }

    #[tokio::test]
    async fn lists_all_expenses_newest_first() {
        let (state, alice, _) = get_test_state(ExpenseScope::Shared);

        let response = get_expenses_page(
            State(state),
            Extension(alice),
            Query(ExpenseListQuery::default()),
        )
        .await
        .unwrap();

        assert_status_ok(&response);
        let html = parse_html_document(response).await;
        assert_valid_html(&html);
        assert_eq!(row_titles(&html), vec!["Bus", "Lunch", "Dinner"]);
        assert_total(&html, "680.30");
    }

    #[tokio::test]
    async fn applies_title_category_and_month_filters() {
        let (state, alice, _) = get_test_state(ExpenseScope::Shared);

        let response = get_expenses_page(
            State(state),
            Extension(alice),
            Query(query("LUN", "Food", "10", "2025")),
        )
        .await
        .unwrap();

        let html = parse_html_document(response).await;
        assert_eq!(row_titles(&html), vec!["Lunch"]);
        assert_total(&html, "250.00");
    }

    #[tokio::test]
    async fn month_filter_needs_month_and_year() {
        let (state, alice, _) = get_test_state(ExpenseScope::Shared);

        let response = get_expenses_page(
            State(state),
            Extension(alice),
            Query(query("", "all", "10", "")),
        )
        .await
        .unwrap();

        let html = parse_html_document(response).await;
        assert_eq!(row_titles(&html).len(), 3);
    }

    #[tokio::test]
    async fn per_user_scope_hides_other_users_expenses() {
        let (state, _, bob) = get_test_state(ExpenseScope::PerUser);

        let response = get_expenses_page(
            State(state),
            Extension(bob),
            Query(ExpenseListQuery::default()),
        )
        .await
        .unwrap();

        let html = parse_html_document(response).await;
        assert_eq!(row_titles(&html), vec!["Dinner"]);
        assert_total(&html, "400.20");

        let categories = html
            .select(&Selector::parse("select[name='category'] option").unwrap())
            .filter_map(|option| option.value().attr("value"))
            .collect::<Vec<_>>();
        assert_eq!(categories, vec!["all", "Food"]);
    }

    #[test]
    fn query_ignores_invalid_month() {
        let filter = query("", "", "13", "2025").to_filter(None);

        assert_eq!(filter.period, None);
        assert_eq!(filter.category, None);
        assert_eq!(filter.title_query, None);
    }

    #[test]
    fn query_builds_period() {
        let filter = query(" coffee ", "Food", "3", "2025").to_filter(None);

        assert_eq!(filter.period, Some(Period::new(3, 2025).unwrap()));
        assert_eq!(filter.category.as_deref(), Some("Food"));
        assert_eq!(filter.title_query.as_deref(), Some("coffee"));
    }
}
