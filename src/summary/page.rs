//! The page comparing how much was spent per category in two months.

use std::sync::{Arc, Mutex};

use axum::{
    Extension,
    extract::{FromRef, Query, State},
    response::{IntoResponse, Response},
};
use maud::{Markup, html};
use rusqlite::Connection;
use serde::{Deserialize, Serialize};
use time::{Date, Month};

use crate::{
    AppState, Error,
    auth::UserID,
    endpoints,
    expense::ExpenseScope,
    html::{
        BUTTON_PRIMARY_STYLE, FORM_LABEL_STYLE, FORM_TEXT_INPUT_STYLE, LINK_STYLE,
        PAGE_CONTAINER_STYLE, TABLE_CELL_STYLE, TABLE_HEADER_STYLE, TABLE_ROW_STYLE, base,
        format_currency,
    },
    navigation::NavBar,
    summary::{
        Period,
        aggregation::PercentChange,
        report::{SummaryReport, load_summary_report},
        svg::{bar_chart_svg, category_key, pie_chart_svg},
    },
    timezone::local_today,
};

/// The state needed for the summary page and the SVG download.
#[derive(Debug, Clone)]
pub struct SummaryState {
    pub db_connection: Arc<Mutex<Connection>>,
    /// The local timezone as a canonical timezone name, e.g. "Asia/Kolkata".
    pub local_timezone: String,
    pub expense_scope: ExpenseScope,
}

impl FromRef<AppState> for SummaryState {
    fn from_ref(state: &AppState) -> Self {
        Self {
            db_connection: state.db_connection.clone(),
            local_timezone: state.local_timezone.clone(),
            expense_scope: state.expense_scope,
        }
    }
}

/// The months to compare, as given in the URL query string.
///
/// The fields are kept as text so that empty inputs fall back to the defaults
/// instead of rejecting the request.
#[derive(Debug, Default, Deserialize)]
pub struct SummaryQuery {
    pub month: Option<String>,
    pub year: Option<String>,
    pub compare_month: Option<String>,
    pub compare_year: Option<String>,
}

/// The query string that selects a pair of periods, used for the download link.
#[derive(Serialize)]
struct PeriodsQuery {
    month: u8,
    year: i32,
    compare_month: u8,
    compare_year: i32,
}

fn parse_field<T: std::str::FromStr>(field: &Option<String>) -> Option<T> {
    field.as_deref().and_then(|text| text.trim().parse().ok())
}

impl SummaryQuery {
    /// Work out which periods to compare.
    ///
    /// A missing month or year of the primary period is taken from `today`.
    /// The compare period is only used when both of its fields are given,
    /// otherwise it is the month before the primary period. Invalid months
    /// are replaced with these defaults.
    pub fn resolve_periods(&self, today: Date) -> (Period, Period) {
        let current = Period::containing(today);

        let primary = Period::new(
            parse_field(&self.month).unwrap_or(current.month()),
            parse_field(&self.year).unwrap_or(current.year()),
        )
        .inspect_err(|error| tracing::debug!("using the current month instead: {error}"))
        .unwrap_or(current);

        let compare = match (
            parse_field::<u8>(&self.compare_month),
            parse_field::<i32>(&self.compare_year),
        ) {
            (Some(month), Some(year)) => Period::new(month, year)
                .inspect_err(|error| tracing::debug!("using the previous month instead: {error}"))
                .ok(),
            _ => None,
        }
        .unwrap_or_else(|| primary.previous());

        (primary, compare)
    }
}

/// Resolve the periods in `query` and load the report for the user making the request.
pub(super) fn get_summary_report(
    state: SummaryState,
    user_id: UserID,
    query: &SummaryQuery,
) -> Result<SummaryReport, Error> {
    let today = local_today(&state.local_timezone).ok_or_else(|| {
        tracing::error!("Invalid timezone {}", state.local_timezone);
        Error::InvalidTimezoneError(state.local_timezone.clone())
    })?;
    let (primary_period, compare_period) = query.resolve_periods(today);

    let connection = state
        .db_connection
        .lock()
        .inspect_err(|error| tracing::error!("could not acquire database lock: {error}"))
        .map_err(|_| Error::DatabaseLockError)?;

    load_summary_report(
        primary_period,
        compare_period,
        state.expense_scope.owner_filter(user_id),
        &connection,
    )
    .inspect_err(|error| tracing::error!("could not load summary report: {error}"))
}

/// Format a percent change for display, "∞" when spending went up from nothing
/// and "-" when nothing was spent in either month.
pub fn format_percent_change(percent_change: Option<PercentChange>) -> String {
    match percent_change {
        Some(PercentChange::Finite(percent)) => format!("{percent:.2}%"),
        Some(PercentChange::Infinite) => "∞".to_owned(),
        None => "-".to_owned(),
    }
}

fn download_url(report: &SummaryReport) -> String {
    let query = PeriodsQuery {
        month: report.primary_period.month(),
        year: report.primary_period.year(),
        compare_month: report.compare_period.month(),
        compare_year: report.compare_period.year(),
    };

    match serde_urlencoded::to_string(&query) {
        Ok(query) => format!("{}?{query}", endpoints::SUMMARY_DOWNLOAD),
        Err(error) => {
            tracing::error!("could not encode summary download query: {error}");
            endpoints::SUMMARY_DOWNLOAD.to_owned()
        }
    }
}

fn month_select(name: &str, label: &str, selected: Period) -> Markup {
    let months = (1..=12u8)
        .filter_map(|number| Month::try_from(number).ok().map(|month| (number, month)));

    html! {
        div
        {
            label for=(name) class=(FORM_LABEL_STYLE) { (label) }

            select name=(name) id=(name) class=(FORM_TEXT_INPUT_STYLE)
            {
                @for (number, month) in months {
                    option value=(number) selected[selected.month() == number] { (month) }
                }
            }
        }
    }
}

fn year_input(name: &str, label: &str, selected: Period) -> Markup {
    html! {
        div
        {
            label for=(name) class=(FORM_LABEL_STYLE) { (label) }

            input
                name=(name)
                id=(name)
                type="number"
                value=(selected.year())
                required
                class=(FORM_TEXT_INPUT_STYLE);
        }
    }
}

fn period_form(report: &SummaryReport) -> Markup {
    html! {
        form
            method="get"
            action=(endpoints::SUMMARY_VIEW)
            class="grid grid-cols-2 sm:grid-cols-5 gap-3 items-end w-full"
        {
            (month_select("month", "Month", report.primary_period))
            (year_input("year", "Year", report.primary_period))
            (month_select("compare_month", "Compare with", report.compare_period))
            (year_input("compare_year", "Year", report.compare_period))

            button type="submit" class=(BUTTON_PRIMARY_STYLE) { "Compare" }
        }
    }
}

fn totals_cards(report: &SummaryReport) -> Markup {
    let card = |id: &str, title: String, value: String| {
        html! {
            div class="rounded border border-gray-200 bg-white px-4 py-3 shadow-sm dark:border-gray-700 dark:bg-gray-800"
            {
                div class="text-xs text-gray-500 dark:text-gray-400" { (title) }
                div id=(id) class="text-lg font-semibold tabular-nums" { (value) }
            }
        }
    };

    html! {
        div class="grid grid-cols-2 lg:grid-cols-4 gap-4 w-full"
        {
            (card(
                "primary-total",
                report.primary_period.to_string(),
                format_currency(report.primary_totals.total),
            ))
            (card(
                "compare-total",
                report.compare_period.to_string(),
                format_currency(report.compare_totals.total),
            ))
            (card("difference", "Difference".to_owned(), format_currency(report.difference)))
            (card(
                "percent-change",
                "Change".to_owned(),
                format_percent_change(report.percent_change),
            ))
        }
    }
}

fn comparison_table(report: &SummaryReport) -> Markup {
    html! {
        section class="w-full overflow-x-auto dark:bg-gray-800"
        {
            table id="comparison-table" class="w-full text-sm text-left rtl:text-right text-gray-500 dark:text-gray-400"
            {
                thead class=(TABLE_HEADER_STYLE)
                {
                    tr
                    {
                        th scope="col" class=(TABLE_CELL_STYLE) { "Category" }
                        th scope="col" class="px-6 py-3 text-right" { (report.primary_period) }
                        th scope="col" class="px-6 py-3 text-right" { (report.compare_period) }
                        th scope="col" class="px-6 py-3 text-right" { "Difference" }
                        th scope="col" class="px-6 py-3 text-right" { "Change" }
                    }
                }

                tbody
                {
                    @for row in &report.rows {
                        tr class=(TABLE_ROW_STYLE)
                        {
                            th
                                scope="row"
                                class="px-6 py-4 font-medium text-gray-900 whitespace-nowrap dark:text-white"
                            {
                                (row.category)
                            }
                            td class="px-6 py-4 text-right tabular-nums" { (format_currency(row.primary)) }
                            td class="px-6 py-4 text-right tabular-nums" { (format_currency(row.compare)) }
                            td class="px-6 py-4 text-right tabular-nums" { (format_currency(row.difference)) }
                            td class="px-6 py-4 text-right tabular-nums" { (format_percent_change(row.percent_change)) }
                        }
                    }

                    @if report.rows.is_empty() {
                        tr
                        {
                            td
                                colspan="5"
                                class="px-6 py-4 text-center text-gray-500 dark:text-gray-400"
                            {
                                "No expenses in either month."
                            }
                        }
                    }
                }
            }
        }
    }
}

fn summary_view(report: &SummaryReport) -> Markup {
    let nav_bar = NavBar::new(endpoints::SUMMARY_VIEW).into_html();
    let pies = [
        (
            report.primary_period,
            report.primary_totals.total,
            &report.primary_slices,
        ),
        (
            report.compare_period,
            report.compare_totals.total,
            &report.compare_slices,
        ),
    ];

    let content = html! {
        (nav_bar)

        main class=(PAGE_CONTAINER_STYLE)
        {
            section class="space-y-6 w-full lg:max-w-5xl"
            {
                header class="flex justify-between flex-wrap items-end"
                {
                    h1 class="text-xl font-bold" { (report.title()) }

                    a id="download-link" href=(download_url(report)) class=(LINK_STYLE) download
                    {
                        "Download SVG"
                    }
                }

                (period_form(report))
                (totals_cards(report))
                (comparison_table(report))

                div class="rounded bg-white p-4 dark:bg-gray-100"
                {
                    (bar_chart_svg(report))
                }

                div class="grid grid-cols-1 md:grid-cols-2 gap-4"
                {
                    @for (period, total, slices) in pies {
                        figure class="rounded bg-white p-4 dark:bg-gray-100 flex flex-col items-center"
                        {
                            figcaption class="text-sm font-semibold text-gray-900"
                            {
                                (period) ": " (format_currency(total))
                            }
                            (pie_chart_svg(slices))
                        }
                    }
                }

                div class="rounded bg-white p-4 dark:bg-gray-100"
                {
                    svg
                        xmlns="http://www.w3.org/2000/svg"
                        viewBox={ "0 0 320 " ((report.rows.len().div_ceil(2) * 18).max(18)) }
                        class="w-full max-w-md h-auto"
                    {
                        (category_key(&report.rows))
                    }
                }
            }
        }
    };

    base("Summary", &[], &content)
}

/// Renders the comparison of two months, by default this month and the month before.
pub async fn get_summary_page(
    State(state): State<SummaryState>,
    Extension(user_id): Extension<UserID>,
    Query(query): Query<SummaryQuery>,
) -> Result<Response, Error> {
    let report = get_summary_report(state, user_id, &query)?;

    Ok(summary_view(&report).into_response())
}
