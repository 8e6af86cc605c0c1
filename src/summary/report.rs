//! Bundles everything the summary page and the SVG download show about two months.

use rusqlite::Connection;

use crate::{
    Error,
    auth::UserID,
    expense::{Expense, ExpenseFilter, query_expenses},
    summary::{
        Period,
        aggregation::{
            CategoryTotals, ComparisonRow, PercentChange, bar_scale_max, compare_totals,
            percent_change, round_money, totals_for_period,
        },
        pie::{DEFAULT_PALETTE, PieGeometry, PieSlice, build_pie_slices},
    },
};

/// The comparison of the spending in two months.
#[derive(Debug, Clone, PartialEq)]
pub struct SummaryReport {
    pub primary_period: Period,
    pub compare_period: Period,
    pub primary_totals: CategoryTotals,
    pub compare_totals: CategoryTotals,
    /// One row per category, sorted by category name.
    pub rows: Vec<ComparisonRow>,
    /// The difference between the two grand totals, rounded to two decimals.
    pub difference: f64,
    /// The change between the two grand totals.
    pub percent_change: Option<PercentChange>,
    /// The amount that a full width bar represents.
    pub bar_scale_max: f64,
    pub primary_slices: Vec<PieSlice>,
    pub compare_slices: Vec<PieSlice>,
}

impl SummaryReport {
    /// Build the report from `expenses`, which may include expenses from
    /// outside of the two periods.
    ///
    /// The pie slices take their values from the rounded comparison rows but
    /// their angles from the unrounded period total, so when rounding moves
    /// the values the slices may not quite close the circle.
    pub fn build(expenses: &[Expense], primary_period: Period, compare_period: Period) -> Self {
        let primary = totals_for_period(expenses, primary_period);
        let compare = totals_for_period(expenses, compare_period);
        let rows = compare_totals(&primary, &compare);

        let geometry = PieGeometry::default();
        let primary_slices = build_pie_slices(
            &rows
                .iter()
                .map(|row| (row.category.clone(), row.primary))
                .collect::<Vec<_>>(),
            primary.total,
            &geometry,
            &DEFAULT_PALETTE,
        );
        let compare_slices = build_pie_slices(
            &rows
                .iter()
                .map(|row| (row.category.clone(), row.compare))
                .collect::<Vec<_>>(),
            compare.total,
            &geometry,
            &DEFAULT_PALETTE,
        );

        Self {
            primary_period,
            compare_period,
            difference: round_money(primary.total - compare.total),
            percent_change: percent_change(primary.total, compare.total),
            bar_scale_max: bar_scale_max(&rows, primary.total, compare.total),
            primary_totals: primary,
            compare_totals: compare,
            rows,
            primary_slices,
            compare_slices,
        }
    }

    /// A line naming both periods, e.g. "Comparison: April 2025 vs March 2025".
    pub fn title(&self) -> String {
        format!(
            "Comparison: {} vs {}",
            self.primary_period, self.compare_period
        )
    }
}

/// Load the expenses of both periods from the database and build the report.
///
/// `owner` restricts the report to the expenses recorded by that user.
///
/// # Errors
/// This function will return a [Error::SqlError] if there is an SQL error.
pub fn load_summary_report(
    primary_period: Period,
    compare_period: Period,
    owner: Option<UserID>,
    connection: &Connection,
) -> Result<SummaryReport, Error> {
    let mut periods = vec![primary_period];
    if compare_period != primary_period {
        periods.push(compare_period);
    }

    let mut expenses = Vec::new();

    for period in periods {
        let filter = ExpenseFilter {
            period: Some(period),
            owner,
            ..Default::default()
        };

        expenses.extend(query_expenses(&filter, connection)?);
    }

    Ok(SummaryReport::build(&expenses, primary_period, compare_period))
}
