//! Groups expenses by category and compares the category totals of two months.

use std::collections::{BTreeMap, BTreeSet};

use crate::{expense::Expense, summary::Period};

/// The total spent per category during one period.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct CategoryTotals {
    /// The amount spent in each category, ordered by category name.
    pub totals: BTreeMap<String, f64>,
    /// The amount spent across all categories.
    pub total: f64,
}

/// Sum the amounts of the expenses dated within `period` per category.
///
/// Expenses outside of `period` are ignored. The amounts are accumulated
/// as-is, rounding only happens when the totals are displayed.
pub fn totals_for_period(expenses: &[Expense], period: Period) -> CategoryTotals {
    let mut category_totals = CategoryTotals::default();

    for expense in expenses.iter().filter(|expense| period.contains(expense.date)) {
        *category_totals
            .totals
            .entry(expense.category.clone())
            .or_insert(0.0) += expense.amount;
        category_totals.total += expense.amount;
    }

    category_totals
}

/// Round an amount of money to two decimal places, halves away from zero.
pub fn round_money(value: f64) -> f64 {
    (value * 100.0).round() / 100.0
}

/// The relative change from one amount to another.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum PercentChange {
    /// The change as a percentage of the baseline, rounded to two decimals.
    Finite(f64),
    /// Spending went from nothing to something.
    Infinite,
}

/// The change from `compare` to `primary` as a percentage of `compare`.
///
/// Returns `None` if both amounts are zero and [PercentChange::Infinite] if
/// only `compare` is zero.
pub fn percent_change(primary: f64, compare: f64) -> Option<PercentChange> {
    if compare == 0.0 {
        if primary == 0.0 {
            None
        } else {
            Some(PercentChange::Infinite)
        }
    } else {
        Some(PercentChange::Finite(round_money(
            (primary - compare) / compare * 100.0,
        )))
    }
}

/// How one category's spending changed between two periods.
#[derive(Debug, Clone, PartialEq)]
pub struct ComparisonRow {
    pub category: String,
    /// The total for the primary period, rounded to two decimals.
    pub primary: f64,
    /// The total for the period being compared against, rounded to two decimals.
    pub compare: f64,
    /// `primary - compare`, rounded to two decimals.
    pub difference: f64,
    pub percent_change: Option<PercentChange>,
}

/// Build one row per category that appears in either period, sorted by category name.
///
/// A category missing from one of the periods counts as zero for that period.
pub fn compare_totals(primary: &CategoryTotals, compare: &CategoryTotals) -> Vec<ComparisonRow> {
    let categories: BTreeSet<&String> = primary
        .totals
        .keys()
        .chain(compare.totals.keys())
        .collect();

    categories
        .into_iter()
        .map(|category| {
            let primary = round_money(primary.totals.get(category).copied().unwrap_or(0.0));
            let compare = round_money(compare.totals.get(category).copied().unwrap_or(0.0));

            ComparisonRow {
                category: category.clone(),
                primary,
                compare,
                difference: round_money(primary - compare),
                percent_change: percent_change(primary, compare),
            }
        })
        .collect()
}

/// The amount that a full width bar represents in the bar chart.
///
/// This is the largest category total of either period, or the larger of the
/// two period totals (at least one) if every category total is zero, so that
/// bar widths never divide by zero.
pub fn bar_scale_max(rows: &[ComparisonRow], primary_total: f64, compare_total: f64) -> f64 {
    let max_value = rows
        .iter()
        .flat_map(|row| [row.primary, row.compare])
        .fold(0.0, f64::max);

    if max_value > 0.0 {
        max_value
    } else {
        primary_total.max(compare_total).max(1.0)
    }
}
