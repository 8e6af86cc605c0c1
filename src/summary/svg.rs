//! Draws the month comparison as SVG.
//!
//! The same bar chart and pie chart markup is used inline on the summary page
//! and in the standalone document offered for download. Elements are always
//! written with a closing tag so that the output is valid XML.

use maud::{Markup, PreEscaped, html};

use crate::{
    html::CURRENCY_SYMBOL,
    summary::{
        Period,
        aggregation::ComparisonRow,
        pie::{DEFAULT_PALETTE, PieSlice},
        report::SummaryReport,
    },
};

const DOCUMENT_WIDTH: f64 = 1200.0;
const ROW_HEIGHT: f64 = 56.0;
/// The space above the first bar, taken up by the title and legend.
const TOP_MARGIN: f64 = 72.0;
/// The space left of the bars for the category names.
const LEFT_PADDING: f64 = 320.0;
const BAR_MAX_WIDTH: f64 = 440.0;
const BAR_HEIGHT: f64 = 14.0;
/// Room to the right of the longest bar for its amount label.
const BAR_LABEL_WIDTH: f64 = 120.0;
const PIE_LEFT: f64 = LEFT_PADDING + BAR_MAX_WIDTH + 40.0;
const PIE_SIZE: f64 = 240.0;
const PIE_TOPS: [f64; 2] = [40.0, 320.0];
/// Where the category key starts, below the second pie and its title.
const KEY_TOP: f64 = 590.0;
const KEY_COLUMN_WIDTH: f64 = 160.0;
const KEY_ROW_HEIGHT: f64 = 18.0;
const BOTTOM_MARGIN: f64 = 40.0;

const PRIMARY_COLOR: &str = "#3A9AD9";
const COMPARE_COLOR: &str = "#FF6B78";
const NO_DATA_COLOR: &str = "#f1f3f5";
const MUTED_TEXT_COLOR: &str = "#6c757d";

/// Format a coordinate or length for an SVG attribute.
fn px(value: f64) -> String {
    format!("{value:.2}")
}

/// The label next to a bar, "-" for nothing spent.
fn amount_label(value: f64) -> String {
    if value == 0.0 {
        "-".to_owned()
    } else {
        format!("{CURRENCY_SYMBOL}{value:.2}")
    }
}

fn bar_width(value: f64, scale_max: f64) -> f64 {
    value / scale_max * BAR_MAX_WIDTH
}

/// The height taken up by the title, the bars and the axis.
fn bar_chart_height(row_count: usize) -> f64 {
    TOP_MARGIN + row_count as f64 * ROW_HEIGHT + BOTTOM_MARGIN
}

fn key_row_count(category_count: usize) -> usize {
    category_count.div_ceil(2)
}

/// The height taken up by both pies and the category key.
fn pie_area_height(category_count: usize) -> f64 {
    KEY_TOP + key_row_count(category_count) as f64 * KEY_ROW_HEIGHT
}

/// The declared height of the downloadable document.
pub fn document_height(category_count: usize) -> f64 {
    bar_chart_height(category_count).max(pie_area_height(category_count) + BOTTOM_MARGIN)
}

fn legend(primary_period: Period, compare_period: Period) -> Markup {
    html! {
        g class="legend" transform="translate(20,32)"
        {
            rect x="0" y="0" width="12" height="12" rx="2" fill=(PRIMARY_COLOR) {}
            text x="18" y="10" font-size="12" { (primary_period) }
            rect x="180" y="0" width="12" height="12" rx="2" fill=(COMPARE_COLOR) {}
            text x="198" y="10" font-size="12" { (compare_period) }
        }
    }
}

fn bar_row(row: &ComparisonRow, index: usize, scale_max: f64) -> Markup {
    let top = TOP_MARGIN + index as f64 * ROW_HEIGHT;
    let primary_width = bar_width(row.primary, scale_max);
    let compare_width = bar_width(row.compare, scale_max);

    html! {
        g class="bar-row"
        {
            text
                x=(px(LEFT_PADDING - 12.0))
                y=(px(top + 22.0))
                text-anchor="end"
                font-size="13"
            {
                (row.category)
            }

            rect
                class="bar-primary"
                x=(px(LEFT_PADDING))
                y=(px(top + 4.0))
                width=(px(primary_width))
                height=(px(BAR_HEIGHT))
                rx="6"
                fill=(PRIMARY_COLOR)
            {}
            text x=(px(LEFT_PADDING + primary_width + 8.0)) y=(px(top + 15.0)) font-size="11"
            {
                (amount_label(row.primary))
            }

            rect
                class="bar-compare"
                x=(px(LEFT_PADDING))
                y=(px(top + 24.0))
                width=(px(compare_width))
                height=(px(BAR_HEIGHT))
                rx="6"
                fill=(COMPARE_COLOR)
            {}
            text x=(px(LEFT_PADDING + compare_width + 8.0)) y=(px(top + 35.0)) font-size="11"
            {
                (amount_label(row.compare))
            }
        }
    }
}

fn axis(row_count: usize, scale_max: f64) -> Markup {
    let axis_y = bar_chart_height(row_count) - 22.0;

    html! {
        g class="axis" transform={ "translate(" (px(LEFT_PADDING)) "," (px(axis_y)) ")" }
        {
            line x1="0" y1="0" x2=(px(BAR_MAX_WIDTH)) y2="0" stroke="#adb5bd" stroke-width="1" {}
            text x="0" y="14" font-size="11" fill=(MUTED_TEXT_COLOR) { "0" }
            text x=(px(BAR_MAX_WIDTH)) y="14" font-size="11" text-anchor="end" fill=(MUTED_TEXT_COLOR)
            {
                (CURRENCY_SYMBOL) (format!("{scale_max:.2}"))
            }
        }
    }
}

/// The bars, their labels and the axis, positioned for the full document.
fn bars(report: &SummaryReport) -> Markup {
    html! {
        @for (index, row) in report.rows.iter().enumerate() {
            (bar_row(row, index, report.bar_scale_max))
        }

        (axis(report.rows.len(), report.bar_scale_max))
    }
}

/// A standalone bar chart for showing inline on the summary page.
pub fn bar_chart_svg(report: &SummaryReport) -> Markup {
    let width = LEFT_PADDING + BAR_MAX_WIDTH + BAR_LABEL_WIDTH;
    let height = bar_chart_height(report.rows.len());

    html! {
        svg
            xmlns="http://www.w3.org/2000/svg"
            viewBox={ "0 0 " (px(width)) " " (px(height)) }
            class="w-full h-auto"
            role="img"
            aria-label=(report.title())
        {
            (legend(report.primary_period, report.compare_period))
            (bars(report))
        }
    }
}

/// A pie chart drawn in a 240 by 240 box, or a "No data" placeholder if
/// there are no slices.
pub fn pie_chart_svg(slices: &[PieSlice]) -> Markup {
    html! {
        svg
            xmlns="http://www.w3.org/2000/svg"
            x="0"
            y="12"
            width=(px(PIE_SIZE))
            height=(px(PIE_SIZE))
            viewBox={ "0 0 " (px(PIE_SIZE)) " " (px(PIE_SIZE)) }
        {
            @if slices.is_empty() {
                circle class="no-data" cx="120" cy="120" r="90" fill=(NO_DATA_COLOR) fill-opacity="1" {}
                text
                    x="120"
                    y="120"
                    text-anchor="middle"
                    dominant-baseline="middle"
                    font-size="14"
                    fill=(MUTED_TEXT_COLOR)
                {
                    "No data"
                }
            } @else {
                @for slice in slices {
                    path class="pie-slice" d=(slice.path) fill=(slice.color) stroke="#ffffff" stroke-width="1"
                    {
                        title { (slice.category) ": " (format!("{:.2}", slice.percent)) "%" }
                    }
                }

                @for slice in slices {
                    text
                        x=(px(slice.label_x))
                        y=(px(slice.label_y))
                        text-anchor="middle"
                        dominant-baseline="middle"
                        font-size="11"
                        fill="#ffffff"
                    {
                        (format!("{:.2}%", slice.percent))
                    }
                }
            }
        }
    }
}

/// The colour key for the categories of both pies, two columns wide.
pub fn category_key(rows: &[ComparisonRow]) -> Markup {
    html! {
        @for (index, row) in rows.iter().enumerate() {
            @let x = (index % 2) as f64 * KEY_COLUMN_WIDTH;
            @let y = (index / 2) as f64 * KEY_ROW_HEIGHT;

            g class="key-entry"
            {
                rect
                    x=(px(x))
                    y=(px(y))
                    width="10"
                    height="10"
                    fill=(DEFAULT_PALETTE[index % DEFAULT_PALETTE.len()])
                {}
                text x=(px(x + 14.0)) y=(px(y + 9.0)) font-size="11" { (row.category) }
            }
        }
    }
}

fn pie_title(period: Period, total: f64) -> String {
    format!("{period}: {CURRENCY_SYMBOL}{total:.2}")
}

/// Render the full comparison as a standalone SVG document.
pub fn comparison_svg(report: &SummaryReport) -> String {
    let height = document_height(report.rows.len());
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

    let document = html! {
        (PreEscaped(r#"<?xml version="1.0" encoding="UTF-8"?>"#))
        "\n"
        svg
            xmlns="http://www.w3.org/2000/svg"
            width=(px(DOCUMENT_WIDTH))
            height=(px(height))
            viewBox={ "0 0 " (px(DOCUMENT_WIDTH)) " " (px(height)) }
            font-family="Helvetica, Arial, sans-serif"
        {
            rect x="0" y="0" width="100%" height="100%" fill="#ffffff" {}

            text x="20" y="22" font-size="18" font-weight="bold" { (report.title()) }

            (legend(report.primary_period, report.compare_period))
            (bars(report))

            @for ((period, total, slices), top) in pies.into_iter().zip(PIE_TOPS) {
                g class="pie" transform={ "translate(" (px(PIE_LEFT)) "," (px(top)) ")" }
                {
                    text x="0" y="0" font-size="13" font-weight="bold" { (pie_title(period, total)) }
                    (pie_chart_svg(slices))
                }
            }

            g class="category-key" transform={ "translate(" (px(PIE_LEFT)) "," (px(KEY_TOP)) ")" }
            {
                (category_key(&report.rows))
            }
        }
    };

    document.into_string()
}

/// The file name for a downloaded comparison, e.g. "comparison_2025_4_vs_2025_3.svg".
pub fn comparison_filename(primary_period: Period, compare_period: Period) -> String {
    format!(
        "comparison_{}_{}_vs_{}_{}.svg",
        primary_period.year(),
        primary_period.month(),
        compare_period.year(),
        compare_period.month()
    )
}
