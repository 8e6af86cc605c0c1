//! Computes the SVG geometry of pie chart slices.

use crate::summary::round_money;

/// The colours given to the categories of a chart, reused from the start
/// when there are more categories than colours.
pub const DEFAULT_PALETTE: [&str; 6] = [
    "#3A9AD9", "#FF6B78", "#FFD166", "#6BCB77", "#8E63FF", "#FF9F80",
];

/// Where to draw a pie chart.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PieGeometry {
    pub cx: f64,
    pub cy: f64,
    pub radius: f64,
}

impl Default for PieGeometry {
    fn default() -> Self {
        Self {
            cx: 120.0,
            cy: 120.0,
            radius: 100.0,
        }
    }
}

/// How far from the centre slice labels are placed, as a fraction of the radius.
const LABEL_RADIUS_FRACTION: f64 = 0.62;

/// One category's wedge of a pie chart.
#[derive(Debug, Clone, PartialEq)]
pub struct PieSlice {
    pub category: String,
    /// The slice's value rounded to two decimals.
    pub value: f64,
    /// The SVG path data for the wedge.
    pub path: String,
    pub color: String,
    pub label_x: f64,
    pub label_y: f64,
    /// The share of the total, as a percentage rounded to two decimals.
    pub percent: f64,
    /// Where the wedge starts, in degrees clockwise from 12 o'clock.
    pub start_angle: f64,
    /// How many degrees the wedge covers.
    pub span: f64,
}

/// Get the point on the circle at `angle` degrees clockwise from 12 o'clock.
fn point_on_circle(geometry: &PieGeometry, radius: f64, angle: f64) -> (f64, f64) {
    let radians = (angle - 90.0).to_radians();

    (
        geometry.cx + radius * radians.cos(),
        geometry.cy + radius * radians.sin(),
    )
}

fn wedge_path(geometry: &PieGeometry, start_angle: f64, span: f64) -> String {
    let PieGeometry { cx, cy, radius: r } = *geometry;
    let (x1, y1) = point_on_circle(geometry, r, start_angle);

    // An arc whose end point equals its start point draws nothing, so a
    // slice covering the whole pie is drawn as two half circles.
    if span >= 360.0 - 1e-9 {
        let (xm, ym) = point_on_circle(geometry, r, start_angle + 180.0);

        return format!(
            "M {cx:.2},{cy:.2} L {x1:.2},{y1:.2} A {r:.2},{r:.2} 0 0,1 {xm:.2},{ym:.2} \
             A {r:.2},{r:.2} 0 0,1 {x1:.2},{y1:.2} Z"
        );
    }

    let (x2, y2) = point_on_circle(geometry, r, start_angle + span);
    let large_arc = if span > 180.0 { 1 } else { 0 };

    format!(
        "M {cx:.2},{cy:.2} L {x1:.2},{y1:.2} A {r:.2},{r:.2} 0 {large_arc},1 {x2:.2},{y2:.2} Z"
    )
}

/// Build the slices of a pie chart from `(category, value)` pairs.
///
/// Slices are returned in the same order as `slices` and together cover the
/// full circle, starting at 12 o'clock and going clockwise. Pairs with a
/// value of zero or less are left out, but still use up a colour so that
/// each category keeps the colour of its position in `slices`.
///
/// Returns no slices if `total` is zero or less.
pub fn build_pie_slices(
    slices: &[(String, f64)],
    total: f64,
    geometry: &PieGeometry,
    palette: &[&str],
) -> Vec<PieSlice> {
    if total <= 0.0 {
        return Vec::new();
    }

    let palette = if palette.is_empty() {
        &DEFAULT_PALETTE[..]
    } else {
        palette
    };

    let mut start_angle = 0.0;
    let mut pie_slices = Vec::new();

    for (index, (category, value)) in slices.iter().enumerate() {
        if *value <= 0.0 {
            continue;
        }

        let span = value / total * 360.0;
        let (label_x, label_y) = point_on_circle(
            geometry,
            geometry.radius * LABEL_RADIUS_FRACTION,
            start_angle + span / 2.0,
        );

        pie_slices.push(PieSlice {
            category: category.clone(),
            value: round_money(*value),
            path: wedge_path(geometry, start_angle, span),
            color: palette[index % palette.len()].to_owned(),
            label_x,
            label_y,
            percent: round_money(value / total * 100.0),
            start_angle,
            span,
        });

        start_angle += span;
    }

    pie_slices
}
