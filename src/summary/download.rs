use axum::{
    Extension,
    extract::{Query, State},
    http::header::{CONTENT_DISPOSITION, CONTENT_TYPE},
    response::{IntoResponse, Response},
};

use crate::{
    Error,
    auth::UserID,
    summary::{
        page::{SummaryQuery, SummaryState, get_summary_report},
        svg::{comparison_filename, comparison_svg},
    },
};

/// Responds with the comparison of two months as an SVG file attachment.
///
/// Takes the same query parameters as the summary page.
pub async fn get_summary_download(
    State(state): State<SummaryState>,
    Extension(user_id): Extension<UserID>,
    Query(query): Query<SummaryQuery>,
) -> Result<Response, Error> {
    let report = get_summary_report(state, user_id, &query)?;
    let filename = comparison_filename(report.primary_period, report.compare_period);

    Ok((
        [
            (CONTENT_TYPE, "image/svg+xml".to_owned()),
            (
                CONTENT_DISPOSITION,
                format!("attachment; filename=\"{filename}\""),
            ),
        ],
        comparison_svg(&report),
    )
        .into_response())
}
