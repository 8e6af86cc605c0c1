//! Helpers for building and checking the `redirect_url` that carries a user
//! back to the page they wanted after logging in.

use axum::{extract::Request, http::Uri};

use crate::endpoints;

/// Only same-origin paths are accepted, and never the auth pages themselves.
fn is_safe_redirect_path(path_and_query: &str) -> bool {
    if !path_and_query.starts_with('/') || path_and_query.starts_with("//") {
        return false;
    }

    let path = path_and_query
        .split_once('?')
        .map_or(path_and_query, |(path, _)| path);

    path != endpoints::LOG_IN_VIEW && path != endpoints::LOG_OUT && path != endpoints::REGISTER_VIEW
}

/// Reduce a user supplied URL to a local path and query.
///
/// Returns `None` for absolute URLs pointing at another host or for paths
/// that would loop back into the log-in flow.
pub fn normalize_redirect_url(raw_url: &str) -> Option<String> {
    let uri = raw_url.parse::<Uri>().ok()?;

    if uri.scheme().is_some() || uri.authority().is_some() {
        return None;
    }

    let path_and_query = uri.path_and_query()?.as_str();

    is_safe_redirect_path(path_and_query).then(|| path_and_query.to_owned())
}

/// HTMX sends the full URL of the current page, so the host is dropped here.
fn normalize_hx_current_url(raw_url: &str) -> Option<String> {
    let uri = raw_url.parse::<Uri>().ok()?;
    let path_and_query = uri.path_and_query()?.as_str();

    is_safe_redirect_path(path_and_query).then(|| path_and_query.to_owned())
}

/// Build the log-in URL that should send the user back to `request` once they
/// have logged in.
///
/// Page requests return to their own URL. Requests to `/api` routes are made
/// by HTMX, so they return to the page named in the `HX-Current-URL` header.
pub fn build_log_in_redirect_url(request: &Request) -> Option<String> {
    let redirect_target = if request.uri().path().starts_with("/api") {
        redirect_target_from_hx_request(request)?
    } else {
        let path_and_query = request.uri().path_and_query()?.as_str();
        normalize_redirect_url(path_and_query)?
    };

    build_log_in_redirect_url_from_target(&redirect_target)
}

pub(super) fn build_log_in_redirect_url_from_target(redirect_target: &str) -> Option<String> {
    match serde_urlencoded::to_string([("redirect_url", redirect_target)]) {
        Ok(query) => Some(format!("{}?{query}", endpoints::LOG_IN_VIEW)),
        Err(error) => {
            tracing::error!("Could not encode redirect URL {redirect_target}: {error}");
            None
        }
    }
}

fn redirect_target_from_hx_request(request: &Request) -> Option<String> {
    let headers = request.headers();
    let is_hx_request = headers
        .get("hx-request")
        .and_then(|header| header.to_str().ok())
        .is_some_and(|header| header.eq_ignore_ascii_case("true"));

    if !is_hx_request {
        tracing::warn!("Missing HX-Request header for /api request.");
        return None;
    }

    let Some(current_url) = headers
        .get("hx-current-url")
        .and_then(|header| header.to_str().ok())
    else {
        tracing::warn!("Missing HX-Current-URL header for /api request.");
        return None;
    };

    let redirect_url = normalize_hx_current_url(current_url);

    if redirect_url.is_none() {
        tracing::warn!("Invalid HX-Current-URL header value: {current_url}");
    }

    redirect_url
}

#[cfg(test)]
mod redirect_tests {
    use axum::{body::Body, extract::Request};

    use crate::endpoints;

    use super::{build_log_in_redirect_url, normalize_redirect_url};

    #[test]
    fn keeps_local_path_and_query() {
        assert_eq!(
            normalize_redirect_url("/expenses?q=tea&category=Food"),
            Some("/expenses?q=tea&category=Food".to_owned())
        );
    }

    #[test]
    fn rejects_other_hosts() {
        assert_eq!(normalize_redirect_url("https://example.com/expenses"), None);
        assert_eq!(normalize_redirect_url("//example.com/expenses"), None);
    }

    #[test]
    fn rejects_auth_pages() {
        assert_eq!(normalize_redirect_url(endpoints::LOG_IN_VIEW), None);
        assert_eq!(normalize_redirect_url(endpoints::REGISTER_VIEW), None);
        assert_eq!(normalize_redirect_url(endpoints::LOG_OUT), None);
    }

    #[test]
    fn page_request_redirects_back_to_itself() {
        let request = Request::builder()
            .uri("/summary?month=3&year=2025")
            .body(Body::empty())
            .unwrap();

        let want_query =
            serde_urlencoded::to_string([("redirect_url", "/summary?month=3&year=2025")]).unwrap();

        assert_eq!(
            build_log_in_redirect_url(&request),
            Some(format!("{}?{want_query}", endpoints::LOG_IN_VIEW))
        );
    }

    #[test]
    fn api_request_without_htmx_headers_has_no_target() {
        let request = Request::builder()
            .uri(endpoints::EXPENSES_API)
            .body(Body::empty())
            .unwrap();

        assert_eq!(build_log_in_redirect_url(&request), None);
    }

    #[test]
    fn api_request_uses_current_url_header() {
        let request = Request::builder()
            .uri(endpoints::EXPENSES_API)
            .header("HX-Request", "true")
            .header("HX-Current-URL", "http://localhost:3000/expenses/new")
            .body(Body::empty())
            .unwrap();

        let want_query = serde_urlencoded::to_string([("redirect_url", "/expenses/new")]).unwrap();

        assert_eq!(
            build_log_in_redirect_url(&request),
            Some(format!("{}?{want_query}", endpoints::LOG_IN_VIEW))
        );
    }
}
