//! Application router configuration with protected and unprotected route definitions.

use axum::{
    Router, middleware,
    response::Redirect,
    routing::{get, post, put},
};
use tower_http::services::ServeDir;

use crate::{
    AppState,
    auth::{
        auth_guard, auth_guard_hx, get_log_in_page, get_log_out, get_register_page, post_log_in,
        register_user,
    },
    endpoints,
    expense::{
        create_expense_endpoint, delete_expense_endpoint, get_create_expense_page,
        get_delete_expense_page, get_edit_expense_page, get_expenses_page,
        update_expense_endpoint,
    },
    internal_server_error::get_internal_server_error_page,
    not_found::get_404_not_found,
    summary::{get_summary_download, get_summary_page},
};

/// Return a router with all the app's routes.
pub fn build_router(state: AppState) -> Router {
    let unprotected_routes = Router::new()
        .route(endpoints::LOG_IN_VIEW, get(get_log_in_page))
        .route(endpoints::LOG_IN_API, post(post_log_in))
        .route(endpoints::LOG_OUT, get(get_log_out))
        .route(endpoints::REGISTER_VIEW, get(get_register_page))
        .route(endpoints::USERS, post(register_user))
        .route(
            endpoints::INTERNAL_ERROR_VIEW,
            get(get_internal_server_error_page),
        );

    let protected_routes = Router::new()
        .route(endpoints::ROOT, get(get_index_page))
        .route(endpoints::EXPENSES_VIEW, get(get_expenses_page))
        .route(endpoints::NEW_EXPENSE_VIEW, get(get_create_expense_page))
        .route(endpoints::EDIT_EXPENSE_VIEW, get(get_edit_expense_page))
        .route(endpoints::DELETE_EXPENSE_VIEW, get(get_delete_expense_page))
        .route(endpoints::SUMMARY_VIEW, get(get_summary_page))
        .route(endpoints::SUMMARY_DOWNLOAD, get(get_summary_download))
        .layer(middleware::from_fn_with_state(state.clone(), auth_guard));

    // These POST/PUT/DELETE routes need to use the HX-REDIRECT header for auth redirects to work properly for HTMX requests.
    let protected_routes = protected_routes.merge(
        Router::new()
            .route(endpoints::EXPENSES_API, post(create_expense_endpoint))
            .route(
                endpoints::EXPENSE,
                put(update_expense_endpoint).delete(delete_expense_endpoint),
            )
            .layer(middleware::from_fn_with_state(state.clone(), auth_guard_hx)),
    );

    protected_routes
        .merge(unprotected_routes)
        .nest_service(endpoints::STATIC, ServeDir::new("static/"))
        .fallback(get_404_not_found)
        .with_state(state)
}

/// The root path '/' redirects to the expense list.
async fn get_index_page() -> Redirect {
    Redirect::to(endpoints::EXPENSES_VIEW)
}


#[cfg(test)]
mod router_tests {
    use axum::http::StatusCode;
    use axum_extra::extract::cookie::Cookie;
    use axum_test::TestServer;
    use rusqlite::Connection;

    use crate::{
        AppState,
        auth::{COOKIE_TOKEN, PasswordHash, Username, ValidatedPassword, create_user},
        endpoints::{self, format_endpoint},
        expense::ExpenseScope,
    };

    use super::build_router;

    const PASSWORD: &str = "averysafeandsecurepassword";

    fn get_test_server(expense_scope: ExpenseScope) -> TestServer {
        let connection = Connection::open_in_memory().unwrap();
        let state = AppState::new(connection, "foobar", "Etc/UTC", expense_scope).unwrap();

        {
            let connection = state.db_connection.lock().unwrap();
            for username in ["alice", "bob"] {
                create_user(
                    Username::new_unchecked(username),
                    PasswordHash::new(ValidatedPassword::new_unchecked(PASSWORD), 4).unwrap(),
                    &connection,
                )
                .unwrap();
            }
        }

        TestServer::try_new(build_router(state)).expect("Could not create test server.")
    }

    async fn log_in(server: &TestServer, username: &str) -> Cookie<'static> {
        let response = server
            .post(endpoints::LOG_IN_API)
            .form(&[("username", username), ("password", PASSWORD)])
            .await;
        response.assert_status(StatusCode::SEE_OTHER);

        response.cookie(COOKIE_TOKEN)
    }

    async fn add_expense(server: &TestServer, cookie: &Cookie<'static>, title: &str, amount: &str) {
        server
            .post(endpoints::EXPENSES_API)
            .add_cookie(cookie.clone())
            .form(&[
                ("title", title),
                ("amount", amount),
                ("category", "Food"),
                ("date", "2025-04-02"),
            ])
            .await
            .assert_status(StatusCode::SEE_OTHER);
    }

    #[tokio::test]
    async fn pages_redirect_to_log_in_without_cookie() {
        let server = get_test_server(ExpenseScope::Shared);

        for path in [
            endpoints::EXPENSES_VIEW,
            endpoints::NEW_EXPENSE_VIEW,
            endpoints::SUMMARY_VIEW,
            endpoints::SUMMARY_DOWNLOAD,
        ] {
            let response = server.get(path).await;

            response.assert_status(StatusCode::SEE_OTHER);
            assert!(
                response
                    .header("location")
                    .to_str()
                    .unwrap()
                    .starts_with(endpoints::LOG_IN_VIEW),
                "{path} did not redirect to the log in page"
            );
        }
    }

    #[tokio::test]
    async fn api_responds_with_hx_redirect_without_cookie() {
        let server = get_test_server(ExpenseScope::Shared);

        let response = server
            .post(endpoints::EXPENSES_API)
            .form(&[("title", "Lunch"), ("amount", "10"), ("category", "Food")])
            .await;

        response.assert_status_ok();
        assert!(
            response
                .header("hx-redirect")
                .to_str()
                .unwrap()
                .starts_with(endpoints::LOG_IN_VIEW)
        );
    }

    #[tokio::test]
    async fn unknown_route_gives_404() {
        let server = get_test_server(ExpenseScope::Shared);

        server
            .get("/does/not/exist")
            .await
            .assert_status(StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn log_in_add_list_and_summarise_expenses() {
        let server = get_test_server(ExpenseScope::Shared);
        let cookie = log_in(&server, "alice").await;
        add_expense(&server, &cookie, "Groceries", "100").await;
        add_expense(&server, &cookie, "Dinner", "25.5").await;

        let list = server
            .get(endpoints::EXPENSES_VIEW)
            .add_cookie(cookie.clone())
            .await;
        list.assert_status_ok();
        let text = list.text();
        assert!(text.contains("Groceries"));
        assert!(text.contains("Dinner"));

        let summary = server
            .get(endpoints::SUMMARY_VIEW)
            .add_query_params([("month", "4"), ("year", "2025")])
            .add_cookie(cookie.clone())
            .await;
        summary.assert_status_ok();
        assert!(summary.text().contains("Comparison: April 2025 vs March 2025"));

        let download = server
            .get(endpoints::SUMMARY_DOWNLOAD)
            .add_query_params([("month", "4"), ("year", "2025")])
            .add_cookie(cookie)
            .await;
        download.assert_status_ok();
        assert_eq!(download.header("content-type"), "image/svg+xml");
        assert!(download.text().contains("Food"));
    }

    #[tokio::test]
    async fn edit_and_delete_expense() {
        let server = get_test_server(ExpenseScope::Shared);
        let cookie = log_in(&server, "alice").await;
        add_expense(&server, &cookie, "Groceries", "100").await;
        let expense_path = format_endpoint(endpoints::EXPENSE, 1);

        server
            .put(&expense_path)
            .add_cookie(cookie.clone())
            .form(&[
                ("title", "Weekly groceries"),
                ("amount", "120"),
                ("category", "Food"),
                ("date", "2025-04-03"),
            ])
            .await
            .assert_status(StatusCode::SEE_OTHER);
        let text = server
            .get(endpoints::EXPENSES_VIEW)
            .add_cookie(cookie.clone())
            .await
            .text();
        assert!(text.contains("Weekly groceries"));

        server
            .delete(&expense_path)
            .add_cookie(cookie.clone())
            .await
            .assert_status(StatusCode::SEE_OTHER);
        server
            .get(&format_endpoint(endpoints::EDIT_EXPENSE_VIEW, 1))
            .add_cookie(cookie)
            .await
            .assert_status(StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn per_user_scope_hides_other_users_expenses() {
        let server = get_test_server(ExpenseScope::PerUser);
        let alice = log_in(&server, "alice").await;
        let bob = log_in(&server, "bob").await;
        add_expense(&server, &alice, "Groceries", "100").await;

        let text = server
            .get(endpoints::EXPENSES_VIEW)
            .add_cookie(bob.clone())
            .await
            .text();
        assert!(!text.contains("Groceries"));

        server
            .delete(&format_endpoint(endpoints::EXPENSE, 1))
            .add_cookie(bob)
            .await
            .assert_status(StatusCode::NOT_FOUND);
    }
}
