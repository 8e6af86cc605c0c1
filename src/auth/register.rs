//! The registration page for creating a new user account.
use std::sync::{Arc, Mutex};

use axum::{
    Form,
    extract::{FromRef, State},
    http::StatusCode,
    response::{IntoResponse, Response},
};
use axum_htmx::HxRedirect;
use maud::{Markup, html};
use rusqlite::Connection;
use serde::{Deserialize, Serialize};

use crate::{
    AppState, Error,
    auth::{PasswordHash, Username, ValidatedPassword, create_user},
    endpoints,
    html::{
        FORM_LABEL_STYLE, FORM_TEXT_INPUT_STYLE, LINK_STYLE, base, loading_spinner,
        log_in_register, password_input, username_input,
    },
    internal_server_error::get_internal_server_error_redirect,
};

/// The minimum number of characters the password should have to be considered valid on the client side (server-side validation is done on top of this validation).
const PASSWORD_INPUT_MIN_LENGTH: u8 = 8;

const USERNAME_TAKEN_ERROR_MSG: &str = "Username already taken";
const PASSWORD_MISMATCH_ERROR_MSG: &str = "Passwords do not match";

fn confirm_password_input(min_length: u8, error_message: Option<&str>) -> Markup {
    html! {
        div
        {
            label
                for="confirm-password"
                class=(FORM_LABEL_STYLE)
            {
                "Confirm Password"
            }

            input
                type="password"
                name="confirm_password"
                id="confirm-password"
                placeholder="••••••••"
                class=(FORM_TEXT_INPUT_STYLE)
                required
                minlength=(min_length)
                autofocus[error_message.is_some()]
            ;

            @if let Some(error_message) = error_message
            {
                p class="text-red-500 text-base" { (error_message) }
            }
        }
    }
}

/// Where a registration error is shown in the form.
#[derive(Debug, Clone, Copy, Default)]
struct FormErrors<'a> {
    username: Option<&'a str>,
    password: Option<&'a str>,
    confirm_password: Option<&'a str>,
}

fn registration_form(username: &str, errors: FormErrors) -> Markup {
    html! {
        form
            hx-post=(endpoints::USERS)
            hx-indicator="#indicator"
            hx-disabled-elt="#username, #password, #submit-button"
            class="space-y-4 md:space-y-6"
        {
            (username_input(username, errors.username))
            (password_input("", PASSWORD_INPUT_MIN_LENGTH, errors.password))
            (confirm_password_input(PASSWORD_INPUT_MIN_LENGTH, errors.confirm_password))

            button
                type="submit" id="submit-button" tabindex="0"
                class="w-full px-4 py-2 bg-blue-500 dark:bg-blue-600 disabled:bg-blue-700
                    hover:enabled:bg-blue-600 hover:enabled:dark:bg-blue-700 text-white rounded"
            {
                span class="inline htmx-indicator" id="indicator"
                {
                    (loading_spinner())
                }
                "Create Account"
            }

            p class="text-sm font-light text-gray-500 dark:text-gray-400"
            {
                "Already have an account? "

                a href=(endpoints::LOG_IN_VIEW) tabindex="0" class=(LINK_STYLE)
                {
                  "Log in here"
                }
            }
        }
    }
}

/// Display the registration page.
pub async fn get_register_page() -> Response {
    let registration_form = registration_form("", FormErrors::default());
    let content = log_in_register("Create Account", &registration_form);

    base("Register", &[], &content).into_response()
}

/// The state needed for creating a new user.
#[derive(Debug, Clone)]
pub struct RegistrationState {
    /// The connection to the database holding the users.
    pub db_connection: Arc<Mutex<Connection>>,
}

impl FromRef<AppState> for RegistrationState {
    fn from_ref(state: &AppState) -> Self {
        Self {
            db_connection: state.db_connection.clone(),
        }
    }
}

/// The raw data entered by the user in the registration form.
#[derive(Serialize, Deserialize)]
pub struct RegisterForm {
    /// The requested username, trimmed before it is stored.
    pub username: String,
    /// The new password.
    pub password: String,
    /// Must equal `password`.
    pub confirm_password: String,
}

/// Create a new user from the registration form.
///
/// Validation problems re-render the form with the error beside the field
/// it relates to. On success the client is redirected to the log-in page.
pub async fn register_user(
    State(state): State<RegistrationState>,
    Form(user_data): Form<RegisterForm>,
) -> Response {
    let username = match Username::new(&user_data.username) {
        Ok(username) => username,
        Err(error) => {
            let error_message = error.to_string();

            return registration_form(
                &user_data.username,
                FormErrors {
                    username: Some(&error_message),
                    ..Default::default()
                },
            )
            .into_response();
        }
    };

    let validated_password =
        match ValidatedPassword::new(&user_data.password, &[username.as_ref()]) {
            Ok(password) => password,
            Err(error) => {
                let error_message = error.to_string();

                return registration_form(
                    username.as_ref(),
                    FormErrors {
                        password: Some(&error_message),
                        ..Default::default()
                    },
                )
                .into_response();
            }
        };

    if user_data.password != user_data.confirm_password {
        return registration_form(
            username.as_ref(),
            FormErrors {
                confirm_password: Some(PASSWORD_MISMATCH_ERROR_MSG),
                ..Default::default()
            },
        )
        .into_response();
    }

    let password_hash = match PasswordHash::new(validated_password, PasswordHash::DEFAULT_COST) {
        Ok(hash) => hash,
        Err(error) => {
            tracing::error!("an error occurred while hashing a password: {error}");

            return get_internal_server_error_redirect();
        }
    };

    let connection = match state.db_connection.lock() {
        Ok(connection) => connection,
        Err(error) => {
            tracing::error!("Could not acquire database lock: {error}");
            return get_internal_server_error_redirect();
        }
    };

    match create_user(username.clone(), password_hash, &connection) {
        Ok(user) => {
            tracing::info!("Registered user {} with ID {}", user.username, user.id);

            (
                HxRedirect(endpoints::LOG_IN_VIEW.to_owned()),
                StatusCode::SEE_OTHER,
            )
                .into_response()
        }
        Err(Error::DuplicateUsername(_)) => registration_form(
            username.as_ref(),
            FormErrors {
                username: Some(USERNAME_TAKEN_ERROR_MSG),
                ..Default::default()
            },
        )
        .into_response(),
        Err(error) => {
            tracing::error!("An unhandled error occurred while inserting a new user: {error}");

            get_internal_server_error_redirect()
        }
    }
}

#[cfg(test)]
mod get_register_page_tests {
    use scraper::Selector;

    use crate::{
        endpoints,
        test_utils::{
            assert_content_type, assert_form_input, assert_form_submit_button_with_text,
            assert_hx_endpoint, assert_status_ok, assert_valid_html, must_get_form,
            parse_html_document,
        },
    };

    use super::get_register_page;

    #[tokio::test]
    async fn render_register_page() {
        let response = get_register_page().await;

        assert_status_ok(&response);
        assert_content_type(&response, "text/html; charset=utf-8");
        let document = parse_html_document(response).await;
        assert_valid_html(&document);

        let title = document
            .select(&Selector::parse("h1").unwrap())
            .next()
            .expect("No h1 found")
            .text()
            .collect::<String>();
        assert_eq!(title.trim(), "Create Account");

        let form = must_get_form(&document);
        assert_hx_endpoint(&form, endpoints::USERS, "hx-post");
        assert_form_input(&form, "username", "text");
        assert_form_input(&form, "password", "password");
        assert_form_input(&form, "confirm_password", "password");
        assert_form_submit_button_with_text(&form, "Create Account");

        let links = form
            .select(&Selector::parse("a[href]").unwrap())
            .collect::<Vec<_>>();
        assert_eq!(links.len(), 1, "want 1 link, got {}", links.len());
        assert_eq!(links[0].value().attr("href"), Some(endpoints::LOG_IN_VIEW));
    }
}
