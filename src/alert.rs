//! Alert messages for reporting failed requests to users.
//!
//! Alerts are rendered as HTML fragments that HTMX swaps into the
//! `#alert-container` element of the base page.

use axum::response::{IntoResponse, Response};
use maud::{Markup, html};

/// An alert message shown at the bottom of the page.
#[derive(Debug, Clone, PartialEq)]
pub enum Alert {
    /// Something went wrong, `details` explains what the user can do about it.
    Error { message: String, details: String },
}

impl Alert {
    fn into_html(self) -> Markup {
        let Alert::Error { message, details } = self;

        html! {
            div
                role="alert"
                class="alert-error flex items-start gap-3 p-4 mb-4 text-red-800 border
                    border-red-300 rounded-lg bg-red-50 dark:bg-gray-800 dark:text-red-400
                    dark:border-red-800"
            {
                div class="flex-1"
                {
                    p class="font-semibold" { (message) }

                    @if !details.is_empty() {
                        p class="text-sm" { (details) }
                    }
                }

                button
                    type="button"
                    aria-label="Dismiss"
                    class="ms-auto text-red-500 hover:text-red-700"
                    onclick="this.closest('[role=alert]').remove()"
                {
                    "×"
                }
            }
        }
    }
}

impl IntoResponse for Alert {
    fn into_response(self) -> Response {
        self.into_html().into_response()
    }
}
