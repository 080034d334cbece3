//! Error alerts shown to users when a form submission fails.
//!
//! Alerts are rendered as HTML fragments that HTMX swaps into the
//! `#alert-container` element defined by [crate::html::base].

use axum::response::{IntoResponse, Response};
use maud::{Markup, html};

const ALERT_ERROR_STYLE: &str = "p-4 mb-4 text-sm text-red-800 rounded-lg \
    bg-red-50 border border-red-300 dark:bg-gray-800 dark:text-red-400 \
    dark:border-red-800";

/// A message shown to the user after an action fails.
#[derive(Debug, Clone, PartialEq)]
pub enum Alert {
    /// The action failed.
    Error {
        /// The headline of the alert.
        message: String,
        /// What went wrong and, where possible, how to fix it.
        details: String,
    },
}

impl Alert {
    /// Render the alert as an HTML fragment.
    pub fn into_html(self) -> Markup {
        let (style, message, details) = match self {
            Alert::Error { message, details } => (ALERT_ERROR_STYLE, message, details),
        };

        html! {
            div class=(style) role="alert"
            {
                div class="flex items-start justify-between gap-4"
                {
                    div
                    {
                        p class="font-semibold" { (message) }

                        @if !details.is_empty() {
                            p class="mt-1" { (details) }
                        }
                    }

                    button
                        type="button"
                        aria-label="Dismiss"
                        class="text-lg leading-none"
                        onclick="this.closest('[role=alert]').remove()"
                    {
                        "×"
                    }
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
