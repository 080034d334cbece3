//! Defines the route handler for the page for editing a transaction.

use std::sync::{Arc, Mutex};

use axum::{
    extract::{FromRef, Path, State},
    response::{IntoResponse, Response},
};
use maud::{Markup, html};
use rusqlite::Connection;

use crate::{
    AppState, Error,
    category::{Category, Subcategory, get_all_categories, get_subcategories},
    endpoints::{self, format_endpoint},
    html::{
        BUTTON_PRIMARY_STYLE, FORM_CONTAINER_STYLE, LINK_STYLE, base, dollar_input_styles,
        loading_spinner,
    },
    navigation::NavBar,
    transaction::{
        Transaction, TransactionId,
        core::get_transaction,
        form::{TransactionFormDefaults, transaction_form_fields, transaction_form_script},
    },
};

/// The state needed for the edit transaction page.
#[derive(Debug, Clone)]
pub struct EditTransactionPageState {
    /// The database connection for accessing transactions and categories.
    pub db_connection: Arc<Mutex<Connection>>,
}

impl FromRef<AppState> for EditTransactionPageState {
    fn from_ref(state: &AppState) -> Self {
        Self {
            db_connection: state.db_connection.clone(),
        }
    }
}

/// Renders the page for editing a transaction, or the 404 page if it does not exist.
pub async fn get_edit_transaction_page(
    Path(transaction_id): Path<TransactionId>,
    State(state): State<EditTransactionPageState>,
) -> Result<Response, Error> {
    let connection = state
        .db_connection
        .lock()
        .inspect_err(|error| tracing::error!("could not acquire database lock: {error}"))
        .map_err(|_| Error::DatabaseLockError)?;

    let transaction = get_transaction(transaction_id, &connection).inspect_err(|error| {
        if *error != Error::NotFound {
            tracing::error!("Failed to retrieve transaction {transaction_id}: {error}")
        }
    })?;
    let categories = get_all_categories(&connection)?;
    let subcategories = get_subcategories(transaction.category_id, &connection)?;

    Ok(edit_transaction_view(&transaction, &categories, &subcategories).into_response())
}

fn edit_transaction_view(
    transaction: &Transaction,
    categories: &[Category],
    subcategories: &[Subcategory],
) -> Markup {
    let nav_bar = NavBar::new(endpoints::EDIT_TRANSACTION_VIEW).into_html();
    let spinner = loading_spinner();
    let update_url = format_endpoint(endpoints::TRANSACTION, transaction.id);
    let cancel_url = format_endpoint(endpoints::TRANSACTION_VIEW, transaction.id);
    let fields = transaction_form_fields(
        &TransactionFormDefaults {
            date: transaction.date,
            description: Some(&transaction.description),
            amount: Some(transaction.amount),
            category_id: Some(transaction.category_id),
            subcategory_id: transaction.subcategory_id,
            notes: Some(&transaction.notes),
            subcategories,
        },
        categories,
    );

    let content = html! {
        (nav_bar)

        div class=(FORM_CONTAINER_STYLE)
        {
            form
                hx-put=(update_url)
                hx-target-error="#alert-container"
                class="w-full space-y-4 md:space-y-6"
            {
                h2 class="text-xl font-bold" { "Edit Transaction" }

                @if let Some(fund_label) = fund_label(transaction) {
                    p class="text-sm text-gray-600 dark:text-gray-400" { (fund_label) }
                }

                (fields)

                button type="submit" id="submit-button" tabindex="0" class=(BUTTON_PRIMARY_STYLE)
                {
                    span
                        id="indicator"
                        class="inline htmx-indicator"
                    {
                        (spinner)
                    }
                    " Update Transaction"
                }

                a href=(cancel_url) class=(LINK_STYLE) { "Cancel" }
            }
        }
    };

    base(
        "Edit Transaction",
        &[dollar_input_styles(), transaction_form_script()],
        &content,
    )
}

/// Sinking fund transactions keep their fund and type when edited.
fn fund_label(transaction: &Transaction) -> Option<String> {
    transaction
        .sinking_fund_id
        .map(|_| format!("Sinking fund {}", transaction.kind.as_str()))
}
