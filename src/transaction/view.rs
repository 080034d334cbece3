//! The page for a single transaction.

use std::sync::{Arc, Mutex};

use axum::{
    extract::{FromRef, Path, State},
    response::{IntoResponse, Response},
};
use maud::{Markup, html};
use rusqlite::Connection;

use crate::{
    AppState, Error,
    endpoints::{self, format_endpoint},
    html::{CARD_STYLE, CATEGORY_BADGE_STYLE, PAGE_CONTAINER_STYLE, base, edit_delete_action_links, format_currency},
    navigation::NavBar,
    transaction::{
        TransactionId, TransactionKind,
        query::{TransactionTableRow, get_transaction_row},
    },
};

/// The state needed for the transaction page.
#[derive(Debug, Clone)]
pub struct TransactionPageState {
    pub db_connection: Arc<Mutex<Connection>>,
}

impl FromRef<AppState> for TransactionPageState {
    fn from_ref(state: &AppState) -> Self {
        Self {
            db_connection: state.db_connection.clone(),
        }
    }
}

/// Renders a single transaction, or the 404 page if it does not exist.
pub async fn get_transaction_page(
    Path(transaction_id): Path<TransactionId>,
    State(state): State<TransactionPageState>,
) -> Result<Response, Error> {
    let connection = state
        .db_connection
        .lock()
        .inspect_err(|error| tracing::error!("could not acquire database lock: {error}"))
        .map_err(|_| Error::DatabaseLockError)?;

    let transaction = get_transaction_row(transaction_id, &connection)?;

    Ok(transaction_view(&transaction).into_response())
}

fn transaction_view(transaction: &TransactionTableRow) -> Markup {
    let nav_bar = NavBar::new(endpoints::TRANSACTION_VIEW).into_html();
    let edit_url = format_endpoint(endpoints::EDIT_TRANSACTION_VIEW, transaction.id);
    let delete_url = format_endpoint(endpoints::TRANSACTION, transaction.id);
    let confirm_message = format!(
        "Are you sure you want to delete '{}'?",
        transaction.description
    );
    let signed_amount = match transaction.kind {
        TransactionKind::Contribution => transaction.amount,
        _ => -transaction.amount,
    };

    let content = html! {
        (nav_bar)

        main class=(PAGE_CONTAINER_STYLE)
        {
            section class=(CARD_STYLE) style="max-width: 32rem"
            {
                header class="flex justify-between items-start gap-4 mb-4"
                {
                    div
                    {
                        h1 class="text-xl font-bold" { (transaction.description) }
                        p class="text-sm text-gray-500 dark:text-gray-400" { (transaction.date) }
                    }

                    span class="text-xl font-semibold" { (format_currency(signed_amount)) }
                }

                dl class="grid grid-cols-2 gap-2 text-sm"
                {
                    dt class="font-medium" { "Category" }
                    dd
                    {
                        span class=(CATEGORY_BADGE_STYLE) { (transaction.category_name) }
                    }

                    @if let Some(subcategory_name) = &transaction.subcategory_name {
                        dt class="font-medium" { "Subcategory" }
                        dd { (subcategory_name) }
                    }

                    dt class="font-medium" { "Type" }
                    dd { (transaction.kind) }

                    @if let Some(sinking_fund_name) = &transaction.sinking_fund_name {
                        dt class="font-medium" { "Sinking fund" }
                        dd { (sinking_fund_name) }
                    }

                    @if !transaction.notes.is_empty() {
                        dt class="font-medium" { "Notes" }
                        dd class="whitespace-pre-line" { (transaction.notes) }
                    }
                }

                div class="flex gap-4 mt-6"
                {
                    (edit_delete_action_links(
                        &edit_url,
                        &delete_url,
                        &confirm_message,
                        "closest section",
                        "none",
                    ))
                }
            }
        }
    };

    base("Transaction", &[], &content)
}

#[cfg(test)]
mod tests {
    use std::sync::{Arc, Mutex};

    use axum::{
        extract::{Path, State},
        http::StatusCode,
        response::IntoResponse,
    };
    use scraper::Selector;
    use time::macros::date;

    use crate::{
        category::{CategoryName, create_category},
        db::get_test_connection,
        sinking_fund::{create_sinking_fund, set_fund_category},
        test_utils::{assert_status_ok, assert_valid_html, parse_html_document},
        transaction::{Transaction, TransactionKind, create_transaction},
    };

    use super::{TransactionPageState, get_transaction_page};

    #[tokio::test]
    async fn shows_fund_and_links() {
        let connection = get_test_connection();
        create_category(CategoryName::new_unchecked("Car Expenses"), &connection).unwrap();
        let fund = create_sinking_fund("Vehicle", 100_000.0, 24_500.0, &connection).unwrap();
        set_fund_category(fund.id, 1, &connection).unwrap();
        create_transaction(
            Transaction::build(24_500.0, date!(2025 - 10 - 01), "Monthly allocation to Vehicle", 1)
                .sinking_fund_id(Some(fund.id))
                .kind(TransactionKind::Contribution),
            &connection,
        )
        .unwrap();
        let state = TransactionPageState {
            db_connection: Arc::new(Mutex::new(connection)),
        };

        let response = get_transaction_page(Path(1), State(state)).await.unwrap();

        assert_status_ok(&response);
        let document = parse_html_document(response).await;
        assert_valid_html(&document);
        let text = document.root_element().text().collect::<String>();
        assert!(text.contains("Vehicle"), "want fund name in page, got {text}");
        assert!(text.contains("Contribution"), "want type in page, got {text}");

        let edit_link = document
            .select(&Selector::parse("a[href='/transactions/1/edit']").unwrap())
            .next();
        assert!(edit_link.is_some(), "want edit link");
        let delete_button = document
            .select(&Selector::parse("button[hx-delete='/api/transactions/1']").unwrap())
            .next();
        assert!(delete_button.is_some(), "want delete button");
    }

    #[tokio::test]
    async fn missing_transaction_is_not_found() {
        let state = TransactionPageState {
            db_connection: Arc::new(Mutex::new(get_test_connection())),
        };

        let response = get_transaction_page(Path(1), State(state))
            .await
            .into_response();

        assert_eq!(response.status(), StatusCode::NOT_FOUND);
    }
}
