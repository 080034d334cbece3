//! The page listing transactions, with search, category and date filters.

use std::sync::{Arc, Mutex};

use axum::{
    extract::{FromRef, State},
    response::{IntoResponse, Response},
};
// The filter form submits empty strings for unused fields, which axum_extra's
// Query parses as None.
use axum_extra::extract::Query;
use maud::{Markup, html};
use rusqlite::Connection;

use crate::{
    AppState, Error,
    category::{Category, get_all_categories},
    endpoints::{self, format_endpoint},
    html::{
        BUTTON_PRIMARY_STYLE, CATEGORY_BADGE_STYLE, FORM_LABEL_STYLE, FORM_TEXT_INPUT_STYLE,
        LINK_STYLE, PAGE_CONTAINER_STYLE, TABLE_CELL_STYLE, TABLE_HEADER_STYLE, TABLE_ROW_STYLE,
        base, format_currency,
    },
    navigation::NavBar,
    transaction::{
        TransactionKind,
        query::{TransactionFilter, TransactionTableRow, get_transactions},
    },
};

/// The state needed for the transactions page.
#[derive(Debug, Clone)]
pub struct TransactionsViewState {
    /// The database connection for accessing transactions.
    pub db_connection: Arc<Mutex<Connection>>,
}

impl FromRef<AppState> for TransactionsViewState {
    fn from_ref(state: &AppState) -> Self {
        Self {
            db_connection: state.db_connection.clone(),
        }
    }
}

/// Render the transactions matching the query filters, newest first.
pub async fn get_transactions_page(
    State(state): State<TransactionsViewState>,
    Query(filter): Query<TransactionFilter>,
) -> Result<Response, Error> {
    let connection = state
        .db_connection
        .lock()
        .inspect_err(|error| tracing::error!("could not acquire database lock: {error}"))
        .map_err(|_| Error::DatabaseLockError)?;

    let transactions = get_transactions(&filter, &connection)
        .inspect_err(|error| tracing::error!("could not get transactions: {error}"))?;
    let categories = get_all_categories(&connection)?;

    Ok(transactions_view(&transactions, &categories, &filter).into_response())
}

fn transactions_view(
    transactions: &[TransactionTableRow],
    categories: &[Category],
    filter: &TransactionFilter,
) -> Markup {
    let nav_bar = NavBar::new(endpoints::TRANSACTIONS_VIEW).into_html();
    let total: f64 = transactions
        .iter()
        .filter(|transaction| transaction.kind == TransactionKind::Expense)
        .map(|transaction| transaction.amount)
        .sum();

    let content = html! {
        (nav_bar)

        main class=(PAGE_CONTAINER_STYLE)
        {
            section class="space-y-4 w-full lg:max-w-5xl"
            {
                header class="flex justify-between flex-wrap items-end"
                {
                    h1 class="text-xl font-bold" { "Transactions" }

                    a href=(endpoints::NEW_TRANSACTION_VIEW) class=(LINK_STYLE)
                    {
                        "Create Transaction"
                    }
                }

                (filter_form(categories, filter))

                p class="text-sm text-gray-600 dark:text-gray-400"
                {
                    (transactions.len()) " transactions, "
                    (format_currency(total)) " spent"
                }

                div class="overflow-x-auto dark:bg-gray-800"
                {
                    table class="w-full text-sm text-left rtl:text-right
                        text-gray-500 dark:text-gray-400"
                    {
                        thead class=(TABLE_HEADER_STYLE)
                        {
                            tr
                            {
                                th scope="col" class=(TABLE_CELL_STYLE) { "Date" }
                                th scope="col" class=(TABLE_CELL_STYLE) { "Description" }
                                th scope="col" class=(TABLE_CELL_STYLE) { "Category" }
                                th scope="col" class=(TABLE_CELL_STYLE) { "Type" }
                                th scope="col" class="px-6 py-4 text-right" { "Amount" }
                            }
                        }

                        tbody
                        {
                            @for transaction in transactions {
                                (table_row(transaction))
                            }

                            @if transactions.is_empty() {
                                tr class=(TABLE_ROW_STYLE)
                                {
                                    td colspan="5" class="px-6 py-4 text-center"
                                    {
                                        "No transactions found."
                                    }
                                }
                            }
                        }
                    }
                }
            }
        }
    };

    base("Transactions", &[], &content)
}

fn filter_form(categories: &[Category], filter: &TransactionFilter) -> Markup {
    html! {
        form
            method="get"
            action=(endpoints::TRANSACTIONS_VIEW)
            class="grid grid-cols-1 md:grid-cols-5 gap-4 items-end"
        {
            div
            {
                label for="search" class=(FORM_LABEL_STYLE) { "Search" }
                input
                    id="search"
                    name="search"
                    type="search"
                    placeholder="Description or notes"
                    value=[filter.search.as_deref()]
                    class=(FORM_TEXT_INPUT_STYLE);
            }

            div
            {
                label for="category" class=(FORM_LABEL_STYLE) { "Category" }
                select id="category" name="category" class=(FORM_TEXT_INPUT_STYLE)
                {
                    option value="" { "All categories" }

                    @for category in categories {
                        option
                            value=(category.id)
                            selected[filter.category_id == Some(category.id)]
                        {
                            (category.name)
                        }
                    }
                }
            }

            div
            {
                label for="date_from" class=(FORM_LABEL_STYLE) { "From" }
                input
                    id="date_from"
                    name="date_from"
                    type="date"
                    value=[filter.date_from]
                    class=(FORM_TEXT_INPUT_STYLE);
            }

            div
            {
                label for="date_to" class=(FORM_LABEL_STYLE) { "To" }
                input
                    id="date_to"
                    name="date_to"
                    type="date"
                    value=[filter.date_to]
                    class=(FORM_TEXT_INPUT_STYLE);
            }

            button type="submit" class=(BUTTON_PRIMARY_STYLE) { "Filter" }
        }
    }
}

fn table_row(transaction: &TransactionTableRow) -> Markup {
    let view_url = format_endpoint(endpoints::TRANSACTION_VIEW, transaction.id);
    let amount = match transaction.kind {
        TransactionKind::Contribution => transaction.amount,
        _ => -transaction.amount,
    };

    html! {
        tr class=(TABLE_ROW_STYLE)
        {
            td class=(TABLE_CELL_STYLE) { (transaction.date) }

            td class=(TABLE_CELL_STYLE)
            {
                a href=(view_url) class=(LINK_STYLE) { (transaction.description) }

                @if let Some(fund) = &transaction.sinking_fund_name {
                    p class="text-xs text-gray-500" { "Sinking fund: " (fund) }
                }
            }

            td class=(TABLE_CELL_STYLE)
            {
                span class=(CATEGORY_BADGE_STYLE) { (transaction.category_name) }

                @if let Some(subcategory) = &transaction.subcategory_name {
                    " " span class="text-xs" { (subcategory) }
                }
            }

            td class=(TABLE_CELL_STYLE) { (transaction.kind) }

            td class="px-6 py-4 text-right" { (format_currency(amount)) }
        }
    }
}

#[cfg(test)]
mod tests {
    use std::sync::{Arc, Mutex};

    use axum::extract::State;
    use axum_extra::extract::Query;
    use scraper::{Html, Selector};
    use time::macros::date;

    use crate::{
        category::{CategoryName, create_category},
        db::get_test_connection,
        test_utils::{assert_status_ok, assert_valid_html, parse_html_document},
        transaction::{Transaction, create_transaction, query::TransactionFilter},
    };

    use super::{TransactionsViewState, get_transactions_page};

    fn get_state() -> TransactionsViewState {
        let connection = get_test_connection();
        create_category(CategoryName::new_unchecked("Groceries"), &connection).unwrap();
        create_category(CategoryName::new_unchecked("Car Expenses"), &connection).unwrap();
        for (description, date, category_id) in [
            ("Countdown", date!(2025 - 10 - 01), 1),
            ("Shell", date!(2025 - 10 - 03), 2),
            ("Pak'nSave", date!(2025 - 10 - 07), 1),
        ] {
            create_transaction(
                Transaction::build(10.0, date, description, category_id),
                &connection,
            )
            .unwrap();
        }

        TransactionsViewState {
            db_connection: Arc::new(Mutex::new(connection)),
        }
    }

    fn row_descriptions(document: &Html) -> Vec<String> {
        document
            .select(&Selector::parse("tbody tr td:nth-child(2) a").unwrap())
            .map(|link| link.text().collect())
            .collect()
    }

    #[tokio::test]
    async fn lists_newest_first() {
        let response = get_transactions_page(State(get_state()), Query(TransactionFilter::default()))
            .await
            .unwrap();

        assert_status_ok(&response);
        let document = parse_html_document(response).await;
        assert_valid_html(&document);
        assert_eq!(
            row_descriptions(&document),
            vec!["Pak'nSave", "Shell", "Countdown"]
        );
    }

    #[tokio::test]
    async fn filters_by_category_and_marks_it_selected() {
        let filter = TransactionFilter {
            category_id: Some(1),
            ..Default::default()
        };

        let response = get_transactions_page(State(get_state()), Query(filter))
            .await
            .unwrap();

        let document = parse_html_document(response).await;
        assert_eq!(row_descriptions(&document), vec!["Pak'nSave", "Countdown"]);
        let selected = document
            .select(&Selector::parse("select[name=category] option[selected]").unwrap())
            .next()
            .unwrap();
        assert_eq!(selected.value().attr("value"), Some("1"));
    }

    #[tokio::test]
    async fn filters_by_search_and_dates() {
        let filter = TransactionFilter {
            search: Some("  ".to_owned()),
            date_from: Some(date!(2025 - 10 - 02)),
            date_to: Some(date!(2025 - 10 - 06)),
            ..Default::default()
        };

        let response = get_transactions_page(State(get_state()), Query(filter))
            .await
            .unwrap();

        let document = parse_html_document(response).await;
        assert_eq!(row_descriptions(&document), vec!["Shell"]);
    }
}
