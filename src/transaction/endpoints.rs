//! Defines the endpoints for creating, updating and deleting transactions.

use std::sync::{Arc, Mutex};

use axum::{
    extract::{FromRef, Path, State},
    http::StatusCode,
    response::{IntoResponse, Response},
};
// Must use axum_extra's Form since that parses an empty string as None instead
// of crashing like axum::Form.
use axum_extra::extract::Form;
use axum_htmx::HxRedirect;
use rusqlite::Connection;

use crate::{
    AppState, Error,
    categorization::learn_pattern,
    category::CategoryId,
    endpoints::{self, format_endpoint},
    timezone::local_today,
    transaction::{
        Transaction, TransactionBuilder, TransactionId,
        core::{create_transaction, delete_transaction, update_transaction},
        form::TransactionForm,
    },
};

/// The state needed to create, update or delete a transaction.
#[derive(Debug, Clone)]
pub struct TransactionApiState {
    /// The database connection for managing transactions.
    pub db_connection: Arc<Mutex<Connection>>,
    /// The local timezone as a canonical timezone name, e.g. "Pacific/Auckland".
    pub local_timezone: String,
}

impl FromRef<AppState> for TransactionApiState {
    fn from_ref(state: &AppState) -> Self {
        Self {
            db_connection: state.db_connection.clone(),
            local_timezone: state.local_timezone.clone(),
        }
    }
}

impl From<TransactionForm> for TransactionBuilder {
    fn from(form: TransactionForm) -> Self {
        Transaction::build(form.amount, form.date, &form.description, form.category_id)
            .subcategory_id(form.subcategory_id)
            .notes(form.notes.as_deref().unwrap_or_default())
    }
}

/// A route handler for creating a new transaction, redirects to transactions view on success.
///
/// The chosen category is learned for the description.
pub async fn create_transaction_endpoint(
    State(state): State<TransactionApiState>,
    Form(form): Form<TransactionForm>,
) -> Response {
    let connection = match state.db_connection.lock() {
        Ok(connection) => connection,
        Err(error) => {
            tracing::error!("could not acquire database lock: {error}");
            return Error::DatabaseLockError.into_alert_response();
        }
    };

    let transaction = match create_transaction(form.into(), &connection) {
        Ok(transaction) => transaction,
        Err(error) => {
            tracing::error!("could not create transaction: {error}");
            return error.into_alert_response();
        }
    };

    learn_category(
        &transaction.description,
        transaction.category_id,
        &state.local_timezone,
        &connection,
    );

    (
        HxRedirect(endpoints::TRANSACTIONS_VIEW.to_owned()),
        StatusCode::SEE_OTHER,
    )
        .into_response()
}

/// A route handler for editing a transaction, redirects to the transaction's page on success.
pub async fn update_transaction_endpoint(
    Path(transaction_id): Path<TransactionId>,
    State(state): State<TransactionApiState>,
    Form(form): Form<TransactionForm>,
) -> Response {
    let connection = match state.db_connection.lock() {
        Ok(connection) => connection,
        Err(error) => {
            tracing::error!("could not acquire database lock: {error}");
            return Error::DatabaseLockError.into_alert_response();
        }
    };

    let builder: TransactionBuilder = form.into();
    let description = builder.description.clone();
    let category_id = builder.category_id;

    if let Err(error) = update_transaction(transaction_id, builder, &connection) {
        tracing::error!("could not update transaction {transaction_id}: {error}");
        return error.into_alert_response();
    }

    learn_category(&description, category_id, &state.local_timezone, &connection);

    (
        HxRedirect(format_endpoint(endpoints::TRANSACTION_VIEW, transaction_id)),
        StatusCode::SEE_OTHER,
    )
        .into_response()
}

/// A route handler for deleting a transaction, redirects to the transactions view.
pub async fn delete_transaction_endpoint(
    Path(transaction_id): Path<TransactionId>,
    State(state): State<TransactionApiState>,
) -> Response {
    let connection = match state.db_connection.lock() {
        Ok(connection) => connection,
        Err(error) => {
            tracing::error!("could not acquire database lock: {error}");
            return Error::DatabaseLockError.into_alert_response();
        }
    };

    if let Err(error) = delete_transaction(transaction_id, &connection) {
        tracing::error!("could not delete transaction {transaction_id}: {error}");
        return error.into_alert_response();
    }

    tracing::info!("deleted transaction {transaction_id}");

    (
        HxRedirect(endpoints::TRANSACTIONS_VIEW.to_owned()),
        StatusCode::SEE_OTHER,
    )
        .into_response()
}

/// Learn `category_id` for `description`. The transaction is already saved,
/// so failures are only logged.
fn learn_category(
    description: &str,
    category_id: CategoryId,
    local_timezone: &str,
    connection: &Connection,
) {
    let result = local_today(local_timezone)
        .and_then(|today| learn_pattern(description, category_id, today, connection));

    if let Err(error) = result {
        tracing::warn!("could not learn category {category_id} for \"{description}\": {error}");
    }
}

#[cfg(test)]
mod tests {
    use std::sync::{Arc, Mutex};

    use axum::{
        extract::{Path, State},
        http::StatusCode,
    };
    use axum_extra::extract::Form;
    use time::macros::date;

    use crate::{
        categorization::suggest_categories,
        category::{CategoryName, create_category, create_subcategory},
        db::get_test_connection,
        endpoints,
        test_utils::assert_hx_redirect,
        transaction::{
            Transaction, count_transactions, create_transaction, form::TransactionForm,
            get_transaction,
        },
    };

    use super::{
        TransactionApiState, create_transaction_endpoint, delete_transaction_endpoint,
        update_transaction_endpoint,
    };

    fn get_state() -> TransactionApiState {
        let connection = get_test_connection();
        create_category(CategoryName::new_unchecked("Car Expenses"), &connection).unwrap();
        create_category(CategoryName::new_unchecked("Groceries"), &connection).unwrap();

        TransactionApiState {
            db_connection: Arc::new(Mutex::new(connection)),
            local_timezone: "Etc/UTC".to_owned(),
        }
    }

    fn form(description: &str, category_id: i64) -> TransactionForm {
        TransactionForm {
            date: date!(2025 - 10 - 05),
            description: description.to_owned(),
            amount: 80.0,
            category_id,
            subcategory_id: None,
            notes: None,
        }
    }

    #[tokio::test]
    async fn can_create_transaction() {
        let state = get_state();

        let response =
            create_transaction_endpoint(State(state.clone()), Form(form("Shell gas station", 1)))
                .await;

        assert_hx_redirect(&response, endpoints::TRANSACTIONS_VIEW);
        let connection = state.db_connection.lock().unwrap();
        let transaction = get_transaction(1, &connection).unwrap();
        assert_eq!(transaction.amount, 80.0);
        assert_eq!(transaction.description, "Shell gas station");
        assert_eq!(transaction.notes, "");
    }

    #[tokio::test]
    async fn saving_twice_teaches_suggestions() {
        let state = get_state();

        for _ in 0..2 {
            create_transaction_endpoint(State(state.clone()), Form(form("Shell gas station", 1)))
                .await;
        }

        let connection = state.db_connection.lock().unwrap();
        let suggestions = suggest_categories("shell gas", &connection).unwrap();
        assert_eq!(suggestions.len(), 1);
        assert_eq!(suggestions[0].id, 1);
        assert_eq!(suggestions[0].name, "Car Expenses");
    }

    #[tokio::test]
    async fn create_with_invalid_category_is_bad_request() {
        let state = get_state();

        let response =
            create_transaction_endpoint(State(state.clone()), Form(form("Shell", 42))).await;

        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        assert_eq!(count_transactions(&state.db_connection.lock().unwrap()), Ok(0));
    }

    #[tokio::test]
    async fn update_learns_new_category() {
        let state = get_state();
        let subcategory_id = {
            let connection = state.db_connection.lock().unwrap();
            create_transaction(
                Transaction::build(10.0, date!(2025 - 10 - 01), "Countdown", 1),
                &connection,
            )
            .unwrap();
            create_subcategory(2, "Weekly shop", &connection).unwrap().id
        };
        let mut update = form("Countdown", 2);
        update.subcategory_id = Some(subcategory_id);

        let response =
            update_transaction_endpoint(Path(1), State(state.clone()), Form(update)).await;

        assert_hx_redirect(&response, "/transactions/1");
        let connection = state.db_connection.lock().unwrap();
        let transaction = get_transaction(1, &connection).unwrap();
        assert_eq!(transaction.category_id, 2);
        assert_eq!(transaction.subcategory_id, Some(subcategory_id));
        let suggestions = suggest_categories("countdown", &connection).unwrap();
        assert_eq!(suggestions[0].id, 2);
    }

    #[tokio::test]
    async fn update_missing_transaction_is_not_found() {
        let response =
            update_transaction_endpoint(Path(9), State(get_state()), Form(form("x", 1))).await;

        assert_eq!(response.status(), StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn can_delete_transaction() {
        let state = get_state();
        create_transaction(
            Transaction::build(10.0, date!(2025 - 10 - 01), "Countdown", 2),
            &state.db_connection.lock().unwrap(),
        )
        .unwrap();

        let response = delete_transaction_endpoint(Path(1), State(state.clone())).await;

        assert_hx_redirect(&response, endpoints::TRANSACTIONS_VIEW);
        assert_eq!(count_transactions(&state.db_connection.lock().unwrap()), Ok(0));

        let response = delete_transaction_endpoint(Path(1), State(state)).await;
        assert_eq!(response.status(), StatusCode::NOT_FOUND);
    }
}
