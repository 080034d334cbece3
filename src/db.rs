//! Opening the application database, creating its schema and retrying
//! operations that hit a locked database.

use std::{
    path::Path,
    sync::{Arc, Mutex},
    thread,
    time::Duration,
};

use rusqlite::{Connection, ErrorCode, Transaction as SqlTransaction, TransactionBehavior};
use tokio::task;

use crate::{
    Error,
    budget::{create_budget_allocation_table, create_budget_period_table},
    categorization::create_categorization_pattern_table,
    category::{create_category_table, create_subcategory_table},
    sinking_fund::{
        create_month_transition_table, create_sinking_fund_category_table,
        create_sinking_fund_table,
    },
    transaction::create_transaction_table,
};

/// How many times an operation is attempted while the database is locked.
pub const MAX_ATTEMPTS: u32 = 3;

/// The wait before the second attempt, grows linearly with each attempt.
const RETRY_BACKOFF: Duration = Duration::from_millis(200);

/// How long SQLite itself waits on a lock before reporting `SQLITE_BUSY`.
const BUSY_TIMEOUT: Duration = Duration::from_secs(1);

/// Open the database at `path` in write-ahead logging mode.
///
/// Call [initialize] before using the connection.
///
/// # Errors
/// Returns an error if the file cannot be opened or the pragmas cannot be set.
pub fn open_connection(path: impl AsRef<Path>) -> Result<Connection, Error> {
    let connection = Connection::open(path)?;
    connection.busy_timeout(BUSY_TIMEOUT)?;

    let journal_mode: String =
        connection.pragma_update_and_check(None, "journal_mode", "WAL", |row| row.get(0))?;
    tracing::debug!("database journal mode set to {journal_mode}");

    Ok(connection)
}

/// Turn on foreign key enforcement and create all of the application's tables
/// if they do not exist yet.
///
/// Safe to call on every start-up.
///
/// # Errors
/// Returns an error if a table cannot be created.
pub fn initialize(connection: &Connection) -> Result<(), Error> {
    // Has no effect inside a transaction.
    connection.pragma_update(None, "foreign_keys", true)?;

    let transaction = SqlTransaction::new_unchecked(connection, TransactionBehavior::Exclusive)?;

    create_category_table(&transaction)?;
    create_subcategory_table(&transaction)?;
    create_sinking_fund_table(&transaction)?;
    create_sinking_fund_category_table(&transaction)?;
    create_transaction_table(&transaction)?;
    create_budget_period_table(&transaction)?;
    create_budget_allocation_table(&transaction)?;
    create_month_transition_table(&transaction)?;
    create_categorization_pattern_table(&transaction)?;

    transaction.commit()?;

    Ok(())
}

/// Run `operation`, retrying it when another connection holds the database lock.
///
/// The operation is attempted up to [MAX_ATTEMPTS] times, sleeping 200 ms,
/// then 400 ms between attempts. Any other error is returned immediately.
///
/// # Errors
/// Returns [Error::DatabaseBusy] if the database is still locked after the
/// last attempt, otherwise the error from `operation`.
pub fn with_retry<T>(mut operation: impl FnMut() -> Result<T, Error>) -> Result<T, Error> {
    for attempt in 1..=MAX_ATTEMPTS {
        match operation() {
            Err(Error::SqlError(error)) if is_transient(&error) => {
                tracing::warn!("database is locked (attempt {attempt}/{MAX_ATTEMPTS}): {error}");

                if attempt < MAX_ATTEMPTS {
                    thread::sleep(RETRY_BACKOFF * attempt);
                }
            }
            result => return result,
        }
    }

    tracing::error!("database is still locked after {MAX_ATTEMPTS} attempts");
    Err(Error::DatabaseBusy(MAX_ATTEMPTS))
}

/// Lock the shared connection and run `operation` on tokio's blocking thread pool.
///
/// Use this from request handlers for work that may wait on SQLite's busy
/// timeout or on [with_retry]'s backoff, so that waiting never stalls the
/// async runtime.
///
/// # Errors
/// Returns [Error::DatabaseLockError] if the mutex is poisoned,
/// [Error::DatabaseTaskFailed] if the task panicked, otherwise the error from
/// `operation`.
pub async fn run_blocking<T, F>(
    db_connection: &Arc<Mutex<Connection>>,
    operation: F,
) -> Result<T, Error>
where
    T: Send + 'static,
    F: FnOnce(&Connection) -> Result<T, Error> + Send + 'static,
{
    let db_connection = db_connection.clone();

    task::spawn_blocking(move || {
        let connection = db_connection
            .lock()
            .inspect_err(|error| tracing::error!("could not acquire database lock: {error}"))
            .map_err(|_| Error::DatabaseLockError)?;

        operation(&connection)
    })
    .await
    .inspect_err(|error| tracing::error!("database task failed: {error}"))
    .map_err(|_| Error::DatabaseTaskFailed)?
}

fn is_transient(error: &rusqlite::Error) -> bool {
    matches!(
        error.sqlite_error_code(),
        Some(ErrorCode::DatabaseBusy | ErrorCode::DatabaseLocked)
    )
}

#[cfg(test)]
pub(crate) fn get_test_connection() -> Connection {
    let connection = Connection::open_in_memory().expect("Could not open in-memory database");
    initialize(&connection).expect("Could not initialize database");
    connection
}

#[cfg(test)]
mod tests {
    use std::{
        cell::Cell,
        sync::{Arc, Mutex, mpsc},
        time::Duration,
    };

    use rusqlite::ffi;

    use crate::Error;

    use super::{MAX_ATTEMPTS, get_test_connection, initialize, run_blocking, with_retry};

    fn busy_error() -> Error {
        Error::SqlError(rusqlite::Error::SqliteFailure(
            ffi::Error::new(ffi::SQLITE_BUSY),
            None,
        ))
    }

    #[test]
    fn initialize_is_idempotent() {
        let connection = super::get_test_connection();

        let result = initialize(&connection);

        assert_eq!(result, Ok(()));
    }

    #[test]
    fn retries_until_the_lock_is_released() {
        let attempts = Cell::new(0);

        let result = with_retry(|| {
            attempts.set(attempts.get() + 1);

            if attempts.get() < 2 {
                Err(busy_error())
            } else {
                Ok(42)
            }
        });

        assert_eq!(result, Ok(42));
        assert_eq!(attempts.get(), 2);
    }

    #[test]
    fn gives_up_after_max_attempts() {
        let attempts = Cell::new(0);

        let result: Result<(), Error> = with_retry(|| {
            attempts.set(attempts.get() + 1);
            Err(busy_error())
        });

        assert_eq!(result, Err(Error::DatabaseBusy(MAX_ATTEMPTS)));
        assert_eq!(attempts.get(), MAX_ATTEMPTS);
    }

    #[tokio::test]
    async fn blocking_work_leaves_the_runtime_free() {
        let db_connection = Arc::new(Mutex::new(get_test_connection()));
        let (sender, receiver) = mpsc::channel();

        // Waits for a message that is only sent once the runtime gets to run
        // the test body again.
        let task = tokio::spawn(async move {
            run_blocking(&db_connection, move |_| {
                receiver
                    .recv_timeout(Duration::from_secs(2))
                    .map_err(|_| Error::DatabaseBusy(1))
            })
            .await
        });
        tokio::time::sleep(Duration::from_millis(50)).await;
        sender.send(7).unwrap();

        assert_eq!(task.await.unwrap(), Ok(7));
    }

    #[tokio::test]
    async fn run_blocking_passes_errors_through() {
        let db_connection = Arc::new(Mutex::new(get_test_connection()));

        let result: Result<(), Error> =
            run_blocking(&db_connection, |_| Err(Error::NotFound)).await;

        assert_eq!(result, Err(Error::NotFound));
    }

    #[test]
    fn other_errors_are_not_retried() {
        let attempts = Cell::new(0);

        let result: Result<(), Error> = with_retry(|| {
            attempts.set(attempts.get() + 1);
            Err(Error::NotFound)
        });

        assert_eq!(result, Err(Error::NotFound));
        assert_eq!(attempts.get(), 1);
    }
}
