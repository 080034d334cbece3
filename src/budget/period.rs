//! Budget periods: one per calendar month, created the first time the month is seen.

use rusqlite::{Connection, OptionalExtension};
use time::{Date, OffsetDateTime};

use crate::{Error, database_id::DatabaseId, db::with_retry, month::MonthYear};

/// The ID of a budget period.
pub type BudgetPeriodId = DatabaseId;

/// Get the ID of the budget period for `month`, creating the period if needed.
///
/// When the period is new, the allocations of the month before it are copied
/// into it and the move from the previous month is recorded as a month
/// transition. Copying runs in a savepoint: if it fails, the copy is rolled
/// back and a warning is logged, but the new period is still returned.
///
/// Calling this function again for the same month returns the same ID and
/// does not copy anything.
///
/// # Errors
/// Returns an [Error::SqlError] if the period cannot be created or read.
pub fn ensure_budget_period(
    month: MonthYear,
    today: Date,
    connection: &Connection,
) -> Result<BudgetPeriodId, Error> {
    let rows_inserted = connection.execute(
        "INSERT INTO budget_period (month, year, created_at) VALUES (?1, ?2, ?3)
        ON CONFLICT(month, year) DO NOTHING",
        (month.month_number(), month.year(), OffsetDateTime::now_utc()),
    )?;

    let period_id = get_budget_period_id(month, connection)?;

    if rows_inserted == 1 {
        tracing::info!("created budget period for {month}");

        if let Err(error) = carry_over_previous_month(month, period_id, today, connection) {
            tracing::warn!(
                "could not copy budget allocations from {} into {month}: {error}",
                month.previous()
            );
        }
    }

    Ok(period_id)
}

/// Ensure the budget period for the month containing `today` exists.
///
/// Retried while another connection holds the database lock.
///
/// # Errors
/// Returns [Error::DatabaseBusy] if the database stays locked, or any other
/// error from [ensure_budget_period].
pub fn ensure_current_period(today: Date, connection: &Connection) -> Result<BudgetPeriodId, Error> {
    with_retry(|| ensure_budget_period(MonthYear::from_date(today), today, connection))
}

/// Get the ID of the budget period for `month`.
///
/// # Errors
/// Returns [Error::NotFound] if there is no period for `month`.
pub fn get_budget_period_id(
    month: MonthYear,
    connection: &Connection,
) -> Result<BudgetPeriodId, Error> {
    connection
        .query_row(
            "SELECT id FROM budget_period WHERE month = ?1 AND year = ?2",
            (month.month_number(), month.year()),
            |row| row.get(0),
        )
        .map_err(|error| error.into())
}

fn carry_over_previous_month(
    month: MonthYear,
    period_id: BudgetPeriodId,
    today: Date,
    connection: &Connection,
) -> Result<(), Error> {
    connection.execute_batch("SAVEPOINT carry_over")?;

    match copy_previous_allocations(month, period_id, today, connection) {
        Ok(()) => {
            connection.execute_batch("RELEASE carry_over")?;
            Ok(())
        }
        Err(error) => {
            if let Err(rollback_error) =
                connection.execute_batch("ROLLBACK TO carry_over; RELEASE carry_over")
            {
                tracing::error!("could not roll back allocation copy: {rollback_error}");
            }

            Err(error)
        }
    }
}

fn copy_previous_allocations(
    month: MonthYear,
    period_id: BudgetPeriodId,
    today: Date,
    connection: &Connection,
) -> Result<(), Error> {
    let previous_month = month.previous();

    let previous_period_id: Option<BudgetPeriodId> = connection
        .query_row(
            "SELECT id FROM budget_period WHERE month = ?1 AND year = ?2",
            (previous_month.month_number(), previous_month.year()),
            |row| row.get(0),
        )
        .optional()?;

    let Some(previous_period_id) = previous_period_id else {
        tracing::debug!("no budget period for {previous_month}, starting {month} empty");
        return Ok(());
    };

    let rows_copied = connection.execute(
        "INSERT OR IGNORE INTO budget_allocation
            (budget_period_id, category_id, subcategory_id, budgeted_amount)
        SELECT ?1, category_id, subcategory_id, budgeted_amount
        FROM budget_allocation
        WHERE budget_period_id = ?2",
        (period_id, previous_period_id),
    )?;

    connection.execute(
        "INSERT OR IGNORE INTO month_transition
            (from_month, from_year, to_month, to_year, transition_date)
        VALUES (?1, ?2, ?3, ?4, ?5)",
        (
            previous_month.month_number(),
            previous_month.year(),
            month.month_number(),
            month.year(),
            today,
        ),
    )?;

    tracing::info!("copied {rows_copied} budget allocations from {previous_month} into {month}");

    Ok(())
}

/// Initialize the budget period table.
pub fn create_budget_period_table(connection: &Connection) -> Result<(), rusqlite::Error> {
    connection.execute_batch(
        "CREATE TABLE IF NOT EXISTS budget_period (
            id INTEGER PRIMARY KEY,
            month INTEGER NOT NULL CHECK (month BETWEEN 1 AND 12),
            year INTEGER NOT NULL,
            created_at TEXT NOT NULL,
            UNIQUE(month, year)
        );",
    )?;

    Ok(())
}
