//! Sinking funds and the category each fund files its transactions under.

use rusqlite::{Connection, OptionalExtension, Row};
use serde::Serialize;

use crate::{Error, category::CategoryId, database_id::DatabaseId};

/// The ID of a sinking fund.
pub type SinkingFundId = DatabaseId;

/// A savings bucket with a target balance and a scheduled monthly contribution.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SinkingFund {
    pub id: SinkingFundId,
    pub name: String,
    /// The balance the fund is saving towards.
    pub target_amount: f64,
    /// The balance as of the last reconciliation or contribution.
    pub current_balance: f64,
    /// How much is contributed at the start of each month.
    pub monthly_allocation: f64,
    pub is_active: bool,
}

/// Create an active sinking fund with a zero balance.
///
/// # Errors
/// Returns:
/// - [Error::EmptySinkingFundName] if `name` is blank,
/// - [Error::InvalidAmount] if either amount is negative or not finite,
/// - [Error::DuplicateSinkingFundName] if a fund with the same name exists.
pub fn create_sinking_fund(
    name: &str,
    target_amount: f64,
    monthly_allocation: f64,
    connection: &Connection,
) -> Result<SinkingFund, Error> {
    let name = name.trim();

    if name.is_empty() {
        return Err(Error::EmptySinkingFundName);
    }

    validate_amount(target_amount)?;
    validate_amount(monthly_allocation)?;

    connection
        .prepare(
            "INSERT INTO sinking_fund (name, target_amount, current_balance, monthly_allocation)
            VALUES (?1, ?2, 0, ?3)
            RETURNING id, name, target_amount, current_balance, monthly_allocation, is_active",
        )?
        .query_row((name, target_amount, monthly_allocation), map_row)
        .map_err(|error| match error {
            rusqlite::Error::SqliteFailure(
                rusqlite::ffi::Error {
                    code: _,
                    extended_code: rusqlite::ffi::SQLITE_CONSTRAINT_UNIQUE,
                },
                _,
            ) => Error::DuplicateSinkingFundName(name.to_owned()),
            error => error.into(),
        })
}

/// Retrieve a sinking fund by ID.
///
/// # Errors
/// Returns [Error::NotFound] if the fund does not exist.
pub fn get_sinking_fund(
    sinking_fund_id: SinkingFundId,
    connection: &Connection,
) -> Result<SinkingFund, Error> {
    connection
        .prepare(
            "SELECT id, name, target_amount, current_balance, monthly_allocation, is_active
            FROM sinking_fund WHERE id = ?1",
        )?
        .query_row([sinking_fund_id], map_row)
        .map_err(|error| error.into())
}

/// Retrieve the active sinking funds ordered by name.
pub fn get_active_funds(connection: &Connection) -> Result<Vec<SinkingFund>, Error> {
    connection
        .prepare(
            "SELECT id, name, target_amount, current_balance, monthly_allocation, is_active
            FROM sinking_fund WHERE is_active = 1 ORDER BY name ASC",
        )?
        .query_map([], map_row)?
        .map(|maybe_fund| maybe_fund.map_err(|error| error.into()))
        .collect()
}

/// Change the target amount and/or the monthly allocation of a fund.
///
/// `None` leaves the current value as it is.
///
/// # Errors
/// Returns [Error::InvalidAmount] for negative amounts or
/// [Error::UpdateMissingSinkingFund] if the fund does not exist.
pub fn update_fund_settings(
    sinking_fund_id: SinkingFundId,
    target_amount: Option<f64>,
    monthly_allocation: Option<f64>,
    connection: &Connection,
) -> Result<(), Error> {
    if let Some(amount) = target_amount {
        validate_amount(amount)?;
    }

    if let Some(amount) = monthly_allocation {
        validate_amount(amount)?;
    }

    let rows_affected = connection.execute(
        "UPDATE sinking_fund
        SET target_amount = COALESCE(?1, target_amount),
            monthly_allocation = COALESCE(?2, monthly_allocation)
        WHERE id = ?3",
        (target_amount, monthly_allocation, sinking_fund_id),
    )?;

    if rows_affected == 0 {
        return Err(Error::UpdateMissingSinkingFund);
    }

    Ok(())
}

/// Set the category that the transactions of a fund are filed under.
///
/// # Errors
/// Returns [Error::InvalidCategory] if the category or the fund does not exist.
pub fn set_fund_category(
    sinking_fund_id: SinkingFundId,
    category_id: CategoryId,
    connection: &Connection,
) -> Result<(), Error> {
    connection
        .execute(
            "INSERT INTO sinking_fund_category (sinking_fund_id, category_id) VALUES (?1, ?2)
            ON CONFLICT(sinking_fund_id) DO UPDATE SET category_id = excluded.category_id",
            (sinking_fund_id, category_id),
        )
        .map_err(|error| match error {
            rusqlite::Error::SqliteFailure(
                rusqlite::ffi::Error {
                    code: _,
                    extended_code: rusqlite::ffi::SQLITE_CONSTRAINT_FOREIGNKEY,
                },
                _,
            ) => Error::InvalidCategory(Some(category_id)),
            error => error.into(),
        })?;

    Ok(())
}

/// Get the category that the transactions of a fund are filed under, if one is set.
pub fn get_fund_category(
    sinking_fund_id: SinkingFundId,
    connection: &Connection,
) -> Result<Option<CategoryId>, Error> {
    connection
        .query_row(
            "SELECT category_id FROM sinking_fund_category WHERE sinking_fund_id = ?1",
            [sinking_fund_id],
            |row| row.get(0),
        )
        .optional()
        .map_err(|error| error.into())
}

fn validate_amount(amount: f64) -> Result<(), Error> {
    if !amount.is_finite() || amount < 0.0 {
        return Err(Error::InvalidAmount(amount));
    }

    Ok(())
}

fn map_row(row: &Row) -> Result<SinkingFund, rusqlite::Error> {
    Ok(SinkingFund {
        id: row.get(0)?,
        name: row.get(1)?,
        target_amount: row.get(2)?,
        current_balance: row.get(3)?,
        monthly_allocation: row.get(4)?,
        is_active: row.get(5)?,
    })
}

/// Initialize the sinking fund table.
pub fn create_sinking_fund_table(connection: &Connection) -> Result<(), rusqlite::Error> {
    connection.execute_batch(
        "CREATE TABLE IF NOT EXISTS sinking_fund (
            id INTEGER PRIMARY KEY,
            name TEXT NOT NULL UNIQUE,
            target_amount REAL NOT NULL DEFAULT 0,
            current_balance REAL NOT NULL DEFAULT 0,
            monthly_allocation REAL NOT NULL DEFAULT 0,
            is_active INTEGER NOT NULL DEFAULT 1
        );",
    )?;

    Ok(())
}

/// Initialize the table mapping sinking funds to categories.
///
/// Must be created after the sinking fund and category tables.
pub fn create_sinking_fund_category_table(connection: &Connection) -> Result<(), rusqlite::Error> {
    connection.execute_batch(
        "CREATE TABLE IF NOT EXISTS sinking_fund_category (
            sinking_fund_id INTEGER PRIMARY KEY,
            category_id INTEGER NOT NULL,
            FOREIGN KEY(sinking_fund_id) REFERENCES sinking_fund(id) ON DELETE CASCADE,
            FOREIGN KEY(category_id) REFERENCES category(id)
        );",
    )?;

    Ok(())
}
