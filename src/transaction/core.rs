//! Defines the core data models and database queries for transactions.

use std::{fmt::Display, str::FromStr};

use rusqlite::{
    Connection, Row, ToSql,
    types::{FromSql, FromSqlError, FromSqlResult, ToSqlOutput, ValueRef},
};
use serde::{Deserialize, Serialize};
use time::{Date, OffsetDateTime};

use crate::{
    Error,
    category::{CategoryId, SubcategoryId},
    database_id::DatabaseId,
    sinking_fund::SinkingFundId,
};

// ============================================================================
// MODELS
// ============================================================================

/// The ID of a transaction.
pub type TransactionId = DatabaseId;

/// What a transaction does with the money.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TransactionKind {
    /// Money spent against a category budget.
    #[default]
    Expense,
    /// Money put into a sinking fund.
    Contribution,
    /// Money taken out of a sinking fund.
    Withdrawal,
}

impl TransactionKind {
    /// The name used in the database and in forms.
    pub fn as_str(&self) -> &'static str {
        match self {
            TransactionKind::Expense => "expense",
            TransactionKind::Contribution => "contribution",
            TransactionKind::Withdrawal => "withdrawal",
        }
    }
}

impl Display for TransactionKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let label = match self {
            TransactionKind::Expense => "Expense",
            TransactionKind::Contribution => "Contribution",
            TransactionKind::Withdrawal => "Withdrawal",
        };

        write!(f, "{label}")
    }
}

impl FromStr for TransactionKind {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "expense" => Ok(TransactionKind::Expense),
            "contribution" => Ok(TransactionKind::Contribution),
            "withdrawal" => Ok(TransactionKind::Withdrawal),
            _ => Err(Error::InvalidFormValue("transaction type".to_owned())),
        }
    }
}

impl ToSql for TransactionKind {
    fn to_sql(&self) -> rusqlite::Result<ToSqlOutput<'_>> {
        Ok(self.as_str().into())
    }
}

impl FromSql for TransactionKind {
    fn column_result(value: ValueRef<'_>) -> FromSqlResult<Self> {
        value
            .as_str()?
            .parse()
            .map_err(|_| FromSqlError::InvalidType)
    }
}

/// Money spent on something, or moved into or out of a sinking fund.
///
/// To create a new `Transaction`, use [Transaction::build].
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Transaction {
    /// The ID of the transaction.
    pub id: TransactionId,
    /// When the transaction happened.
    pub date: Date,
    /// A text description of what the transaction was for.
    pub description: String,
    /// The amount of money, always positive.
    pub amount: f64,
    /// The category the transaction is filed under.
    pub category_id: CategoryId,
    /// The subcategory the transaction is filed under, if any.
    pub subcategory_id: Option<SubcategoryId>,
    /// The sinking fund the money went into or came out of.
    ///
    /// Transactions with a sinking fund are not counted as budget spending.
    pub sinking_fund_id: Option<SinkingFundId>,
    pub kind: TransactionKind,
    /// Free-form notes, empty if none were given.
    pub notes: String,
    pub created_at: OffsetDateTime,
    pub updated_at: OffsetDateTime,
}

impl Transaction {
    /// Create a new expense.
    ///
    /// Shortcut for [TransactionBuilder] for discoverability.
    pub fn build(
        amount: f64,
        date: Date,
        description: &str,
        category_id: CategoryId,
    ) -> TransactionBuilder {
        TransactionBuilder {
            amount,
            date,
            description: description.to_owned(),
            category_id,
            subcategory_id: None,
            sinking_fund_id: None,
            kind: TransactionKind::Expense,
            notes: String::new(),
        }
    }
}

/// A builder for creating [Transaction] instances.
///
/// ```ignore
/// use time::macros::date;
///
/// use crate::transaction::{Transaction, TransactionKind};
///
/// let contribution = Transaction::build(1947.0, date!(2025 - 10 - 01), "Monthly allocation", 5)
///     .sinking_fund_id(Some(3))
///     .kind(TransactionKind::Contribution);
/// ```
#[derive(Debug, PartialEq, Clone)]
pub struct TransactionBuilder {
    pub amount: f64,
    pub date: Date,
    pub description: String,
    pub category_id: CategoryId,
    pub subcategory_id: Option<SubcategoryId>,
    pub sinking_fund_id: Option<SinkingFundId>,
    pub kind: TransactionKind,
    pub notes: String,
}

impl TransactionBuilder {
    /// Set the subcategory, which must belong to the transaction's category.
    pub fn subcategory_id(mut self, subcategory_id: Option<SubcategoryId>) -> Self {
        self.subcategory_id = subcategory_id;
        self
    }

    /// Link the transaction to a sinking fund.
    pub fn sinking_fund_id(mut self, sinking_fund_id: Option<SinkingFundId>) -> Self {
        self.sinking_fund_id = sinking_fund_id;
        self
    }

    pub fn kind(mut self, kind: TransactionKind) -> Self {
        self.kind = kind;
        self
    }

    pub fn notes(mut self, notes: &str) -> Self {
        self.notes = notes.to_owned();
        self
    }
}

// ============================================================================
// DATABASE FUNCTIONS
// ============================================================================

const SELECT_COLUMNS: &str = "id, date, description, amount, category_id, subcategory_id, \
    sinking_fund_id, kind, notes, created_at, updated_at";

/// Create a new transaction in the database from a builder.
///
/// # Errors
/// This function will return a:
/// - [Error::InvalidAmount] if the amount is not a positive number,
/// - [Error::InvalidTransactionKind] if a sinking fund transaction is an expense,
///   or a contribution or withdrawal has no sinking fund,
/// - [Error::InvalidSubcategory] if the subcategory does not belong to the category,
/// - [Error::InvalidCategory] if the category ID does not refer to a real category,
/// - or [Error::SqlError] if there is some other SQL error.
pub fn create_transaction(
    builder: TransactionBuilder,
    connection: &Connection,
) -> Result<Transaction, Error> {
    validate(&builder, connection)?;

    let now = OffsetDateTime::now_utc();

    connection
        .prepare(&format!(
            "INSERT INTO \"transaction\"
                (date, description, amount, category_id, subcategory_id, sinking_fund_id, kind,
                notes, created_at, updated_at)
            VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?9)
            RETURNING {SELECT_COLUMNS}"
        ))?
        .query_row(
            (
                builder.date,
                builder.description.trim(),
                builder.amount,
                builder.category_id,
                builder.subcategory_id,
                builder.sinking_fund_id,
                builder.kind,
                builder.notes.trim(),
                now,
            ),
            map_transaction_row,
        )
        .map_err(|error| map_foreign_key_error(error, builder.category_id))
}

/// Retrieve a transaction from the database by its `id`.
///
/// # Errors
/// This function will return a:
/// - [Error::NotFound] if `id` does not refer to a valid transaction,
/// - or [Error::SqlError] there is some other SQL error.
pub fn get_transaction(id: TransactionId, connection: &Connection) -> Result<Transaction, Error> {
    let transaction = connection
        .prepare(&format!(
            "SELECT {SELECT_COLUMNS} FROM \"transaction\" WHERE id = :id"
        ))?
        .query_row(&[(":id", &id)], map_transaction_row)?;

    Ok(transaction)
}

/// Replace the date, description, amount, category, subcategory and notes of a transaction.
///
/// The sinking fund link and kind of a transaction never change.
///
/// # Errors
/// This function will return a:
/// - [Error::UpdateMissingTransaction] if the transaction does not exist,
/// - or the validation errors of [create_transaction].
pub fn update_transaction(
    id: TransactionId,
    builder: TransactionBuilder,
    connection: &Connection,
) -> Result<(), Error> {
    validate(&builder, connection)?;

    let rows_affected = connection
        .execute(
            "UPDATE \"transaction\"
            SET date = ?1, description = ?2, amount = ?3, category_id = ?4,
                subcategory_id = ?5, notes = ?6, updated_at = ?7
            WHERE id = ?8",
            (
                builder.date,
                builder.description.trim(),
                builder.amount,
                builder.category_id,
                builder.subcategory_id,
                builder.notes.trim(),
                OffsetDateTime::now_utc(),
                id,
            ),
        )
        .map_err(|error| map_foreign_key_error(error, builder.category_id))?;

    if rows_affected == 0 {
        return Err(Error::UpdateMissingTransaction);
    }

    Ok(())
}

/// Delete a transaction.
///
/// # Errors
/// Returns [Error::DeleteMissingTransaction] if the transaction does not exist.
pub fn delete_transaction(id: TransactionId, connection: &Connection) -> Result<(), Error> {
    let rows_affected =
        connection.execute("DELETE FROM \"transaction\" WHERE id = ?1", [id])?;

    if rows_affected == 0 {
        return Err(Error::DeleteMissingTransaction);
    }

    Ok(())
}

/// Get the total number of transactions in the database.
///
/// # Errors
/// This function will return a [Error::SqlError] there is some SQL error.
#[cfg(test)]
pub fn count_transactions(connection: &Connection) -> Result<u32, Error> {
    connection
        .query_row("SELECT COUNT(id) FROM \"transaction\";", [], |row| {
            row.get(0)
        })
        .map_err(|error| error.into())
}

fn validate(builder: &TransactionBuilder, connection: &Connection) -> Result<(), Error> {
    if !builder.amount.is_finite() || builder.amount <= 0.0 {
        return Err(Error::InvalidAmount(builder.amount));
    }

    match (builder.kind, builder.sinking_fund_id) {
        (TransactionKind::Expense, Some(_)) => {
            return Err(Error::InvalidTransactionKind(
                builder.kind,
                "cannot belong to a sinking fund",
            ));
        }
        (TransactionKind::Contribution | TransactionKind::Withdrawal, None) => {
            return Err(Error::InvalidTransactionKind(
                builder.kind,
                "must belong to a sinking fund",
            ));
        }
        _ => {}
    }

    if let Some(subcategory_id) = builder.subcategory_id {
        let belongs_to_category: bool = connection.query_row(
            "SELECT EXISTS(SELECT 1 FROM subcategory WHERE id = ?1 AND category_id = ?2)",
            (subcategory_id, builder.category_id),
            |row| row.get(0),
        )?;

        if !belongs_to_category {
            return Err(Error::InvalidSubcategory);
        }
    }

    Ok(())
}

fn map_foreign_key_error(error: rusqlite::Error, category_id: CategoryId) -> Error {
    match error {
        rusqlite::Error::SqliteFailure(
            rusqlite::ffi::Error {
                code: _,
                extended_code: rusqlite::ffi::SQLITE_CONSTRAINT_FOREIGNKEY,
            },
            _,
        ) => Error::InvalidCategory(Some(category_id)),
        error => error.into(),
    }
}

/// Create the transaction table in the database.
///
/// Must be created after the category, subcategory and sinking fund tables.
///
/// # Errors
/// Returns an error if the table cannot be created or if there is an SQL error.
pub fn create_transaction_table(connection: &Connection) -> Result<(), rusqlite::Error> {
    connection.execute_batch(
        "CREATE TABLE IF NOT EXISTS \"transaction\" (
            id INTEGER PRIMARY KEY AUTOINCREMENT,
            date TEXT NOT NULL,
            description TEXT NOT NULL,
            amount REAL NOT NULL,
            category_id INTEGER NOT NULL,
            subcategory_id INTEGER,
            sinking_fund_id INTEGER,
            kind TEXT NOT NULL DEFAULT 'expense'
                CHECK (kind IN ('expense', 'contribution', 'withdrawal')),
            notes TEXT NOT NULL DEFAULT '',
            created_at TEXT NOT NULL,
            updated_at TEXT NOT NULL,
            FOREIGN KEY(category_id) REFERENCES category(id),
            FOREIGN KEY(subcategory_id) REFERENCES subcategory(id) ON DELETE SET NULL,
            FOREIGN KEY(sinking_fund_id) REFERENCES sinking_fund(id)
        );

        CREATE INDEX IF NOT EXISTS idx_transaction_date_category
            ON \"transaction\"(date, category_id);

        CREATE INDEX IF NOT EXISTS idx_transaction_sinking_fund
            ON \"transaction\"(sinking_fund_id);",
    )?;

    Ok(())
}

/// Map a database row to a Transaction.
pub fn map_transaction_row(row: &Row) -> Result<Transaction, rusqlite::Error> {
    Ok(Transaction {
        id: row.get(0)?,
        date: row.get(1)?,
        description: row.get(2)?,
        amount: row.get(3)?,
        category_id: row.get(4)?,
        subcategory_id: row.get(5)?,
        sinking_fund_id: row.get(6)?,
        kind: row.get(7)?,
        notes: row.get(8)?,
        created_at: row.get(9)?,
        updated_at: row.get(10)?,
    })
}

// ============================================================================
// TESTS
// ============================================================================
