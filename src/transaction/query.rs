//! Queries for listing transactions with their category, subcategory and sinking fund names.

use rusqlite::{Connection, Row, ToSql, params_from_iter};
use serde::Deserialize;
use time::Date;

use crate::{
    Error,
    category::CategoryId,
    transaction::{TransactionId, TransactionKind},
};

/// A transaction joined with the names of what it is filed under.
#[derive(Debug, Clone, PartialEq)]
pub struct TransactionTableRow {
    pub id: TransactionId,
    pub date: Date,
    pub description: String,
    pub amount: f64,
    pub category_name: String,
    pub subcategory_name: Option<String>,
    pub sinking_fund_name: Option<String>,
    pub kind: TransactionKind,
    pub notes: String,
}

/// Filters for the transaction list, all optional.
#[derive(Debug, Default, Clone, PartialEq, Deserialize)]
pub struct TransactionFilter {
    /// Text that must appear in the description or the notes.
    pub search: Option<String>,
    #[serde(rename = "category")]
    pub category_id: Option<CategoryId>,
    /// The earliest date to include.
    pub date_from: Option<Date>,
    /// The latest date to include.
    pub date_to: Option<Date>,
}

const SELECT_TABLE_ROW: &str = "SELECT t.id, t.date, t.description, t.amount, c.name, sc.name,
        sf.name, t.kind, t.notes
    FROM \"transaction\" t
    INNER JOIN category c ON c.id = t.category_id
    LEFT JOIN subcategory sc ON sc.id = t.subcategory_id
    LEFT JOIN sinking_fund sf ON sf.id = t.sinking_fund_id";

/// Get the transactions matching `filter`, newest first.
///
/// Sinking fund contributions and withdrawals are included.
pub fn get_transactions(
    filter: &TransactionFilter,
    connection: &Connection,
) -> Result<Vec<TransactionTableRow>, Error> {
    let mut conditions = Vec::new();
    let mut params: Vec<&dyn ToSql> = Vec::new();

    let search_pattern = filter
        .search
        .as_deref()
        .map(str::trim)
        .filter(|search| !search.is_empty())
        .map(|search| format!("%{search}%"));

    if let Some(search_pattern) = &search_pattern {
        params.push(search_pattern);
        conditions.push(format!(
            "(t.description LIKE ?{index} OR t.notes LIKE ?{index})",
            index = params.len()
        ));
    }

    if let Some(category_id) = &filter.category_id {
        params.push(category_id);
        conditions.push(format!("t.category_id = ?{}", params.len()));
    }

    if let Some(date_from) = &filter.date_from {
        params.push(date_from);
        conditions.push(format!("t.date >= ?{}", params.len()));
    }

    if let Some(date_to) = &filter.date_to {
        params.push(date_to);
        conditions.push(format!("t.date <= ?{}", params.len()));
    }

    let where_clause = if conditions.is_empty() {
        String::new()
    } else {
        format!("WHERE {}", conditions.join(" AND "))
    };

    let query =
        format!("{SELECT_TABLE_ROW} {where_clause} ORDER BY t.date DESC, t.created_at DESC");

    connection
        .prepare(&query)?
        .query_map(params_from_iter(params), map_table_row)?
        .map(|maybe_row| maybe_row.map_err(|error| error.into()))
        .collect()
}

/// Get the most recent transactions that are not sinking fund contributions
/// or withdrawals.
pub fn get_recent_transactions(
    limit: u32,
    connection: &Connection,
) -> Result<Vec<TransactionTableRow>, Error> {
    connection
        .prepare(&format!(
            "{SELECT_TABLE_ROW}
            WHERE t.sinking_fund_id IS NULL
            ORDER BY t.date DESC, t.created_at DESC
            LIMIT ?1"
        ))?
        .query_map([limit], map_table_row)?
        .map(|maybe_row| maybe_row.map_err(|error| error.into()))
        .collect()
}

/// Get a single transaction with the names of what it is filed under.
///
/// # Errors
/// Returns [Error::NotFound] if the transaction does not exist.
pub fn get_transaction_row(
    id: TransactionId,
    connection: &Connection,
) -> Result<TransactionTableRow, Error> {
    connection
        .prepare(&format!("{SELECT_TABLE_ROW} WHERE t.id = ?1"))?
        .query_row([id], map_table_row)
        .map_err(|error| error.into())
}

fn map_table_row(row: &Row) -> Result<TransactionTableRow, rusqlite::Error> {
    Ok(TransactionTableRow {
        id: row.get(0)?,
        date: row.get(1)?,
        description: row.get(2)?,
        amount: row.get(3)?,
        category_name: row.get(4)?,
        subcategory_name: row.get(5)?,
        sinking_fund_name: row.get(6)?,
        kind: row.get(7)?,
        notes: row.get(8)?,
    })
}
