//! Budget allocations: how much is planned to be spent per category in a period.

use rusqlite::{Connection, Row};

use crate::{
    Error,
    budget::BudgetPeriodId,
    category::{CategoryId, SubcategoryId},
    database_id::DatabaseId,
};

/// The amount budgeted for a category, or one of its subcategories, in a budget period.
#[derive(Debug, Clone, PartialEq)]
pub struct BudgetAllocation {
    pub id: DatabaseId,
    pub budget_period_id: BudgetPeriodId,
    pub category_id: CategoryId,
    /// `None` for the allocation of the category as a whole.
    pub subcategory_id: Option<SubcategoryId>,
    pub budgeted_amount: f64,
}

/// Set the amount budgeted for a category (and optionally a subcategory) in a
/// budget period, replacing any previous amount.
///
/// There is at most one allocation per period, category and subcategory, with
/// `None` counting as a single subcategory.
///
/// # Errors
/// Returns:
/// - [Error::InvalidAmount] if `amount` is negative or not a finite number,
/// - [Error::InvalidSubcategory] if the subcategory does not belong to the category,
/// - [Error::InvalidCategory] if the category does not exist.
pub fn set_allocation(
    budget_period_id: BudgetPeriodId,
    category_id: CategoryId,
    subcategory_id: Option<SubcategoryId>,
    amount: f64,
    connection: &Connection,
) -> Result<(), Error> {
    if !amount.is_finite() || amount < 0.0 {
        return Err(Error::InvalidAmount(amount));
    }

    if let Some(subcategory_id) = subcategory_id {
        let belongs_to_category: bool = connection.query_row(
            "SELECT EXISTS(SELECT 1 FROM subcategory WHERE id = ?1 AND category_id = ?2)",
            (subcategory_id, category_id),
            |row| row.get(0),
        )?;

        if !belongs_to_category {
            return Err(Error::InvalidSubcategory);
        }
    }

    connection
        .execute(
            "INSERT INTO budget_allocation
                (budget_period_id, category_id, subcategory_id, budgeted_amount)
            VALUES (?1, ?2, ?3, ?4)
            ON CONFLICT(budget_period_id, category_id, COALESCE(subcategory_id, 0))
            DO UPDATE SET budgeted_amount = excluded.budgeted_amount",
            (budget_period_id, category_id, subcategory_id, amount),
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

/// Get every allocation in a budget period.
pub fn get_allocations(
    budget_period_id: BudgetPeriodId,
    connection: &Connection,
) -> Result<Vec<BudgetAllocation>, Error> {
    connection
        .prepare(
            "SELECT id, budget_period_id, category_id, subcategory_id, budgeted_amount
            FROM budget_allocation
            WHERE budget_period_id = ?1
            ORDER BY category_id, subcategory_id",
        )?
        .query_map([budget_period_id], map_row)?
        .map(|maybe_allocation| maybe_allocation.map_err(|error| error.into()))
        .collect()
}

fn map_row(row: &Row) -> Result<BudgetAllocation, rusqlite::Error> {
    Ok(BudgetAllocation {
        id: row.get(0)?,
        budget_period_id: row.get(1)?,
        category_id: row.get(2)?,
        subcategory_id: row.get(3)?,
        budgeted_amount: row.get(4)?,
    })
}

/// Initialize the budget allocation table.
///
/// Must be created after the budget period, category and subcategory tables.
pub fn create_budget_allocation_table(connection: &Connection) -> Result<(), rusqlite::Error> {
    connection.execute_batch(
        "CREATE TABLE IF NOT EXISTS budget_allocation (
            id INTEGER PRIMARY KEY,
            budget_period_id INTEGER NOT NULL,
            category_id INTEGER NOT NULL,
            subcategory_id INTEGER,
            budgeted_amount REAL NOT NULL DEFAULT 0,
            FOREIGN KEY(budget_period_id) REFERENCES budget_period(id) ON DELETE CASCADE,
            FOREIGN KEY(category_id) REFERENCES category(id),
            FOREIGN KEY(subcategory_id) REFERENCES subcategory(id) ON DELETE CASCADE
        );

        CREATE UNIQUE INDEX IF NOT EXISTS idx_budget_allocation_unique
            ON budget_allocation(budget_period_id, category_id, COALESCE(subcategory_id, 0));",
    )?;

    Ok(())
}
