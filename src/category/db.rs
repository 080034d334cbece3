//! Database operations for categories and subcategories.

use rusqlite::{Connection, OptionalExtension, Row};

use crate::{
    Error,
    category::{Category, CategoryId, CategoryName, CategoryUsage, Subcategory},
};

/// Create a category and return it with its generated ID.
///
/// # Errors
/// Returns [Error::DuplicateCategoryName] if a category with the same name exists.
pub fn create_category(name: CategoryName, connection: &Connection) -> Result<Category, Error> {
    connection
        .execute("INSERT INTO category (name) VALUES (?1);", (name.as_ref(),))
        .map_err(|error| map_unique_violation(error, &name))?;

    let id = connection.last_insert_rowid();

    Ok(Category { id, name })
}

/// Retrieve a single category by ID.
#[cfg(test)]
pub fn get_category(category_id: CategoryId, connection: &Connection) -> Result<Category, Error> {
    connection
        .prepare("SELECT id, name FROM category WHERE id = :id;")?
        .query_row(&[(":id", &category_id)], map_row)
        .map_err(|error| error.into())
}

/// Retrieve all categories ordered alphabetically by name.
pub fn get_all_categories(connection: &Connection) -> Result<Vec<Category>, Error> {
    connection
        .prepare("SELECT id, name FROM category ORDER BY name ASC;")?
        .query_map([], map_row)?
        .map(|maybe_category| maybe_category.map_err(|error| error.into()))
        .collect()
}

/// Rename a category.
///
/// # Errors
/// Returns [Error::UpdateMissingCategory] if the category doesn't exist or
/// [Error::DuplicateCategoryName] if another category already has `new_name`.
pub fn update_category(
    category_id: CategoryId,
    new_name: CategoryName,
    connection: &Connection,
) -> Result<(), Error> {
    let rows_affected = connection
        .execute(
            "UPDATE category SET name = ?1 WHERE id = ?2",
            (new_name.as_ref(), category_id),
        )
        .map_err(|error| map_unique_violation(error, &new_name))?;

    if rows_affected == 0 {
        return Err(Error::UpdateMissingCategory);
    }

    Ok(())
}

/// Delete a category that is no longer in use.
///
/// A category can only be deleted when no transactions are filed under it,
/// none of its budget allocations are positive and no sinking fund is mapped to
/// it. Its remaining (zero) allocations are deleted along with it.
///
/// # Errors
/// Returns:
/// - [Error::DeleteMissingCategory] if the category doesn't exist,
/// - [Error::CategoryHasTransactions] if transactions still use the category,
/// - [Error::CategoryHasBudgetAllocations] if it has a positive allocation in any month,
/// - [Error::CategoryUsedBySinkingFund] if a sinking fund's transactions are filed under it.
pub fn delete_category(category_id: CategoryId, connection: &Connection) -> Result<(), Error> {
    let transaction = connection.unchecked_transaction()?;

    let exists: bool = transaction.query_row(
        "SELECT EXISTS(SELECT 1 FROM category WHERE id = ?1)",
        [category_id],
        |row| row.get(0),
    )?;

    if !exists {
        return Err(Error::DeleteMissingCategory);
    }

    let transaction_count: u32 = transaction.query_row(
        "SELECT COUNT(id) FROM \"transaction\" WHERE category_id = ?1",
        [category_id],
        |row| row.get(0),
    )?;

    if transaction_count > 0 {
        return Err(Error::CategoryHasTransactions(transaction_count));
    }

    let budget_count: u32 = transaction.query_row(
        "SELECT COUNT(id) FROM budget_allocation WHERE category_id = ?1 AND budgeted_amount > 0",
        [category_id],
        |row| row.get(0),
    )?;

    if budget_count > 0 {
        return Err(Error::CategoryHasBudgetAllocations);
    }

    let fund_name: Option<String> = transaction
        .query_row(
            "SELECT sf.name FROM sinking_fund_category sfc
            INNER JOIN sinking_fund sf ON sf.id = sfc.sinking_fund_id
            WHERE sfc.category_id = ?1
            ORDER BY sf.name ASC
            LIMIT 1",
            [category_id],
            |row| row.get(0),
        )
        .optional()?;

    if let Some(fund_name) = fund_name {
        return Err(Error::CategoryUsedBySinkingFund(fund_name));
    }

    transaction.execute(
        "DELETE FROM budget_allocation WHERE category_id = ?1",
        [category_id],
    )?;
    transaction.execute("DELETE FROM category WHERE id = ?1", [category_id])?;

    transaction.commit()?;

    Ok(())
}

/// Retrieve all categories with their transaction and positive-allocation
/// counts and the sinking fund mapped to them, if any.
pub fn get_category_usage(connection: &Connection) -> Result<Vec<CategoryUsage>, Error> {
    connection
        .prepare(
            "SELECT c.id, c.name,
                (SELECT COUNT(t.id) FROM \"transaction\" t WHERE t.category_id = c.id),
                (SELECT COUNT(b.id) FROM budget_allocation b
                    WHERE b.category_id = c.id AND b.budgeted_amount > 0),
                (SELECT sf.name FROM sinking_fund_category sfc
                    INNER JOIN sinking_fund sf ON sf.id = sfc.sinking_fund_id
                    WHERE sfc.category_id = c.id
                    ORDER BY sf.name ASC
                    LIMIT 1)
            FROM category c
            ORDER BY c.name ASC",
        )?
        .query_map([], |row| {
            Ok(CategoryUsage {
                category: map_row(row)?,
                transaction_count: row.get(2)?,
                budget_count: row.get(3)?,
                sinking_fund: row.get(4)?,
            })
        })?
        .map(|maybe_usage| maybe_usage.map_err(|error| error.into()))
        .collect()
}

/// Create a subcategory under `category_id`.
///
/// # Errors
/// Returns [Error::EmptySubcategoryName] if `name` is blank,
/// [Error::DuplicateSubcategoryName] if the category already has a subcategory
/// called `name` or [Error::InvalidCategory] if `category_id` does not refer to
/// a category.
pub fn create_subcategory(
    category_id: CategoryId,
    name: &str,
    connection: &Connection,
) -> Result<Subcategory, Error> {
    let name = name.trim();

    if name.is_empty() {
        return Err(Error::EmptySubcategoryName);
    }

    connection
        .prepare(
            "INSERT INTO subcategory (category_id, name) VALUES (?1, ?2)
            RETURNING id, category_id, name",
        )?
        .query_row((category_id, name), map_subcategory_row)
        .map_err(|error| match error {
            rusqlite::Error::SqliteFailure(
                rusqlite::ffi::Error {
                    code: _,
                    extended_code: rusqlite::ffi::SQLITE_CONSTRAINT_FOREIGNKEY,
                },
                _,
            ) => Error::InvalidCategory(Some(category_id)),
            rusqlite::Error::SqliteFailure(
                rusqlite::ffi::Error {
                    code: _,
                    extended_code: rusqlite::ffi::SQLITE_CONSTRAINT_UNIQUE,
                },
                _,
            ) => Error::DuplicateSubcategoryName(name.to_owned()),
            error => error.into(),
        })
}

/// Retrieve the subcategories of a category ordered by name.
pub fn get_subcategories(
    category_id: CategoryId,
    connection: &Connection,
) -> Result<Vec<Subcategory>, Error> {
    connection
        .prepare(
            "SELECT id, category_id, name FROM subcategory WHERE category_id = ?1 ORDER BY name ASC",
        )?
        .query_map([category_id], map_subcategory_row)?
        .map(|maybe_subcategory| maybe_subcategory.map_err(|error| error.into()))
        .collect()
}

/// Initialize the category table.
pub fn create_category_table(connection: &Connection) -> Result<(), rusqlite::Error> {
    connection.execute_batch(
        "CREATE TABLE IF NOT EXISTS category (
            id INTEGER PRIMARY KEY,
            name TEXT NOT NULL UNIQUE
        );",
    )?;

    Ok(())
}

/// Initialize the subcategory table.
pub fn create_subcategory_table(connection: &Connection) -> Result<(), rusqlite::Error> {
    connection.execute_batch(
        "CREATE TABLE IF NOT EXISTS subcategory (
            id INTEGER PRIMARY KEY,
            category_id INTEGER NOT NULL,
            name TEXT NOT NULL,
            UNIQUE(category_id, name),
            FOREIGN KEY(category_id) REFERENCES category(id) ON DELETE CASCADE
        );

        CREATE INDEX IF NOT EXISTS idx_subcategory_category ON subcategory(category_id);",
    )?;

    Ok(())
}

fn map_unique_violation(error: rusqlite::Error, name: &CategoryName) -> Error {
    match error {
        rusqlite::Error::SqliteFailure(
            rusqlite::ffi::Error {
                code: _,
                extended_code: rusqlite::ffi::SQLITE_CONSTRAINT_UNIQUE,
            },
            _,
        ) => Error::DuplicateCategoryName(name.to_string()),
        error => error.into(),
    }
}

fn map_row(row: &Row) -> Result<Category, rusqlite::Error> {
    let id = row.get(0)?;
    let raw_name: String = row.get(1)?;
    let name = CategoryName::new_unchecked(&raw_name);

    Ok(Category { id, name })
}

fn map_subcategory_row(row: &Row) -> Result<Subcategory, rusqlite::Error> {
    Ok(Subcategory {
        id: row.get(0)?,
        category_id: row.get(1)?,
        name: row.get(2)?,
    })
}

#[cfg(test)]
mod category_query_tests {
    use std::collections::HashSet;

    use time::macros::date;

    use crate::{
        Error,
        budget::{ensure_budget_period, set_allocation},
        category::CategoryName,
        db::get_test_connection,
        month::MonthYear,
        sinking_fund::{
            contribute_monthly_allocations, create_sinking_fund, get_sinking_fund,
            set_fund_category,
        },
        transaction::{Transaction, create_transaction},
    };

    use super::{
        create_category, create_subcategory, delete_category, get_all_categories, get_category,
        get_category_usage, get_subcategories, update_category,
    };

    #[test]
    fn create_category_succeeds() {
        let connection = get_test_connection();
        let name = CategoryName::new("Groceries").unwrap();

        let category = create_category(name.clone(), &connection).expect("Could not create category");

        assert!(category.id > 0);
        assert_eq!(category.name, name);
    }

    #[test]
    fn create_category_fails_on_duplicate_name() {
        let connection = get_test_connection();
        create_category(CategoryName::new_unchecked("Groceries"), &connection).unwrap();

        let result = create_category(CategoryName::new_unchecked("Groceries"), &connection);

        assert_eq!(
            result,
            Err(Error::DuplicateCategoryName("Groceries".to_owned()))
        );
    }

    #[test]
    fn get_category_with_invalid_id_returns_not_found() {
        let connection = get_test_connection();
        let category = create_category(CategoryName::new_unchecked("Foo"), &connection).unwrap();

        let result = get_category(category.id + 123, &connection);

        assert_eq!(result, Err(Error::NotFound));
    }

    #[test]
    fn get_all_categories_returns_every_category() {
        let connection = get_test_connection();
        let want = HashSet::from([
            create_category(CategoryName::new_unchecked("Foo"), &connection).unwrap(),
            create_category(CategoryName::new_unchecked("Bar"), &connection).unwrap(),
        ]);

        let got = HashSet::from_iter(get_all_categories(&connection).unwrap());

        assert_eq!(want, got);
    }

    #[test]
    fn update_category_renames() {
        let connection = get_test_connection();
        let category = create_category(CategoryName::new_unchecked("Old"), &connection).unwrap();

        update_category(category.id, CategoryName::new_unchecked("New"), &connection).unwrap();

        let got = get_category(category.id, &connection).unwrap();
        assert_eq!(got.name.as_ref(), "New");
    }

    #[test]
    fn update_category_fails_on_name_clash() {
        let connection = get_test_connection();
        create_category(CategoryName::new_unchecked("Taken"), &connection).unwrap();
        let category = create_category(CategoryName::new_unchecked("Other"), &connection).unwrap();

        let result = update_category(category.id, CategoryName::new_unchecked("Taken"), &connection);

        assert_eq!(result, Err(Error::DuplicateCategoryName("Taken".to_owned())));
    }

    #[test]
    fn update_missing_category_fails() {
        let connection = get_test_connection();

        let result = update_category(999, CategoryName::new_unchecked("New"), &connection);

        assert_eq!(result, Err(Error::UpdateMissingCategory));
    }

    #[test]
    fn delete_unused_category_succeeds() {
        let connection = get_test_connection();
        let category = create_category(CategoryName::new_unchecked("Unused"), &connection).unwrap();

        delete_category(category.id, &connection).unwrap();

        assert_eq!(get_category(category.id, &connection), Err(Error::NotFound));
    }

    #[test]
    fn delete_missing_category_fails() {
        let connection = get_test_connection();

        let result = delete_category(999, &connection);

        assert_eq!(result, Err(Error::DeleteMissingCategory));
    }

    #[test]
    fn delete_category_with_transactions_fails() {
        let connection = get_test_connection();
        let category = create_category(CategoryName::new_unchecked("Food"), &connection).unwrap();
        for _ in 0..2 {
            create_transaction(
                Transaction::build(10.0, date!(2025 - 10 - 01), "Lunch", category.id),
                &connection,
            )
            .unwrap();
        }

        let result = delete_category(category.id, &connection);

        assert_eq!(result, Err(Error::CategoryHasTransactions(2)));
    }

    #[test]
    fn delete_category_with_positive_allocation_fails() {
        let connection = get_test_connection();
        let today = date!(2025 - 10 - 01);
        let category = create_category(CategoryName::new_unchecked("Rent"), &connection).unwrap();
        let period = ensure_budget_period(MonthYear::from_date(today), today, &connection).unwrap();
        set_allocation(period, category.id, None, 1500.0, &connection).unwrap();

        let result = delete_category(category.id, &connection);

        assert_eq!(result, Err(Error::CategoryHasBudgetAllocations));
    }

    #[test]
    fn delete_category_mapped_to_sinking_fund_fails() {
        let connection = get_test_connection();
        let category =
            create_category(CategoryName::new_unchecked("Emergency Fund Build-Up"), &connection)
                .unwrap();
        let fund = create_sinking_fund("Emergency Fund", 200_000.0, 1947.0, &connection).unwrap();
        set_fund_category(fund.id, category.id, &connection).unwrap();

        let result = delete_category(category.id, &connection);

        assert_eq!(
            result,
            Err(Error::CategoryUsedBySinkingFund("Emergency Fund".to_owned()))
        );
        contribute_monthly_allocations(date!(2025 - 10 - 01), &connection).unwrap();
        let fund = get_sinking_fund(fund.id, &connection).unwrap();
        assert_eq!(fund.current_balance, 1947.0);
    }

    #[test]
    fn fund_category_cannot_be_deleted_directly() {
        let connection = get_test_connection();
        let category = create_category(CategoryName::new_unchecked("Car"), &connection).unwrap();
        let fund = create_sinking_fund("Vehicle", 100_000.0, 24_500.0, &connection).unwrap();
        set_fund_category(fund.id, category.id, &connection).unwrap();

        let result = connection.execute("DELETE FROM category WHERE id = ?1", [category.id]);

        assert!(result.is_err());
    }

    #[test]
    fn delete_category_removes_zero_allocations() {
        let connection = get_test_connection();
        let today = date!(2025 - 10 - 01);
        let category = create_category(CategoryName::new_unchecked("Gifts"), &connection).unwrap();
        let period = ensure_budget_period(MonthYear::from_date(today), today, &connection).unwrap();
        set_allocation(period, category.id, None, 0.0, &connection).unwrap();

        delete_category(category.id, &connection).unwrap();

        let remaining: u32 = connection
            .query_row(
                "SELECT COUNT(id) FROM budget_allocation WHERE category_id = ?1",
                [category.id],
                |row| row.get(0),
            )
            .unwrap();
        assert_eq!(remaining, 0);
    }

    #[test]
    fn category_usage_counts_transactions_and_positive_budgets() {
        let connection = get_test_connection();
        let today = date!(2025 - 10 - 01);
        let food = create_category(CategoryName::new_unchecked("Food"), &connection).unwrap();
        let fun = create_category(CategoryName::new_unchecked("Fun"), &connection).unwrap();
        create_transaction(
            Transaction::build(10.0, today, "Lunch", food.id),
            &connection,
        )
        .unwrap();
        let period = ensure_budget_period(MonthYear::from_date(today), today, &connection).unwrap();
        set_allocation(period, food.id, None, 200.0, &connection).unwrap();
        set_allocation(period, fun.id, None, 0.0, &connection).unwrap();
        let fund = create_sinking_fund("Discretionary", 75_000.0, 15_000.0, &connection).unwrap();
        set_fund_category(fund.id, fun.id, &connection).unwrap();

        let usage = get_category_usage(&connection).unwrap();

        assert_eq!(usage.len(), 2);
        assert_eq!(usage[0].category, food);
        assert_eq!((usage[0].transaction_count, usage[0].budget_count), (1, 1));
        assert_eq!(usage[0].sinking_fund, None);
        assert_eq!(usage[1].category, fun);
        assert_eq!((usage[1].transaction_count, usage[1].budget_count), (0, 0));
        assert_eq!(usage[1].sinking_fund.as_deref(), Some("Discretionary"));
    }

    #[test]
    fn subcategories_are_listed_per_category() {
        let connection = get_test_connection();
        let car = create_category(CategoryName::new_unchecked("Car"), &connection).unwrap();
        let home = create_category(CategoryName::new_unchecked("Home"), &connection).unwrap();
        let fuel = create_subcategory(car.id, "Fuel", &connection).unwrap();
        let insurance = create_subcategory(car.id, "Insurance", &connection).unwrap();
        create_subcategory(home.id, "Power", &connection).unwrap();

        let got = get_subcategories(car.id, &connection).unwrap();

        assert_eq!(got, vec![fuel, insurance]);
    }

    #[test]
    fn create_subcategory_fails_on_invalid_category() {
        let connection = get_test_connection();

        let result = create_subcategory(42, "Fuel", &connection);

        assert_eq!(result, Err(Error::InvalidCategory(Some(42))));
    }
}
