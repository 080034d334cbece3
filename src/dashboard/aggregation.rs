//! Budget and spending aggregation for the dashboard and analytics pages.
//!
//! Spending totals only count ordinary expenses: transactions tied to a
//! sinking fund are tracked by the fund instead.

use rusqlite::{Connection, Row};

use crate::{
    Error, budget::BudgetPeriodId, category::CategoryId, month::MonthYear,
    sinking_fund::SinkingFund,
};

/// How much was budgeted and spent for a category in one month.
#[derive(Debug, Clone, PartialEq)]
pub struct BudgetVsActual {
    pub category_id: CategoryId,
    pub category_name: String,
    /// The sum of the category's allocations, including subcategory allocations.
    pub budgeted: f64,
    pub spent: f64,
    /// `budgeted - spent`, negative when overspent.
    pub remaining: f64,
}

/// The total spent in a category in one month.
#[derive(Debug, Clone, PartialEq)]
pub struct CategorySpending {
    pub category_name: String,
    pub total_spent: f64,
}

/// Get the budgeted and spent amounts for every category, ordered by name.
///
/// Categories with neither an allocation nor spending are included with zeros.
pub fn get_budget_vs_actual(
    budget_period_id: BudgetPeriodId,
    month: MonthYear,
    connection: &Connection,
) -> Result<Vec<BudgetVsActual>, Error> {
    connection
        .prepare(
            "SELECT c.id, c.name,
                COALESCE((
                    SELECT SUM(ba.budgeted_amount) FROM budget_allocation ba
                    WHERE ba.category_id = c.id AND ba.budget_period_id = ?1
                ), 0) AS budgeted,
                COALESCE((
                    SELECT SUM(t.amount) FROM \"transaction\" t
                    WHERE t.category_id = c.id
                        AND t.sinking_fund_id IS NULL
                        AND t.date >= ?2 AND t.date < ?3
                ), 0) AS spent
            FROM category c
            ORDER BY c.name ASC",
        )?
        .query_map(
            (budget_period_id, month.first_day(), month.end_exclusive()),
            map_budget_vs_actual_row,
        )?
        .map(|maybe_row| maybe_row.map_err(|error| error.into()))
        .collect()
}

fn map_budget_vs_actual_row(row: &Row) -> Result<BudgetVsActual, rusqlite::Error> {
    let budgeted: f64 = row.get(2)?;
    let spent: f64 = row.get(3)?;

    Ok(BudgetVsActual {
        category_id: row.get(0)?,
        category_name: row.get(1)?,
        budgeted,
        spent,
        remaining: budgeted - spent,
    })
}

/// Get the amount spent per category in `month`, largest first.
///
/// Categories without spending are left out.
pub fn get_category_spending(
    month: MonthYear,
    connection: &Connection,
) -> Result<Vec<CategorySpending>, Error> {
    connection
        .prepare(
            "SELECT c.name, SUM(t.amount) AS total_spent
            FROM \"transaction\" t
            INNER JOIN category c ON c.id = t.category_id
            WHERE t.sinking_fund_id IS NULL AND t.date >= ?1 AND t.date < ?2
            GROUP BY c.id, c.name
            ORDER BY total_spent DESC",
        )?
        .query_map((month.first_day(), month.end_exclusive()), |row| {
            Ok(CategorySpending {
                category_name: row.get(0)?,
                total_spent: row.get(1)?,
            })
        })?
        .map(|maybe_row| maybe_row.map_err(|error| error.into()))
        .collect()
}

/// The fund's balance as a percentage of its target, to one decimal place.
///
/// Funds without a positive target have zero progress.
pub fn fund_progress(fund: &SinkingFund) -> f64 {
    if fund.target_amount <= 0.0 {
        return 0.0;
    }

    (fund.current_balance / fund.target_amount * 1000.0).round() / 10.0
}
