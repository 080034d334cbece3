//! The monthly contribution run that moves each fund's monthly allocation into it.

use rusqlite::{Connection, Transaction as SqlTransaction, TransactionBehavior};
use time::Date;

use crate::{
    Error,
    category::CategoryId,
    month::MonthYear,
    sinking_fund::SinkingFundId,
    transaction::{Transaction, TransactionKind, create_transaction},
};

/// What a monthly contribution run did.
#[derive(Debug, Clone, PartialEq)]
pub struct ContributionSummary {
    /// The month the contributions were made for.
    pub month: MonthYear,
    /// How many funds received a contribution.
    pub contributions_made: u32,
    /// The sum of all contributions.
    pub total_contributed: f64,
}

/// Whether the monthly contributions have been made for `month`.
pub fn contributions_made(month: MonthYear, connection: &Connection) -> Result<bool, Error> {
    connection
        .query_row(
            "SELECT EXISTS(
                SELECT 1 FROM month_transition
                WHERE to_month = ?1 AND to_year = ?2 AND sinking_funds_contributed = 1
            )",
            (month.month_number(), month.year()),
            |row| row.get(0),
        )
        .map_err(|error| error.into())
}

/// Contribute the monthly allocation of every active fund for the month of `today`.
///
/// Each fund with a positive monthly allocation gets a contribution
/// transaction dated `today`, filed under the fund's category, and its
/// balance is increased by the allocation. Everything happens in one
/// immediate transaction: the month is marked as contributed with a single
/// conditional write, so the contributions are made at most once per month
/// even with concurrent requests.
///
/// # Errors
/// Returns:
/// - [Error::MonthlyContributionsAlreadyMade] if the month was already contributed,
/// - [Error::MissingFundCategory] if a fund has no category, in which case
///   nothing is written.
pub fn contribute_monthly_allocations(
    today: Date,
    connection: &Connection,
) -> Result<ContributionSummary, Error> {
    let month = MonthYear::from_date(today);
    let previous_month = month.previous();
    let transaction = SqlTransaction::new_unchecked(connection, TransactionBehavior::Immediate)?;

    let rows_claimed = transaction.execute(
        "INSERT INTO month_transition
            (from_month, from_year, to_month, to_year, transition_date, sinking_funds_contributed)
        VALUES (?1, ?2, ?3, ?4, ?5, 1)
        ON CONFLICT(to_month, to_year) DO UPDATE SET sinking_funds_contributed = 1
        WHERE sinking_funds_contributed = 0",
        (
            previous_month.month_number(),
            previous_month.year(),
            month.month_number(),
            month.year(),
            today,
        ),
    )?;

    if rows_claimed == 0 {
        tracing::warn!("monthly contributions for {month} were already made");
        return Err(Error::MonthlyContributionsAlreadyMade(month));
    }

    let funds = transaction
        .prepare(
            "SELECT sf.id, sf.name, sf.monthly_allocation, sfc.category_id
            FROM sinking_fund sf
            LEFT JOIN sinking_fund_category sfc ON sfc.sinking_fund_id = sf.id
            WHERE sf.is_active = 1 AND sf.monthly_allocation > 0
            ORDER BY sf.name ASC",
        )?
        .query_map([], |row| {
            Ok((
                row.get::<_, SinkingFundId>(0)?,
                row.get::<_, String>(1)?,
                row.get::<_, f64>(2)?,
                row.get::<_, Option<CategoryId>>(3)?,
            ))
        })?
        .collect::<Result<Vec<_>, _>>()?;

    let mut summary = ContributionSummary {
        month,
        contributions_made: 0,
        total_contributed: 0.0,
    };

    for (fund_id, name, monthly_allocation, category_id) in funds {
        let Some(category_id) = category_id else {
            tracing::error!("sinking fund \"{name}\" has no category, aborting contributions");
            return Err(Error::MissingFundCategory(name));
        };

        create_transaction(
            Transaction::build(
                monthly_allocation,
                today,
                &format!("Monthly allocation to {name}"),
                category_id,
            )
            .sinking_fund_id(Some(fund_id))
            .kind(TransactionKind::Contribution),
            &transaction,
        )?;

        transaction.execute(
            "UPDATE sinking_fund SET current_balance = current_balance + ?1 WHERE id = ?2",
            (monthly_allocation, fund_id),
        )?;

        summary.contributions_made += 1;
        summary.total_contributed += monthly_allocation;
    }

    transaction.commit()?;

    tracing::info!(
        "contributed {:.2} to {} sinking funds for {month}",
        summary.total_contributed,
        summary.contributions_made
    );

    Ok(summary)
}

/// Initialize the month transition table.
pub fn create_month_transition_table(connection: &Connection) -> Result<(), rusqlite::Error> {
    connection.execute_batch(
        "CREATE TABLE IF NOT EXISTS month_transition (
            id INTEGER PRIMARY KEY,
            from_month INTEGER NOT NULL,
            from_year INTEGER NOT NULL,
            to_month INTEGER NOT NULL,
            to_year INTEGER NOT NULL,
            transition_date TEXT NOT NULL,
            sinking_funds_contributed INTEGER NOT NULL DEFAULT 0,
            UNIQUE(to_month, to_year)
        );",
    )?;

    Ok(())
}
