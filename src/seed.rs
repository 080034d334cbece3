//! Populating a database with the household's sinking funds.

use rusqlite::Connection;

use crate::{
    Error,
    categorization::seed_patterns_from_transactions,
    category::{CategoryName, create_category, get_all_categories},
    sinking_fund::{create_sinking_fund, get_active_funds, set_fund_category},
};

/// A sinking fund created by [seed_database] and the category its
/// transactions are filed under.
struct FundSeed {
    name: &'static str,
    target_amount: f64,
    monthly_allocation: f64,
    category_name: &'static str,
}

const FUND_SEEDS: [FundSeed; 5] = [
    FundSeed {
        name: "Wife/Household",
        target_amount: 50_000.0,
        monthly_allocation: 20_000.0,
        category_name: "Wife Support",
    },
    FundSeed {
        name: "Vehicle",
        target_amount: 100_000.0,
        monthly_allocation: 24_500.0,
        category_name: "Car Expenses",
    },
    FundSeed {
        name: "Emergency Fund",
        target_amount: 200_000.0,
        monthly_allocation: 1_947.0,
        category_name: "Emergency Fund Build-Up",
    },
    FundSeed {
        name: "Discretionary",
        target_amount: 75_000.0,
        monthly_allocation: 15_000.0,
        category_name: "Prof. Dues + Prime",
    },
    FundSeed {
        name: "Assembly/Convention",
        target_amount: 30_000.0,
        monthly_allocation: 9_167.0,
        category_name: "Convention & Assembly",
    },
];

/// What [seed_database] added.
#[derive(Debug, Default, PartialEq, Eq)]
pub struct SeedSummary {
    /// Categories that did not exist before.
    pub categories_created: usize,
    /// Sinking funds that did not exist before.
    pub funds_created: usize,
    /// Categorization patterns learned from the transaction history.
    pub patterns_seeded: usize,
}

/// Create the household's sinking funds with their categories and learn
/// categorization patterns from any existing transactions.
///
/// Funds and categories that already exist (by name) are reused, so running
/// this against a populated database only fills in what is missing.
///
/// # Errors
/// Returns an error if any of the inserts fail.
pub fn seed_database(connection: &Connection) -> Result<SeedSummary, Error> {
    let mut summary = SeedSummary::default();
    let mut categories = get_all_categories(connection)?;
    let mut funds = get_active_funds(connection)?;

    for seed in &FUND_SEEDS {
        let category_id = match categories
            .iter()
            .find(|category| category.name.as_ref() == seed.category_name)
        {
            Some(category) => category.id,
            None => {
                let category =
                    create_category(CategoryName::new_unchecked(seed.category_name), connection)?;
                summary.categories_created += 1;
                let id = category.id;
                categories.push(category);
                id
            }
        };

        let fund_id = match funds.iter().find(|fund| fund.name == seed.name) {
            Some(fund) => fund.id,
            None => {
                let fund = create_sinking_fund(
                    seed.name,
                    seed.target_amount,
                    seed.monthly_allocation,
                    connection,
                )?;
                tracing::info!("created sinking fund \"{}\"", fund.name);
                summary.funds_created += 1;
                let id = fund.id;
                funds.push(fund);
                id
            }
        };

        set_fund_category(fund_id, category_id, connection)?;
    }

    summary.patterns_seeded = seed_patterns_from_transactions(connection)?;

    Ok(summary)
}
