use std::error::Error;

use clap::Parser;

use budget_tracker::{initialize_db, open_connection, seed_database};

/// Set up a budget_tracker database with the household's sinking funds.
///
/// Existing funds and categories are left as they are, so this can be run
/// against a database that is already in use.
#[derive(Parser, Debug)]
#[command(version, about, long_about = None)]
struct Args {
    /// File path to the SQLite database, created if it does not exist.
    #[arg(long, env = "DB_PATH", default_value = "budget_tracker.db")]
    db_path: String,
}

fn main() -> Result<(), Box<dyn Error>> {
    let args = Args::parse();

    println!("Seeding database at {:?}", args.db_path);
    let connection = open_connection(&args.db_path)?;
    initialize_db(&connection)?;

    let summary = seed_database(&connection)?;

    println!(
        "Created {} categories and {} sinking funds, learned {} categorization patterns.",
        summary.categories_created, summary.funds_created, summary.patterns_seeded
    );
    println!("Success!");

    Ok(())
}
