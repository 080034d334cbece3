//! Storage for learned categorization patterns.

use std::collections::BTreeMap;

use rusqlite::Connection;
use time::Date;

use crate::{Error, category::CategoryId};

/// Normalize a transaction description into the form patterns are stored in.
pub fn normalize_description(description: &str) -> String {
    description.trim().to_lowercase()
}

/// Record that `description` was filed under `category_id` on `today`.
///
/// Creates the pattern with a usage count of one, or bumps the usage count and
/// last-used date of an existing pattern in the same statement. Blank
/// descriptions are ignored.
pub fn learn_pattern(
    description: &str,
    category_id: CategoryId,
    today: Date,
    connection: &Connection,
) -> Result<(), Error> {
    let pattern = normalize_description(description);

    if pattern.is_empty() {
        return Ok(());
    }

    connection.execute(
        "INSERT INTO categorization_pattern (description_pattern, category_id, usage_count, last_used)
        VALUES (?1, ?2, 1, ?3)
        ON CONFLICT(description_pattern, category_id) DO UPDATE SET
            usage_count = usage_count + 1,
            last_used = excluded.last_used",
        (&pattern, category_id, today),
    )?;

    tracing::debug!("learned pattern \"{pattern}\" for category {category_id}");

    Ok(())
}

/// Build patterns from the existing transaction history.
///
/// Every description (normalized) used at least twice with the same category
/// becomes a pattern whose usage count is the number of uses and whose
/// last-used date is the most recent use. Returns the number of patterns
/// created or updated.
pub fn seed_patterns_from_transactions(connection: &Connection) -> Result<usize, Error> {
    let transaction = connection.unchecked_transaction()?;

    // Grouped here rather than in SQL, which only lower-cases ASCII.
    let mut uses: BTreeMap<(String, CategoryId), (u32, Date)> = BTreeMap::new();

    for row in transaction
        .prepare(
            "SELECT description, category_id, date FROM \"transaction\"
            WHERE sinking_fund_id IS NULL",
        )?
        .query_map([], |row| {
            Ok((
                row.get::<_, String>(0)?,
                row.get::<_, CategoryId>(1)?,
                row.get::<_, Date>(2)?,
            ))
        })?
    {
        let (description, category_id, date) = row?;
        let pattern = normalize_description(&description);

        if pattern.is_empty() {
            continue;
        }

        uses.entry((pattern, category_id))
            .and_modify(|(count, last_used)| {
                *count += 1;
                *last_used = (*last_used).max(date);
            })
            .or_insert((1, date));
    }

    let mut rows_affected = 0;

    {
        let mut statement = transaction.prepare(
            "INSERT INTO categorization_pattern
                (description_pattern, category_id, usage_count, last_used)
            VALUES (?1, ?2, ?3, ?4)
            ON CONFLICT(description_pattern, category_id) DO UPDATE SET
                usage_count = MAX(usage_count, excluded.usage_count),
                last_used = MAX(last_used, excluded.last_used)",
        )?;

        for ((pattern, category_id), (count, last_used)) in &uses {
            if *count >= 2 {
                rows_affected += statement.execute((pattern, category_id, count, last_used))?;
            }
        }
    }

    transaction.commit()?;

    Ok(rows_affected)
}

/// Initialize the categorization pattern table.
pub fn create_categorization_pattern_table(connection: &Connection) -> Result<(), rusqlite::Error> {
    connection.execute_batch(
        "CREATE TABLE IF NOT EXISTS categorization_pattern (
            id INTEGER PRIMARY KEY,
            description_pattern TEXT NOT NULL,
            category_id INTEGER NOT NULL,
            usage_count INTEGER NOT NULL DEFAULT 1,
            last_used TEXT NOT NULL,
            UNIQUE(description_pattern, category_id),
            FOREIGN KEY(category_id) REFERENCES category(id) ON DELETE CASCADE
        );

        CREATE INDEX IF NOT EXISTS idx_categorization_pattern_text
            ON categorization_pattern(description_pattern);",
    )?;

    Ok(())
}
