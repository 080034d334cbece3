//! Suggest categories for a transaction description from learned patterns.

use std::collections::HashSet;

use rusqlite::{Connection, params_from_iter};
use serde::Serialize;

use crate::{
    Error,
    categorization::db::normalize_description,
    category::CategoryId,
};

/// Descriptions shorter than this (after trimming) get no suggestions.
const MIN_DESCRIPTION_LENGTH: usize = 3;
/// Words must be longer than this to take part in partial matching.
const MIN_WORD_LENGTH: usize = 2;
const MAX_EXACT_MATCHES: usize = 3;
const MAX_PARTIAL_MATCHES: usize = 5;
const MAX_SUGGESTIONS: usize = 3;

/// How sure the engine is about a suggestion.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Confidence {
    /// The description matched a learned pattern exactly.
    High,
    /// The description shares two or more words with a learned pattern.
    Medium,
    /// The description shares one word with a learned pattern.
    Low,
}

/// A category suggested for a description.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CategorySuggestion {
    pub id: CategoryId,
    pub name: String,
    pub confidence: Confidence,
}

/// Suggest up to three categories for `description`.
///
/// Patterns that match the normalized description exactly are returned with
/// [Confidence::High], most used first. Otherwise patterns containing any of
/// the description's words (longer than two characters) are scored by how many
/// distinct words they share with the description. The result never contains
/// the same category twice.
pub fn suggest_categories(
    description: &str,
    connection: &Connection,
) -> Result<Vec<CategorySuggestion>, Error> {
    if description.trim().chars().count() < MIN_DESCRIPTION_LENGTH {
        return Ok(Vec::new());
    }

    let pattern = normalize_description(description);

    let exact_matches = get_exact_matches(&pattern, connection)?;

    if !exact_matches.is_empty() {
        return Ok(exact_matches);
    }

    let mut words: Vec<&str> = Vec::new();
    for word in pattern.split_whitespace() {
        if word.chars().count() > MIN_WORD_LENGTH && !words.contains(&word) {
            words.push(word);
        }
    }

    if words.is_empty() {
        return Ok(Vec::new());
    }

    let input_words: HashSet<&str> = words.iter().copied().collect();
    let mut seen_categories = HashSet::new();
    let mut suggestions = Vec::new();

    for (category_id, name, matched_pattern) in get_partial_matches(&words, connection)? {
        let overlap = matched_pattern
            .split_whitespace()
            .collect::<HashSet<_>>()
            .intersection(&input_words)
            .count();

        if overlap == 0 || !seen_categories.insert(category_id) {
            continue;
        }

        let confidence = if overlap >= 2 {
            Confidence::Medium
        } else {
            Confidence::Low
        };

        suggestions.push(CategorySuggestion {
            id: category_id,
            name,
            confidence,
        });

        if suggestions.len() >= MAX_SUGGESTIONS {
            break;
        }
    }

    Ok(suggestions)
}

fn get_exact_matches(
    pattern: &str,
    connection: &Connection,
) -> Result<Vec<CategorySuggestion>, Error> {
    connection
        .prepare(
            "SELECT p.category_id, c.name
            FROM categorization_pattern p
            INNER JOIN category c ON c.id = p.category_id
            WHERE p.description_pattern = ?1
            ORDER BY p.usage_count DESC, p.last_used DESC
            LIMIT ?2",
        )?
        .query_map((pattern, MAX_EXACT_MATCHES as i64), |row| {
            Ok(CategorySuggestion {
                id: row.get(0)?,
                name: row.get(1)?,
                confidence: Confidence::High,
            })
        })?
        .map(|maybe_suggestion| maybe_suggestion.map_err(|error| error.into()))
        .collect()
}

/// Patterns containing any of `words` as a substring, most used first.
fn get_partial_matches(
    words: &[&str],
    connection: &Connection,
) -> Result<Vec<(CategoryId, String, String)>, Error> {
    let conditions = (1..=words.len())
        .map(|index| format!("instr(p.description_pattern, ?{index}) > 0"))
        .collect::<Vec<_>>()
        .join(" OR ");

    let query = format!(
        "SELECT p.category_id, c.name, p.description_pattern
        FROM categorization_pattern p
        INNER JOIN category c ON c.id = p.category_id
        WHERE {conditions}
        ORDER BY p.usage_count DESC, p.last_used DESC
        LIMIT {MAX_PARTIAL_MATCHES}"
    );

    connection
        .prepare(&query)?
        .query_map(params_from_iter(words.iter()), |row| {
            Ok((row.get(0)?, row.get(1)?, row.get(2)?))
        })?
        .map(|maybe_match| maybe_match.map_err(|error| error.into()))
        .collect()
}
