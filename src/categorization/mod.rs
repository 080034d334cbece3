//! Learning which category a description belongs to and suggesting categories
//! for new descriptions.

mod db;
mod endpoint;
mod suggest;

pub use db::{create_categorization_pattern_table, learn_pattern, seed_patterns_from_transactions};
pub use endpoint::get_category_suggestions_endpoint;
pub use suggest::suggest_categories;
