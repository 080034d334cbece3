//! Transactions: spending filed under a category, and the contributions to
//! and withdrawals from sinking funds.
//!
//! This module contains:
//! - The `Transaction` model and `TransactionBuilder` for creating transactions
//! - Database functions for storing, querying, and managing transactions
//! - View handlers and endpoints for the transaction pages

mod core;
mod create_page;
mod edit_page;
mod endpoints;
mod form;
mod query;
mod transactions_page;
mod view;

pub use core::{
    Transaction, TransactionBuilder, TransactionId, TransactionKind, create_transaction,
    create_transaction_table,
};
pub use create_page::get_create_transaction_page;
pub use edit_page::get_edit_transaction_page;
pub use endpoints::{
    create_transaction_endpoint, delete_transaction_endpoint, update_transaction_endpoint,
};
pub use query::{TransactionTableRow, get_recent_transactions};
pub use transactions_page::get_transactions_page;
pub use view::get_transaction_page;

#[cfg(test)]
pub use core::{count_transactions, get_transaction};
