//! Sinking funds: savings buckets that receive a fixed contribution every month.
//!
//! This module contains:
//! - The `SinkingFund` model and the mapping from funds to categories
//! - Reconciling fund balances with their transaction history
//! - The once-per-month contribution run
//! - Route handlers for manual contributions, withdrawals and fund settings

mod balance;
mod contribution;
mod core;
mod endpoints;

pub use balance::{reconcile_balances, record_fund_transaction};
pub use contribution::{
    contribute_monthly_allocations, contributions_made, create_month_transition_table,
};
pub use core::{
    SinkingFund, SinkingFundId, create_sinking_fund, create_sinking_fund_category_table,
    create_sinking_fund_table, get_active_funds, get_fund_category, get_sinking_fund,
    set_fund_category, update_fund_settings,
};
pub use endpoints::{
    contribute_to_sinking_funds_endpoint, create_fund_transaction_endpoint,
    get_sinking_funds_endpoint, update_sinking_fund_endpoint,
};
