//! Monthly budget periods and the amounts allocated to each category.

mod allocation;
mod period;
mod setup;

pub use allocation::{create_budget_allocation_table, get_allocations, set_allocation};
#[cfg(test)]
pub use period::ensure_budget_period;
pub use period::{
    BudgetPeriodId, create_budget_period_table, ensure_current_period, get_budget_period_id,
};
pub use setup::{get_budget_page, save_budget_endpoint};
