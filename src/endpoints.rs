//! The API endpoints URIs.
//!
//! For endpoints that take a parameter, e.g., '/transactions/{transaction_id}', use [format_endpoint].

/// The root route which redirects to the dashboard.
pub const ROOT: &str = "/";
/// The landing page with the budget overview for the current month.
pub const DASHBOARD_VIEW: &str = "/dashboard";
/// The page for listing and searching transactions.
pub const TRANSACTIONS_VIEW: &str = "/transactions";
/// The page for creating a new transaction.
pub const NEW_TRANSACTION_VIEW: &str = "/transactions/new";
/// The page for viewing a single transaction.
pub const TRANSACTION_VIEW: &str = "/transactions/{transaction_id}";
/// The page for editing an existing transaction.
pub const EDIT_TRANSACTION_VIEW: &str = "/transactions/{transaction_id}/edit";
/// The page for managing categories.
pub const CATEGORIES_VIEW: &str = "/categories";
/// The page for setting the current month's budget and the sinking fund settings.
pub const BUDGET_VIEW: &str = "/budget";
/// The page with charts of spending and sinking fund progress.
pub const ANALYTICS_VIEW: &str = "/analytics";
/// The page to display when an internal server error occurs.
pub const INTERNAL_ERROR_VIEW: &str = "/error";
/// The route for static files.
pub const STATIC: &str = "/static";

/// The route to create a transaction.
pub const TRANSACTIONS_API: &str = "/api/transactions";
/// The route to update or delete a single transaction.
pub const TRANSACTION: &str = "/api/transactions/{transaction_id}";
/// The route to create a category.
pub const CATEGORIES_API: &str = "/api/categories";
/// The route to update or delete a category.
pub const CATEGORY: &str = "/api/categories/{category_id}";
/// The route to list the subcategories of a category.
pub const SUBCATEGORIES: &str = "/api/subcategories/{category_id}";
/// The route to get category suggestions for a transaction description.
pub const CATEGORY_SUGGESTIONS: &str = "/api/category-suggestions";
/// The route to save the budget setup form.
pub const BUDGET_API: &str = "/api/budget";
/// The route to list the active sinking funds.
pub const SINKING_FUNDS_API: &str = "/api/sinking-funds";
/// The route to make this month's sinking fund contributions.
pub const CONTRIBUTE_TO_SINKING_FUNDS: &str = "/api/sinking-funds/contribute";
/// The route to update a sinking fund's target and monthly allocation.
pub const SINKING_FUND: &str = "/api/sinking-funds/{sinking_fund_id}";
/// The route to record a manual contribution to or withdrawal from a sinking fund.
pub const SINKING_FUND_TRANSACTIONS: &str = "/api/sinking-funds/{sinking_fund_id}/transactions";

/// Replace the parameter in `endpoint_path` with `id`.
///
/// A parameter is a string that starts with a left brace, followed by
/// lowercase letters or underscores, and ends with a right brace.
/// For example, in the endpoint path '/users/{user_id}', '{user_id}' is the parameter.
///
/// This function assumes that an endpoint path only contains ASCII characters
/// and a single parameter.
///
/// If no parameter is found in `endpoint_path`, the function returns the
/// the original `endpoint_path`.
pub fn format_endpoint(endpoint_path: &str, id: i64) -> String {
    let mut param_start = None;
    let mut param_end = None;

    for (i, c) in endpoint_path.chars().enumerate() {
        if c == '{' {
            param_start = Some(i);
        } else if param_start.is_some() && c == '}' {
            param_end = Some(i + 1);
            break;
        }
    }

    let param_start = match param_start {
        Some(start) => start,
        None => return endpoint_path.to_string(),
    };

    let param_end = param_end.unwrap_or(endpoint_path.len());

    format!(
        "{}{}{}",
        &endpoint_path[..param_start],
        id,
        &endpoint_path[param_end..]
    )
}
