//! Application router configuration.

use axum::{
    Router,
    response::Redirect,
    routing::{get, post},
};
use tower_http::services::ServeDir;

use crate::{
    AppState,
    budget::{get_budget_page, save_budget_endpoint},
    categorization::get_category_suggestions_endpoint,
    category::{
        create_category_endpoint, create_subcategory_endpoint, delete_category_endpoint,
        get_categories_page, get_subcategories_endpoint, update_category_endpoint,
    },
    dashboard::{get_analytics_page, get_dashboard_page},
    endpoints,
    internal_server_error::get_internal_server_error_page,
    not_found::get_404_not_found,
    sinking_fund::{
        contribute_to_sinking_funds_endpoint, create_fund_transaction_endpoint,
        get_sinking_funds_endpoint, update_sinking_fund_endpoint,
    },
    transaction::{
        create_transaction_endpoint, delete_transaction_endpoint, get_create_transaction_page,
        get_edit_transaction_page, get_transaction_page, get_transactions_page,
        update_transaction_endpoint,
    },
};

/// Return a router with all the app's routes.
pub fn build_router(state: AppState) -> Router {
    let page_routes = Router::new()
        .route(endpoints::ROOT, get(get_index_page))
        .route(endpoints::DASHBOARD_VIEW, get(get_dashboard_page))
        .route(endpoints::ANALYTICS_VIEW, get(get_analytics_page))
        .route(endpoints::BUDGET_VIEW, get(get_budget_page))
        .route(endpoints::CATEGORIES_VIEW, get(get_categories_page))
        .route(endpoints::TRANSACTIONS_VIEW, get(get_transactions_page))
        .route(
            endpoints::NEW_TRANSACTION_VIEW,
            get(get_create_transaction_page),
        )
        .route(endpoints::TRANSACTION_VIEW, get(get_transaction_page))
        .route(
            endpoints::EDIT_TRANSACTION_VIEW,
            get(get_edit_transaction_page),
        )
        .route(
            endpoints::INTERNAL_ERROR_VIEW,
            get(get_internal_server_error_page),
        );

    let api_routes = Router::new()
        .route(
            endpoints::TRANSACTIONS_API,
            post(create_transaction_endpoint),
        )
        .route(
            endpoints::TRANSACTION,
            axum::routing::put(update_transaction_endpoint).delete(delete_transaction_endpoint),
        )
        .route(endpoints::CATEGORIES_API, post(create_category_endpoint))
        .route(
            endpoints::CATEGORY,
            axum::routing::put(update_category_endpoint).delete(delete_category_endpoint),
        )
        .route(
            endpoints::SUBCATEGORIES,
            get(get_subcategories_endpoint).post(create_subcategory_endpoint),
        )
        .route(
            endpoints::CATEGORY_SUGGESTIONS,
            get(get_category_suggestions_endpoint),
        )
        .route(endpoints::BUDGET_API, post(save_budget_endpoint))
        .route(endpoints::SINKING_FUNDS_API, get(get_sinking_funds_endpoint))
        .route(
            endpoints::CONTRIBUTE_TO_SINKING_FUNDS,
            post(contribute_to_sinking_funds_endpoint),
        )
        .route(
            endpoints::SINKING_FUND,
            axum::routing::put(update_sinking_fund_endpoint),
        )
        .route(
            endpoints::SINKING_FUND_TRANSACTIONS,
            post(create_fund_transaction_endpoint),
        );

    page_routes
        .merge(api_routes)
        .nest_service(endpoints::STATIC, ServeDir::new("static/"))
        .fallback(get_404_not_found)
        .with_state(state)
}

/// The root path '/' redirects to the dashboard page.
async fn get_index_page() -> Redirect {
    Redirect::to(endpoints::DASHBOARD_VIEW)
}
