//! Dashboard HTTP handlers and view rendering.
//!
//! This module contains:
//! - The route handler for the dashboard, the landing page for the current month
//! - The route handler for the analytics page with charts for the current month
//! - HTML view functions for rendering both pages

use std::sync::{Arc, Mutex};

use axum::{
    extract::{FromRef, State},
    response::{IntoResponse, Response},
};
use maud::{Markup, html};
use rusqlite::Connection;
use time::Date;

use crate::{
    AppState, Error,
    budget::{ensure_current_period, get_budget_period_id},
    dashboard::{
        aggregation::{
            BudgetVsActual, CategorySpending, get_budget_vs_actual, get_category_spending,
        },
        cards::sinking_fund_cards_view,
        charts::{
            DashboardChart, budget_vs_actual_chart, category_spending_chart, charts_script,
            charts_view, sinking_fund_chart,
        },
        tables::{budget_vs_actual_table, recent_transactions_table},
    },
    db::run_blocking,
    endpoints,
    html::{HeadElement, LINK_STYLE, base},
    month::MonthYear,
    navigation::NavBar,
    sinking_fund::{SinkingFund, contributions_made, get_active_funds, reconcile_balances},
    timezone::local_today,
    transaction::{TransactionTableRow, get_recent_transactions},
};

/// The number of transactions shown on the dashboard.
const RECENT_TRANSACTION_LIMIT: u32 = 10;

/// The state needed for displaying the dashboard and analytics pages.
///
/// Contains the database connection and timezone information required
/// by dashboard handlers.
#[derive(Debug, Clone)]
pub struct DashboardState {
    /// The database connection for reading budgets, transactions and funds.
    pub db_connection: Arc<Mutex<Connection>>,
    /// The local timezone as a canonical timezone name, e.g. "Pacific/Auckland".
    pub local_timezone: String,
}

impl FromRef<AppState> for DashboardState {
    fn from_ref(state: &AppState) -> Self {
        Self {
            db_connection: state.db_connection.clone(),
            local_timezone: state.local_timezone.clone(),
        }
    }
}

/// Holds all the data needed to render the dashboard.
struct DashboardData {
    month: MonthYear,
    budget_rows: Vec<BudgetVsActual>,
    recent_transactions: Vec<TransactionTableRow>,
    funds: Vec<SinkingFund>,
    show_contribute_button: bool,
}

/// Display the budget overview for the current month.
///
/// Loading the dashboard creates the month's budget period if needed and
/// corrects any sinking fund balance that disagrees with the fund's transactions.
pub async fn get_dashboard_page(State(state): State<DashboardState>) -> Result<Response, Error> {
    let today = local_today(&state.local_timezone)?;

    // Ensuring the period may wait out a locked database.
    let data = run_blocking(&state.db_connection, move |connection| {
        load_dashboard_data(today, connection)
    })
    .await?;

    Ok(dashboard_view(&data).into_response())
}

fn load_dashboard_data(today: Date, connection: &Connection) -> Result<DashboardData, Error> {
    let month = MonthYear::from_date(today);

    let budget_period_id = ensure_current_period(today, connection)
        .inspect_err(|error| tracing::error!("could not ensure budget period for {month}: {error}"))?;

    Ok(DashboardData {
        month,
        budget_rows: get_budget_vs_actual(budget_period_id, month, connection)?,
        recent_transactions: get_recent_transactions(RECENT_TRANSACTION_LIMIT, connection)?,
        funds: reconcile_balances(connection)
            .inspect_err(|error| tracing::error!("could not reconcile sinking funds: {error}"))?,
        show_contribute_button: !contributions_made(month, connection)?,
    })
}

fn dashboard_view(data: &DashboardData) -> Markup {
    let nav_bar = NavBar::new(endpoints::DASHBOARD_VIEW).into_html();

    let content = html!(
        (nav_bar)

        div
            id="dashboard-content"
            class="flex flex-col items-center gap-8 px-2 lg:px-6 lg:py-8 mx-auto
                max-w-screen-xl text-gray-900 dark:text-white"
        {
            header class="w-full flex justify-between items-end flex-wrap gap-4"
            {
                h2 class="text-2xl font-bold" { (data.month) }

                div class="flex gap-4"
                {
                    a href=(endpoints::NEW_TRANSACTION_VIEW) class=(LINK_STYLE) { "Add Transaction" }
                    a href=(endpoints::BUDGET_VIEW) class=(LINK_STYLE) { "Edit Budget" }
                }
            }

            (budget_vs_actual_table(&data.budget_rows))

            (sinking_fund_cards_view(&data.funds, data.show_contribute_button))

            (recent_transactions_table(&data.recent_transactions))
        }
    );

    base("Dashboard", &[], &content)
}

/// Display charts of this month's spending and the sinking funds' progress.
pub async fn get_analytics_page(State(state): State<DashboardState>) -> Result<Response, Error> {
    let month = MonthYear::from_date(local_today(&state.local_timezone)?);

    let connection = state
        .db_connection
        .lock()
        .inspect_err(|error| tracing::error!("could not acquire database lock: {error}"))
        .map_err(|_| Error::DatabaseLockError)?;

    let category_spending = get_category_spending(month, &connection)
        .inspect_err(|error| tracing::error!("could not get category spending: {error}"))?;

    // Analytics only reads, so a month without a period has nothing budgeted.
    let budget_rows = match get_budget_period_id(month, &connection) {
        Ok(budget_period_id) => get_budget_vs_actual(budget_period_id, month, &connection)?,
        Err(Error::NotFound) => Vec::new(),
        Err(error) => return Err(error),
    };

    let funds = get_active_funds(&connection)?;

    let charts = build_analytics_charts(&category_spending, &budget_rows, &funds);

    Ok(analytics_view(month, &charts).into_response())
}

/// Creates the analytics charts.
///
/// The chart options are serialized to JSON for ECharts consumption.
fn build_analytics_charts(
    category_spending: &[CategorySpending],
    budget_rows: &[BudgetVsActual],
    funds: &[SinkingFund],
) -> [DashboardChart; 3] {
    [
        DashboardChart {
            id: "category-spending-chart",
            options: category_spending_chart(category_spending).to_string(),
        },
        DashboardChart {
            id: "budget-vs-actual-chart",
            options: budget_vs_actual_chart(budget_rows).to_string(),
        },
        DashboardChart {
            id: "sinking-fund-chart",
            options: sinking_fund_chart(funds).to_string(),
        },
    ]
}

fn analytics_view(month: MonthYear, charts: &[DashboardChart]) -> Markup {
    let nav_bar = NavBar::new(endpoints::ANALYTICS_VIEW).into_html();

    let content = html!(
        (nav_bar)

        div
            class="flex flex-col items-center px-2 lg:px-6 lg:py-8 mx-auto
                max-w-screen-xl text-gray-900 dark:text-white"
        {
            h2 class="w-full text-2xl font-bold mb-4" { "Analytics for " (month) }

            (charts_view(charts))
        }
    );

    let scripts = [
        HeadElement::ScriptLink("/static/echarts.6.0.0.min.js".to_owned()),
        charts_script(charts),
    ];

    base("Analytics", &scripts, &content)
}
