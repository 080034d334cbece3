//! The budget setup page, where the current month's allocations and the
//! sinking fund settings are edited together.

use std::{
    collections::{BTreeMap, HashMap},
    sync::{Arc, Mutex},
};

use axum::{
    extract::{FromRef, State},
    http::StatusCode,
    response::{IntoResponse, Response},
};
use axum_extra::extract::Form;
use axum_htmx::HxRedirect;
use maud::{Markup, html};
use rusqlite::Connection;

use crate::{
    AppState, Error,
    budget::{BudgetPeriodId, ensure_current_period, get_allocations, set_allocation},
    category::{Category, CategoryId, get_all_categories},
    database_id::DatabaseId,
    db::run_blocking,
    endpoints,
    html::{
        BUTTON_PRIMARY_STYLE, FORM_TEXT_INPUT_STYLE, PAGE_CONTAINER_STYLE, TABLE_CELL_STYLE,
        TABLE_HEADER_STYLE, TABLE_ROW_STYLE, base, dollar_input_styles, format_currency,
        loading_spinner,
    },
    month::MonthYear,
    navigation::NavBar,
    sinking_fund::{SinkingFund, SinkingFundId, get_active_funds, update_fund_settings},
    timezone::local_today,
};

const BUDGET_PREFIX: &str = "budget_";
const FUND_TARGET_PREFIX: &str = "sf_target_";
const FUND_MONTHLY_PREFIX: &str = "sf_monthly_";

/// The state needed for the budget setup page and its form.
#[derive(Debug, Clone)]
pub struct BudgetState {
    pub db_connection: Arc<Mutex<Connection>>,
    /// The local timezone as a canonical timezone name, e.g. "Pacific/Auckland".
    pub local_timezone: String,
}

impl FromRef<AppState> for BudgetState {
    fn from_ref(state: &AppState) -> Self {
        Self {
            db_connection: state.db_connection.clone(),
            local_timezone: state.local_timezone.clone(),
        }
    }
}

/// A category and the amount budgeted for it this month.
struct CategoryBudget {
    category: Category,
    budgeted_amount: f64,
}

/// Render the budget setup page for the current month.
pub async fn get_budget_page(State(state): State<BudgetState>) -> Result<Response, Error> {
    let today = local_today(&state.local_timezone)?;
    let month = MonthYear::from_date(today);

    let (category_budgets, funds) = run_blocking(&state.db_connection, move |connection| {
        let period_id = ensure_current_period(today, connection)?;
        let category_budgets = get_category_budgets(period_id, connection)?;
        let funds = get_active_funds(connection)?;

        Ok((category_budgets, funds))
    })
    .await?;

    Ok(budget_view(month, &category_budgets, &funds).into_response())
}

fn get_category_budgets(
    period_id: BudgetPeriodId,
    connection: &Connection,
) -> Result<Vec<CategoryBudget>, Error> {
    let budgeted_amounts: HashMap<CategoryId, f64> = get_allocations(period_id, connection)?
        .into_iter()
        .filter(|allocation| allocation.subcategory_id.is_none())
        .map(|allocation| (allocation.category_id, allocation.budgeted_amount))
        .collect();

    let category_budgets = get_all_categories(connection)
        .inspect_err(|error| tracing::error!("could not get categories: {error}"))?
        .into_iter()
        .map(|category| CategoryBudget {
            budgeted_amount: budgeted_amounts
                .get(&category.id)
                .copied()
                .unwrap_or_default(),
            category,
        })
        .collect();

    Ok(category_budgets)
}

fn budget_view(month: MonthYear, category_budgets: &[CategoryBudget], funds: &[SinkingFund]) -> Markup {
    let nav_bar = NavBar::new(endpoints::BUDGET_VIEW).into_html();
    let total_budgeted: f64 = category_budgets
        .iter()
        .map(|budget| budget.budgeted_amount)
        .sum();
    let total_monthly: f64 = funds.iter().map(|fund| fund.monthly_allocation).sum();

    let content = html!(
        (nav_bar)

        main class=(PAGE_CONTAINER_STYLE)
        {
            form
                hx-post=(endpoints::BUDGET_API)
                hx-target-error="#alert-container"
                class="space-y-6 w-full lg:max-w-5xl"
            {
                header class="flex justify-between flex-wrap items-end"
                {
                    h1 class="text-xl font-bold" { "Budget for " (month) }

                    p class="text-sm text-gray-600 dark:text-gray-400"
                    {
                        "Budgeted: " (format_currency(total_budgeted))
                        " · Sinking funds: " (format_currency(total_monthly))
                    }
                }

                section class="overflow-x-auto dark:bg-gray-800"
                {
                    h2 class="text-lg font-semibold mb-2" { "Categories" }

                    table class="w-full text-sm text-left text-gray-500 dark:text-gray-400"
                    {
                        thead class=(TABLE_HEADER_STYLE)
                        {
                            tr
                            {
                                th scope="col" class=(TABLE_CELL_STYLE) { "Category" }
                                th scope="col" class=(TABLE_CELL_STYLE) { "Budgeted" }
                            }
                        }

                        tbody
                        {
                            @for budget in category_budgets {
                                @let input_name = format!("{BUDGET_PREFIX}{}", budget.category.id);

                                tr class=(TABLE_ROW_STYLE)
                                {
                                    td class=(TABLE_CELL_STYLE)
                                    {
                                        label for=(input_name) { (budget.category.name) }
                                    }

                                    td class=(TABLE_CELL_STYLE)
                                    {
                                        div class="input-wrapper w-full"
                                        {
                                            input
                                                id=(input_name)
                                                name=(input_name)
                                                type="number"
                                                step="0.01"
                                                min="0"
                                                value=(format!("{:.2}", budget.budgeted_amount))
                                                class=(FORM_TEXT_INPUT_STYLE);
                                        }
                                    }
                                }
                            }

                            @if category_budgets.is_empty() {
                                tr
                                {
                                    td colspan="2" class="px-6 py-4 text-center"
                                    {
                                        "No categories yet."
                                    }
                                }
                            }
                        }
                    }
                }

                @if !funds.is_empty() {
                    section class="overflow-x-auto dark:bg-gray-800"
                    {
                        h2 class="text-lg font-semibold mb-2" { "Sinking Funds" }

                        table class="w-full text-sm text-left text-gray-500 dark:text-gray-400"
                        {
                            thead class=(TABLE_HEADER_STYLE)
                            {
                                tr
                                {
                                    th scope="col" class=(TABLE_CELL_STYLE) { "Fund" }
                                    th scope="col" class=(TABLE_CELL_STYLE) { "Balance" }
                                    th scope="col" class=(TABLE_CELL_STYLE) { "Target" }
                                    th scope="col" class=(TABLE_CELL_STYLE) { "Monthly" }
                                }
                            }

                            tbody
                            {
                                @for fund in funds {
                                    tr class=(TABLE_ROW_STYLE)
                                    {
                                        td class=(TABLE_CELL_STYLE) { (fund.name) }

                                        td class=(TABLE_CELL_STYLE)
                                        {
                                            (format_currency(fund.current_balance))
                                        }

                                        td class=(TABLE_CELL_STYLE)
                                        {
                                            div class="input-wrapper w-full"
                                            {
                                                input
                                                    name=(format!("{FUND_TARGET_PREFIX}{}", fund.id))
                                                    type="number"
                                                    step="0.01"
                                                    min="0"
                                                    aria-label=(format!("{} target", fund.name))
                                                    value=(format!("{:.2}", fund.target_amount))
                                                    class=(FORM_TEXT_INPUT_STYLE);
                                            }
                                        }

                                        td class=(TABLE_CELL_STYLE)
                                        {
                                            div class="input-wrapper w-full"
                                            {
                                                input
                                                    name=(format!("{FUND_MONTHLY_PREFIX}{}", fund.id))
                                                    type="number"
                                                    step="0.01"
                                                    min="0"
                                                    aria-label=(format!("{} monthly allocation", fund.name))
                                                    value=(format!("{:.2}", fund.monthly_allocation))
                                                    class=(FORM_TEXT_INPUT_STYLE);
                                            }
                                        }
                                    }
                                }
                            }
                        }
                    }
                }

                button type="submit" class=(BUTTON_PRIMARY_STYLE)
                {
                    span class="inline htmx-indicator" { (loading_spinner()) }
                    " Save Budget"
                }
            }
        }
    );

    base("Budget", &[dollar_input_styles()], &content)
}

/// The parsed budget form.
#[derive(Debug, Default, PartialEq)]
struct BudgetForm {
    allocations: Vec<(CategoryId, f64)>,
    /// The new target and monthly allocation per fund, `None` if not submitted.
    fund_settings: BTreeMap<SinkingFundId, (Option<f64>, Option<f64>)>,
}

/// Parse the `budget_<category id>`, `sf_target_<fund id>` and
/// `sf_monthly_<fund id>` fields of the budget form.
///
/// Empty amounts count as zero and other fields are ignored.
fn parse_budget_form(fields: &HashMap<String, String>) -> Result<BudgetForm, Error> {
    let mut form = BudgetForm::default();

    for (key, value) in fields {
        if let Some(category_id) = key.strip_prefix(BUDGET_PREFIX) {
            form.allocations
                .push((parse_id(key, category_id)?, parse_amount(key, value)?));
        } else if let Some(fund_id) = key.strip_prefix(FUND_TARGET_PREFIX) {
            form.fund_settings
                .entry(parse_id(key, fund_id)?)
                .or_default()
                .0 = Some(parse_amount(key, value)?);
        } else if let Some(fund_id) = key.strip_prefix(FUND_MONTHLY_PREFIX) {
            form.fund_settings
                .entry(parse_id(key, fund_id)?)
                .or_default()
                .1 = Some(parse_amount(key, value)?);
        }
    }

    form.allocations.sort_by_key(|(category_id, _)| *category_id);

    Ok(form)
}

fn parse_id(key: &str, id: &str) -> Result<DatabaseId, Error> {
    id.parse()
        .map_err(|_| Error::InvalidFormValue(key.to_owned()))
}

fn parse_amount(key: &str, value: &str) -> Result<f64, Error> {
    let value = value.trim();

    if value.is_empty() {
        return Ok(0.0);
    }

    value
        .parse()
        .map_err(|_| Error::InvalidFormValue(key.to_owned()))
}

/// Save the current month's allocations and the sinking fund settings,
/// redirects to the dashboard.
///
/// Either every change is saved or none are.
pub async fn save_budget_endpoint(
    State(state): State<BudgetState>,
    Form(fields): Form<HashMap<String, String>>,
) -> Response {
    let form = match parse_budget_form(&fields) {
        Ok(form) => form,
        Err(error) => return error.into_alert_response(),
    };

    let today = match local_today(&state.local_timezone) {
        Ok(today) => today,
        Err(error) => return error.into_alert_response(),
    };

    let result = run_blocking(&state.db_connection, move |connection| {
        save_budget(&form, today, connection)
    })
    .await;

    if let Err(error) = result {
        tracing::error!("could not save budget: {error}");
        return error.into_alert_response();
    }

    (
        HxRedirect(endpoints::DASHBOARD_VIEW.to_owned()),
        StatusCode::SEE_OTHER,
    )
        .into_response()
}

fn save_budget(form: &BudgetForm, today: time::Date, connection: &Connection) -> Result<(), Error> {
    let period_id = ensure_current_period(today, connection)?;
    let transaction = connection.unchecked_transaction()?;

    for &(category_id, amount) in &form.allocations {
        set_allocation(period_id, category_id, None, amount, &transaction)?;
    }

    for (&fund_id, &(target_amount, monthly_allocation)) in &form.fund_settings {
        update_fund_settings(fund_id, target_amount, monthly_allocation, &transaction)?;
    }

    transaction.commit()?;

    tracing::info!(
        "saved {} budget allocations and {} sinking fund settings",
        form.allocations.len(),
        form.fund_settings.len()
    );

    Ok(())
}

#[cfg(test)]
mod tests {
    use std::{
        collections::HashMap,
        sync::{Arc, Mutex},
    };

    use axum::{extract::State, http::StatusCode};
    use axum_extra::extract::Form;
    use scraper::Selector;

    use crate::{
        Error,
        budget::{get_allocations, get_budget_period_id},
        category::{CategoryName, create_category},
        db::get_test_connection,
        endpoints,
        month::MonthYear,
        sinking_fund::{create_sinking_fund, get_sinking_fund},
        test_utils::{
            assert_hx_endpoint, assert_hx_redirect, assert_valid_html, must_get_form,
            parse_html_document,
        },
        timezone::local_today,
    };

    use super::{BudgetForm, BudgetState, get_budget_page, parse_budget_form, save_budget_endpoint};

    fn get_state() -> BudgetState {
        let connection = get_test_connection();
        create_category(CategoryName::new_unchecked("Groceries"), &connection).unwrap();
        create_category(CategoryName::new_unchecked("Car Expenses"), &connection).unwrap();
        create_sinking_fund("Vehicle", 100_000.0, 24_500.0, &connection).unwrap();

        BudgetState {
            db_connection: Arc::new(Mutex::new(connection)),
            local_timezone: "Etc/UTC".to_owned(),
        }
    }

    fn fields(pairs: &[(&str, &str)]) -> HashMap<String, String> {
        pairs
            .iter()
            .map(|(key, value)| (key.to_string(), value.to_string()))
            .collect()
    }

    #[test]
    fn parses_budget_and_fund_fields() {
        let form = parse_budget_form(&fields(&[
            ("budget_2", "150.5"),
            ("budget_1", ""),
            ("sf_target_3", "1000"),
            ("sf_monthly_3", "100"),
            ("sf_monthly_4", "25"),
            ("csrf", "ignored"),
        ]))
        .unwrap();

        assert_eq!(
            form,
            BudgetForm {
                allocations: vec![(1, 0.0), (2, 150.5)],
                fund_settings: [(3, (Some(1000.0), Some(100.0))), (4, (None, Some(25.0)))]
                    .into_iter()
                    .collect(),
            }
        );
    }

    #[test]
    fn rejects_non_numeric_amounts_and_ids() {
        assert_eq!(
            parse_budget_form(&fields(&[("budget_1", "lots")])),
            Err(Error::InvalidFormValue("budget_1".to_owned()))
        );
        assert_eq!(
            parse_budget_form(&fields(&[("sf_target_x", "1")])),
            Err(Error::InvalidFormValue("sf_target_x".to_owned()))
        );
    }

    #[tokio::test]
    async fn page_has_inputs_for_categories_and_funds() {
        let response = get_budget_page(State(get_state())).await.unwrap();

        assert_eq!(response.status(), StatusCode::OK);
        let html = parse_html_document(response).await;
        assert_valid_html(&html);
        let form = must_get_form(&html);
        assert_hx_endpoint(&form, endpoints::BUDGET_API, "hx-post");

        for name in ["budget_1", "budget_2", "sf_target_1", "sf_monthly_1"] {
            let selector = Selector::parse(&format!("input[name={name}]")).unwrap();
            assert!(
                form.select(&selector).next().is_some(),
                "want input named {name}"
            );
        }

        let monthly = form
            .select(&Selector::parse("input[name=sf_monthly_1]").unwrap())
            .next()
            .unwrap();
        assert_eq!(monthly.value().attr("value"), Some("24500.00"));
    }

    #[tokio::test]
    async fn saves_allocations_and_fund_settings() {
        let state = get_state();

        let response = save_budget_endpoint(
            State(state.clone()),
            Form(fields(&[
                ("budget_1", "600"),
                ("budget_2", "250.25"),
                ("sf_target_1", "90000"),
                ("sf_monthly_1", "20000"),
            ])),
        )
        .await;

        assert_hx_redirect(&response, endpoints::DASHBOARD_VIEW);
        let connection = state.db_connection.lock().unwrap();
        let month = MonthYear::from_date(local_today("Etc/UTC").unwrap());
        let period_id = get_budget_period_id(month, &connection).unwrap();
        let allocations = get_allocations(period_id, &connection)
            .unwrap()
            .into_iter()
            .map(|allocation| (allocation.category_id, allocation.budgeted_amount))
            .collect::<Vec<_>>();
        assert_eq!(allocations, vec![(1, 600.0), (2, 250.25)]);
        let fund = get_sinking_fund(1, &connection).unwrap();
        assert_eq!(fund.target_amount, 90_000.0);
        assert_eq!(fund.monthly_allocation, 20_000.0);
    }

    #[tokio::test]
    async fn invalid_form_saves_nothing() {
        let state = get_state();

        let response = save_budget_endpoint(
            State(state.clone()),
            Form(fields(&[("budget_1", "600"), ("budget_2", "-5")])),
        )
        .await;

        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        let connection = state.db_connection.lock().unwrap();
        let month = MonthYear::from_date(local_today("Etc/UTC").unwrap());
        let period_id = get_budget_period_id(month, &connection).unwrap();
        assert!(get_allocations(period_id, &connection).unwrap().is_empty());
    }
}
