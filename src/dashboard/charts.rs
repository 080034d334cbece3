//! Chart generation and rendering for the analytics page.
//!
//! This module creates interactive ECharts visualizations for the current month:
//! - **Category Spending Chart**: Pie chart of spending per category
//! - **Budget vs Actual Chart**: Budgeted and spent amounts for budgeted categories
//! - **Sinking Fund Chart**: Each fund's balance as a percentage of its target
//!
//! Each chart is generated as JSON configuration for the ECharts library and
//! rendered with corresponding HTML containers and JavaScript initialization code.

use charming::{
    Chart,
    component::{Axis, Grid, Legend, Title},
    element::{
        AxisLabel, AxisPointer, AxisPointerType, AxisType, Emphasis, EmphasisFocus, JsFunction,
        Label, Tooltip, Trigger,
    },
    series::{Bar, Pie},
};
use maud::{Markup, PreEscaped, html};

use crate::{
    dashboard::aggregation::{BudgetVsActual, CategorySpending, fund_progress},
    html::HeadElement,
    sinking_fund::SinkingFund,
};

/// A dashboard chart with its HTML container ID and ECharts configuration.
pub(super) struct DashboardChart {
    /// The HTML element ID to use for the chart (kebab-case)
    pub id: &'static str,
    /// The ECharts configuration as a JSON string
    pub options: String,
}

/// Renders the HTML containers for the charts.
pub(super) fn charts_view(charts: &[DashboardChart]) -> Markup {
    html!(
        section
            id="charts"
            class="w-full mx-auto mb-4"
        {
            div class="grid grid-cols-1 xl:grid-cols-2 gap-4"
            {
                @for chart in charts {
                    div
                        id=(chart.id)
                        class="min-h-[380px] rounded dark:bg-gray-100"
                    {}
                }
            }
        }
    )
}

/// Generates JavaScript initialization code for the charts.
///
/// Creates scripts that initialize ECharts instances with dark mode support
/// and responsive resizing.
pub(super) fn charts_script(charts: &[DashboardChart]) -> HeadElement {
    let script_content = charts
        .iter()
        .map(|chart| {
            format!(
                r#"(function() {{
                    const chartDom = document.getElementById("{}");
                    const chart = echarts.init(chartDom);
                    const option = {};
                    chart.setOption(option);

                    window.addEventListener('resize', chart.resize);

                    const darkModeMediaQuery = window.matchMedia('(prefers-color-scheme: dark)');
                    const updateTheme = () => {{
                        const isDarkMode = darkModeMediaQuery.matches;
                        chart.setTheme(isDarkMode ? 'dark' : 'default');
                    }}
                    darkModeMediaQuery.addEventListener('change', updateTheme);
                    updateTheme();
                }})();"#,
                chart.id, chart.options
            )
        })
        .collect::<Vec<_>>()
        .join("\n");

    let wrapped_script = format!(
        "document.addEventListener('DOMContentLoaded', function() {{\n{}\n}});",
        script_content
    );

    HeadElement::ScriptSource(PreEscaped(wrapped_script))
}

pub(super) fn category_spending_chart(spending: &[CategorySpending]) -> Chart {
    let data = spending
        .iter()
        .map(|row| (row.total_spent, row.category_name.as_str()))
        .collect::<Vec<_>>();

    Chart::new()
        .title(Title::new().text("Spending by Category").subtext("This month"))
        .tooltip(
            Tooltip::new()
                .trigger(Trigger::Item)
                .value_formatter(currency_formatter()),
        )
        .legend(Legend::new().bottom("0%"))
        .series(
            Pie::new()
                .name("Spent")
                .radius(vec!["40%", "70%"])
                .label(Label::new().show(false))
                .data(data),
        )
}

/// Only categories with a positive budget are shown.
pub(super) fn budget_vs_actual_chart(rows: &[BudgetVsActual]) -> Chart {
    let budgeted_rows = rows
        .iter()
        .filter(|row| row.budgeted > 0.0)
        .collect::<Vec<_>>();
    let labels = budgeted_rows
        .iter()
        .map(|row| row.category_name.clone())
        .collect::<Vec<_>>();
    let budgeted = budgeted_rows
        .iter()
        .map(|row| row.budgeted)
        .collect::<Vec<_>>();
    let spent = budgeted_rows
        .iter()
        .map(|row| row.spent)
        .collect::<Vec<_>>();

    Chart::new()
        .title(Title::new().text("Budget vs Actual").subtext("This month"))
        .tooltip(currency_tooltip())
        .legend(Legend::new().right("4%"))
        .grid(
            Grid::new()
                .left("3%")
                .right("4%")
                .bottom("3%")
                .contain_label(true),
        )
        .x_axis(Axis::new().type_(AxisType::Category).data(labels))
        .y_axis(
            Axis::new()
                .type_(AxisType::Value)
                .axis_label(AxisLabel::new().formatter(currency_formatter())),
        )
        .series(
            Bar::new()
                .name("Budgeted")
                .emphasis(Emphasis::new().focus(EmphasisFocus::Series))
                .data(budgeted),
        )
        .series(
            Bar::new()
                .name("Spent")
                .emphasis(Emphasis::new().focus(EmphasisFocus::Series))
                .data(spent),
        )
}

pub(super) fn sinking_fund_chart(funds: &[SinkingFund]) -> Chart {
    let labels = funds
        .iter()
        .map(|fund| fund.name.clone())
        .collect::<Vec<_>>();
    let progress = funds.iter().map(fund_progress).collect::<Vec<_>>();

    Chart::new()
        .title(Title::new().text("Sinking Funds").subtext("Progress towards target"))
        .tooltip(
            Tooltip::new()
                .trigger(Trigger::Axis)
                .value_formatter(JsFunction::new_with_args("value", "return value + '%';"))
                .axis_pointer(AxisPointer::new().type_(AxisPointerType::Shadow)),
        )
        .grid(
            Grid::new()
                .left("3%")
                .right("4%")
                .bottom("3%")
                .contain_label(true),
        )
        .x_axis(Axis::new().type_(AxisType::Value).max(100))
        .y_axis(Axis::new().type_(AxisType::Category).data(labels))
        .series(Bar::new().name("Progress").data(progress))
}

#[inline]
fn currency_formatter() -> JsFunction {
    JsFunction::new_with_args(
        "number",
        "const currencyFormatter = new Intl.NumberFormat('en-US', {
              style: 'currency',
              currency: 'USD'
            });
            return (number) ? currencyFormatter.format(number) : \"-\";",
    )
}

/// Creates a tooltip configuration for currency values
fn currency_tooltip() -> Tooltip {
    Tooltip::new()
        .trigger(Trigger::Axis)
        .value_formatter(currency_formatter())
        .axis_pointer(AxisPointer::new().type_(AxisPointerType::Shadow))
}

#[cfg(test)]
mod tests {
    use crate::{
        dashboard::aggregation::{BudgetVsActual, CategorySpending},
        sinking_fund::SinkingFund,
    };

    use super::{budget_vs_actual_chart, category_spending_chart, sinking_fund_chart};

    #[test]
    fn budget_vs_actual_skips_unbudgeted_categories() {
        let rows = [
            BudgetVsActual {
                category_id: 1,
                category_name: "Groceries".to_owned(),
                budgeted: 500.0,
                spent: 200.0,
                remaining: 300.0,
            },
            BudgetVsActual {
                category_id: 2,
                category_name: "Hobbies".to_owned(),
                budgeted: 0.0,
                spent: 45.0,
                remaining: -45.0,
            },
        ];

        let options = budget_vs_actual_chart(&rows).to_string();

        assert!(options.contains("Groceries"));
        assert!(!options.contains("Hobbies"), "got chart options {options}");
    }

    #[test]
    fn category_spending_lists_every_category() {
        let spending = [
            CategorySpending {
                category_name: "Groceries".to_owned(),
                total_spent: 200.0,
            },
            CategorySpending {
                category_name: "Car Expenses".to_owned(),
                total_spent: 60.0,
            },
        ];

        let options = category_spending_chart(&spending).to_string();

        assert!(options.contains("Groceries"));
        assert!(options.contains("Car Expenses"));
    }

    #[test]
    fn sinking_fund_chart_uses_progress() {
        let funds = [SinkingFund {
            id: 1,
            name: "Emergency Fund".to_owned(),
            target_amount: 200_000.0,
            current_balance: 3894.0,
            monthly_allocation: 1947.0,
            is_active: true,
        }];

        let options = sinking_fund_chart(&funds).to_string();

        assert!(options.contains("Emergency Fund"));
        assert!(options.contains("1.9"), "got chart options {options}");
    }
}
