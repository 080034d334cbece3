//! Table views for dashboard data display.
//!
//! Provides the budget vs actual table for the current month and the list of
//! recent transactions.

use maud::{Markup, html};

use crate::{
    dashboard::aggregation::BudgetVsActual,
    endpoints::{self, format_endpoint},
    html::{
        CATEGORY_BADGE_STYLE, LINK_STYLE, TABLE_CELL_STYLE, TABLE_HEADER_STYLE, TABLE_ROW_STYLE,
        format_currency,
    },
    transaction::TransactionTableRow,
};

const TABLE_NUMBER_CELL_STYLE: &str = "px-6 py-4 text-right whitespace-nowrap";
const TABLE_CELL_GREEN_STYLE: &str = "text-green-600 dark:text-green-400";
const TABLE_CELL_RED_STYLE: &str = "text-red-600 dark:text-red-400";

/// Gets the CSS class for coloring amounts (green for positive, red for negative).
fn amount_color_class(amount: f64) -> &'static str {
    if amount >= 0.0 {
        TABLE_CELL_GREEN_STYLE
    } else {
        TABLE_CELL_RED_STYLE
    }
}

/// Renders the budgeted, spent and remaining amounts per category with a totals row.
pub(super) fn budget_vs_actual_table(rows: &[BudgetVsActual]) -> Markup {
    let total_budgeted: f64 = rows.iter().map(|row| row.budgeted).sum();
    let total_spent: f64 = rows.iter().map(|row| row.spent).sum();
    let total_remaining = total_budgeted - total_spent;

    html! {
        div class="w-full"
        {
            h3 class="text-xl font-semibold mb-4" { "Budget vs Actual" }

            div class="overflow-x-auto rounded-lg shadow"
            {
                table id="budget-table" class="w-full text-sm text-left text-gray-500 dark:text-gray-400"
                {
                    thead class=(TABLE_HEADER_STYLE)
                    {
                        tr
                        {
                            th scope="col" class=(TABLE_CELL_STYLE) { "Category" }
                            th scope="col" class=(TABLE_NUMBER_CELL_STYLE) { "Budgeted" }
                            th scope="col" class=(TABLE_NUMBER_CELL_STYLE) { "Spent" }
                            th scope="col" class=(TABLE_NUMBER_CELL_STYLE) { "Remaining" }
                        }
                    }

                    tbody
                    {
                        @for row in rows {
                            tr class=(TABLE_ROW_STYLE)
                            {
                                th scope="row" class={ (TABLE_CELL_STYLE) " font-medium text-gray-900 dark:text-white" }
                                {
                                    (row.category_name)
                                }
                                td class=(TABLE_NUMBER_CELL_STYLE) { (format_currency(row.budgeted)) }
                                td class=(TABLE_NUMBER_CELL_STYLE) { (format_currency(row.spent)) }
                                td class={ (TABLE_NUMBER_CELL_STYLE) " " (amount_color_class(row.remaining)) }
                                {
                                    (format_currency(row.remaining))
                                }
                            }
                        }

                        tr class={ (TABLE_ROW_STYLE) " font-bold" }
                        {
                            th scope="row" class=(TABLE_CELL_STYLE) { "Total" }
                            td class=(TABLE_NUMBER_CELL_STYLE) { (format_currency(total_budgeted)) }
                            td class=(TABLE_NUMBER_CELL_STYLE) { (format_currency(total_spent)) }
                            td class={ (TABLE_NUMBER_CELL_STYLE) " " (amount_color_class(total_remaining)) }
                            {
                                (format_currency(total_remaining))
                            }
                        }
                    }
                }
            }
        }
    }
}

/// Renders the most recent transactions, linking to each one.
pub(super) fn recent_transactions_table(transactions: &[TransactionTableRow]) -> Markup {
    html! {
        div class="w-full"
        {
            div class="flex justify-between items-baseline mb-4"
            {
                h3 class="text-xl font-semibold" { "Recent Transactions" }
                a href=(endpoints::TRANSACTIONS_VIEW) class=(LINK_STYLE) { "View all" }
            }

            @if transactions.is_empty() {
                p class="text-gray-600 dark:text-gray-400"
                {
                    "No transactions yet. "
                    a href=(endpoints::NEW_TRANSACTION_VIEW) class=(LINK_STYLE) { "Add one" }
                    "."
                }
            } @else {
                div class="overflow-x-auto rounded-lg shadow"
                {
                    table id="recent-transactions" class="w-full text-sm text-left text-gray-500 dark:text-gray-400"
                    {
                        thead class=(TABLE_HEADER_STYLE)
                        {
                            tr
                            {
                                th scope="col" class=(TABLE_CELL_STYLE) { "Date" }
                                th scope="col" class=(TABLE_CELL_STYLE) { "Description" }
                                th scope="col" class=(TABLE_CELL_STYLE) { "Category" }
                                th scope="col" class=(TABLE_NUMBER_CELL_STYLE) { "Amount" }
                            }
                        }

                        tbody
                        {
                            @for transaction in transactions {
                                tr class=(TABLE_ROW_STYLE)
                                {
                                    td class=(TABLE_CELL_STYLE) { (transaction.date) }
                                    td class=(TABLE_CELL_STYLE)
                                    {
                                        a
                                            href=(format_endpoint(endpoints::TRANSACTION_VIEW, transaction.id))
                                            class=(LINK_STYLE)
                                        {
                                            (transaction.description)
                                        }
                                    }
                                    td class=(TABLE_CELL_STYLE)
                                    {
                                        span class=(CATEGORY_BADGE_STYLE) { (transaction.category_name) }
                                    }
                                    td class=(TABLE_NUMBER_CELL_STYLE) { (format_currency(transaction.amount)) }
                                }
                            }
                        }
                    }
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use scraper::{Html, Selector};

    use crate::{dashboard::aggregation::BudgetVsActual, html::format_currency};

    use super::budget_vs_actual_table;

    #[test]
    fn totals_row_sums_categories() {
        let rows = [
            BudgetVsActual {
                category_id: 1,
                category_name: "Groceries".to_owned(),
                budgeted: 500.0,
                spent: 200.5,
                remaining: 299.5,
            },
            BudgetVsActual {
                category_id: 2,
                category_name: "Car Expenses".to_owned(),
                budgeted: 50.0,
                spent: 60.0,
                remaining: -10.0,
            },
        ];

        let html = Html::parse_fragment(&budget_vs_actual_table(&rows).into_string());

        let last_row = html
            .select(&Selector::parse("tbody tr").unwrap())
            .last()
            .unwrap();
        let cells = last_row
            .select(&Selector::parse("th, td").unwrap())
            .map(|cell| cell.text().collect::<String>().trim().to_owned())
            .collect::<Vec<_>>();
        assert_eq!(cells.len(), 4);
        assert_eq!(cells[0], "Total");
        assert_eq!(cells[3], format_currency(289.5));

        let overspent = html
            .select(&Selector::parse("td.text-red-600").unwrap())
            .map(|cell| cell.text().collect::<String>().trim().to_owned())
            .collect::<Vec<_>>();
        assert_eq!(overspent, vec![format_currency(-10.0)]);
    }
}
