//! Card components for the sinking funds on the dashboard.
//!
//! Each card shows the fund's balance and progress towards its target, a form
//! for recording a contribution or withdrawal and a form for editing the
//! target and monthly allocation.

use maud::{Markup, html};

use crate::{
    dashboard::fund_progress,
    endpoints::{self, format_endpoint},
    html::{BUTTON_PRIMARY_STYLE, CARD_STYLE, FORM_TEXT_INPUT_STYLE, format_currency},
    sinking_fund::SinkingFund,
};

const SMALL_INPUT_STYLE: &str = "block w-full p-1.5 rounded text-sm \
    text-gray-900 dark:text-white bg-gray-50 dark:bg-gray-700 \
    border border-gray-300 dark:border-gray-600";

/// Renders the sinking fund section, with the monthly contribution button
/// when this month's contributions have not been made.
pub(super) fn sinking_fund_cards_view(
    funds: &[SinkingFund],
    show_contribute_button: bool,
) -> Markup {
    let monthly_total: f64 = funds.iter().map(|fund| fund.monthly_allocation).sum();

    html! {
        section class="w-full mx-auto mb-8"
        {
            div class="flex justify-between items-center flex-wrap gap-4 mb-4"
            {
                h3 class="text-xl font-semibold" { "Sinking Funds" }

                @if show_contribute_button {
                    button
                        type="button"
                        id="contribute-button"
                        hx-post=(endpoints::CONTRIBUTE_TO_SINKING_FUNDS)
                        hx-target-error="#alert-container"
                        hx-confirm={
                            "Contribute " (format_currency(monthly_total))
                            " to your sinking funds for this month?"
                        }
                        class="px-4 py-2 bg-green-600 hover:bg-green-700 text-white rounded"
                    {
                        "Make Monthly Contributions"
                    }
                } @else {
                    span class="text-sm text-green-700 dark:text-green-400"
                    {
                        "This month's contributions have been made."
                    }
                }
            }

            @if funds.is_empty() {
                p class="text-gray-600 dark:text-gray-400" { "No active sinking funds." }
            } @else {
                div class="grid grid-cols-1 md:grid-cols-2 xl:grid-cols-3 gap-4"
                {
                    @for fund in funds {
                        (fund_card(fund))
                    }
                }
            }
        }
    }
}

fn fund_card(fund: &SinkingFund) -> Markup {
    let progress = fund_progress(fund);
    let bar_width = progress.clamp(0.0, 100.0);
    let transactions_url = format_endpoint(endpoints::SINKING_FUND_TRANSACTIONS, fund.id);
    let settings_url = format_endpoint(endpoints::SINKING_FUND, fund.id);

    html! {
        div class=(CARD_STYLE) data-fund-id=(fund.id)
        {
            div class="flex justify-between items-baseline"
            {
                h4 class="font-semibold" { (fund.name) }
                span class="text-sm" { (progress) "%" }
            }

            p class="text-2xl font-bold mt-1" { (format_currency(fund.current_balance)) }

            p class="text-sm text-gray-600 dark:text-gray-400"
            {
                "of " (format_currency(fund.target_amount))
                ", " (format_currency(fund.monthly_allocation)) " per month"
            }

            div class="w-full h-2 mt-2 bg-gray-200 rounded-full dark:bg-gray-700"
            {
                div
                    class="h-2 bg-blue-600 rounded-full"
                    style={ "width: " (bar_width) "%" }
                {}
            }

            details class="mt-4"
            {
                summary class="cursor-pointer text-sm" { "Contribute or withdraw" }

                form
                    hx-post=(transactions_url)
                    hx-target-error="#alert-container"
                    class="grid grid-cols-2 gap-2 mt-2"
                {
                    select
                        name="transaction_type"
                        aria-label="Transaction type"
                        class=(SMALL_INPUT_STYLE)
                    {
                        option value="contribution" { "Contribution" }
                        option value="withdrawal" { "Withdrawal" }
                    }

                    input
                        type="number"
                        name="amount"
                        step="0.01"
                        min="0.01"
                        placeholder="0.00"
                        required
                        aria-label="Amount"
                        class=(SMALL_INPUT_STYLE);

                    input
                        type="text"
                        name="description"
                        placeholder="Description"
                        aria-label="Description"
                        class={ (SMALL_INPUT_STYLE) " col-span-2" };

                    input
                        type="date"
                        name="date"
                        aria-label="Date"
                        class=(SMALL_INPUT_STYLE);

                    button type="submit" class=(BUTTON_PRIMARY_STYLE) { "Save" }
                }
            }

            details class="mt-2"
            {
                summary class="cursor-pointer text-sm" { "Settings" }

                form
                    hx-put=(settings_url)
                    hx-target-error="#alert-container"
                    class="grid grid-cols-2 gap-2 mt-2"
                {
                    label class="text-sm"
                    {
                        "Target"
                        input
                            type="number"
                            name="target_amount"
                            step="0.01"
                            min="0"
                            value=(format!("{:.2}", fund.target_amount))
                            class=(FORM_TEXT_INPUT_STYLE);
                    }

                    label class="text-sm"
                    {
                        "Monthly"
                        input
                            type="number"
                            name="monthly_allocation"
                            step="0.01"
                            min="0"
                            value=(format!("{:.2}", fund.monthly_allocation))
                            class=(FORM_TEXT_INPUT_STYLE);
                    }

                    button type="submit" class={ (BUTTON_PRIMARY_STYLE) " col-span-2" } { "Update" }
                }
            }
        }
    }
}
