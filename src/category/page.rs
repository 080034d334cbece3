//! The category management page.

use std::sync::{Arc, Mutex};

use axum::{
    extract::{FromRef, State},
    response::{IntoResponse, Response},
};
use maud::{Markup, PreEscaped, html};
use rusqlite::Connection;

use crate::{
    AppState, Error, endpoints,
    category::{
        CategoryUsage, Subcategory,
        db::{get_category_usage, get_subcategories},
    },
    html::{
        BUTTON_DELETE_STYLE, BUTTON_PRIMARY_STYLE, CATEGORY_BADGE_STYLE, FORM_TEXT_INPUT_STYLE,
        HeadElement, PAGE_CONTAINER_STYLE, TABLE_CELL_STYLE, TABLE_HEADER_STYLE, TABLE_ROW_STYLE,
        base,
    },
    navigation::NavBar,
};

/// The state needed for the category management page.
#[derive(Debug, Clone)]
pub struct CategoriesPageState {
    pub db_connection: Arc<Mutex<Connection>>,
}

impl FromRef<AppState> for CategoriesPageState {
    fn from_ref(state: &AppState) -> Self {
        Self {
            db_connection: state.db_connection.clone(),
        }
    }
}

/// Render the category management page with transaction and budget counts.
pub async fn get_categories_page(
    State(state): State<CategoriesPageState>,
) -> Result<Response, Error> {
    let connection = state
        .db_connection
        .lock()
        .inspect_err(|error| tracing::error!("could not acquire database lock: {error}"))
        .map_err(|_| Error::DatabaseLockError)?;

    let categories = get_category_usage(&connection)
        .and_then(|categories| {
            categories
                .into_iter()
                .map(|usage| {
                    get_subcategories(usage.category.id, &connection)
                        .map(|subcategories| (usage, subcategories))
                })
                .collect::<Result<Vec<_>, Error>>()
        })
        .inspect_err(|error| tracing::error!("Failed to retrieve categories: {error}"))?;

    Ok(categories_view(&categories).into_response())
}

/// Submits the JSON category forms and reloads the page, or shows the `error`
/// field of the response under the form.
fn json_form_script() -> HeadElement {
    HeadElement::ScriptSource(PreEscaped(
        r#"
        document.addEventListener('htmx:afterRequest', function (event) {
            const form = event.detail.elt.closest('[data-json-form]');
            if (!form) {
                return;
            }

            if (event.detail.successful) {
                window.location.reload();
                return;
            }

            let message = 'Something went wrong, please try again.';
            try {
                message = JSON.parse(event.detail.xhr.responseText).error || message;
            } catch (_) {}

            const errorElement = document.getElementById('category-error');
            errorElement.textContent = message;
            errorElement.classList.remove('hidden');
        });
        "#
        .to_owned(),
    ))
}

fn categories_view(categories: &[(CategoryUsage, Vec<Subcategory>)]) -> Markup {
    let nav_bar = NavBar::new(endpoints::CATEGORIES_VIEW).into_html();

    let table_row = |(usage, subcategories): &(CategoryUsage, Vec<Subcategory>)| {
        let category_url = endpoints::format_endpoint(endpoints::CATEGORY, usage.category.id);
        let subcategories_url =
            endpoints::format_endpoint(endpoints::SUBCATEGORIES, usage.category.id);
        let can_delete = usage.transaction_count == 0
            && usage.budget_count == 0
            && usage.sinking_fund.is_none();
        let confirm_message = format!(
            "Are you sure you want to delete '{}'?",
            usage.category.name
        );

        html!(
            tr class=(TABLE_ROW_STYLE)
            {
                td class=(TABLE_CELL_STYLE)
                {
                    span class=(CATEGORY_BADGE_STYLE) { (usage.category.name) }

                    @if let Some(fund) = &usage.sinking_fund {
                        p class="sinking-fund mt-1 text-xs text-gray-500 dark:text-gray-400"
                        {
                            "Sinking fund: " (fund)
                        }
                    }

                    @if !subcategories.is_empty() {
                        ul class="subcategories mt-2 text-xs text-gray-600 dark:text-gray-300"
                        {
                            @for subcategory in subcategories {
                                li { (subcategory.name) }
                            }
                        }
                    }
                }

                td class=(TABLE_CELL_STYLE) { (usage.transaction_count) }

                td class=(TABLE_CELL_STYLE) { (usage.budget_count) }

                td class=(TABLE_CELL_STYLE)
                {
                    div class="flex flex-wrap items-center gap-4"
                    {
                        form
                            hx-put=(category_url)
                            hx-swap="none"
                            data-json-form="true"
                            class="flex gap-2"
                        {
                            input
                                type="text"
                                name="name"
                                value=(usage.category.name)
                                required
                                aria-label="New name"
                                class=(FORM_TEXT_INPUT_STYLE);

                            button type="submit" class="text-blue-600 dark:text-blue-500 underline"
                            {
                                "Rename"
                            }
                        }

                        form
                            hx-post=(subcategories_url)
                            hx-swap="none"
                            data-json-form="true"
                            class="flex gap-2"
                        {
                            input
                                type="text"
                                name="name"
                                placeholder="New subcategory"
                                required
                                aria-label="New subcategory name"
                                class=(FORM_TEXT_INPUT_STYLE);

                            button type="submit" class="text-blue-600 dark:text-blue-500 underline"
                            {
                                "Add"
                            }
                        }

                        @if can_delete {
                            button
                                type="button"
                                hx-delete=(category_url)
                                hx-confirm=(confirm_message)
                                hx-swap="none"
                                data-json-form="true"
                                class=(BUTTON_DELETE_STYLE)
                            {
                                "Delete"
                            }
                        } @else {
                            span
                                class="text-sm text-gray-500 dark:text-gray-400"
                                title="Categories that are in use cannot be deleted"
                            {
                                "In use"
                            }
                        }
                    }
                }
            }
        )
    };

    let content = html!(
        (nav_bar)

        main class=(PAGE_CONTAINER_STYLE)
        {
            section class="space-y-4 w-full lg:max-w-5xl"
            {
                header class="flex justify-between flex-wrap items-end"
                {
                    h1 class="text-xl font-bold" { "Categories" }
                }

                form
                    hx-post=(endpoints::CATEGORIES_API)
                    hx-swap="none"
                    data-json-form="true"
                    class="flex gap-2 max-w-md"
                {
                    input
                        id="name"
                        type="text"
                        name="name"
                        placeholder="New category name"
                        required
                        class=(FORM_TEXT_INPUT_STYLE);

                    button type="submit" class=(BUTTON_PRIMARY_STYLE) { "Add Category" }
                }

                p id="category-error" class="hidden text-red-600 dark:text-red-400" {}

                div class="overflow-x-auto dark:bg-gray-800"
                {
                    table class="w-full text-sm text-left rtl:text-right
                        text-gray-500 dark:text-gray-400"
                    {
                        thead class=(TABLE_HEADER_STYLE)
                        {
                            tr
                            {
                                th scope="col" class=(TABLE_CELL_STYLE) { "Name" }
                                th scope="col" class=(TABLE_CELL_STYLE) { "Transactions" }
                                th scope="col" class=(TABLE_CELL_STYLE) { "Budgets" }
                                th scope="col" class=(TABLE_CELL_STYLE) { "Actions" }
                            }
                        }

                        tbody
                        {
                            @for usage in categories {
                                (table_row(usage))
                            }

                            @if categories.is_empty() {
                                tr
                                {
                                    td
                                        colspan="4"
                                        class="px-6 py-4 text-center
                                            text-gray-500 dark:text-gray-400"
                                    {
                                        "No categories created yet."
                                    }
                                }
                            }
                        }
                    }
                }
            }
        }
    );

    base("Categories", &[json_form_script()], &content)
}
