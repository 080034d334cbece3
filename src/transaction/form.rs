//! The form fields shared by the new and edit transaction pages.

use maud::{Markup, PreEscaped, html};
use serde::Deserialize;
use time::Date;

use crate::{
    category::{Category, CategoryId, Subcategory, SubcategoryId},
    endpoints,
    html::{FORM_LABEL_STYLE, FORM_TEXT_INPUT_STYLE, HeadElement},
};

/// The form data for creating or editing a transaction.
#[derive(Debug, Deserialize)]
pub struct TransactionForm {
    pub date: Date,
    pub description: String,
    /// The value of the transaction in dollars.
    pub amount: f64,
    pub category_id: CategoryId,
    pub subcategory_id: Option<SubcategoryId>,
    pub notes: Option<String>,
}

/// The values the form fields start with.
pub struct TransactionFormDefaults<'a> {
    pub date: Date,
    pub description: Option<&'a str>,
    pub amount: Option<f64>,
    pub category_id: Option<CategoryId>,
    pub subcategory_id: Option<SubcategoryId>,
    pub notes: Option<&'a str>,
    /// The subcategories of the selected category.
    pub subcategories: &'a [Subcategory],
}

pub fn transaction_form_fields(
    defaults: &TransactionFormDefaults<'_>,
    categories: &[Category],
) -> Markup {
    let amount_str = defaults.amount.map(|amount| format!("{amount:.2}"));

    html! {
        div
        {
            label for="date" class=(FORM_LABEL_STYLE) { "Date" }

            input
                name="date"
                id="date"
                type="date"
                value=(defaults.date)
                required
                class=(FORM_TEXT_INPUT_STYLE);
        }

        div
        {
            label for="description" class=(FORM_LABEL_STYLE) { "Description" }

            input
                name="description"
                id="description"
                type="text"
                placeholder="Description"
                value=[defaults.description]
                required
                autocomplete="off"
                data-suggestions-url=(endpoints::CATEGORY_SUGGESTIONS)
                class=(FORM_TEXT_INPUT_STYLE);

            div id="category-suggestions" class="flex flex-wrap gap-2 mt-2" {}
        }

        div
        {
            label for="amount" class=(FORM_LABEL_STYLE) { "Amount" }

            // w-full needed to ensure input takes the full width when prefilled with a value
            div class="input-wrapper w-full"
            {
                input
                    name="amount"
                    id="amount"
                    type="number"
                    step="0.01"
                    min="0.01"
                    placeholder="0.00"
                    value=[amount_str.as_deref()]
                    required
                    class=(FORM_TEXT_INPUT_STYLE);
            }
        }

        div
        {
            label for="category_id" class=(FORM_LABEL_STYLE) { "Category" }

            select
                name="category_id"
                id="category_id"
                required
                data-subcategories-url=(endpoints::SUBCATEGORIES)
                class=(FORM_TEXT_INPUT_STYLE)
            {
                option value="" { "Select a category" }

                @for category in categories {
                    option
                        value=(category.id)
                        selected[Some(category.id) == defaults.category_id]
                    {
                        (category.name)
                    }
                }
            }
        }

        div
        {
            label for="subcategory_id" class=(FORM_LABEL_STYLE) { "Subcategory" }

            select
                name="subcategory_id"
                id="subcategory_id"
                class=(FORM_TEXT_INPUT_STYLE)
            {
                option value="" { "None" }

                @for subcategory in defaults.subcategories {
                    option
                        value=(subcategory.id)
                        selected[Some(subcategory.id) == defaults.subcategory_id]
                    {
                        (subcategory.name)
                    }
                }
            }
        }

        div
        {
            label for="notes" class=(FORM_LABEL_STYLE) { "Notes" }

            textarea
                name="notes"
                id="notes"
                rows="3"
                class=(FORM_TEXT_INPUT_STYLE)
            {
                (defaults.notes.unwrap_or_default())
            }
        }
    }
}

/// Fetches category suggestions as the description is typed and reloads the
/// subcategory options when the category changes.
pub fn transaction_form_script() -> HeadElement {
    HeadElement::ScriptSource(PreEscaped(
        r#"
        document.addEventListener('DOMContentLoaded', function () {
            const description = document.getElementById('description');
            const category = document.getElementById('category_id');
            const subcategory = document.getElementById('subcategory_id');
            const suggestions = document.getElementById('category-suggestions');
            let timer = null;

            async function loadSubcategories() {
                subcategory.replaceChildren(new Option('None', ''));

                if (!category.value) {
                    return;
                }

                const url = category.dataset.subcategoriesUrl.replace('{category_id}', category.value);
                const response = await fetch(url);

                if (!response.ok) {
                    return;
                }

                for (const item of await response.json()) {
                    subcategory.add(new Option(item.name, item.id));
                }
            }

            async function loadSuggestions() {
                suggestions.replaceChildren();

                const params = new URLSearchParams({ description: description.value });
                const response = await fetch(description.dataset.suggestionsUrl + '?' + params);

                if (!response.ok) {
                    return;
                }

                for (const suggestion of await response.json()) {
                    const button = document.createElement('button');
                    button.type = 'button';
                    button.textContent = suggestion.name + ' (' + suggestion.confidence + ')';
                    button.className = 'px-2 py-1 text-xs rounded bg-blue-100 text-blue-800 dark:bg-blue-900 dark:text-blue-300';
                    button.addEventListener('click', async function () {
                        category.value = String(suggestion.id);
                        await loadSubcategories();
                        suggestions.replaceChildren();
                    });
                    suggestions.appendChild(button);
                }
            }

            category.addEventListener('change', loadSubcategories);
            description.addEventListener('input', function () {
                clearTimeout(timer);
                timer = setTimeout(loadSuggestions, 300);
            });
        });
        "#
        .to_owned(),
    ))
}

#[cfg(test)]
mod tests {
    use scraper::{Html, Selector};
    use time::macros::date;

    use crate::{
        category::{Category, CategoryName, Subcategory},
        test_utils::extract_form,
    };

    use super::{TransactionForm, TransactionFormDefaults, transaction_form_fields};

    #[tokio::test]
    async fn blank_optional_fields_decode_as_none() {
        let form: TransactionForm = extract_form(
            "date=2025-10-05&description=Shell&amount=80.5&category_id=3&subcategory_id=&notes=",
        )
        .await
        .unwrap();

        assert_eq!(form.date, date!(2025 - 10 - 05));
        assert_eq!(form.description, "Shell");
        assert_eq!(form.amount, 80.5);
        assert_eq!(form.category_id, 3);
        assert_eq!(form.subcategory_id, None);
        assert_eq!(form.notes, None);
    }

    #[tokio::test]
    async fn missing_category_is_rejected() {
        let result =
            extract_form::<TransactionForm>("date=2025-10-05&description=Shell&amount=80.5").await;

        assert!(result.is_err());
    }

    #[test]
    fn selects_default_category_and_subcategory() {
        let categories = [
            Category {
                id: 1,
                name: CategoryName::new_unchecked("Car Expenses"),
            },
            Category {
                id: 2,
                name: CategoryName::new_unchecked("Groceries"),
            },
        ];
        let subcategories = [Subcategory {
            id: 7,
            category_id: 1,
            name: "Fuel".to_owned(),
        }];

        let fields = transaction_form_fields(
            &TransactionFormDefaults {
                date: date!(2025 - 10 - 05),
                description: Some("Shell"),
                amount: Some(80.0),
                category_id: Some(1),
                subcategory_id: Some(7),
                notes: Some("road trip"),
                subcategories: &subcategories,
            },
            &categories,
        );
        let html = Html::parse_document(&maud::html! { form { (fields) } }.into_string());

        let selected = html
            .select(&Selector::parse("option[selected]").unwrap())
            .map(|option| option.value().attr("value").unwrap_or_default().to_owned())
            .collect::<Vec<_>>();
        assert_eq!(selected, vec!["1", "7"]);

        let amount = html
            .select(&Selector::parse("input[name=amount]").unwrap())
            .next()
            .unwrap();
        assert_eq!(amount.value().attr("value"), Some("80.00"));

        let notes = html
            .select(&Selector::parse("textarea[name=notes]").unwrap())
            .next()
            .unwrap();
        assert_eq!(notes.text().collect::<String>(), "road trip");
    }
}
