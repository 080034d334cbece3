//! The navigation bar: a row of links on large screens and a bottom tab bar
//! with a "More" menu on small screens.

use maud::{Markup, html};

use crate::endpoints;

/// Where a link goes in the bottom tab bar on small screens.
#[derive(Clone, Copy, PartialEq, Eq)]
enum Placement {
    /// Always visible as a tab.
    Tab,
    /// Tucked into the "More" menu.
    More,
}

const LINKS: [(&str, &str, Placement); 5] = [
    (endpoints::DASHBOARD_VIEW, "Dashboard", Placement::Tab),
    (endpoints::TRANSACTIONS_VIEW, "Transactions", Placement::Tab),
    (endpoints::BUDGET_VIEW, "Budget", Placement::Tab),
    (endpoints::CATEGORIES_VIEW, "Categories", Placement::More),
    (endpoints::ANALYTICS_VIEW, "Analytics", Placement::More),
];

struct Link {
    url: &'static str,
    title: &'static str,
    placement: Placement,
    is_current: bool,
}

impl Link {
    fn desktop_html(&self) -> Markup {
        let style = if self.is_current {
            "block py-2 px-3 text-white bg-blue-700 rounded-sm lg:bg-transparent
            lg:text-blue-700 lg:p-0 dark:text-white lg:dark:text-blue-500"
        } else {
            "block py-2 px-3 text-gray-900 rounded-sm hover:bg-gray-100
            lg:hover:bg-transparent lg:border-0 lg:hover:text-blue-700 lg:p-0
            dark:text-white lg:dark:hover:text-blue-500 dark:hover:bg-gray-700"
        };

        html!( a href=(self.url) class=(style) { (self.title) } )
    }

    fn tab_html(&self) -> Markup {
        html! {
            li class="min-w-0" {
                a
                    href=(self.url)
                    class=(tab_style(self.is_current))
                    aria-current=[self.is_current.then_some("page")]
                {
                    span class="truncate" { (self.title) }
                }
            }
        }
    }

    fn menu_item_html(&self) -> Markup {
        let style = if self.is_current {
            "block rounded-lg bg-blue-50 px-3 py-2 text-blue-700
            dark:bg-blue-900/30 dark:text-blue-200"
        } else {
            "block rounded-lg px-3 py-2 text-gray-700 hover:bg-gray-100
            hover:text-blue-700 dark:text-gray-200 dark:hover:bg-gray-800/80"
        };

        html! {
            li {
                a href=(self.url) class=(style) aria-current=[self.is_current.then_some("page")]
                {
                    (self.title)
                }
            }
        }
    }
}

fn tab_style(is_current: bool) -> &'static str {
    if is_current {
        "flex w-full min-w-0 items-center justify-center rounded-lg cursor-pointer
        bg-blue-50 px-2.5 py-2 text-xs font-semibold leading-tight text-blue-700
        shadow-sm sm:px-4 sm:text-sm dark:bg-blue-900/30 dark:text-blue-200
        list-none [&::-webkit-details-marker]:hidden"
    } else {
        "flex w-full min-w-0 items-center justify-center rounded-lg cursor-pointer
        px-2.5 py-2 text-xs font-semibold leading-tight text-gray-600 sm:px-4
        sm:text-sm hover:bg-blue-50/70 hover:text-blue-700 dark:text-gray-300
        dark:hover:bg-blue-900/20 dark:hover:text-blue-200
        list-none [&::-webkit-details-marker]:hidden"
    }
}

/// Whether the page at `active_endpoint` belongs to the section at `url`,
/// e.g. "/transactions/new" belongs to "/transactions".
fn is_in_section(active_endpoint: &str, url: &str) -> bool {
    active_endpoint
        .strip_prefix(url)
        .is_some_and(|rest| rest.is_empty() || rest.starts_with('/'))
}

/// The navigation bar shown at the top of every page (and at the bottom on small screens).
pub struct NavBar {
    links: Vec<Link>,
}

impl NavBar {
    /// Get the navigation bar with the section containing `active_endpoint`
    /// highlighted.
    pub fn new(active_endpoint: &str) -> Self {
        let links = LINKS
            .iter()
            .map(|&(url, title, placement)| Link {
                url,
                title,
                placement,
                is_current: is_in_section(active_endpoint, url),
            })
            .collect();

        Self { links }
    }

    pub fn into_html(self) -> Markup {
        let more_is_current = self
            .links
            .iter()
            .any(|link| link.placement == Placement::More && link.is_current);

        // Layout adapted from https://flowbite.com/docs/components/navbar/#default-navbar
        html!(
            nav class="bg-white border-gray-200 dark:bg-gray-900"
            {
                div
                    class="max-w-screen-xl flex flex-wrap items-center justify-between mx-auto p-4"
                {
                    a href=(endpoints::ROOT) class="flex items-center space-x-3 rtl:space-x-reverse"
                    {
                        span
                            class="self-center text-2xl font-semibold whitespace-nowrap dark:text-white"
                        {
                            "Budget Tracker"
                        }
                    }

                    div class="hidden w-full lg:block lg:w-auto"
                    {
                        ul
                            class="font-medium flex flex-col p-4 lg:p-0 mt-4
                            border border-gray-100 rounded bg-gray-50
                            lg:flex-row lg:space-x-8 rtl:space-x-reverse lg:mt-0
                            lg:border-0 lg:bg-white dark:bg-gray-800
                            lg:dark:bg-gray-900 dark:border-gray-700"
                        {
                            @for link in &self.links {
                                li { (link.desktop_html()) }
                            }
                        }
                    }
                }
            }

            nav class="fixed inset-x-0 bottom-0 z-40 lg:hidden"
            {
                div class="mx-auto max-w-screen-xl px-4 pb-4"
                {
                    ul
                        class="grid grid-cols-4 gap-2 px-4 py-3 rounded-xl border
                        border-gray-200 bg-white/95 shadow-lg backdrop-blur
                        dark:border-gray-700 dark:bg-gray-900/95"
                        aria-label="Primary"
                    {
                        @for link in self.links.iter().filter(|link| link.placement == Placement::Tab) {
                            (link.tab_html())
                        }

                        li class="min-w-0" {
                            details class="group relative"
                            {
                                summary
                                    class=(tab_style(more_is_current))
                                    aria-current=[more_is_current.then_some("page")]
                                {
                                    span class="truncate" { "More" }
                                }

                                ul
                                    class="absolute bottom-full right-0 mb-3 w-40 flex flex-col
                                    gap-1 rounded-xl border border-gray-200 bg-white/95 p-2
                                    text-sm font-medium shadow-xl backdrop-blur
                                    dark:border-gray-700 dark:bg-gray-900/95"
                                {
                                    @for link in self.links.iter().filter(|link| link.placement == Placement::More) {
                                        (link.menu_item_html())
                                    }
                                }
                            }
                        }
                    }
                }
            }
        )
    }
}

#[cfg(test)]
mod tests {
    use scraper::{Html, Selector};

    use crate::endpoints;

    use super::NavBar;

    fn current_titles(active_endpoint: &str) -> Vec<&'static str> {
        NavBar::new(active_endpoint)
            .links
            .iter()
            .filter(|link| link.is_current)
            .map(|link| link.title)
            .collect()
    }

    #[test]
    fn highlights_section_of_active_page() {
        let cases = [
            (endpoints::DASHBOARD_VIEW, vec!["Dashboard"]),
            (endpoints::TRANSACTIONS_VIEW, vec!["Transactions"]),
            (endpoints::NEW_TRANSACTION_VIEW, vec!["Transactions"]),
            (endpoints::EDIT_TRANSACTION_VIEW, vec!["Transactions"]),
            (endpoints::BUDGET_VIEW, vec!["Budget"]),
            (endpoints::CATEGORIES_VIEW, vec!["Categories"]),
            (endpoints::ANALYTICS_VIEW, vec!["Analytics"]),
            (endpoints::ROOT, vec![]),
            (endpoints::INTERNAL_ERROR_VIEW, vec![]),
            (endpoints::TRANSACTIONS_API, vec![]),
        ];

        for (endpoint, want) in cases {
            assert_eq!(current_titles(endpoint), want, "active endpoint {endpoint}");
        }
    }

    #[test]
    fn more_menu_is_current_for_analytics() {
        let html = Html::parse_fragment(&NavBar::new(endpoints::ANALYTICS_VIEW).into_html().into_string());

        let summary = html
            .select(&Selector::parse("summary").unwrap())
            .next()
            .unwrap();
        assert_eq!(summary.value().attr("aria-current"), Some("page"));

        let more_links = html
            .select(&Selector::parse("details a").unwrap())
            .map(|link| link.value().attr("href").unwrap_or_default())
            .collect::<Vec<_>>();
        assert_eq!(more_links, vec![endpoints::CATEGORIES_VIEW, endpoints::ANALYTICS_VIEW]);
    }
}
