//! Spending categories and their subcategories.

mod api;
mod db;
mod domain;
mod page;

pub use api::{
    create_category_endpoint, create_subcategory_endpoint, delete_category_endpoint,
    get_subcategories_endpoint, update_category_endpoint,
};
#[cfg(test)]
pub use db::{create_subcategory, get_category};
pub use db::{
    create_category, create_category_table, create_subcategory_table, get_all_categories,
    get_subcategories,
};
pub use domain::{Category, CategoryId, CategoryName, CategoryUsage, Subcategory, SubcategoryId};
pub use page::get_categories_page;
