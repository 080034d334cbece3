//! Defines the app level error type and conversions to rendered HTML pages, alerts and JSON.
use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use serde_json::json;

use crate::{
    alert::Alert, category::CategoryId, internal_server_error::InternalServerError,
    month::MonthYear, not_found::NotFoundError, transaction::TransactionKind,
};

/// The errors that may occur in the application.
#[derive(Debug, thiserror::Error, PartialEq)]
pub enum Error {
    /// An empty string was used to create a category name.
    #[error("Category name is required")]
    EmptyCategoryName,

    /// An empty string was used to create a subcategory name.
    #[error("Subcategory name is required")]
    EmptySubcategoryName,

    /// An empty string was used to create a sinking fund name.
    #[error("Sinking fund name is required")]
    EmptySinkingFundName,

    /// The category name already exists in the database.
    #[error("the category \"{0}\" already exists")]
    DuplicateCategoryName(String),

    /// The category already has a subcategory with this name.
    #[error("the subcategory \"{0}\" already exists in this category")]
    DuplicateSubcategoryName(String),

    /// The sinking fund name already exists in the database.
    #[error("the sinking fund \"{0}\" already exists")]
    DuplicateSinkingFundName(String),

    /// The category ID used to create a transaction or allocation did not
    /// match a valid category.
    #[error("the category ID {0:?} does not refer to a valid category")]
    InvalidCategory(Option<CategoryId>),

    /// The subcategory does not exist or does not belong to the transaction's category.
    #[error("the subcategory does not belong to the selected category")]
    InvalidSubcategory,

    /// An amount was negative, zero where it must be positive, or not a finite number.
    #[error("{0} is not a valid amount")]
    InvalidAmount(f64),

    /// A sinking fund transaction that is not a contribution or withdrawal,
    /// or a contribution or withdrawal without a sinking fund.
    #[error("{0} transactions {1}")]
    InvalidTransactionKind(TransactionKind, &'static str),

    /// A form field could not be parsed, e.g. a non-numeric amount.
    #[error("invalid value for {0}")]
    InvalidFormValue(String),

    /// A category still has transactions and cannot be deleted.
    #[error("Cannot delete category. It has {0} transactions.")]
    CategoryHasTransactions(u32),

    /// A category still has positive budget allocations and cannot be deleted.
    #[error("Cannot delete category. It has active budget allocations.")]
    CategoryHasBudgetAllocations,

    /// A sinking fund files its transactions under the category, so it cannot be deleted.
    #[error("Cannot delete category. The sinking fund \"{0}\" uses it.")]
    CategoryUsedBySinkingFund(String),

    /// The monthly sinking fund contributions were already made for the month.
    #[error("Monthly contributions already made for {0}")]
    MonthlyContributionsAlreadyMade(MonthYear),

    /// A withdrawal would take a sinking fund below zero.
    #[error("Insufficient balance in sinking fund: {balance:.2} available, {requested:.2} requested")]
    InsufficientFundBalance {
        /// The current balance of the fund.
        balance: f64,
        /// The amount that was requested to be withdrawn.
        requested: f64,
    },

    /// The sinking fund has no category configured for its transactions.
    #[error("the sinking fund \"{0}\" has no category configured for its transactions")]
    MissingFundCategory(String),

    /// The requested resource was not found.
    ///
    /// For HTTP request handlers, the client should check that the parameters
    /// (e.g., ID) are correct and that the resource has been created.
    ///
    /// Internally, this error may occur when a query returns no rows.
    #[error("the requested resource could not be found")]
    NotFound,

    /// An unhandled/unexpected SQL error.
    #[error("an unexpected SQL error occurred: {0}")]
    SqlError(rusqlite::Error),

    /// The database stayed locked by another writer after all retries.
    #[error("the database is locked, gave up after {0} attempts")]
    DatabaseBusy(u32),

    /// An error occurred while getting the local timezone from a canonical timezone string.
    #[error("invalid timezone {0}")]
    InvalidTimezoneError(String),

    /// Could not acquire the database lock
    #[error("could not acquire the database lock")]
    DatabaseLockError,

    /// A database task on the blocking thread pool panicked or was cancelled.
    #[error("the database task did not finish")]
    DatabaseTaskFailed,

    /// Tried to update a transaction that does not exist
    #[error("tried to update a transaction that is not in the database")]
    UpdateMissingTransaction,

    /// Tried to delete a transaction that does not exist
    #[error("tried to delete a transaction that is not in the database")]
    DeleteMissingTransaction,

    /// Tried to update a category that does not exist
    #[error("Category not found")]
    UpdateMissingCategory,

    /// Tried to delete a category that does not exist
    #[error("Category not found")]
    DeleteMissingCategory,

    /// Tried to update a sinking fund that does not exist
    #[error("Sinking fund not found")]
    UpdateMissingSinkingFund,
}

impl From<rusqlite::Error> for Error {
    fn from(value: rusqlite::Error) -> Self {
        match value {
            rusqlite::Error::QueryReturnedNoRows => Error::NotFound,
            error => {
                tracing::error!("an unhandled SQL error occurred: {}", error);
                Error::SqlError(error)
            }
        }
    }
}

impl IntoResponse for Error {
    fn into_response(self) -> Response {
        match self {
            Error::NotFound => NotFoundError.into_response(),
            Error::InvalidTimezoneError(timezone) => InternalServerError {
                description: "Invalid Timezone Settings",
                fix: &format!(
                    "Could not get local timezone \"{timezone}\". Check your server settings and \
                    ensure the timezone has been set to valid, canonical timezone string"
                ),
            }
            .into_response(),
            Error::DatabaseBusy(_) => InternalServerError {
                description: "The database is busy",
                fix: "Another process is holding the database lock. Please try again.",
            }
            .into_response(),
            Error::DatabaseLockError | Error::DatabaseTaskFailed => {
                InternalServerError::default().into_response()
            }
            // Any errors that are not handled above are not intended to be shown to the client.
            error => {
                tracing::error!("An unexpected error occurred: {}", error);
                InternalServerError::default().into_response()
            }
        }
    }
}

impl Error {
    /// The status code used when this error is sent to a client.
    pub fn status_code(&self) -> StatusCode {
        match self {
            Error::EmptyCategoryName
            | Error::EmptySubcategoryName
            | Error::EmptySinkingFundName
            | Error::DuplicateCategoryName(_)
            | Error::DuplicateSubcategoryName(_)
            | Error::DuplicateSinkingFundName(_)
            | Error::InvalidCategory(_)
            | Error::InvalidSubcategory
            | Error::InvalidAmount(_)
            | Error::InvalidTransactionKind(..)
            | Error::InvalidFormValue(_)
            | Error::CategoryHasTransactions(_)
            | Error::CategoryHasBudgetAllocations
            | Error::CategoryUsedBySinkingFund(_)
            | Error::MonthlyContributionsAlreadyMade(_)
            | Error::InsufficientFundBalance { .. } => StatusCode::BAD_REQUEST,
            Error::NotFound
            | Error::UpdateMissingTransaction
            | Error::DeleteMissingTransaction
            | Error::UpdateMissingCategory
            | Error::DeleteMissingCategory
            | Error::UpdateMissingSinkingFund => StatusCode::NOT_FOUND,
            Error::MissingFundCategory(_)
            | Error::SqlError(_)
            | Error::DatabaseBusy(_)
            | Error::InvalidTimezoneError(_)
            | Error::DatabaseLockError
            | Error::DatabaseTaskFailed => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    /// Convert the error into an HTTP response with an HTML alert.
    pub fn into_alert_response(self) -> Response {
        let status_code = self.status_code();

        let alert = match self {
            Error::InvalidTimezoneError(timezone) => Alert::Error {
                message: "Invalid Timezone Settings".to_owned(),
                details: format!(
                    "Could not get local timezone \"{timezone}\". Check your server settings and \
                    ensure the timezone has been set to valid, canonical timezone string"
                ),
            },
            Error::InvalidCategory(category_id) => Alert::Error {
                message: "Invalid category".to_owned(),
                details: format!("Could not find a category with the ID {category_id:?}"),
            },
            Error::UpdateMissingTransaction => Alert::Error {
                message: "Could not update transaction".to_owned(),
                details: "The transaction could not be found.".to_owned(),
            },
            Error::DeleteMissingTransaction => Alert::Error {
                message: "Could not delete transaction".to_owned(),
                details: "The transaction could not be found. \
                    Try refreshing the page to see if the transaction has already been deleted."
                    .to_owned(),
            },
            Error::UpdateMissingSinkingFund => Alert::Error {
                message: "Could not update sinking fund".to_owned(),
                details: "The sinking fund could not be found.".to_owned(),
            },
            Error::MonthlyContributionsAlreadyMade(month) => Alert::Error {
                message: "Monthly contributions already made".to_owned(),
                details: format!(
                    "The sinking funds have already received their monthly allocations for {month}."
                ),
            },
            Error::MissingFundCategory(name) => Alert::Error {
                message: "Sinking fund is not configured".to_owned(),
                details: format!(
                    "The sinking fund \"{name}\" has no category for its transactions. \
                    Configure one before making contributions."
                ),
            },
            error @ (Error::EmptyCategoryName
            | Error::EmptySubcategoryName
            | Error::EmptySinkingFundName
            | Error::DuplicateCategoryName(_)
            | Error::DuplicateSubcategoryName(_)
            | Error::DuplicateSinkingFundName(_)
            | Error::InvalidSubcategory
            | Error::InvalidAmount(_)
            | Error::InvalidTransactionKind(..)
            | Error::InvalidFormValue(_)
            | Error::CategoryHasTransactions(_)
            | Error::CategoryHasBudgetAllocations
            | Error::CategoryUsedBySinkingFund(_)
            | Error::InsufficientFundBalance { .. }
            | Error::UpdateMissingCategory
            | Error::DeleteMissingCategory
            | Error::NotFound) => Alert::Error {
                message: "Could not save your changes".to_owned(),
                details: error.to_string(),
            },
            _ => Alert::Error {
                message: "Something went wrong".to_owned(),
                details: "An unexpected error occurred, check the server logs for more details."
                    .to_owned(),
            },
        };

        (status_code, alert.into_html()).into_response()
    }

    /// Convert the error into a JSON response of the form `{"error": "..."}`.
    ///
    /// Unexpected errors are logged and their message is passed through to the client.
    pub fn into_json_response(self) -> Response {
        let status_code = self.status_code();

        if status_code == StatusCode::INTERNAL_SERVER_ERROR {
            tracing::error!("An unexpected error occurred: {}", self);
        }

        (status_code, Json(json!({ "error": self.to_string() }))).into_response()
    }
}
