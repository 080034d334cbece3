//! A web app for running a household budget.
//!
//! Transactions are filed under categories and subcategories, each month gets
//! a budget period whose allocations carry over from the previous month, and
//! sinking funds receive a fixed contribution once per month. Descriptions
//! that have been categorized before are used to suggest categories for new
//! transactions.
//!
//! This library provides a REST API that directly serves HTML pages, plus a
//! few JSON endpoints used by the pages' scripts.

#![warn(missing_docs)]

use std::{net::SocketAddr, time::Duration};

use axum_server::Handle;
use tokio::signal;

mod alert;
mod app_state;
mod budget;
mod categorization;
mod category;
mod dashboard;
mod database_id;
mod db;
mod endpoints;
mod error;
mod html;
mod internal_server_error;
mod month;
mod navigation;
mod not_found;
mod routing;
mod seed;
mod sinking_fund;
#[cfg(test)]
mod test_utils;
mod timezone;
mod transaction;

pub use app_state::AppState;
pub use db::{initialize as initialize_db, open_connection};
pub use error::Error;
pub use routing::build_router;
pub use seed::{SeedSummary, seed_database};

/// An async task that waits for either the ctrl+c or terminate signal, whichever comes first, and
/// then signals the server to shut down gracefully.
///
/// `handle` is a handle to an Axum `Server`.
pub async fn graceful_shutdown(handle: Handle<SocketAddr>) {
    let ctrl_c = async {
        signal::ctrl_c()
            .await
            .expect("failed to install Ctrl+C handler");
    };

    #[cfg(unix)]
    let terminate = async {
        signal::unix::signal(signal::unix::SignalKind::terminate())
            .expect("failed to install signal handler")
            .recv()
            .await;
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {
            tracing::debug!("Received ctrl+c signal.");
            handle.graceful_shutdown(Some(Duration::from_secs(1)));
        },
        _ = terminate => {
            tracing::debug!("Received terminate signal.");
            handle.graceful_shutdown(Some(Duration::from_secs(1)));
        },
    }
}
