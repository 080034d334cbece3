//! Route handlers for contributing to, withdrawing from and configuring sinking funds.

use std::sync::{Arc, Mutex};

use axum::{
    Json,
    extract::{FromRef, Path, State},
    http::StatusCode,
    response::{IntoResponse, Response},
};
// Must use axum_extra's Form since that parses an empty string as None instead
// of crashing like axum::Form.
use axum_extra::extract::Form;
use axum_htmx::HxRedirect;
use rusqlite::Connection;
use serde::Deserialize;
use time::Date;

use crate::{
    AppState, Error,
    db::{run_blocking, with_retry},
    endpoints,
    sinking_fund::{
        SinkingFundId, contribute_monthly_allocations, get_active_funds, record_fund_transaction,
        update_fund_settings,
    },
    timezone::local_today,
    transaction::TransactionKind,
};

/// The state needed by the sinking fund endpoints.
#[derive(Debug, Clone)]
pub struct SinkingFundState {
    /// The database connection for managing sinking funds.
    pub db_connection: Arc<Mutex<Connection>>,
    /// The local timezone as a canonical timezone name, e.g. "Pacific/Auckland".
    pub local_timezone: String,
}

impl FromRef<AppState> for SinkingFundState {
    fn from_ref(state: &AppState) -> Self {
        Self {
            db_connection: state.db_connection.clone(),
            local_timezone: state.local_timezone.clone(),
        }
    }
}

/// Make this month's contributions to every sinking fund, redirects to the dashboard.
pub async fn contribute_to_sinking_funds_endpoint(
    State(state): State<SinkingFundState>,
) -> Response {
    let today = match local_today(&state.local_timezone) {
        Ok(today) => today,
        Err(error) => return error.into_alert_response(),
    };

    let result = run_blocking(&state.db_connection, move |connection| {
        with_retry(|| contribute_monthly_allocations(today, connection))
    })
    .await;

    if let Err(error) = result {
        return error.into_alert_response();
    }

    (
        HxRedirect(endpoints::DASHBOARD_VIEW.to_owned()),
        StatusCode::SEE_OTHER,
    )
        .into_response()
}

/// The form data for a manual sinking fund transaction.
#[derive(Debug, Deserialize)]
pub struct FundTransactionForm {
    /// Either a contribution or a withdrawal.
    pub transaction_type: TransactionKind,
    pub amount: f64,
    pub description: Option<String>,
    /// Defaults to today.
    pub date: Option<Date>,
}

/// Record a contribution to or withdrawal from a sinking fund, redirects to the dashboard.
pub async fn create_fund_transaction_endpoint(
    Path(sinking_fund_id): Path<SinkingFundId>,
    State(state): State<SinkingFundState>,
    Form(form): Form<FundTransactionForm>,
) -> Response {
    let date = match form.date {
        Some(date) => date,
        None => match local_today(&state.local_timezone) {
            Ok(today) => today,
            Err(error) => return error.into_alert_response(),
        },
    };

    let connection = match state.db_connection.lock() {
        Ok(connection) => connection,
        Err(error) => {
            tracing::error!("could not acquire database lock: {error}");
            return Error::DatabaseLockError.into_alert_response();
        }
    };

    let result = record_fund_transaction(
        sinking_fund_id,
        form.transaction_type,
        form.amount,
        form.description.as_deref().unwrap_or_default(),
        date,
        &connection,
    );

    if let Err(error) = result {
        tracing::error!("could not record transaction for sinking fund {sinking_fund_id}: {error}");
        return error.into_alert_response();
    }

    (
        HxRedirect(endpoints::DASHBOARD_VIEW.to_owned()),
        StatusCode::SEE_OTHER,
    )
        .into_response()
}

/// The form data for editing a sinking fund.
#[derive(Debug, Deserialize)]
pub struct FundSettingsForm {
    pub target_amount: Option<f64>,
    pub monthly_allocation: Option<f64>,
}

/// Change the target and monthly allocation of a sinking fund, redirects to the dashboard.
pub async fn update_sinking_fund_endpoint(
    Path(sinking_fund_id): Path<SinkingFundId>,
    State(state): State<SinkingFundState>,
    Form(form): Form<FundSettingsForm>,
) -> Response {
    let connection = match state.db_connection.lock() {
        Ok(connection) => connection,
        Err(error) => {
            tracing::error!("could not acquire database lock: {error}");
            return Error::DatabaseLockError.into_alert_response();
        }
    };

    if let Err(error) = update_fund_settings(
        sinking_fund_id,
        form.target_amount,
        form.monthly_allocation,
        &connection,
    ) {
        tracing::error!("could not update sinking fund {sinking_fund_id}: {error}");
        return error.into_alert_response();
    }

    (
        HxRedirect(endpoints::DASHBOARD_VIEW.to_owned()),
        StatusCode::SEE_OTHER,
    )
        .into_response()
}

/// List the active sinking funds as JSON.
pub async fn get_sinking_funds_endpoint(State(state): State<SinkingFundState>) -> Response {
    let connection = match state.db_connection.lock() {
        Ok(connection) => connection,
        Err(error) => {
            tracing::error!("could not acquire database lock: {error}");
            return Error::DatabaseLockError.into_json_response();
        }
    };

    match get_active_funds(&connection) {
        Ok(funds) => Json(funds).into_response(),
        Err(error) => error.into_json_response(),
    }
}
