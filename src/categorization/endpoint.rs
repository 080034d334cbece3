//! JSON endpoint for category suggestions.

use std::sync::{Arc, Mutex};

use axum::{
    Json,
    extract::{FromRef, Query, State},
    response::{IntoResponse, Response},
};
use rusqlite::Connection;
use serde::Deserialize;

use crate::{AppState, Error, categorization::suggest_categories};

/// The state needed to suggest categories.
#[derive(Debug, Clone)]
pub struct SuggestionState {
    pub db_connection: Arc<Mutex<Connection>>,
}

impl FromRef<AppState> for SuggestionState {
    fn from_ref(state: &AppState) -> Self {
        Self {
            db_connection: state.db_connection.clone(),
        }
    }
}

/// The query string for [get_category_suggestions_endpoint].
#[derive(Debug, Deserialize)]
pub struct SuggestionQuery {
    #[serde(default)]
    pub description: String,
}

/// Suggest categories for a description, responds with `[{"id", "name", "confidence"}]`.
pub async fn get_category_suggestions_endpoint(
    State(state): State<SuggestionState>,
    Query(query): Query<SuggestionQuery>,
) -> Response {
    let connection = match state.db_connection.lock() {
        Ok(connection) => connection,
        Err(error) => {
            tracing::error!("could not acquire database lock: {error}");
            return Error::DatabaseLockError.into_json_response();
        }
    };

    match suggest_categories(&query.description, &connection) {
        Ok(suggestions) => Json(suggestions).into_response(),
        Err(error) => {
            tracing::error!("could not get category suggestions: {error}");
            error.into_json_response()
        }
    }
}

#[cfg(test)]
mod tests {
    use std::sync::{Arc, Mutex};

    use axum::{
        extract::{Query, State},
        http::StatusCode,
    };
    use serde_json::json;
    use time::macros::date;

    use crate::{
        categorization::learn_pattern,
        category::{CategoryName, create_category},
        db::get_test_connection,
        test_utils::parse_json,
    };

    use super::{SuggestionQuery, SuggestionState, get_category_suggestions_endpoint};

    #[tokio::test]
    async fn responds_with_suggestions_as_json() {
        let connection = get_test_connection();
        let car =
            create_category(CategoryName::new_unchecked("Car Expenses"), &connection).unwrap();
        learn_pattern("Shell gas station", car.id, date!(2025 - 10 - 01), &connection).unwrap();
        let state = SuggestionState {
            db_connection: Arc::new(Mutex::new(connection)),
        };

        let response = get_category_suggestions_endpoint(
            State(state),
            Query(SuggestionQuery {
                description: "shell gas station".to_owned(),
            }),
        )
        .await;

        assert_eq!(response.status(), StatusCode::OK);
        let body = parse_json(response).await;
        assert_eq!(
            body,
            json!([{ "id": car.id, "name": "Car Expenses", "confidence": "high" }])
        );
    }

    #[test]
    fn missing_description_defaults_to_empty() {
        let Query(query) =
            Query::<SuggestionQuery>::try_from_uri(&"/api/category-suggestions".parse().unwrap())
                .unwrap();

        assert_eq!(query.description, "");
    }
}
