//! JSON endpoints for creating, renaming and deleting categories, and for
//! adding and listing subcategories.

use std::sync::{Arc, Mutex};

use axum::{
    Form, Json,
    extract::{FromRef, Path, State},
    response::{IntoResponse, Response},
};
use rusqlite::Connection;
use serde_json::json;

use crate::{
    AppState, Error,
    category::{
        CategoryId, CategoryName,
        db::{
            create_category, create_subcategory, delete_category, get_subcategories,
            update_category,
        },
        domain::CategoryFormData,
    },
};

/// The state needed by the category JSON endpoints.
#[derive(Debug, Clone)]
pub struct CategoryApiState {
    pub db_connection: Arc<Mutex<Connection>>,
}

impl FromRef<AppState> for CategoryApiState {
    fn from_ref(state: &AppState) -> Self {
        Self {
            db_connection: state.db_connection.clone(),
        }
    }
}

/// Create a category, responds with the new category as JSON.
pub async fn create_category_endpoint(
    State(state): State<CategoryApiState>,
    Form(form): Form<CategoryFormData>,
) -> Response {
    let name = match CategoryName::new(&form.name) {
        Ok(name) => name,
        Err(error) => return error.into_json_response(),
    };

    let connection = match state.db_connection.lock() {
        Ok(connection) => connection,
        Err(error) => {
            tracing::error!("could not acquire database lock: {error}");
            return Error::DatabaseLockError.into_json_response();
        }
    };

    match create_category(name, &connection) {
        Ok(category) => {
            tracing::info!("created category {} ({})", category.name, category.id);
            Json(json!({ "success": true, "id": category.id, "name": category.name }))
                .into_response()
        }
        Err(error) => error.into_json_response(),
    }
}

/// Rename a category.
pub async fn update_category_endpoint(
    Path(category_id): Path<CategoryId>,
    State(state): State<CategoryApiState>,
    Form(form): Form<CategoryFormData>,
) -> Response {
    let name = match CategoryName::new(&form.name) {
        Ok(name) => name,
        Err(error) => return error.into_json_response(),
    };

    let connection = match state.db_connection.lock() {
        Ok(connection) => connection,
        Err(error) => {
            tracing::error!("could not acquire database lock: {error}");
            return Error::DatabaseLockError.into_json_response();
        }
    };

    match update_category(category_id, name, &connection) {
        Ok(()) => Json(json!({ "success": true })).into_response(),
        Err(error) => error.into_json_response(),
    }
}

/// Delete a category that has no transactions and no positive budget allocations.
pub async fn delete_category_endpoint(
    Path(category_id): Path<CategoryId>,
    State(state): State<CategoryApiState>,
) -> Response {
    let connection = match state.db_connection.lock() {
        Ok(connection) => connection,
        Err(error) => {
            tracing::error!("could not acquire database lock: {error}");
            return Error::DatabaseLockError.into_json_response();
        }
    };

    match delete_category(category_id, &connection) {
        Ok(()) => {
            tracing::info!("deleted category {category_id}");
            Json(json!({ "success": true })).into_response()
        }
        Err(error) => error.into_json_response(),
    }
}

/// Add a subcategory to a category, responds with the new subcategory as JSON.
pub async fn create_subcategory_endpoint(
    Path(category_id): Path<CategoryId>,
    State(state): State<CategoryApiState>,
    Form(form): Form<CategoryFormData>,
) -> Response {
    let connection = match state.db_connection.lock() {
        Ok(connection) => connection,
        Err(error) => {
            tracing::error!("could not acquire database lock: {error}");
            return Error::DatabaseLockError.into_json_response();
        }
    };

    match create_subcategory(category_id, &form.name, &connection) {
        Ok(subcategory) => {
            tracing::info!(
                "created subcategory {} ({}) in category {category_id}",
                subcategory.name,
                subcategory.id
            );
            Json(json!({ "success": true, "id": subcategory.id, "name": subcategory.name }))
                .into_response()
        }
        Err(error) => error.into_json_response(),
    }
}

/// List the subcategories of a category as `[{"id", "name"}]`.
pub async fn get_subcategories_endpoint(
    Path(category_id): Path<CategoryId>,
    State(state): State<CategoryApiState>,
) -> Response {
    let connection = match state.db_connection.lock() {
        Ok(connection) => connection,
        Err(error) => {
            tracing::error!("could not acquire database lock: {error}");
            return Error::DatabaseLockError.into_json_response();
        }
    };

    match get_subcategories(category_id, &connection) {
        Ok(subcategories) => Json(
            subcategories
                .into_iter()
                .map(|subcategory| json!({ "id": subcategory.id, "name": subcategory.name }))
                .collect::<Vec<_>>(),
        )
        .into_response(),
        Err(error) => error.into_json_response(),
    }
}

#[cfg(test)]
mod tests {
    use std::sync::{Arc, Mutex};

    use axum::{
        Form,
        extract::{Path, State},
        http::StatusCode,
    };
    use serde_json::json;
    use time::macros::date;

    use crate::{
        category::{
            CategoryName, create_category, create_subcategory, domain::CategoryFormData,
            get_category,
        },
        db::get_test_connection,
        test_utils::parse_json,
        transaction::{Transaction, create_transaction},
    };

    use super::{
        CategoryApiState, create_category_endpoint, create_subcategory_endpoint,
        delete_category_endpoint, get_subcategories_endpoint, update_category_endpoint,
    };

    fn get_state() -> CategoryApiState {
        CategoryApiState {
            db_connection: Arc::new(Mutex::new(get_test_connection())),
        }
    }

    fn form(name: &str) -> Form<CategoryFormData> {
        Form(CategoryFormData {
            name: name.to_owned(),
        })
    }

    #[tokio::test]
    async fn can_create_category() {
        let state = get_state();

        let response = create_category_endpoint(State(state.clone()), form("Groceries")).await;

        assert_eq!(response.status(), StatusCode::OK);
        let body = parse_json(response).await;
        assert_eq!(body["success"], true);
        let id = body["id"].as_i64().expect("id should be a number");
        let category = get_category(id, &state.db_connection.lock().unwrap()).unwrap();
        assert_eq!(category.name.as_ref(), "Groceries");
    }

    #[tokio::test]
    async fn create_fails_on_empty_name() {
        let response = create_category_endpoint(State(get_state()), form("  ")).await;

        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        let body = parse_json(response).await;
        assert_eq!(body, json!({ "error": "Category name is required" }));
    }

    #[tokio::test]
    async fn create_fails_on_duplicate_name() {
        let state = get_state();
        create_category(
            CategoryName::new_unchecked("Groceries"),
            &state.db_connection.lock().unwrap(),
        )
        .unwrap();

        let response = create_category_endpoint(State(state), form("Groceries")).await;

        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn update_missing_category_returns_not_found() {
        let response = update_category_endpoint(Path(404), State(get_state()), form("New")).await;

        assert_eq!(response.status(), StatusCode::NOT_FOUND);
        let body = parse_json(response).await;
        assert_eq!(body, json!({ "error": "Category not found" }));
    }

    #[tokio::test]
    async fn delete_refuses_category_with_transactions() {
        let state = get_state();
        let category_id = {
            let connection = state.db_connection.lock().unwrap();
            let category =
                create_category(CategoryName::new_unchecked("Food"), &connection).unwrap();
            create_transaction(
                Transaction::build(5.0, date!(2025 - 10 - 02), "Snack", category.id),
                &connection,
            )
            .unwrap();
            category.id
        };

        let response = delete_category_endpoint(Path(category_id), State(state)).await;

        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        let body = parse_json(response).await;
        assert_eq!(
            body,
            json!({ "error": "Cannot delete category. It has 1 transactions." })
        );
    }

    #[tokio::test]
    async fn lists_subcategories() {
        let state = get_state();
        let category_id = {
            let connection = state.db_connection.lock().unwrap();
            let category =
                create_category(CategoryName::new_unchecked("Car"), &connection).unwrap();
            create_subcategory(category.id, "Fuel", &connection).unwrap();
            category.id
        };

        let response = get_subcategories_endpoint(Path(category_id), State(state)).await;

        assert_eq!(response.status(), StatusCode::OK);
        let body = parse_json(response).await;
        assert_eq!(body, json!([{ "id": 1, "name": "Fuel" }]));
    }

    #[tokio::test]
    async fn adds_subcategory_then_refuses_duplicate() {
        let state = get_state();
        let category_id = create_category(
            CategoryName::new_unchecked("Car"),
            &state.db_connection.lock().unwrap(),
        )
        .unwrap()
        .id;

        let response =
            create_subcategory_endpoint(Path(category_id), State(state.clone()), form(" Fuel "))
                .await;

        assert_eq!(response.status(), StatusCode::OK);
        let body = parse_json(response).await;
        assert_eq!(body, json!({ "success": true, "id": 1, "name": "Fuel" }));

        let response =
            create_subcategory_endpoint(Path(category_id), State(state), form("Fuel")).await;

        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn subcategory_for_missing_category_is_bad_request() {
        let response = create_subcategory_endpoint(Path(9), State(get_state()), form("Fuel")).await;

        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    }
}
