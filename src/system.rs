//! Route handlers for the greeting and health check endpoints.

use axum::{
    Json,
    extract::{Query, State},
    http::StatusCode,
    response::{IntoResponse, Response},
};
use serde::Deserialize;
use serde_json::json;

use crate::{AppState, Error, db::ping};

/// The longest name [get_hello] will greet.
pub const MAX_NAME_LENGTH: usize = 20;

/// A route handler that responds with a fixed greeting.
pub async fn get_hello_world() -> Response {
    Json(json!({ "message": "Hello World" })).into_response()
}

/// The query string for [get_hello].
#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct HelloQuery {
    name: Option<String>,
}

/// A route handler that greets the caller by `name`, or "World" if no name is given.
///
/// # Errors
/// Returns [Error::Validation] if the name is longer than [MAX_NAME_LENGTH] characters.
pub async fn get_hello(Query(query): Query<HelloQuery>) -> Result<Response, Error> {
    let name = query
        .name
        .filter(|name| !name.is_empty())
        .unwrap_or_else(|| "World".to_owned());

    if name.chars().count() > MAX_NAME_LENGTH {
        return Err(Error::Validation(format!(
            "name must be at most {MAX_NAME_LENGTH} characters"
        )));
    }

    Ok(Json(json!({ "message": format!("Hello, {name}!") })).into_response())
}

/// A route handler that checks the database answers queries.
///
/// Responds with 200 and status "up" if it does, otherwise 503 and status "down".
pub async fn get_health(State(state): State<AppState>) -> Response {
    let result = match state.db_connection.lock() {
        Ok(connection) => ping(&connection).map_err(|error| error.to_string()),
        Err(_) => Err(Error::DatabaseLockError.to_string()),
    };

    match result {
        Ok(()) => (
            StatusCode::OK,
            Json(json!({ "status": "up", "message": "It's healthy" })),
        )
            .into_response(),
        Err(error) => {
            tracing::error!("Database health check failed: {error}");
            (
                StatusCode::SERVICE_UNAVAILABLE,
                Json(json!({ "status": "down", "error": error })),
            )
                .into_response()
        }
    }
}
