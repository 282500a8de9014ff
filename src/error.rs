//! Defines the app level error type and its conversion to JSON error responses.

use axum::{
    Json,
    extract::rejection::JsonRejection,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use serde::Serialize;

use crate::auth::TokenError;

/// The errors that may occur in the application.
#[derive(Debug, thiserror::Error, PartialEq)]
pub enum Error {
    /// The request did not carry valid credentials.
    ///
    /// The message is safe to show to the client and must not contain
    /// internal details.
    #[error("unauthorized: {0}")]
    Unauthorized(&'static str),

    /// A token could not be issued or verified.
    #[error("token error: {0}")]
    Token(#[from] TokenError),

    /// The token secret supplied by the operator could not be used.
    #[error("invalid configuration: {0}")]
    Configuration(String),

    /// The OAuth provider in the request path is unknown or not configured.
    #[error("unknown OAuth provider \"{0}\"")]
    UnknownProvider(String),

    /// The client sent a request that cannot be processed, e.g. a failed
    /// OAuth code exchange.
    #[error("bad request: {0}")]
    BadRequest(String),

    /// A request parameter failed validation.
    #[error("validation failed: {0}")]
    Validation(String),

    /// The requested resource was not found.
    ///
    /// For HTTP request handlers, the client should check that the parameters
    /// (e.g., ID) are correct and that the resource has been created.
    ///
    /// Internally, this error may occur when a query returns no rows.
    #[error("the requested resource could not be found")]
    NotFound,

    /// The email used to create a user already belongs to another user.
    #[error("the email is already in use")]
    DuplicateEmail,

    /// Tried to update a transaction that does not exist
    #[error("tried to update a transaction that is not in the database")]
    UpdateMissingTransaction,

    /// Tried to delete a transaction that does not exist
    #[error("tried to delete a transaction that is not in the database")]
    DeleteMissingTransaction,

    /// The user store failed for a reason other than a missing user.
    ///
    /// Distinct from [Error::Unauthorized] so that clients can tell a bad
    /// credential apart from a degraded system.
    #[error("could not load user: {0}")]
    UserLookup(String),

    /// An error occurred while serializing a value as JSON
    #[error("could not serialize as JSON: {0}")]
    JSONSerializationError(String),

    /// Could not acquire the database lock
    #[error("could not acquire the database lock")]
    DatabaseLockError,

    /// An unhandled/unexpected SQL error.
    #[error("an unexpected SQL error occurred: {0}")]
    SqlError(rusqlite::Error),
}

impl From<rusqlite::Error> for Error {
    fn from(value: rusqlite::Error) -> Self {
        match value {
            rusqlite::Error::SqliteFailure(sql_error, Some(ref desc))
                if sql_error.extended_code == rusqlite::ffi::SQLITE_CONSTRAINT_UNIQUE
                    && desc.ends_with("user.email") =>
            {
                Error::DuplicateEmail
            }
            rusqlite::Error::QueryReturnedNoRows => Error::NotFound,
            error => {
                tracing::error!("an unhandled SQL error occurred: {}", error);
                Error::SqlError(error)
            }
        }
    }
}

impl From<JsonRejection> for Error {
    fn from(rejection: JsonRejection) -> Self {
        match rejection.status() {
            StatusCode::UNPROCESSABLE_ENTITY => Error::Validation(rejection.body_text()),
            _ => Error::BadRequest(rejection.body_text()),
        }
    }
}

/// The JSON body sent to the client for every error response.
#[derive(Debug, Serialize)]
pub struct ErrorBody<'a> {
    /// A stable, machine readable error tag, e.g. "unauthorized".
    pub error: &'a str,
    /// A human readable description of the error.
    pub message: String,
}

/// Build a JSON error response with the given status, tag and message.
pub fn error_response(status: StatusCode, error: &str, message: impl Into<String>) -> Response {
    (
        status,
        Json(ErrorBody {
            error,
            message: message.into(),
        }),
    )
        .into_response()
}

impl IntoResponse for Error {
    fn into_response(self) -> Response {
        match self {
            Error::Unauthorized(message) => {
                error_response(StatusCode::UNAUTHORIZED, "unauthorized", message)
            }
            Error::Token(TokenError::Configuration(error)) => {
                tracing::error!("Token secret is misconfigured: {error}");
                internal_server_error()
            }
            Error::Token(TokenError::Encryption) => {
                tracing::error!("Could not encrypt token");
                internal_server_error()
            }
            Error::Token(error) => {
                tracing::debug!("Rejected session token: {error}");
                error_response(
                    StatusCode::UNAUTHORIZED,
                    "unauthorized",
                    "Invalid or expired session token",
                )
            }
            Error::UnknownProvider(provider) => error_response(
                StatusCode::NOT_FOUND,
                "unknown_provider",
                format!("Unknown OAuth provider \"{provider}\""),
            ),
            Error::BadRequest(message) => {
                error_response(StatusCode::BAD_REQUEST, "bad_request", message)
            }
            Error::Validation(message) => {
                error_response(StatusCode::UNPROCESSABLE_ENTITY, "validation_error", message)
            }
            Error::NotFound => error_response(
                StatusCode::NOT_FOUND,
                "not_found",
                "The requested resource could not be found",
            ),
            Error::UpdateMissingTransaction => error_response(
                StatusCode::NOT_FOUND,
                "not_found",
                "Could not update transaction: the transaction could not be found",
            ),
            Error::DeleteMissingTransaction => error_response(
                StatusCode::NOT_FOUND,
                "not_found",
                "Could not delete transaction: the transaction could not be found",
            ),
            Error::DuplicateEmail => error_response(
                StatusCode::CONFLICT,
                "conflict",
                "A user with this email already exists",
            ),
            Error::UserLookup(error) => {
                tracing::error!("Failed to load user: {error}");
                error_response(
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "database_error",
                    "Failed to load user",
                )
            }
            // Any errors that are not handled above are not intended to be shown to the client.
            error => {
                tracing::error!("An unexpected error occurred: {}", error);
                internal_server_error()
            }
        }
    }
}

fn internal_server_error() -> Response {
    error_response(
        StatusCode::INTERNAL_SERVER_ERROR,
        "internal_error",
        "An unexpected error occurred, check the server logs for more details",
    )
}
