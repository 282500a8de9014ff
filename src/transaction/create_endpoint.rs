use axum::{
    Json,
    extract::{State, rejection::JsonRejection},
    http::StatusCode,
};
use serde::Deserialize;
use time::Date;

use crate::{Error, auth::CurrentUserId};

use super::{
    core::{Transaction, TransactionType, create_transaction},
    state::TransactionState,
};

/// The request body for creating a transaction.
///
/// Empty strings are treated the same as missing fields and fall back to the
/// transaction defaults.
#[derive(Debug, Deserialize)]
pub struct CreateTransaction {
    amount: f64,
    #[serde(rename = "type")]
    kind: TransactionType,
    #[serde(default)]
    currency: String,
    date: Option<Date>,
    #[serde(default)]
    description: String,
    #[serde(default)]
    category: String,
    #[serde(default)]
    status: String,
    #[serde(default)]
    account: String,
    #[serde(default)]
    tags: Vec<String>,
    notes: Option<String>,
}

/// A route handler for creating a new transaction owned by the current user.
pub async fn create_transaction_endpoint(
    State(state): State<TransactionState>,
    CurrentUserId(user_id): CurrentUserId,
    payload: Result<Json<CreateTransaction>, JsonRejection>,
) -> Result<(StatusCode, Json<Transaction>), Error> {
    let Json(payload) = payload?;

    let mut builder = Transaction::build(payload.amount, payload.kind)
        .description(&payload.description)
        .account(&payload.account)
        .tags(payload.tags)
        .notes(payload.notes);

    if let Some(date) = payload.date {
        builder = builder.date(date);
    }
    if !payload.currency.is_empty() {
        builder = builder.currency(&payload.currency);
    }
    if !payload.category.is_empty() {
        builder = builder.category(&payload.category);
    }
    if !payload.status.is_empty() {
        builder = builder.status(&payload.status);
    }

    let connection = state.connection()?;
    let transaction = create_transaction(builder, user_id, &connection)?;

    Ok((StatusCode::CREATED, Json(transaction)))
}
