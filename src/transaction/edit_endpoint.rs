use axum::{
    Json,
    extract::{Path, State, rejection::JsonRejection},
};

use crate::{Error, auth::CurrentUserId};

use super::{
    core::{Transaction, TransactionId, TransactionUpdate, update_transaction},
    state::TransactionState,
};

/// A route handler for partially updating one of the user's transactions.
///
/// Fields missing from the body keep their current values.
pub async fn edit_transaction_endpoint(
    State(state): State<TransactionState>,
    CurrentUserId(user_id): CurrentUserId,
    Path(transaction_id): Path<TransactionId>,
    payload: Result<Json<TransactionUpdate>, JsonRejection>,
) -> Result<Json<Transaction>, Error> {
    let Json(update) = payload?;

    let connection = state.connection()?;

    update_transaction(transaction_id, user_id, update, &connection).map(Json)
}
