use axum::{
    extract::{Path, State},
    http::StatusCode,
};

use crate::{Error, auth::CurrentUserId};

use super::{
    core::{TransactionId, delete_transaction},
    state::TransactionState,
};

/// A route handler for deleting one of the user's transactions, responds with 204 No Content.
pub async fn delete_transaction_endpoint(
    State(state): State<TransactionState>,
    CurrentUserId(user_id): CurrentUserId,
    Path(transaction_id): Path<TransactionId>,
) -> Result<StatusCode, Error> {
    let connection = state.connection()?;

    delete_transaction(transaction_id, user_id, &connection)?;

    Ok(StatusCode::NO_CONTENT)
}
