use axum::{
    Json,
    extract::{Path, State},
};

use crate::{Error, auth::CurrentUserId};

use super::{
    core::{Transaction, TransactionId, get_transaction},
    state::TransactionState,
};

/// A route handler that returns one of the user's transactions.
///
/// Transactions owned by other users are reported as not found.
pub async fn get_transaction_endpoint(
    State(state): State<TransactionState>,
    CurrentUserId(user_id): CurrentUserId,
    Path(transaction_id): Path<TransactionId>,
) -> Result<Json<Transaction>, Error> {
    let connection = state.connection()?;

    get_transaction(transaction_id, user_id, &connection).map(Json)
}
