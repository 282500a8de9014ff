//! Creates the application's database schema.

use rusqlite::{Connection, Transaction as SqlTransaction};

use crate::{transaction::create_transaction_table, user::create_user_table};

/// Create the tables for the domain models if they do not exist.
///
/// Also turns on foreign key enforcement for `connection` so that deleting a
/// user deletes their transactions.
///
/// # Errors
/// Returns an error if there is an SQL error.
pub fn initialize(connection: &Connection) -> Result<(), rusqlite::Error> {
    connection.pragma_update(None, "foreign_keys", "ON")?;

    let transaction =
        SqlTransaction::new_unchecked(connection, rusqlite::TransactionBehavior::Exclusive)?;

    create_user_table(&transaction)?;
    create_transaction_table(&transaction)?;

    transaction.commit()?;

    Ok(())
}

/// Check that the database answers a trivial query.
///
/// # Errors
/// Returns an error if the query fails.
pub fn ping(connection: &Connection) -> Result<(), rusqlite::Error> {
    connection.query_row("SELECT 1", [], |row| row.get::<_, i64>(0))?;

    Ok(())
}
