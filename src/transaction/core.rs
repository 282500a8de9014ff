//! Defines the core data models and database queries for transactions.

use rusqlite::{
    Connection, Row, ToSql,
    types::{FromSql, FromSqlError, FromSqlResult, ToSqlOutput, Type, ValueRef},
};
use serde::{Deserialize, Serialize};
use time::{Date, OffsetDateTime};

use crate::{Error, user::UserID};

/// Alias for the integer type used for transaction IDs.
pub type TransactionId = i64;

/// The currency used when a transaction does not specify one.
pub const DEFAULT_CURRENCY: &str = "USD";
/// The category used when a transaction does not specify one.
pub const DEFAULT_CATEGORY: &str = "Uncategorized";
/// The status used when a transaction does not specify one.
pub const DEFAULT_STATUS: &str = "pending";

// ============================================================================
// MODELS
// ============================================================================

/// Whether money was earned or spent.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TransactionType {
    /// Money earned.
    Income,
    /// Money spent.
    Expense,
}

impl TransactionType {
    /// The lowercase name used in the database and in query strings.
    pub fn as_str(&self) -> &'static str {
        match self {
            TransactionType::Income => "income",
            TransactionType::Expense => "expense",
        }
    }

    /// Parse a lowercase type name.
    pub fn parse(text: &str) -> Option<Self> {
        match text {
            "income" => Some(TransactionType::Income),
            "expense" => Some(TransactionType::Expense),
            _ => None,
        }
    }
}

impl ToSql for TransactionType {
    fn to_sql(&self) -> rusqlite::Result<ToSqlOutput<'_>> {
        Ok(ToSqlOutput::from(self.as_str()))
    }
}

impl FromSql for TransactionType {
    fn column_result(value: ValueRef<'_>) -> FromSqlResult<Self> {
        let text = value.as_str()?;

        TransactionType::parse(text)
            .ok_or_else(|| FromSqlError::Other(format!("invalid transaction type {text:?}").into()))
    }
}

/// An expense or income owned by a single user.
///
/// To create a new `Transaction`, use [Transaction::build].
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Transaction {
    /// The ID of the transaction.
    pub id: TransactionId,
    /// The user that owns the transaction.
    pub user_id: UserID,
    /// The amount of money spent or earned in this transaction.
    pub amount: f64,
    /// The ISO 4217 code of the currency, e.g. "USD".
    pub currency: String,
    /// When the transaction happened.
    pub date: Date,
    /// A text description of what the transaction was for.
    pub description: String,
    /// The category of the transaction, e.g. "Groceries".
    pub category: String,
    /// Whether the transaction is income or an expense.
    #[serde(rename = "type")]
    pub kind: TransactionType,
    /// The settlement status, e.g. "pending" or "cleared".
    pub status: String,
    /// The account the money moved through.
    pub account: String,
    /// Free-form labels.
    pub tags: Vec<String>,
    /// Optional notes.
    pub notes: Option<String>,
}

impl Transaction {
    /// Create a new transaction.
    ///
    /// Shortcut for [TransactionBuilder] for discoverability.
    pub fn build(amount: f64, kind: TransactionType) -> TransactionBuilder {
        TransactionBuilder {
            amount,
            kind,
            currency: DEFAULT_CURRENCY.to_owned(),
            date: OffsetDateTime::now_utc().date(),
            description: String::new(),
            category: DEFAULT_CATEGORY.to_owned(),
            status: DEFAULT_STATUS.to_owned(),
            account: String::new(),
            tags: Vec::new(),
            notes: None,
        }
    }
}

/// A builder for creating [Transaction] instances.
///
/// Fields that are not set fall back to the defaults: [DEFAULT_CURRENCY],
/// today's date (UTC), an empty description, [DEFAULT_CATEGORY],
/// [DEFAULT_STATUS], an empty account, no tags and no notes.
///
/// # Examples
///
/// ```ignore
/// use time::macros::date;
///
/// let transaction = Transaction::build(-45.99, TransactionType::Expense)
///     .date(date!(2025-01-15))
///     .description("Coffee")
///     .tags(vec!["food".to_owned()]);
/// let transaction = create_transaction(transaction, user_id, &connection)?;
/// ```
#[derive(Debug, PartialEq, Clone)]
pub struct TransactionBuilder {
    /// The monetary amount of the transaction.
    pub amount: f64,
    /// Whether the transaction is income or an expense.
    pub kind: TransactionType,
    /// The currency code.
    pub currency: String,
    /// The date when the transaction occurred.
    pub date: Date,
    /// A human-readable description of the transaction.
    pub description: String,
    /// The category of the transaction.
    pub category: String,
    /// The settlement status.
    pub status: String,
    /// The account the money moved through.
    pub account: String,
    /// Free-form labels.
    pub tags: Vec<String>,
    /// Optional notes.
    pub notes: Option<String>,
}

impl TransactionBuilder {
    /// Set the currency code.
    pub fn currency(mut self, currency: &str) -> Self {
        currency.clone_into(&mut self.currency);
        self
    }

    /// Set the date of the transaction.
    pub fn date(mut self, date: Date) -> Self {
        self.date = date;
        self
    }

    /// Set the description.
    pub fn description(mut self, description: &str) -> Self {
        description.clone_into(&mut self.description);
        self
    }

    /// Set the category.
    pub fn category(mut self, category: &str) -> Self {
        category.clone_into(&mut self.category);
        self
    }

    /// Set the settlement status.
    pub fn status(mut self, status: &str) -> Self {
        status.clone_into(&mut self.status);
        self
    }

    /// Set the account.
    pub fn account(mut self, account: &str) -> Self {
        account.clone_into(&mut self.account);
        self
    }

    /// Set the tags.
    pub fn tags(mut self, tags: Vec<String>) -> Self {
        self.tags = tags;
        self
    }

    /// Set the notes.
    pub fn notes(mut self, notes: Option<String>) -> Self {
        self.notes = notes;
        self
    }
}

/// A partial update to a transaction, `None` fields are left unchanged.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(default)]
pub struct TransactionUpdate {
    /// The new amount.
    pub amount: Option<f64>,
    /// The new currency code.
    pub currency: Option<String>,
    /// The new date.
    pub date: Option<Date>,
    /// The new description.
    pub description: Option<String>,
    /// The new category.
    pub category: Option<String>,
    /// The new type.
    #[serde(rename = "type")]
    pub kind: Option<TransactionType>,
    /// The new status.
    pub status: Option<String>,
    /// The new account.
    pub account: Option<String>,
    /// The new tags, replacing all existing tags.
    pub tags: Option<Vec<String>>,
    /// The new notes.
    pub notes: Option<String>,
}

// ============================================================================
// DATABASE FUNCTIONS
// ============================================================================

const TRANSACTION_COLUMNS: &str =
    "id, user_id, amount, currency, date, description, category, type, status, account, tags, notes";

/// Create a new transaction owned by `user_id` in the database from a builder.
///
/// # Errors
/// This function will return a:
/// - [Error::NotFound] if `user_id` does not refer to a user,
/// - or [Error::SqlError] if there is some other SQL error.
pub fn create_transaction(
    builder: TransactionBuilder,
    user_id: UserID,
    connection: &Connection,
) -> Result<Transaction, Error> {
    let tags = encode_tags(&builder.tags)?;

    let transaction = connection
        .prepare(&format!(
            "INSERT INTO \"transaction\" \
             (user_id, amount, currency, date, description, category, type, status, account, tags, notes) \
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11) \
             RETURNING {TRANSACTION_COLUMNS}"
        ))?
        .query_row(
            rusqlite::params![
                user_id.as_i64(),
                builder.amount,
                builder.currency,
                builder.date,
                builder.description,
                builder.category,
                builder.kind,
                builder.status,
                builder.account,
                tags,
                builder.notes,
            ],
            map_transaction_row,
        )
        .map_err(|error| match error {
            rusqlite::Error::SqliteFailure(
                rusqlite::ffi::Error {
                    code: _,
                    extended_code: rusqlite::ffi::SQLITE_CONSTRAINT_FOREIGNKEY,
                },
                _,
            ) => Error::NotFound,
            error => error.into(),
        })?;

    Ok(transaction)
}

/// Retrieve the transaction `id` owned by `user_id`.
///
/// # Errors
/// This function will return a:
/// - [Error::NotFound] if `id` does not refer to a transaction owned by `user_id`,
/// - or [Error::SqlError] there is some other SQL error.
pub fn get_transaction(
    id: TransactionId,
    user_id: UserID,
    connection: &Connection,
) -> Result<Transaction, Error> {
    let transaction = connection
        .prepare(&format!(
            "SELECT {TRANSACTION_COLUMNS} FROM \"transaction\" WHERE id = :id AND user_id = :user_id"
        ))?
        .query_one(
            rusqlite::named_params! {":id": id, ":user_id": user_id.as_i64()},
            map_transaction_row,
        )?;

    Ok(transaction)
}

/// Apply `update` to the transaction `id` owned by `user_id` and return the
/// updated transaction.
///
/// # Errors
/// This function will return a:
/// - [Error::UpdateMissingTransaction] if `id` does not refer to a transaction owned by `user_id`,
/// - or [Error::SqlError] there is some other SQL error.
pub fn update_transaction(
    id: TransactionId,
    user_id: UserID,
    update: TransactionUpdate,
    connection: &Connection,
) -> Result<Transaction, Error> {
    let tags = update.tags.as_deref().map(encode_tags).transpose()?;

    connection
        .prepare(&format!(
            "UPDATE \"transaction\" SET \
                amount = COALESCE(:amount, amount), \
                currency = COALESCE(:currency, currency), \
                date = COALESCE(:date, date), \
                description = COALESCE(:description, description), \
                category = COALESCE(:category, category), \
                type = COALESCE(:type, type), \
                status = COALESCE(:status, status), \
                account = COALESCE(:account, account), \
                tags = COALESCE(:tags, tags), \
                notes = COALESCE(:notes, notes) \
             WHERE id = :id AND user_id = :user_id \
             RETURNING {TRANSACTION_COLUMNS}"
        ))?
        .query_row(
            rusqlite::named_params! {
                ":amount": update.amount,
                ":currency": update.currency,
                ":date": update.date,
                ":description": update.description,
                ":category": update.category,
                ":type": update.kind,
                ":status": update.status,
                ":account": update.account,
                ":tags": tags,
                ":notes": update.notes,
                ":id": id,
                ":user_id": user_id.as_i64(),
            },
            map_transaction_row,
        )
        .map_err(|error| match error {
            rusqlite::Error::QueryReturnedNoRows => Error::UpdateMissingTransaction,
            error => error.into(),
        })
}

/// Delete the transaction `id` owned by `user_id`.
///
/// # Errors
/// This function will return a:
/// - [Error::DeleteMissingTransaction] if `id` does not refer to a transaction owned by `user_id`,
/// - or [Error::SqlError] there is some other SQL error.
pub fn delete_transaction(
    id: TransactionId,
    user_id: UserID,
    connection: &Connection,
) -> Result<(), Error> {
    let rows_affected = connection.execute(
        "DELETE FROM \"transaction\" WHERE id = :id AND user_id = :user_id",
        rusqlite::named_params! {":id": id, ":user_id": user_id.as_i64()},
    )?;

    if rows_affected == 0 {
        return Err(Error::DeleteMissingTransaction);
    }

    Ok(())
}

/// Create the transaction table in the database.
///
/// # Errors
/// Returns an error if the table cannot be created or if there is an SQL error.
pub fn create_transaction_table(connection: &Connection) -> Result<(), rusqlite::Error> {
    connection.execute(
        "CREATE TABLE IF NOT EXISTS \"transaction\" (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                user_id INTEGER NOT NULL,
                amount REAL NOT NULL,
                currency TEXT NOT NULL DEFAULT 'USD',
                date TEXT NOT NULL,
                description TEXT NOT NULL DEFAULT '',
                category TEXT NOT NULL DEFAULT 'Uncategorized',
                type TEXT NOT NULL CHECK (type IN ('income', 'expense')),
                status TEXT NOT NULL DEFAULT 'pending',
                account TEXT NOT NULL DEFAULT '',
                tags TEXT NOT NULL DEFAULT '[]',
                notes TEXT,
                FOREIGN KEY(user_id) REFERENCES user(id) ON DELETE CASCADE
                )",
        (),
    )?;

    // Every query filters by owner and sorts by date.
    connection.execute(
        "CREATE INDEX IF NOT EXISTS idx_transaction_user_date ON \"transaction\"(user_id, date);",
        (),
    )?;

    Ok(())
}

fn encode_tags(tags: &[String]) -> Result<String, Error> {
    serde_json::to_string(tags).map_err(|error| Error::JSONSerializationError(error.to_string()))
}

/// Map a database row to a Transaction.
///
/// The row must have the columns in [TRANSACTION_COLUMNS] order.
pub fn map_transaction_row(row: &Row) -> Result<Transaction, rusqlite::Error> {
    let tags: String = row.get(10)?;
    let tags = serde_json::from_str(&tags).map_err(|error| {
        rusqlite::Error::FromSqlConversionFailure(10, Type::Text, Box::new(error))
    })?;

    Ok(Transaction {
        id: row.get(0)?,
        user_id: UserID::new(row.get(1)?),
        amount: row.get(2)?,
        currency: row.get(3)?,
        date: row.get(4)?,
        description: row.get(5)?,
        category: row.get(6)?,
        kind: row.get(7)?,
        status: row.get(8)?,
        account: row.get(9)?,
        tags,
        notes: row.get(11)?,
    })
}

// ============================================================================
// TESTS
// ============================================================================
