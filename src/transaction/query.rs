//! Database query helpers for listing and summarising a user's transactions.

use rusqlite::{Connection, params_from_iter, types::Value};
use serde::Serialize;
use time::Date;

use crate::{Error, pagination::Pagination, user::UserID};

use super::core::{Transaction, TransactionType, map_transaction_row};

/// Filters for listing transactions, `None` or empty fields do not filter.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct TransactionFilter {
    /// Substring to look for in the description, notes or any tag.
    pub search: Option<String>,
    /// The earliest date to include.
    pub date_from: Option<Date>,
    /// The latest date to include.
    pub date_to: Option<Date>,
    /// Only include transactions in one of these categories.
    pub categories: Vec<String>,
    /// Only include transactions of this type.
    pub kind: Option<TransactionType>,
    /// The smallest amount to include.
    pub min_amount: Option<f64>,
    /// The largest amount to include.
    pub max_amount: Option<f64>,
    /// Only include transactions carrying at least one of these tags.
    pub tags: Vec<String>,
}

impl TransactionFilter {
    /// Build the `WHERE` clause and its parameters for `user_id`.
    fn where_clause(&self, user_id: UserID) -> (String, Vec<Value>) {
        let mut conditions = vec!["user_id = ?".to_owned()];
        let mut params = vec![Value::Integer(user_id.as_i64())];

        if let Some(search) = self.search.as_deref().filter(|search| !search.is_empty()) {
            conditions.push(
                "(description LIKE ? OR COALESCE(notes, '') LIKE ? \
                 OR EXISTS (SELECT 1 FROM json_each(\"transaction\".tags) WHERE json_each.value LIKE ?))"
                    .to_owned(),
            );
            let pattern = format!("%{search}%");
            params.extend(std::iter::repeat_n(Value::Text(pattern), 3));
        }

        if let Some(date_from) = self.date_from {
            conditions.push("date >= ?".to_owned());
            params.push(Value::Text(date_from.to_string()));
        }

        if let Some(date_to) = self.date_to {
            conditions.push("date <= ?".to_owned());
            params.push(Value::Text(date_to.to_string()));
        }

        if !self.categories.is_empty() {
            conditions.push(format!("category IN ({})", placeholders(self.categories.len())));
            params.extend(self.categories.iter().cloned().map(Value::Text));
        }

        if let Some(kind) = self.kind {
            conditions.push("type = ?".to_owned());
            params.push(Value::Text(kind.as_str().to_owned()));
        }

        if let Some(min_amount) = self.min_amount {
            conditions.push("amount >= ?".to_owned());
            params.push(Value::Real(min_amount));
        }

        if let Some(max_amount) = self.max_amount {
            conditions.push("amount <= ?".to_owned());
            params.push(Value::Real(max_amount));
        }

        if !self.tags.is_empty() {
            conditions.push(format!(
                "EXISTS (SELECT 1 FROM json_each(\"transaction\".tags) WHERE json_each.value IN ({}))",
                placeholders(self.tags.len())
            ));
            params.extend(self.tags.iter().cloned().map(Value::Text));
        }

        (conditions.join(" AND "), params)
    }
}

fn placeholders(count: usize) -> String {
    vec!["?"; count].join(", ")
}

/// Get one page of `user_id`'s transactions matching `filter`, newest first,
/// along with the total number of matching transactions.
///
/// Transactions on the same date are ordered by descending ID so that the
/// order is stable across pages.
///
/// # Errors
/// Returns [Error::SqlError] if the query fails.
pub fn list_transactions(
    user_id: UserID,
    filter: &TransactionFilter,
    pagination: Pagination,
    connection: &Connection,
) -> Result<(Vec<Transaction>, u64), Error> {
    let (where_clause, params) = filter.where_clause(user_id);

    let total: i64 = connection.query_row(
        &format!("SELECT COUNT(*) FROM \"transaction\" WHERE {where_clause}"),
        params_from_iter(params.iter()),
        |row| row.get(0),
    )?;

    let mut page_params = params;
    page_params.push(Value::Integer(pagination.limit()));
    page_params.push(Value::Integer(pagination.offset()));

    let transactions = connection
        .prepare(&format!(
            "SELECT id, user_id, amount, currency, date, description, category, type, status, account, tags, notes \
             FROM \"transaction\" WHERE {where_clause} \
             ORDER BY date DESC, id DESC LIMIT ? OFFSET ?"
        ))?
        .query_map(params_from_iter(page_params.iter()), map_transaction_row)?
        .map(|transaction_result| transaction_result.map_err(Error::SqlError))
        .collect::<Result<Vec<_>, _>>()?;

    Ok((transactions, total as u64))
}

/// The number of a user's transactions in a category.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CategorySummary {
    /// The category name.
    pub category: String,
    /// How many transactions are in the category.
    pub count: i64,
}

/// The number of a user's transactions carrying a tag.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TagSummary {
    /// The tag.
    pub tag: String,
    /// How many transactions carry the tag.
    pub count: i64,
}

/// Get the categories `user_id` has used, ordered by name.
///
/// # Errors
/// Returns [Error::SqlError] if the query fails.
pub fn get_category_summaries(
    user_id: UserID,
    connection: &Connection,
) -> Result<Vec<CategorySummary>, Error> {
    connection
        .prepare(
            "SELECT category, COUNT(*) FROM \"transaction\" \
             WHERE user_id = ?1 GROUP BY category ORDER BY category",
        )?
        .query_map([user_id.as_i64()], |row| {
            Ok(CategorySummary {
                category: row.get(0)?,
                count: row.get(1)?,
            })
        })?
        .map(|summary| summary.map_err(Error::SqlError))
        .collect()
}

/// Get the tags `user_id` has used, ordered by name.
///
/// A transaction that lists the same tag twice is counted once.
///
/// # Errors
/// Returns [Error::SqlError] if the query fails.
pub fn get_tag_summaries(user_id: UserID, connection: &Connection) -> Result<Vec<TagSummary>, Error> {
    connection
        .prepare(
            "SELECT json_each.value, COUNT(DISTINCT \"transaction\".id) \
             FROM \"transaction\", json_each(\"transaction\".tags) \
             WHERE \"transaction\".user_id = ?1 \
             GROUP BY json_each.value ORDER BY json_each.value",
        )?
        .query_map([user_id.as_i64()], |row| {
            Ok(TagSummary {
                tag: row.get(0)?,
                count: row.get(1)?,
            })
        })?
        .map(|summary| summary.map_err(Error::SqlError))
        .collect()
}
