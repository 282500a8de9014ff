use axum::{Json, extract::State};
use axum_extra::extract::Query;
use serde::Deserialize;
use time::{Date, macros::format_description};

use crate::{
    Error,
    auth::CurrentUserId,
    pagination::{PaginatedResponse, Pagination},
};

use super::{
    core::{Transaction, TransactionType},
    query::{TransactionFilter, list_transactions},
    state::TransactionState,
};

/// The raw query string for listing transactions.
///
/// Every value is kept as text so that malformed values can be reported as
/// validation errors instead of a generic rejection.
#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct ListTransactionsQuery {
    page: Option<String>,
    per_page: Option<String>,
    search: Option<String>,
    date_from: Option<String>,
    date_to: Option<String>,
    category: Vec<String>,
    #[serde(rename = "type")]
    kind: Option<String>,
    min_amount: Option<String>,
    max_amount: Option<String>,
    tag: Vec<String>,
}

impl ListTransactionsQuery {
    /// Convert the query string into a [TransactionFilter].
    ///
    /// Unparsable dates are ignored and amounts only filter when positive.
    ///
    /// # Errors
    /// Returns [Error::Validation] for an unknown type or a non-numeric amount.
    fn to_filter(&self) -> Result<TransactionFilter, Error> {
        let kind = match self.kind.as_deref().map(str::trim) {
            None | Some("") | Some("all") => None,
            Some(kind) => Some(TransactionType::parse(kind).ok_or_else(|| {
                Error::Validation(format!(
                    "type must be one of income, expense or all, got {kind:?}"
                ))
            })?),
        };

        Ok(TransactionFilter {
            search: self
                .search
                .as_deref()
                .map(str::trim)
                .filter(|search| !search.is_empty())
                .map(str::to_owned),
            date_from: self.date_from.as_deref().and_then(parse_date),
            date_to: self.date_to.as_deref().and_then(parse_date),
            categories: non_empty(&self.category),
            kind,
            min_amount: parse_amount(self.min_amount.as_deref(), "min_amount")?,
            max_amount: parse_amount(self.max_amount.as_deref(), "max_amount")?,
            tags: non_empty(&self.tag),
        })
    }
}

fn parse_date(text: &str) -> Option<Date> {
    Date::parse(text.trim(), format_description!("[year]-[month]-[day]")).ok()
}

fn parse_amount(text: Option<&str>, name: &str) -> Result<Option<f64>, Error> {
    let Some(text) = text.map(str::trim).filter(|text| !text.is_empty()) else {
        return Ok(None);
    };

    let amount: f64 = text
        .parse()
        .map_err(|_| Error::Validation(format!("{name} must be a number")))?;

    Ok((amount > 0.0).then_some(amount))
}

fn non_empty(values: &[String]) -> Vec<String> {
    values
        .iter()
        .map(|value| value.trim())
        .filter(|value| !value.is_empty())
        .map(str::to_owned)
        .collect()
}

/// A route handler that lists one page of the user's transactions.
pub async fn list_transactions_endpoint(
    State(state): State<TransactionState>,
    CurrentUserId(user_id): CurrentUserId,
    Query(query): Query<ListTransactionsQuery>,
) -> Result<Json<PaginatedResponse<Transaction>>, Error> {
    let pagination = Pagination::from_query(
        query.page.as_deref(),
        query.per_page.as_deref(),
        &state.pagination_config,
    )?;
    let filter = query.to_filter()?;

    let connection = state.connection()?;
    let (transactions, total) = list_transactions(user_id, &filter, pagination, &connection)?;

    Ok(Json(PaginatedResponse::new(transactions, total, pagination)))
}
