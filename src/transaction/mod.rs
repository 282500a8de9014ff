//! Transaction management for the budgeting application.
//!
//! This module contains everything related to transactions:
//! - The `Transaction` model and `TransactionBuilder` for creating transactions
//! - Database functions for storing, querying, and summarising transactions
//! - JSON route handlers, all scoped to the authenticated user

mod core;
mod create_endpoint;
mod delete_endpoint;
mod edit_endpoint;
mod get_endpoint;
mod list_endpoint;
mod query;
mod state;
mod summary_endpoints;

pub use core::{
    Transaction, TransactionBuilder, TransactionId, TransactionType, TransactionUpdate,
    create_transaction, create_transaction_table, delete_transaction, get_transaction,
    update_transaction,
};
pub use create_endpoint::create_transaction_endpoint;
pub use delete_endpoint::delete_transaction_endpoint;
pub use edit_endpoint::edit_transaction_endpoint;
pub use get_endpoint::get_transaction_endpoint;
pub use list_endpoint::list_transactions_endpoint;
pub use query::{
    CategorySummary, TagSummary, TransactionFilter, get_category_summaries, get_tag_summaries,
    list_transactions,
};
pub use state::TransactionState;
pub use summary_endpoints::{get_categories_endpoint, get_tags_endpoint};
