//! Application router configuration with protected and unprotected route definitions.

use axum::{
    Router,
    http::StatusCode,
    middleware,
    response::Response,
    routing::{get, post},
};

use crate::{
    AppState,
    auth::{auth_guard, begin_oauth, get_current_user, log_out, oauth_callback},
    endpoints,
    error::error_response,
    system::{get_health, get_hello, get_hello_world},
    transaction::{
        create_transaction_endpoint, delete_transaction_endpoint, edit_transaction_endpoint,
        get_categories_endpoint, get_tags_endpoint, get_transaction_endpoint,
        list_transactions_endpoint,
    },
};

/// Return a router with all the app's routes.
pub fn build_router(state: AppState) -> Router {
    let unprotected_routes = Router::new()
        .route(endpoints::ROOT, get(get_hello_world))
        .route(endpoints::HELLO_WORLD, get(get_hello_world))
        .route(endpoints::HELLO, get(get_hello))
        .route(endpoints::HEALTH, get(get_health))
        .route(endpoints::OAUTH_BEGIN, get(begin_oauth))
        .route(endpoints::OAUTH_LOG_IN, get(begin_oauth))
        .route(endpoints::OAUTH_CALLBACK, get(oauth_callback))
        .route(endpoints::LOG_OUT, post(log_out));

    let protected_routes = Router::new()
        .route(endpoints::CURRENT_USER, get(get_current_user))
        .route(
            endpoints::TRANSACTIONS,
            get(list_transactions_endpoint).post(create_transaction_endpoint),
        )
        .route(
            endpoints::TRANSACTION,
            get(get_transaction_endpoint)
                .patch(edit_transaction_endpoint)
                .delete(delete_transaction_endpoint),
        )
        .route(endpoints::CATEGORIES, get(get_categories_endpoint))
        .route(endpoints::TAGS, get(get_tags_endpoint))
        .layer(middleware::from_fn_with_state(state.clone(), auth_guard));

    protected_routes
        .merge(unprotected_routes)
        .fallback(get_404_not_found)
        .with_state(state)
}

async fn get_404_not_found() -> Response {
    error_response(
        StatusCode::NOT_FOUND,
        "not_found",
        "The requested resource could not be found",
    )
}
