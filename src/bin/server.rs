use std::{net::SocketAddr, process::exit, sync::Arc};

use axum::{
    Router,
    extract::{MatchedPath, Request},
    middleware,
};
use axum_server::Handle;
use clap::Parser;
use rusqlite::Connection;
use tower_http::trace::TraceLayer;
use tracing_subscriber::{EnvFilter, layer::SubscriberExt, util::SubscriberInitExt};

use budgetctl::{
    AppState, Config, GOOGLE_PROVIDER, GoogleOAuthClient, OAuthProviders, PaginationConfig,
    SecretProvider, TOKEN_KEY_ENV, build_router, graceful_shutdown, logging_middleware,
};

#[tokio::main]
async fn main() {
    setup_logging();

    let config = Config::parse();

    let secrets = SecretProvider::new(config.token_key.clone());
    // Resolve the key now so that a malformed key stops the server at startup
    // instead of failing the first log-in.
    if let Err(error) = secrets.key() {
        tracing::error!("Invalid {}: {error}", TOKEN_KEY_ENV);
        exit(1);
    }

    let mut oauth_providers = OAuthProviders::new();
    match config.google_oauth() {
        Some(google) => {
            oauth_providers = oauth_providers
                .with_provider(GOOGLE_PROVIDER, Arc::new(GoogleOAuthClient::new(google)));
        }
        None => tracing::warn!("GOOGLE_CLIENT_ID is not set, Google log-in is disabled"),
    }

    let connection = match Connection::open(&config.db_path) {
        Ok(connection) => connection,
        Err(error) => {
            tracing::error!("Could not open database at {}: {error}", config.db_path);
            exit(1);
        }
    };

    let state = match AppState::new(
        connection,
        secrets,
        config.cookie_policy(),
        oauth_providers,
        &config.frontend_url,
        PaginationConfig::default(),
    ) {
        Ok(state) => state,
        Err(error) => {
            tracing::error!("Could not initialize the app state: {error}");
            exit(1);
        }
    };

    let addr: SocketAddr = match format!("{}:{}", config.host, config.port).parse() {
        Ok(addr) => addr,
        Err(error) => {
            tracing::error!("Invalid address {}:{}: {error}", config.host, config.port);
            exit(1);
        }
    };

    let handle = Handle::new();
    tokio::spawn(graceful_shutdown(handle.clone()));

    let router = build_router(state).layer(middleware::from_fn(logging_middleware));
    let router = add_tracing_layer(router);

    tracing::info!(
        "HTTP server listening on {addr} (production: {})",
        config.is_production()
    );
    if let Err(error) = axum_server::bind(addr)
        .handle(handle)
        .serve(router.into_make_service())
        .await
    {
        tracing::error!("Server error: {error}");
        exit(1);
    }
}

fn setup_logging() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));

    tracing_subscriber::registry()
        .with(filter)
        .with(tracing_subscriber::fmt::layer().pretty())
        .init();
}

fn add_tracing_layer(router: Router) -> Router {
    let tracing_layer = TraceLayer::new_for_http()
        .make_span_with(|req: &Request| {
            let method = req.method();
            let uri = req.uri().path();

            let matched_path = req
                .extensions()
                .get::<MatchedPath>()
                .map(|matched_path| matched_path.as_str());

            tracing::debug_span!("request", %method, %uri, matched_path)
        })
        // By default, `TraceLayer` will log 5xx responses but we're doing our specific
        // logging of errors so disable that
        .on_failure(());

    router.layer(tracing_layer)
}
