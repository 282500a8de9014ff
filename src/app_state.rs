//! Implements a struct that holds the state of the REST server.

use std::sync::{Arc, Mutex};

use axum::extract::FromRef;
use axum_extra::extract::cookie::Key;
use rusqlite::Connection;
use sha2::{Digest, Sha512};

use crate::{
    Error,
    auth::{CookiePolicy, OAuthProviders, SecretProvider},
    db::initialize,
    pagination::PaginationConfig,
    user::{SQLiteUserStore, UserStore},
};

/// The state of the REST server.
#[derive(Clone)]
pub struct AppState {
    /// The key to be used for signing and encrypting private cookies.
    pub cookie_key: Key,

    /// The security attributes for cookies, chosen from the deployment environment.
    pub cookie_policy: CookiePolicy,

    /// Resolves the key for sealing and opening session tokens.
    pub secrets: Arc<SecretProvider>,

    /// Finds and creates users.
    pub user_store: Arc<dyn UserStore>,

    /// The OAuth providers users can log in with.
    pub oauth_providers: OAuthProviders,

    /// Where to send the browser after a successful log-in.
    pub frontend_url: String,

    /// The config that controls how to page lists of data.
    pub pagination_config: PaginationConfig,

    /// The database connection
    pub db_connection: Arc<Mutex<Connection>>,
}

impl AppState {
    /// Create a new [AppState] with a SQLite database connection.
    ///
    /// This function will initialize the database by adding the tables for the
    /// domain models. The key for private cookies is derived from the token key
    /// in `secrets`.
    ///
    /// # Errors
    /// Returns an error if the database cannot be initialized.
    pub fn new(
        db_connection: Connection,
        secrets: SecretProvider,
        cookie_policy: CookiePolicy,
        oauth_providers: OAuthProviders,
        frontend_url: &str,
        pagination_config: PaginationConfig,
    ) -> Result<Self, Error> {
        initialize(&db_connection)?;

        let connection = Arc::new(Mutex::new(db_connection));

        Ok(Self {
            cookie_key: create_cookie_key(&secrets),
            cookie_policy,
            secrets: Arc::new(secrets),
            user_store: Arc::new(SQLiteUserStore::new(connection.clone())),
            oauth_providers,
            frontend_url: frontend_url.to_owned(),
            pagination_config,
            db_connection: connection,
        })
    }
}

// this impl tells `PrivateCookieJar` how to access the key from our state
impl FromRef<AppState> for Key {
    fn from_ref(state: &AppState) -> Self {
        state.cookie_key.clone()
    }
}

/// Create a key for private cookies from the session token key.
///
/// A misconfigured token key falls back to a random cookie key. Token
/// operations still report the configuration error.
pub fn create_cookie_key(secrets: &SecretProvider) -> Key {
    match secrets.key() {
        Ok(key) => Key::from(&Sha512::digest(key.as_bytes())),
        Err(error) => {
            tracing::error!("Could not derive the cookie key from the token key: {error}");
            Key::generate()
        }
    }
}
