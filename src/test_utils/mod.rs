#![allow(missing_docs)]

pub(crate) mod http;

use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use rusqlite::Connection;
use serde_json::json;

use crate::{
    AppState, Error,
    auth::{
        CookiePolicy, OAuthClient, OAuthError, OAuthProfile, OAuthProviders, SecretProvider,
        issue_token,
    },
    pagination::PaginationConfig,
    user::{NewUser, OAUTH_PASSWORD_SENTINEL, User, UserID, UserStore},
};

pub(crate) use http::{assert_content_type, get_set_cookie, parse_json_body};

pub(crate) const TEST_TOKEN_KEY: &str =
    "0123456789abcdef0123456789abcdef0123456789abcdef0123456789abcdef";

pub(crate) const TEST_FRONTEND_URL: &str = "http://localhost:5173/";

pub(crate) fn test_user(id: i64) -> User {
    User {
        id: UserID::new(id),
        email: format!("user{id}@example.com"),
        name: Some(format!("User {id}")),
        avatar_url: None,
        preferences: json!({}),
        password_hash: OAUTH_PASSWORD_SENTINEL.to_owned(),
    }
}

/// An in-memory [UserStore] that can be told to fail every call.
#[derive(Default)]
pub(crate) struct StubUserStore {
    users: Mutex<Vec<User>>,
    fail: bool,
}

impl StubUserStore {
    pub(crate) fn with_users(users: Vec<User>) -> Self {
        Self {
            users: Mutex::new(users),
            fail: false,
        }
    }

    pub(crate) fn failing() -> Self {
        Self {
            users: Mutex::new(Vec::new()),
            fail: true,
        }
    }

    fn check(&self) -> Result<(), Error> {
        if self.fail {
            Err(Error::SqlError(rusqlite::Error::InvalidQuery))
        } else {
            Ok(())
        }
    }
}

impl UserStore for StubUserStore {
    fn get_user_by_id(&self, id: UserID) -> Result<User, Error> {
        self.check()?;
        self.users
            .lock()
            .unwrap()
            .iter()
            .find(|user| user.id == id)
            .cloned()
            .ok_or(Error::NotFound)
    }

    fn get_user_by_email(&self, email: &str) -> Result<User, Error> {
        self.check()?;
        self.users
            .lock()
            .unwrap()
            .iter()
            .find(|user| user.email == email)
            .cloned()
            .ok_or(Error::NotFound)
    }

    fn create_user(&self, user: NewUser) -> Result<User, Error> {
        self.check()?;
        let mut users = self.users.lock().unwrap();
        if users.iter().any(|existing| existing.email == user.email) {
            return Err(Error::DuplicateEmail);
        }

        let user = User {
            id: UserID::new(users.len() as i64 + 1),
            email: user.email,
            name: user.name,
            avatar_url: user.avatar_url,
            preferences: user.preferences,
            password_hash: user.password_hash,
        };
        users.push(user.clone());

        Ok(user)
    }
}

/// An OAuth provider that hands out a fixed profile for the code "good-code".
pub(crate) struct StubOAuthClient {
    pub(crate) profile: OAuthProfile,
}

impl Default for StubOAuthClient {
    fn default() -> Self {
        Self {
            profile: OAuthProfile {
                email: "jane@example.com".to_owned(),
                name: "Jane Doe".to_owned(),
                avatar_url: String::new(),
            },
        }
    }
}

#[async_trait]
impl OAuthClient for StubOAuthClient {
    fn authorization_url(&self, state: &str) -> Result<String, OAuthError> {
        Ok(format!("https://provider.test/auth?state={state}"))
    }

    async fn exchange_code(&self, code: &str) -> Result<OAuthProfile, OAuthError> {
        if code == "good-code" {
            Ok(self.profile.clone())
        } else {
            Err(OAuthError::CodeRejected(format!("unknown code {code}")))
        }
    }
}

/// An [AppState] over an in-memory database, with the stub OAuth provider
/// registered as "google".
pub(crate) fn get_test_app_state() -> AppState {
    get_test_app_state_with_oauth(StubOAuthClient::default())
}

pub(crate) fn get_test_app_state_with_oauth(client: StubOAuthClient) -> AppState {
    let connection =
        Connection::open_in_memory().expect("Could not open in-memory SQLite database");

    AppState::new(
        connection,
        SecretProvider::new(Some(TEST_TOKEN_KEY.to_owned())),
        CookiePolicy::new(false),
        OAuthProviders::new().with_provider("google", Arc::new(client)),
        TEST_FRONTEND_URL,
        PaginationConfig::default(),
    )
    .expect("Could not create app state")
}

/// Create a user in the state's database and return it with a session token.
pub(crate) fn create_test_user_with_token(state: &AppState, email: &str) -> (User, String) {
    let user = state
        .user_store
        .create_user(NewUser::from_oauth(email, "Test User", ""))
        .expect("Could not create test user");
    let token = issue_token(user.id, &state.secrets).expect("Could not issue token");

    (user, token)
}
