//! Authentication middleware that validates the session cookie and attaches the user's identity.

use std::sync::Arc;

use axum::{
    extract::{FromRef, FromRequestParts, Request, State},
    http::request::Parts,
    middleware::Next,
    response::{IntoResponse, Response},
};
use axum_extra::extract::CookieJar;

use crate::{
    AppState, Error,
    auth::{
        cookie::get_token_from_cookies,
        secret::SecretProvider,
        token::{TokenError, verify_token},
    },
    user::{User, UserID, UserStore},
};

/// The state needed for the auth middleware
#[derive(Clone)]
pub struct AuthState {
    /// Resolves the key for opening session tokens.
    pub secrets: Arc<SecretProvider>,
    /// Loads the user named by a session token.
    pub user_store: Arc<dyn UserStore>,
}

impl FromRef<AppState> for AuthState {
    fn from_ref(state: &AppState) -> Self {
        Self {
            secrets: state.secrets.clone(),
            user_store: state.user_store.clone(),
        }
    }
}

/// The authenticated user attached to a request by [auth_guard].
#[derive(Debug, Clone, PartialEq)]
pub struct Identity {
    /// The ID from the session token.
    pub user_id: UserID,
    /// The user record loaded for `user_id`.
    pub user: User,
}

/// Middleware function that checks for a valid session cookie.
///
/// The user's [Identity] is placed into the request and the request executed
/// normally if the cookie holds a valid token for an existing user, otherwise
/// a JSON error response is returned.
///
/// **Note**: Route handlers can use the [CurrentUser] and [CurrentUserId]
/// extractors to receive the identity.
pub async fn auth_guard(
    State(state): State<AuthState>,
    jar: CookieJar,
    mut request: Request,
    next: Next,
) -> Response {
    match authenticate(&state, &jar) {
        Ok(identity) => {
            request.extensions_mut().insert(identity);
            next.run(request).await
        }
        Err(error) => error.into_response(),
    }
}

fn authenticate(state: &AuthState, jar: &CookieJar) -> Result<Identity, Error> {
    let token = get_token_from_cookies(jar).ok_or(Error::Unauthorized("Not authenticated"))?;
    let user_id = match verify_token(&token, &state.secrets) {
        Ok(user_id) => user_id,
        Err(TokenError::Configuration(error)) => {
            tracing::error!("Token secret is misconfigured: {error}");
            return Err(Error::Unauthorized("Invalid or expired session token"));
        }
        Err(error) => return Err(Error::Token(error)),
    };

    let user = match state.user_store.get_user_by_id(user_id) {
        Ok(user) => user,
        Err(Error::NotFound) => {
            tracing::debug!("Session token refers to missing user {user_id}");
            return Err(Error::Unauthorized("User not found"));
        }
        Err(error) => return Err(Error::UserLookup(error.to_string())),
    };

    Ok(Identity { user_id, user })
}

/// Extracts the full record of the user authenticated by [auth_guard].
#[derive(Debug, Clone)]
pub struct CurrentUser(pub User);

impl<S> FromRequestParts<S> for CurrentUser
where
    S: Send + Sync,
{
    type Rejection = Error;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        parts
            .extensions
            .get::<Identity>()
            .map(|identity| CurrentUser(identity.user.clone()))
            .ok_or(Error::Unauthorized("Not authenticated"))
    }
}

/// Extracts the ID of the user authenticated by [auth_guard].
#[derive(Debug, Clone, Copy)]
pub struct CurrentUserId(pub UserID);

impl<S> FromRequestParts<S> for CurrentUserId
where
    S: Send + Sync,
{
    type Rejection = Error;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        parts
            .extensions
            .get::<Identity>()
            .map(|identity| CurrentUserId(identity.user_id))
            .ok_or(Error::Unauthorized("Not authenticated"))
    }
}
