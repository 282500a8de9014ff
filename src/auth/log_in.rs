//! Route handlers for logging in with an OAuth provider.
//!
//! The flow has two legs: [begin_oauth] sends the browser to the provider's
//! consent page, and [oauth_callback] turns the provider's authorization code
//! into a local user and a session cookie.

use std::sync::Arc;

use axum::{
    extract::{FromRef, Path, Query, State},
    response::{IntoResponse, Redirect, Response},
};
use axum_extra::extract::{CookieJar, PrivateCookieJar};
use rand::RngCore;
use serde::Deserialize;
use time::OffsetDateTime;

use crate::{
    AppState, Error,
    auth::{
        cookie::{CookiePolicy, set_auth_cookie, set_oauth_state_cookie, take_oauth_state},
        oauth::{OAuthClient, OAuthProfile, OAuthProviders},
        secret::SecretProvider,
        token::{TOKEN_TTL, issue_token_at},
    },
    user::{NewUser, User, UserStore},
};

/// The state needed to log in.
#[derive(Clone)]
pub struct LogInState {
    /// The security attributes for the auth cookies.
    pub cookie_policy: CookiePolicy,
    /// Resolves the key for sealing session tokens.
    pub secrets: Arc<SecretProvider>,
    /// Finds and creates users.
    pub user_store: Arc<dyn UserStore>,
    /// The configured OAuth providers.
    pub oauth_providers: OAuthProviders,
    /// Where to send the browser after a successful log-in.
    pub frontend_url: String,
}

impl FromRef<AppState> for LogInState {
    fn from_ref(state: &AppState) -> Self {
        Self {
            cookie_policy: state.cookie_policy,
            secrets: state.secrets.clone(),
            user_store: state.user_store.clone(),
            oauth_providers: state.oauth_providers.clone(),
            frontend_url: state.frontend_url.clone(),
        }
    }
}

const OAUTH_STATE_BYTES: usize = 16;

fn generate_oauth_state() -> String {
    let mut bytes = [0u8; OAUTH_STATE_BYTES];
    rand::thread_rng().fill_bytes(&mut bytes);

    hex::encode(bytes)
}

/// Redirect the client to the consent page of the OAuth provider named in the path.
///
/// A random `state` value is stored in a private cookie and passed to the
/// provider so that the callback can check that it answers this request.
///
/// # Errors
/// Returns [Error::UnknownProvider] if no provider is configured under that name.
pub async fn begin_oauth(
    State(state): State<LogInState>,
    Path(provider): Path<String>,
    jar: PrivateCookieJar,
) -> Result<Response, Error> {
    let client = state
        .oauth_providers
        .get(&provider)
        .ok_or_else(|| Error::UnknownProvider(provider.clone()))?;

    let oauth_state = generate_oauth_state();
    let url = client.authorization_url(&oauth_state).map_err(|error| {
        tracing::error!("Could not build authorization URL for {provider}: {error}");
        Error::BadRequest(format!("Could not start log in with {provider}"))
    })?;
    let jar = set_oauth_state_cookie(jar, oauth_state, state.cookie_policy);

    Ok((jar, Redirect::temporary(&url)).into_response())
}

/// The query parameters the OAuth provider redirects back with.
#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct CallbackQuery {
    code: Option<String>,
    state: Option<String>,
    error: Option<String>,
}

/// Finish the OAuth flow: exchange the code for a profile, find or create the
/// user with that email, set the session cookie and redirect to the front-end.
///
/// # Errors
/// Returns a:
/// - [Error::UnknownProvider] if no provider is configured under that name,
/// - [Error::BadRequest] if the state does not match, the code is missing or
///   rejected, or the profile has no email,
/// - or an internal error if the user could not be loaded or created, or the
///   token could not be issued.
pub async fn oauth_callback(
    State(state): State<LogInState>,
    Path(provider): Path<String>,
    Query(query): Query<CallbackQuery>,
    private_jar: PrivateCookieJar,
    jar: CookieJar,
) -> Result<Response, Error> {
    let client = state
        .oauth_providers
        .get(&provider)
        .ok_or_else(|| Error::UnknownProvider(provider.clone()))?;

    let (private_jar, expected_state) = take_oauth_state(private_jar);

    // The state cookie is cleared whether or not the log-in succeeds.
    match complete_log_in(&state, &provider, client.as_ref(), query, expected_state, jar).await {
        Ok((jar, redirect)) => Ok((private_jar, jar, redirect).into_response()),
        Err(error) => Ok((private_jar, error).into_response()),
    }
}

async fn complete_log_in(
    state: &LogInState,
    provider: &str,
    client: &dyn OAuthClient,
    query: CallbackQuery,
    expected_state: Option<String>,
    jar: CookieJar,
) -> Result<(CookieJar, Redirect), Error> {
    if let Some(error) = query.error {
        tracing::warn!("OAuth provider {provider} returned an error: {error}");
        return Err(Error::BadRequest(format!(
            "The OAuth provider returned an error: {error}"
        )));
    }

    match (expected_state.as_deref(), query.state.as_deref()) {
        (Some(expected), Some(actual)) if !expected.is_empty() && expected == actual => {}
        _ => {
            tracing::warn!("OAuth state mismatch for provider {provider}");
            return Err(Error::BadRequest("Invalid OAuth state".to_owned()));
        }
    }

    let code = query
        .code
        .filter(|code| !code.is_empty())
        .ok_or_else(|| Error::BadRequest("Missing authorization code".to_owned()))?;

    let profile = client.exchange_code(&code).await.map_err(|error| {
        tracing::warn!("Could not exchange authorization code with {provider}: {error}");
        Error::BadRequest("Failed to exchange authorization code".to_owned())
    })?;

    if profile.email.is_empty() {
        return Err(Error::BadRequest(
            "The OAuth profile does not include an email".to_owned(),
        ));
    }

    let user = find_or_create_user(state.user_store.as_ref(), &profile)?;

    let now = OffsetDateTime::now_utc();
    let token = issue_token_at(user.id, &state.secrets, now)?;
    let jar = set_auth_cookie(jar, token, now + TOKEN_TTL, state.cookie_policy);

    Ok((jar, Redirect::temporary(&state.frontend_url)))
}

/// Get the user with the profile's email, creating them on their first log-in.
fn find_or_create_user(user_store: &dyn UserStore, profile: &OAuthProfile) -> Result<User, Error> {
    match user_store.get_user_by_email(&profile.email) {
        Ok(user) => {
            tracing::info!("User {} logged in", user.id);
            Ok(user)
        }
        Err(Error::NotFound) => {
            let new_user = NewUser::from_oauth(&profile.email, &profile.name, &profile.avatar_url);

            match user_store.create_user(new_user) {
                Ok(user) => {
                    tracing::info!("Created user {} on first log in", user.id);
                    Ok(user)
                }
                // Another request created the user between the lookup and the insert.
                Err(Error::DuplicateEmail) => user_store.get_user_by_email(&profile.email),
                Err(error) => Err(error),
            }
        }
        Err(error) => Err(error),
    }
}
