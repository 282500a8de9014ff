//! Defines the session cookie policy and the functions that set and clear the auth cookies.

use axum_extra::extract::{
    CookieJar, PrivateCookieJar,
    cookie::{Cookie, SameSite},
};
use time::{Duration, OffsetDateTime};

/// The name of the cookie that carries the session token.
pub const COOKIE_TOKEN: &str = "auth_token";

/// The name of the private cookie that carries the OAuth `state` value.
pub const COOKIE_OAUTH_STATE: &str = "oauth_state";

/// How long a user has to complete the OAuth consent screen.
pub const OAUTH_STATE_DURATION: Duration = Duration::minutes(10);

/// The security attributes for cookies, chosen from the deployment environment.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CookiePolicy {
    /// Whether the cookie is only sent over HTTPS.
    pub secure: bool,
    /// When the cookie is sent with cross-site requests.
    pub same_site: SameSite,
}

impl CookiePolicy {
    /// Production cookies are `Secure` and `SameSite=None` so that a front-end
    /// hosted on another site can send them, otherwise cookies are not
    /// `Secure` and `SameSite=Lax` so they work over plain HTTP on localhost.
    pub fn new(production: bool) -> Self {
        if production {
            Self {
                secure: true,
                same_site: SameSite::None,
            }
        } else {
            Self {
                secure: false,
                same_site: SameSite::Lax,
            }
        }
    }
}

/// Add the session cookie carrying `token` to the cookie jar.
///
/// The cookie expires at `expires`, which should match the token's expiry.
pub fn set_auth_cookie(
    jar: CookieJar,
    token: String,
    expires: OffsetDateTime,
    policy: CookiePolicy,
) -> CookieJar {
    jar.add(
        Cookie::build((COOKIE_TOKEN, token))
            .path("/")
            .expires(expires)
            .http_only(true)
            .same_site(policy.same_site)
            .secure(policy.secure),
    )
}

/// Overwrite the session cookie with an empty, already expired cookie, which
/// deletes the cookie on the client side.
pub fn invalidate_auth_cookie(jar: CookieJar, policy: CookiePolicy) -> CookieJar {
    jar.add(
        Cookie::build((COOKIE_TOKEN, ""))
            .path("/")
            .expires(OffsetDateTime::UNIX_EPOCH)
            .max_age(Duration::ZERO)
            .http_only(true)
            .same_site(policy.same_site)
            .secure(policy.secure),
    )
}

/// Get the session token from the cookie jar.
///
/// Returns `None` if the cookie is missing or empty.
pub fn get_token_from_cookies(jar: &CookieJar) -> Option<String> {
    jar.get(COOKIE_TOKEN)
        .map(|cookie| cookie.value().to_owned())
        .filter(|token| !token.is_empty())
}

/// Store the OAuth `state` in an encrypted, short-lived cookie scoped to the
/// auth routes.
pub fn set_oauth_state_cookie(
    jar: PrivateCookieJar,
    state: String,
    policy: CookiePolicy,
) -> PrivateCookieJar {
    jar.add(
        Cookie::build((COOKIE_OAUTH_STATE, state))
            .path("/auth")
            .max_age(OAUTH_STATE_DURATION)
            .http_only(true)
            .same_site(policy.same_site)
            .secure(policy.secure),
    )
}

/// Remove the OAuth `state` cookie, returning the jar and the stored state.
pub fn take_oauth_state(jar: PrivateCookieJar) -> (PrivateCookieJar, Option<String>) {
    let state = jar
        .get(COOKIE_OAUTH_STATE)
        .map(|cookie| cookie.value().to_owned());
    let jar = jar.remove(Cookie::build(COOKIE_OAUTH_STATE).path("/auth"));

    (jar, state)
}
