//! Authentication: session tokens, the cookies that carry them, the OAuth
//! log-in flow and the middleware that guards protected routes.

mod cookie;
mod current_user;
mod log_in;
mod log_out;
mod middleware;
mod oauth;
mod secret;
mod token;

pub use cookie::{
    COOKIE_OAUTH_STATE, COOKIE_TOKEN, CookiePolicy, invalidate_auth_cookie, set_auth_cookie,
};
pub use current_user::get_current_user;
pub use log_in::{begin_oauth, oauth_callback};
pub use log_out::log_out;
pub use middleware::{AuthState, CurrentUser, CurrentUserId, Identity, auth_guard};
pub use oauth::{
    GOOGLE_PROVIDER, GoogleOAuthClient, GoogleOAuthConfig, OAuthClient, OAuthError, OAuthProfile,
    OAuthProviders,
};
pub use secret::{SecretError, SecretProvider, TOKEN_KEY_ENV, TokenKey};
pub use token::{TOKEN_TTL, TokenError, issue_token, issue_token_at, verify_token, verify_token_at};
