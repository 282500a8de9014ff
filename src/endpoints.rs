//! The API endpoints URIs.
//!
//! For endpoints that take a parameter, e.g., '/transactions/{transaction_id}', use [format_endpoint].

use std::fmt::Display;

/// The root route which greets the client.
pub const ROOT: &str = "/";
/// A fixed greeting kept for older clients.
pub const HELLO_WORLD: &str = "/api/helloworld";
/// The route that greets the caller by name.
pub const HELLO: &str = "/hello";
/// The route for checking that the server and database are up.
pub const HEALTH: &str = "/health";

/// The route that starts the OAuth flow for a provider.
pub const OAUTH_BEGIN: &str = "/auth/{provider}";
/// An alias of [OAUTH_BEGIN].
pub const OAUTH_LOG_IN: &str = "/auth/login/{provider}";
/// The route the OAuth provider redirects back to.
pub const OAUTH_CALLBACK: &str = "/auth/{provider}/callback";
/// The route for logging out.
pub const LOG_OUT: &str = "/auth/logout";
/// The route for getting the authenticated user's profile.
pub const CURRENT_USER: &str = "/auth/me";

/// The route for listing and creating transactions.
pub const TRANSACTIONS: &str = "/transactions";
/// The route for a single transaction.
pub const TRANSACTION: &str = "/transactions/{transaction_id}";
/// The route for the user's categories.
pub const CATEGORIES: &str = "/categories";
/// The route for the user's tags.
pub const TAGS: &str = "/tags";

/// Replace the first parameter in `endpoint_path` with `value`.
///
/// ```ignore
/// assert_eq!(format_endpoint(TRANSACTION, 1), "/transactions/1");
/// assert_eq!(format_endpoint(OAUTH_CALLBACK, "google"), "/auth/google/callback");
/// ```
pub fn format_endpoint(endpoint_path: &str, value: impl Display) -> String {
    let Some(param_start) = endpoint_path.find('{') else {
        return endpoint_path.to_string();
    };

    let param_end = endpoint_path[param_start..]
        .find('}')
        .map(|offset| param_start + offset + 1)
        .unwrap_or(endpoint_path.len());

    format!(
        "{}{}{}",
        &endpoint_path[..param_start],
        value,
        &endpoint_path[param_end..]
    )
}
