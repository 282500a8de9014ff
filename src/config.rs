//! Command-line and environment configuration for the server.

use clap::Parser;

use crate::auth::{CookiePolicy, GoogleOAuthConfig, TOKEN_KEY_ENV};

/// The value of `APP_ENV` or `ENV` that marks a production deployment.
pub const PRODUCTION: &str = "production";

/// The REST API server for budgetctl.
///
/// Every flag can also be set with the environment variable named in its help.
#[derive(Parser, Debug, Clone)]
#[command(version, about, long_about = None)]
pub struct Config {
    /// File path to the application SQLite database.
    #[arg(long, env = "DATABASE_PATH", default_value = "budgetctl.db")]
    pub db_path: String,

    /// The address to listen on.
    #[arg(long, env = "HOST", default_value = "127.0.0.1")]
    pub host: String,

    /// The port to serve the API from.
    #[arg(short, long, env = "PORT", default_value_t = 8080)]
    pub port: u16,

    /// The 32 byte key for session tokens, hex encoded.
    ///
    /// A random key is generated if this is not set, which logs everyone out
    /// when the server restarts.
    #[arg(long, env = TOKEN_KEY_ENV, hide_env_values = true)]
    pub token_key: Option<String>,

    /// The deployment environment, "production" turns on secure cookies.
    #[arg(long, env = "APP_ENV")]
    pub app_env: Option<String>,

    /// Fallback for `--app-env`.
    #[arg(long = "env", env = "ENV")]
    pub env: Option<String>,

    /// The Google OAuth client ID. Google log-in is disabled if this is not set.
    #[arg(long, env = "GOOGLE_CLIENT_ID")]
    pub google_client_id: Option<String>,

    /// The Google OAuth client secret.
    #[arg(long, env = "GOOGLE_CLIENT_SECRET", hide_env_values = true, default_value = "")]
    pub google_client_secret: String,

    /// The URL Google redirects back to after the consent screen.
    #[arg(
        long,
        env = "GOOGLE_CALLBACK_URL",
        default_value = "http://localhost:8080/auth/google/callback"
    )]
    pub google_callback_url: String,

    /// Where to send the browser after logging in.
    #[arg(long, env = "FRONTEND_URL", default_value = "http://localhost:5173/")]
    pub frontend_url: String,
}

impl Config {
    /// Whether the server runs in production.
    pub fn is_production(&self) -> bool {
        is_production(self.app_env.as_deref(), self.env.as_deref())
    }

    /// The cookie policy for the deployment environment.
    pub fn cookie_policy(&self) -> CookiePolicy {
        CookiePolicy::new(self.is_production())
    }

    /// The Google OAuth settings, or `None` if no client ID is configured.
    pub fn google_oauth(&self) -> Option<GoogleOAuthConfig> {
        let client_id = self.google_client_id.as_deref().filter(|id| !id.is_empty())?;

        Some(GoogleOAuthConfig {
            client_id: client_id.to_owned(),
            client_secret: self.google_client_secret.clone(),
            callback_url: self.google_callback_url.clone(),
        })
    }
}

/// Returns true if either `app_env` or `env` is "production".
pub fn is_production(app_env: Option<&str>, env: Option<&str>) -> bool {
    app_env == Some(PRODUCTION) || env == Some(PRODUCTION)
}
