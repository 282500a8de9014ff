//! OAuth providers used to identify users, and the Google implementation.

use std::{collections::HashMap, sync::Arc};

use async_trait::async_trait;
use serde::Deserialize;

const GOOGLE_AUTH_URL: &str = "https://accounts.google.com/o/oauth2/v2/auth";
const GOOGLE_TOKEN_URL: &str = "https://oauth2.googleapis.com/token";
const GOOGLE_USER_INFO_URL: &str = "https://www.googleapis.com/oauth2/v3/userinfo";
const GOOGLE_SCOPES: &str = "openid email profile";

/// The path segment that selects the Google provider.
pub const GOOGLE_PROVIDER: &str = "google";

/// The parts of a user's profile that an OAuth provider shares with us.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct OAuthProfile {
    /// The user's email. May be empty if the provider did not share it.
    pub email: String,
    /// The user's display name, empty if not shared.
    pub name: String,
    /// A URL to the user's profile picture, empty if not shared.
    pub avatar_url: String,
}

/// The errors that may occur while talking to an OAuth provider.
#[derive(Debug, thiserror::Error)]
pub enum OAuthError {
    /// The authorization URL could not be built.
    #[error("could not build the authorization URL: {0}")]
    AuthorizationUrl(#[from] serde_urlencoded::ser::Error),

    /// The provider could not be reached or returned an error.
    #[error("request to the OAuth provider failed: {0}")]
    Request(#[from] reqwest::Error),

    /// The provider rejected the authorization code.
    #[error("the OAuth provider rejected the code: {0}")]
    CodeRejected(String),
}

/// A provider that identifies users via the OAuth authorization code flow.
#[async_trait]
pub trait OAuthClient: Send + Sync {
    /// The URL of the provider's consent page, carrying `state` for the
    /// callback to check.
    fn authorization_url(&self, state: &str) -> Result<String, OAuthError>;

    /// Exchange an authorization code for the user's profile.
    async fn exchange_code(&self, code: &str) -> Result<OAuthProfile, OAuthError>;
}

/// The configured OAuth providers keyed by the name used in the URL path.
#[derive(Clone, Default)]
pub struct OAuthProviders {
    providers: HashMap<String, Arc<dyn OAuthClient>>,
}

impl OAuthProviders {
    /// Create an empty set of providers.
    pub fn new() -> Self {
        Self::default()
    }

    /// Register `client` under `name`, replacing any existing provider.
    pub fn with_provider(mut self, name: &str, client: Arc<dyn OAuthClient>) -> Self {
        self.providers.insert(name.to_lowercase(), client);
        self
    }

    /// Get the provider registered under `name`, ignoring case.
    pub fn get(&self, name: &str) -> Option<Arc<dyn OAuthClient>> {
        self.providers.get(&name.to_lowercase()).cloned()
    }
}

impl std::fmt::Debug for OAuthProviders {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_list().entries(self.providers.keys()).finish()
    }
}

/// Client credentials for Google's OAuth endpoints.
#[derive(Debug, Clone, PartialEq)]
pub struct GoogleOAuthConfig {
    /// The OAuth client ID.
    pub client_id: String,
    /// The OAuth client secret.
    pub client_secret: String,
    /// The URL Google redirects back to, must match the registered callback.
    pub callback_url: String,
}

/// Signs users in with Google.
pub struct GoogleOAuthClient {
    config: GoogleOAuthConfig,
    http: reqwest::Client,
}

impl GoogleOAuthClient {
    /// Create a Google client with the given credentials.
    pub fn new(config: GoogleOAuthConfig) -> Self {
        Self {
            config,
            http: reqwest::Client::new(),
        }
    }
}

#[derive(Debug, Deserialize)]
struct GoogleTokenResponse {
    access_token: String,
}

#[derive(Debug, Deserialize)]
struct GoogleUserInfo {
    email: Option<String>,
    name: Option<String>,
    picture: Option<String>,
}

#[async_trait]
impl OAuthClient for GoogleOAuthClient {
    fn authorization_url(&self, state: &str) -> Result<String, OAuthError> {
        let query = serde_urlencoded::to_string([
            ("client_id", self.config.client_id.as_str()),
            ("redirect_uri", self.config.callback_url.as_str()),
            ("response_type", "code"),
            ("scope", GOOGLE_SCOPES),
            ("state", state),
        ])?;

        Ok(format!("{GOOGLE_AUTH_URL}?{query}"))
    }

    async fn exchange_code(&self, code: &str) -> Result<OAuthProfile, OAuthError> {
        let response = self
            .http
            .post(GOOGLE_TOKEN_URL)
            .form(&[
                ("client_id", self.config.client_id.as_str()),
                ("client_secret", self.config.client_secret.as_str()),
                ("code", code),
                ("redirect_uri", self.config.callback_url.as_str()),
                ("grant_type", "authorization_code"),
            ])
            .send()
            .await?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            return Err(OAuthError::CodeRejected(format!("{status}: {body}")));
        }

        let token: GoogleTokenResponse = response.json().await?;

        let user_info: GoogleUserInfo = self
            .http
            .get(GOOGLE_USER_INFO_URL)
            .bearer_auth(&token.access_token)
            .send()
            .await?
            .error_for_status()?
            .json()
            .await?;

        Ok(OAuthProfile {
            email: user_info.email.unwrap_or_default(),
            name: user_info.name.unwrap_or_default(),
            avatar_url: user_info.picture.unwrap_or_default(),
        })
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use crate::{
        auth::oauth::{GoogleOAuthClient, GoogleOAuthConfig, OAuthClient, OAuthProviders},
        test_utils::StubOAuthClient,
    };

    fn get_google_client() -> GoogleOAuthClient {
        GoogleOAuthClient::new(GoogleOAuthConfig {
            client_id: "client-123".to_owned(),
            client_secret: "shh".to_owned(),
            callback_url: "http://localhost:8080/auth/google/callback".to_owned(),
        })
    }

    #[test]
    fn google_authorization_url_has_required_params() {
        let url = get_google_client().authorization_url("xyz").unwrap();

        assert!(url.starts_with("https://accounts.google.com/o/oauth2/v2/auth?"));
        assert!(url.contains("client_id=client-123"));
        assert!(url.contains(
            "redirect_uri=http%3A%2F%2Flocalhost%3A8080%2Fauth%2Fgoogle%2Fcallback"
        ));
        assert!(url.contains("response_type=code"));
        assert!(url.contains("scope=openid+email+profile"));
        assert!(url.contains("state=xyz"));
    }

    #[test]
    fn google_authorization_url_does_not_leak_secret() {
        let url = get_google_client().authorization_url("xyz").unwrap();

        assert!(!url.contains("shh"));
    }

    #[test]
    fn providers_are_looked_up_case_insensitively() {
        let providers =
            OAuthProviders::new().with_provider("google", Arc::new(StubOAuthClient::default()));

        assert!(providers.get("google").is_some());
        assert!(providers.get("Google").is_some());
        assert!(providers.get("github").is_none());
    }
}
