//! Log-out route handler that clears the session cookie.

use axum::{
    extract::{FromRef, State},
    http::StatusCode,
    response::{IntoResponse, Response},
};
use axum_extra::extract::CookieJar;

use crate::{AppState, auth::cookie::{CookiePolicy, invalidate_auth_cookie}};

impl FromRef<AppState> for CookiePolicy {
    fn from_ref(state: &AppState) -> Self {
        state.cookie_policy
    }
}

/// Invalidate the session cookie and respond with 204 No Content.
///
/// Logging out does not require a valid session, so this always succeeds.
pub async fn log_out(State(policy): State<CookiePolicy>, jar: CookieJar) -> Response {
    let jar = invalidate_auth_cookie(jar, policy);

    (StatusCode::NO_CONTENT, jar).into_response()
}

#[cfg(test)]
mod log_out_tests {
    use axum::http::StatusCode;
    use axum_extra::extract::cookie::{Cookie, SameSite};
    use axum_test::TestServer;
    use time::OffsetDateTime;

    use crate::{
        auth::{CookiePolicy, cookie::COOKIE_TOKEN},
        build_router,
        test_utils::{create_test_user_with_token, get_set_cookie, get_test_app_state},
    };

    fn assert_cookie_expired(set_cookie: &str) {
        let cookie = Cookie::parse(set_cookie.to_owned()).unwrap();

        assert_eq!(cookie.name(), COOKIE_TOKEN);
        assert_eq!(cookie.value(), "");
        assert_eq!(cookie.max_age(), Some(time::Duration::ZERO));
        assert_eq!(
            cookie.expires_datetime(),
            Some(OffsetDateTime::UNIX_EPOCH),
            "got expires {:?}, want {:?}",
            cookie.expires_datetime(),
            Some(OffsetDateTime::UNIX_EPOCH),
        );
        assert_eq!(cookie.http_only(), Some(true));
        assert_eq!(cookie.path(), Some("/"));
    }

    #[tokio::test]
    async fn log_out_invalidates_auth_cookie() {
        let state = get_test_app_state();
        let (_, token) = create_test_user_with_token(&state, "a@example.com");
        let server = TestServer::try_new(build_router(state)).expect("Could not create test server.");

        let response = server
            .post("/auth/logout")
            .add_cookie(Cookie::new(COOKIE_TOKEN, token))
            .await;

        response.assert_status(StatusCode::NO_CONTENT);
        let set_cookie = get_set_cookie(&response, COOKIE_TOKEN);
        assert_cookie_expired(&set_cookie);
        assert!(set_cookie.contains("SameSite=Lax"));
        assert!(!set_cookie.contains("Secure"));
    }

    #[tokio::test]
    async fn log_out_without_session_succeeds() {
        let server = TestServer::try_new(build_router(get_test_app_state()))
            .expect("Could not create test server.");

        let response = server.post("/auth/logout").await;

        response.assert_status(StatusCode::NO_CONTENT);
        assert_cookie_expired(&get_set_cookie(&response, COOKIE_TOKEN));
    }

    #[tokio::test]
    async fn production_log_out_cookie_is_secure() {
        let mut state = get_test_app_state();
        state.cookie_policy = CookiePolicy::new(true);
        let server = TestServer::try_new(build_router(state)).expect("Could not create test server.");

        let response = server.post("/auth/logout").await;

        let cookie = Cookie::parse(get_set_cookie(&response, COOKIE_TOKEN)).unwrap();
        assert_eq!(cookie.secure(), Some(true));
        assert_eq!(cookie.same_site(), Some(SameSite::None));
    }
}
