use axum::{body::Body, response::Response};
use serde_json::Value;

pub(crate) async fn parse_json_body(response: Response<Body>) -> Value {
    let body = response.into_body();
    let body = axum::body::to_bytes(body, usize::MAX)
        .await
        .expect("Could not get response body");

    serde_json::from_slice(&body).expect("Response body is not valid JSON")
}

#[track_caller]
pub(crate) fn assert_content_type(response: &Response<Body>, content_type: &str) {
    let content_type_header = response
        .headers()
        .get("content-type")
        .expect("content-type header missing");
    assert_eq!(content_type_header, content_type);
}

/// Find the `Set-Cookie` header for the cookie called `name`.
#[track_caller]
pub(crate) fn get_set_cookie(response: &axum_test::TestResponse, name: &str) -> String {
    let prefix = format!("{name}=");

    response
        .headers()
        .get_all("set-cookie")
        .iter()
        .filter_map(|value| value.to_str().ok())
        .find(|value| value.starts_with(&prefix))
        .unwrap_or_else(|| panic!("No Set-Cookie header for {name}"))
        .to_owned()
}
