//! Route handler that returns the profile of the logged-in user.

use axum::Json;
use serde::Serialize;
use serde_json::Value;

use crate::{auth::middleware::CurrentUser, user::UserID};

/// The public view of a user.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct UserProfile {
    id: UserID,
    name: Option<String>,
    email: String,
    avatar_url: Option<String>,
    preferences: Value,
}

/// A route handler that returns the profile of the user attached by the auth middleware.
pub async fn get_current_user(CurrentUser(user): CurrentUser) -> Json<UserProfile> {
    let preferences = match user.preferences {
        Value::Null => Value::Object(Default::default()),
        preferences => preferences,
    };

    Json(UserProfile {
        id: user.id,
        name: user.name,
        email: user.email,
        avatar_url: user.avatar_url,
        preferences,
    })
}
