use axum::{Json, extract::State};

use crate::{Error, auth::CurrentUserId};

use super::{
    query::{CategorySummary, TagSummary, get_category_summaries, get_tag_summaries},
    state::TransactionState,
};

/// A route handler listing the user's categories and how many transactions each has.
pub async fn get_categories_endpoint(
    State(state): State<TransactionState>,
    CurrentUserId(user_id): CurrentUserId,
) -> Result<Json<Vec<CategorySummary>>, Error> {
    let connection = state.connection()?;

    get_category_summaries(user_id, &connection).map(Json)
}

/// A route handler listing the user's tags and how many transactions carry each.
pub async fn get_tags_endpoint(
    State(state): State<TransactionState>,
    CurrentUserId(user_id): CurrentUserId,
) -> Result<Json<Vec<TagSummary>>, Error> {
    let connection = state.connection()?;

    get_tag_summaries(user_id, &connection).map(Json)
}

#[cfg(test)]
mod tests {
    use axum_extra::extract::cookie::Cookie;
    use axum_test::TestServer;
    use serde_json::{Value, json};

    use crate::{
        auth::COOKIE_TOKEN,
        build_router,
        test_utils::{create_test_user_with_token, get_test_app_state},
        transaction::{Transaction, TransactionType, create_transaction},
    };

    #[tokio::test]
    async fn lists_categories_and_tags() {
        let state = get_test_app_state();
        let (user, token) = create_test_user_with_token(&state, "a@example.com");
        {
            let connection = state.db_connection.lock().unwrap();
            for (category, tags) in [("Food", vec!["a", "b"]), ("Food", vec!["b"]), ("Rent", vec![])]
            {
                create_transaction(
                    Transaction::build(1.0, TransactionType::Expense)
                        .category(category)
                        .tags(tags.into_iter().map(str::to_owned).collect()),
                    user.id,
                    &connection,
                )
                .unwrap();
            }
        }
        let server = TestServer::try_new(build_router(state)).expect("Could not create test server.");

        let categories = server
            .get("/categories")
            .add_cookie(Cookie::new(COOKIE_TOKEN, token.clone()))
            .await;
        let tags = server
            .get("/tags")
            .add_cookie(Cookie::new(COOKIE_TOKEN, token))
            .await;

        categories.assert_status_ok();
        assert_eq!(
            categories.json::<Value>(),
            json!([{"category": "Food", "count": 2}, {"category": "Rent", "count": 1}])
        );
        tags.assert_status_ok();
        assert_eq!(
            tags.json::<Value>(),
            json!([{"tag": "a", "count": 1}, {"tag": "b", "count": 2}])
        );
    }
}
