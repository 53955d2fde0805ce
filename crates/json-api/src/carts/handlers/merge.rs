//! Merge Cart Handler

use std::sync::Arc;

use salvo::{
    oapi::{ToSchema, extract::JsonBody},
    prelude::*,
};
use serde::{Deserialize, Serialize};

use bookstore_app::domain::carts::records::SessionId;

use crate::{
    carts::{errors::into_api_error, models::CartResponse},
    errors::{ApiError, FieldError},
    extensions::*,
    state::State,
    validation::{Checks, Validate, validated},
};

/// Merge Cart Request
#[derive(Debug, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub(crate) struct MergeCartRequest {
    /// The guest session whose cart is folded into the caller's cart
    pub session_id: String,
}

impl Validate for MergeCartRequest {
    fn validate(&self, errors: &mut Vec<FieldError>) {
        if SessionId::parse(&self.session_id).is_err() {
            Checks::new(errors).fail(
                "sessionId",
                "must be 1-128 characters of letters, digits, '-' or '_'",
            );
        }
    }
}

/// Merge Cart Handler
///
/// Quantities of books in both carts are summed, capped by the line limit and
/// current stock. The guest cart is removed.
#[endpoint(
    tags("carts"),
    summary = "Merge Guest Cart",
    security(("bearer_auth" = [])),
    responses(
        (status_code = StatusCode::OK, description = "Carts merged"),
    ),
)]
#[tracing::instrument(name = "carts.merge", skip(json, depot), err)]
pub(crate) async fn handler(
    json: JsonBody<MergeCartRequest>,
    depot: &mut Depot,
) -> Result<Json<CartResponse>, ApiError> {
    let state = depot.obtain_or_500::<Arc<State>>()?;
    let actor = depot.principal_or_401()?;
    let request = validated(json)?;

    let session = SessionId::parse(&request.session_id)
        .map_err(|source| ApiError::bad_request(source.to_string()))?;

    let cart = state
        .carts
        .merge(session, actor.user)
        .await
        .map_err(into_api_error)?;

    Ok(Json(CartResponse::new("Carts merged", cart)?))
}

#[cfg(test)]
mod tests {
    use salvo::test::{ResponseExt, TestClient};
    use serde_json::{Value, json};
    use testresult::TestResult;

    use bookstore_app::domain::{
        books::records::BookUuid,
        carts::{MockCartsService, records::CartOwner},
    };

    use crate::{
        carts::handlers::tests::make_cart,
        test_helpers::{TEST_USER_UUID, buyer, carts_service},
    };

    use super::*;

    fn route() -> Router {
        Router::with_path("api/cart/merge").post(handler)
    }

    #[tokio::test]
    async fn test_merge_folds_the_session_into_the_user_cart() -> TestResult {
        let book = BookUuid::new();
        let mut carts = MockCartsService::new();

        carts
            .expect_merge()
            .once()
            .withf(|session, user| session.as_str() == "guest-42" && *user == TEST_USER_UUID)
            .return_once(move |_, user| Ok(make_cart(CartOwner::User(user), &[(book, 5, 9_99)])));

        let mut res = TestClient::post("http://example.com/api/cart/merge")
            .json(&json!({ "sessionId": "guest-42" }))
            .send(&carts_service(carts, Some(buyer()), route()))
            .await;

        assert_eq!(res.status_code, Some(StatusCode::OK));

        let body: CartResponse = res.take_json().await?;

        assert_eq!(body.cart.item_count, 5);

        Ok(())
    }

    #[tokio::test]
    async fn test_merge_requires_a_signed_in_user() -> TestResult {
        let res = TestClient::post("http://example.com/api/cart/merge")
            .json(&json!({ "sessionId": "guest-42" }))
            .send(&carts_service(MockCartsService::new(), None, route()))
            .await;

        assert_eq!(res.status_code, Some(StatusCode::UNAUTHORIZED));

        Ok(())
    }

    #[tokio::test]
    async fn test_merge_rejects_malformed_session_id() -> TestResult {
        let mut res = TestClient::post("http://example.com/api/cart/merge")
            .json(&json!({ "sessionId": "../etc" }))
            .send(&carts_service(MockCartsService::new(), Some(buyer()), route()))
            .await;

        assert_eq!(res.status_code, Some(StatusCode::BAD_REQUEST));

        let body: Value = res.take_json().await?;

        assert_eq!(
            body.pointer("/errors/0/field").and_then(Value::as_str),
            Some("sessionId")
        );

        Ok(())
    }
}
