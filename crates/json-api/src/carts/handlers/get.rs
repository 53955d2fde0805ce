//! Get Cart Handler

use std::sync::Arc;

use salvo::prelude::*;

use crate::{
    carts::{errors::into_api_error, models::CartResponse, owner::cart_owner},
    errors::ApiError,
    extensions::*,
    state::State,
};

/// Get Cart Handler
///
/// Returns an empty cart when the owner has never added anything.
#[endpoint(
    tags("carts"),
    summary = "Get Cart",
    security(("bearer_auth" = []), ("session_id" = [])),
    responses(
        (status_code = StatusCode::OK, description = "Cart found"),
    ),
)]
#[tracing::instrument(name = "carts.get", skip(req, depot), fields(cart_owner = tracing::field::Empty), err)]
pub(crate) async fn handler(req: &mut Request, depot: &mut Depot) -> Result<Json<CartResponse>, ApiError> {
    let state = depot.obtain_or_500::<Arc<State>>()?;
    let owner = cart_owner(req, depot)?;

    tracing::Span::current().record("cart_owner", tracing::field::display(&owner));

    let cart = state.carts.get_cart(owner).await.map_err(into_api_error)?;

    Ok(Json(CartResponse::new("Cart retrieved", cart)?))
}

#[cfg(test)]
mod tests {
    use salvo::test::{ResponseExt, TestClient};
    use testresult::TestResult;

    use bookstore_app::domain::{
        books::records::BookUuid,
        carts::{
            MockCartsService,
            records::{CartOwner, CartRecord, SessionId},
        },
    };

    use crate::{
        carts::{handlers::tests::make_cart, owner::SESSION_ID_HEADER},
        test_helpers::{TEST_USER_UUID, buyer, carts_service},
    };

    use super::*;

    fn route() -> Router {
        Router::with_path("api/cart").get(handler)
    }

    #[tokio::test]
    async fn test_get_cart_for_user() -> TestResult {
        let book = BookUuid::new();
        let mut carts = MockCartsService::new();

        carts
            .expect_get_cart()
            .once()
            .withf(|owner| *owner == CartOwner::User(TEST_USER_UUID))
            .return_once(move |owner| Ok(make_cart(owner, &[(book, 2, 15_00)])));

        let mut res = TestClient::get("http://example.com/api/cart")
            .send(&carts_service(carts, Some(buyer()), route()))
            .await;

        assert_eq!(res.status_code, Some(StatusCode::OK));

        let body: CartResponse = res.take_json().await?;

        assert_eq!(body.cart.subtotal, 30_00);
        assert_eq!(body.cart.item_count, 2);

        Ok(())
    }

    #[tokio::test]
    async fn test_get_cart_for_guest_session() -> TestResult {
        let session = SessionId::parse("guest-42")?;
        let expected = CartOwner::Session(session);

        let mut carts = MockCartsService::new();

        carts
            .expect_get_cart()
            .once()
            .withf(move |owner| *owner == expected)
            .return_once(|owner| Ok(CartRecord::empty(owner)));

        let mut res = TestClient::get("http://example.com/api/cart")
            .add_header(SESSION_ID_HEADER, "guest-42", true)
            .send(&carts_service(carts, None, route()))
            .await;

        assert_eq!(res.status_code, Some(StatusCode::OK));

        let body: CartResponse = res.take_json().await?;

        assert_eq!(body.cart.uuid, None);
        assert!(body.cart.items.is_empty());

        Ok(())
    }

    #[tokio::test]
    async fn test_get_cart_without_owner_returns_401() -> TestResult {
        let res = TestClient::get("http://example.com/api/cart")
            .send(&carts_service(MockCartsService::new(), None, route()))
            .await;

        assert_eq!(res.status_code, Some(StatusCode::UNAUTHORIZED));

        Ok(())
    }
}
