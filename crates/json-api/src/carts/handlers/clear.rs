//! Clear Cart Handler

use std::sync::Arc;

use salvo::prelude::*;

use crate::{
    carts::{errors::into_api_error, models::CartResponse, owner::cart_owner},
    errors::ApiError,
    extensions::*,
    state::State,
};

/// Clear Cart Handler
#[endpoint(
    tags("carts"),
    summary = "Clear Cart",
    security(("bearer_auth" = []), ("session_id" = [])),
    responses(
        (status_code = StatusCode::OK, description = "Cart emptied"),
    ),
)]
#[tracing::instrument(name = "carts.clear", skip(req, depot), err)]
pub(crate) async fn handler(req: &mut Request, depot: &mut Depot) -> Result<Json<CartResponse>, ApiError> {
    let state = depot.obtain_or_500::<Arc<State>>()?;
    let owner = cart_owner(req, depot)?;

    let cart = state.carts.clear(owner).await.map_err(into_api_error)?;

    Ok(Json(CartResponse::new("Cart cleared", cart)?))
}
