//! Remove Cart Item Handler

use std::sync::Arc;

use salvo::{oapi::extract::PathParam, prelude::*};
use uuid::Uuid;

use crate::{
    carts::{errors::into_api_error, models::CartResponse, owner::cart_owner},
    errors::ApiError,
    extensions::*,
    state::State,
};

/// Remove Cart Item Handler
#[endpoint(
    tags("carts"),
    summary = "Remove Book from Cart",
    security(("bearer_auth" = []), ("session_id" = [])),
    responses(
        (status_code = StatusCode::OK, description = "Book removed"),
        (status_code = StatusCode::NOT_FOUND, description = "Book is not in the cart"),
    ),
)]
#[tracing::instrument(name = "carts.items.remove", skip(req, book, depot), err)]
pub(crate) async fn handler(
    req: &mut Request,
    book: PathParam<Uuid>,
    depot: &mut Depot,
) -> Result<Json<CartResponse>, ApiError> {
    let state = depot.obtain_or_500::<Arc<State>>()?;
    let owner = cart_owner(req, depot)?;

    let cart = state
        .carts
        .remove_item(owner, book.into_inner().into())
        .await
        .map_err(into_api_error)?;

    Ok(Json(CartResponse::new("Book removed from cart", cart)?))
}
