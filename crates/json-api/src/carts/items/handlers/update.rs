//! Update Cart Item Handler

use std::sync::Arc;

use salvo::{
    oapi::{
        ToSchema,
        extract::{JsonBody, PathParam},
    },
    prelude::*,
};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use bookstore_app::domain::carts::rules::MAX_LINE_QUANTITY;

use crate::{
    carts::{errors::into_api_error, models::CartResponse, owner::cart_owner},
    errors::{ApiError, FieldError},
    extensions::*,
    state::State,
    validation::{Checks, Validate, validated},
};

/// Update Cart Item Request
#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub(crate) struct UpdateCartItemRequest {
    /// New quantity for the line, `0` removes it
    pub quantity: u32,
}

impl Validate for UpdateCartItemRequest {
    fn validate(&self, errors: &mut Vec<FieldError>) {
        Checks::new(errors).range("quantity", self.quantity, 0, MAX_LINE_QUANTITY);
    }
}

/// Update Cart Item Handler
#[endpoint(
    tags("carts"),
    summary = "Update Cart Item Quantity",
    security(("bearer_auth" = []), ("session_id" = [])),
    responses(
        (status_code = StatusCode::OK, description = "Quantity updated"),
        (status_code = StatusCode::NOT_FOUND, description = "Book is not in the cart"),
    ),
)]
#[tracing::instrument(
    name = "carts.items.update",
    skip(req, book, json, depot),
    fields(book_uuid = tracing::field::Empty),
    err
)]
pub(crate) async fn handler(
    req: &mut Request,
    book: PathParam<Uuid>,
    json: JsonBody<UpdateCartItemRequest>,
    depot: &mut Depot,
) -> Result<Json<CartResponse>, ApiError> {
    let state = depot.obtain_or_500::<Arc<State>>()?;
    let owner = cart_owner(req, depot)?;
    let request = validated(json)?;
    let book = book.into_inner();

    tracing::Span::current().record("book_uuid", tracing::field::display(book));

    let cart = state
        .carts
        .update_item(owner, book.into(), request.quantity)
        .await
        .map_err(into_api_error)?;

    Ok(Json(CartResponse::new("Cart updated", cart)?))
}
