//! Add Cart Item Handler

use std::sync::Arc;

use salvo::{
    oapi::{ToSchema, extract::JsonBody},
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

/// Add Cart Item Request
#[derive(Debug, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub(crate) struct AddCartItemRequest {
    pub book_uuid: Uuid,

    /// Added to the quantity already in the cart
    pub quantity: u32,
}

impl Validate for AddCartItemRequest {
    fn validate(&self, errors: &mut Vec<FieldError>) {
        Checks::new(errors).range("quantity", self.quantity, 1, MAX_LINE_QUANTITY);
    }
}

/// Add Cart Item Handler
#[endpoint(
    tags("carts"),
    summary = "Add Book to Cart",
    security(("bearer_auth" = []), ("session_id" = [])),
    responses(
        (status_code = StatusCode::OK, description = "Book added"),
        (status_code = StatusCode::BAD_REQUEST, description = "Unavailable, out of stock, or over the line limit"),
    ),
)]
#[tracing::instrument(
    name = "carts.items.add",
    skip(req, json, depot),
    fields(book_uuid = tracing::field::Empty, quantity = tracing::field::Empty),
    err
)]
pub(crate) async fn handler(
    req: &mut Request,
    json: JsonBody<AddCartItemRequest>,
    depot: &mut Depot,
) -> Result<Json<CartResponse>, ApiError> {
    let state = depot.obtain_or_500::<Arc<State>>()?;
    let owner = cart_owner(req, depot)?;
    let request = validated(json)?;

    let span = tracing::Span::current();

    span.record("book_uuid", tracing::field::display(request.book_uuid));
    span.record("quantity", request.quantity);

    let cart = state
        .carts
        .add_item(owner, request.book_uuid.into(), request.quantity)
        .await
        .map_err(into_api_error)?;

    Ok(Json(CartResponse::new("Book added to cart", cart)?))
}
