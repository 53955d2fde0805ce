//! Update Book Handler

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

use bookstore_app::domain::books::data::BookUpdate;

use crate::{
    books::{
        errors::into_api_error,
        handlers::{MAX_AUTHOR_LEN, MAX_DESCRIPTION_LEN, MAX_PRICE, MAX_TITLE_LEN},
        models::BookResponse,
    },
    errors::{ApiError, FieldError},
    extensions::*,
    state::State,
    validation::{Checks, Validate, validated},
};

/// Update Book Request. Omitted fields are left unchanged.
#[derive(Debug, Default, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub(crate) struct UpdateBookRequest {
    pub title: Option<String>,
    pub author: Option<String>,
    pub description: Option<String>,

    /// Price in cents
    pub price: Option<u64>,

    /// `false` takes the book off sale, `true` puts it back
    pub listed: Option<bool>,
}

impl Validate for UpdateBookRequest {
    fn validate(&self, errors: &mut Vec<FieldError>) {
        let mut checks = Checks::new(errors);

        checks
            .optional_text("title", self.title.as_deref(), MAX_TITLE_LEN)
            .optional_text("author", self.author.as_deref(), MAX_AUTHOR_LEN)
            .optional_text("description", self.description.as_deref(), MAX_DESCRIPTION_LEN);

        if let Some(price) = self.price {
            checks.range("price", price, 0, MAX_PRICE);
        }
    }
}

impl From<UpdateBookRequest> for BookUpdate {
    fn from(request: UpdateBookRequest) -> Self {
        BookUpdate {
            title: request.title.map(|title| title.trim().to_string()),
            author: request.author.map(|author| author.trim().to_string()),
            description: request.description,
            price: request.price,
            listed: request.listed,
        }
    }
}

/// Update Book Handler
#[endpoint(
    tags("books"),
    summary = "Update Book",
    security(("bearer_auth" = [])),
    responses(
        (status_code = StatusCode::OK, description = "Book updated"),
        (status_code = StatusCode::FORBIDDEN, description = "Not the book's seller"),
        (status_code = StatusCode::NOT_FOUND, description = "Book not found"),
    ),
)]
#[tracing::instrument(
    name = "books.update",
    skip(book, json, depot),
    fields(user_uuid = tracing::field::Empty, book_uuid = tracing::field::Empty),
    err
)]
pub(crate) async fn handler(
    book: PathParam<Uuid>,
    json: JsonBody<UpdateBookRequest>,
    depot: &mut Depot,
) -> Result<Json<BookResponse>, ApiError> {
    let state = depot.obtain_or_500::<Arc<State>>()?;
    let actor = depot.principal_or_401()?;
    let request = validated(json)?;
    let book = book.into_inner();

    let span = tracing::Span::current();

    span.record("user_uuid", tracing::field::display(actor.user));
    span.record("book_uuid", tracing::field::display(book));

    let book = state
        .books
        .update_book(actor, book.into(), request.into())
        .await
        .map_err(into_api_error)?;

    Ok(Json(BookResponse::new("Book updated", book)))
}
