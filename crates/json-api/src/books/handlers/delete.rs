//! Delete Book Handler

use std::sync::Arc;

use salvo::{oapi::extract::PathParam, prelude::*};
use uuid::Uuid;

use crate::{
    books::errors::into_api_error, errors::ApiError, extensions::*, models::MessageResponse,
    state::State,
};

/// Delete Book Handler
///
/// Soft delete. The book disappears from the catalog but past orders keep
/// their snapshot.
#[endpoint(
    tags("books"),
    summary = "Delete Book",
    security(("bearer_auth" = [])),
    responses(
        (status_code = StatusCode::OK, description = "Book deleted"),
        (status_code = StatusCode::FORBIDDEN, description = "Not the book's seller"),
        (status_code = StatusCode::NOT_FOUND, description = "Book not found"),
    ),
)]
#[tracing::instrument(
    name = "books.delete",
    skip(book, depot),
    fields(book_uuid = tracing::field::Empty),
    err
)]
pub(crate) async fn handler(
    book: PathParam<Uuid>,
    depot: &mut Depot,
) -> Result<Json<MessageResponse>, ApiError> {
    let state = depot.obtain_or_500::<Arc<State>>()?;
    let actor = depot.principal_or_401()?;
    let book = book.into_inner();

    tracing::Span::current().record("book_uuid", tracing::field::display(book));

    state
        .books
        .delete_book(actor, book.into())
        .await
        .map_err(into_api_error)?;

    Ok(Json(MessageResponse::new("Book deleted")))
}
