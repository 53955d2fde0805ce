//! List Book Reviews Handler

use std::sync::Arc;

use salvo::{
    oapi::{
        ToSchema,
        extract::{PathParam, QueryParam},
    },
    prelude::*,
};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use bookstore_app::domain::Page;

use crate::{
    errors::ApiError,
    extensions::*,
    reviews::{errors::into_api_error, models::ReviewModel},
    state::State,
};

/// Reviews Response
#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub(crate) struct ReviewsResponse {
    pub message: String,
    pub reviews: Vec<ReviewModel>,
    pub limit: u32,
    pub offset: u32,
}

/// List Book Reviews Handler
///
/// Active reviews only, newest first.
#[endpoint(
    tags("reviews"),
    summary = "List Book Reviews",
    responses(
        (status_code = StatusCode::OK, description = "Reviews listed"),
    ),
)]
#[tracing::instrument(
    name = "reviews.index",
    skip(book, limit, offset, depot),
    fields(book_uuid = tracing::field::Empty),
    err
)]
pub(crate) async fn handler(
    book: PathParam<Uuid>,
    limit: QueryParam<u32, false>,
    offset: QueryParam<u32, false>,
    depot: &mut Depot,
) -> Result<Json<ReviewsResponse>, ApiError> {
    let state = depot.obtain_or_500::<Arc<State>>()?;
    let book = book.into_inner();

    tracing::Span::current().record("book_uuid", tracing::field::display(book));

    let page = Page::new(limit.into_inner(), offset.into_inner());

    let reviews = state
        .reviews
        .list_reviews(book.into(), page)
        .await
        .map_err(into_api_error)?;

    Ok(Json(ReviewsResponse {
        message: "Reviews retrieved".to_string(),
        reviews: reviews.into_iter().map(Into::into).collect(),
        limit: page.limit,
        offset: page.offset,
    }))
}
