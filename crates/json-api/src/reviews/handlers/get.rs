//! Get Review Handler

use std::sync::Arc;

use salvo::{oapi::extract::PathParam, prelude::*};
use uuid::Uuid;

use crate::{
    errors::ApiError,
    extensions::*,
    reviews::{errors::into_api_error, models::ReviewResponse},
    state::State,
};

/// Get Review Handler
#[endpoint(
    tags("reviews"),
    summary = "Get Review",
    responses(
        (status_code = StatusCode::OK, description = "Review found"),
        (status_code = StatusCode::NOT_FOUND, description = "Review not found or removed"),
    ),
)]
#[tracing::instrument(
    name = "reviews.get",
    skip(review, depot),
    fields(review_uuid = tracing::field::Empty),
    err
)]
pub(crate) async fn handler(
    review: PathParam<Uuid>,
    depot: &mut Depot,
) -> Result<Json<ReviewResponse>, ApiError> {
    let state = depot.obtain_or_500::<Arc<State>>()?;
    let review = review.into_inner();

    tracing::Span::current().record("review_uuid", tracing::field::display(review));

    let review = state
        .reviews
        .get_review(review.into())
        .await
        .map_err(into_api_error)?;

    Ok(Json(ReviewResponse::new("Review retrieved", review)))
}
