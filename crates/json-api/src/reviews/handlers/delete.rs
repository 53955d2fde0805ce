//! Delete Review Handler

use std::sync::Arc;

use salvo::{oapi::extract::PathParam, prelude::*};
use uuid::Uuid;

use crate::{
    errors::ApiError, extensions::*, models::MessageResponse, reviews::errors::into_api_error,
    state::State,
};

/// Delete Review Handler
///
/// Soft delete by the author or an admin. The book's rating is recomputed.
#[endpoint(
    tags("reviews"),
    summary = "Delete Review",
    security(("bearer_auth" = [])),
    responses(
        (status_code = StatusCode::OK, description = "Review deleted"),
        (status_code = StatusCode::FORBIDDEN, description = "Not the author or an admin"),
    ),
)]
#[tracing::instrument(
    name = "reviews.delete",
    skip(review, depot),
    fields(review_uuid = tracing::field::Empty),
    err
)]
pub(crate) async fn handler(
    review: PathParam<Uuid>,
    depot: &mut Depot,
) -> Result<Json<MessageResponse>, ApiError> {
    let state = depot.obtain_or_500::<Arc<State>>()?;
    let actor = depot.principal_or_401()?;
    let review = review.into_inner();

    tracing::Span::current().record("review_uuid", tracing::field::display(review));

    state
        .reviews
        .delete_review(actor, review.into())
        .await
        .map_err(into_api_error)?;

    Ok(Json(MessageResponse::new("Review deleted")))
}
