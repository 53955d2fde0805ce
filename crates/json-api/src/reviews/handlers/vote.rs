//! Vote on Review Handler

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

use crate::{
    errors::ApiError,
    extensions::*,
    reviews::{errors::into_api_error, models::ReviewResponse},
    state::State,
};

/// Helpfulness Vote Request
#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub(crate) struct VoteRequest {
    /// `true` for helpful, `false` for not helpful
    pub helpful: bool,
}

/// Vote on Review Handler
///
/// One vote per user and review. Voting again replaces the earlier vote.
#[endpoint(
    tags("reviews"),
    summary = "Vote on Review",
    security(("bearer_auth" = [])),
    responses(
        (status_code = StatusCode::OK, description = "Vote recorded"),
        (status_code = StatusCode::BAD_REQUEST, description = "Voting on your own review"),
    ),
)]
#[tracing::instrument(
    name = "reviews.vote",
    skip(review, json, depot),
    fields(review_uuid = tracing::field::Empty, helpful = tracing::field::Empty),
    err
)]
pub(crate) async fn handler(
    review: PathParam<Uuid>,
    json: JsonBody<VoteRequest>,
    depot: &mut Depot,
) -> Result<Json<ReviewResponse>, ApiError> {
    let state = depot.obtain_or_500::<Arc<State>>()?;
    let actor = depot.principal_or_401()?;
    let review = review.into_inner();

    tracing::Span::current().record("review_uuid", tracing::field::display(review));

    let helpful = json.into_inner().helpful;

    tracing::Span::current().record("helpful", helpful);

    let review = state
        .reviews
        .vote(actor, review.into(), helpful)
        .await
        .map_err(into_api_error)?;

    Ok(Json(ReviewResponse::new("Vote recorded", review)))
}
