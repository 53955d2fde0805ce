//! Flag Review Handler

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
    errors::{ApiError, FieldError},
    extensions::*,
    reviews::{errors::into_api_error, models::ReviewResponse},
    state::State,
    validation::{Checks, Validate, validated},
};

const MAX_REASON_LEN: usize = 500;

/// Flag Review Request
#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub(crate) struct FlagReviewRequest {
    /// Why the review should be looked at
    pub reason: String,
}

impl Validate for FlagReviewRequest {
    fn validate(&self, errors: &mut Vec<FieldError>) {
        Checks::new(errors).text("reason", &self.reason, MAX_REASON_LEN);
    }
}

/// Flag Review Handler
///
/// Marks the review for moderation. It stays visible until an admin removes it.
#[endpoint(
    tags("reviews"),
    summary = "Flag Review",
    security(("bearer_auth" = [])),
    responses(
        (status_code = StatusCode::OK, description = "Review flagged"),
    ),
)]
#[tracing::instrument(
    name = "reviews.flag",
    skip(review, json, depot),
    fields(review_uuid = tracing::field::Empty),
    err
)]
pub(crate) async fn handler(
    review: PathParam<Uuid>,
    json: JsonBody<FlagReviewRequest>,
    depot: &mut Depot,
) -> Result<Json<ReviewResponse>, ApiError> {
    let state = depot.obtain_or_500::<Arc<State>>()?;
    let actor = depot.principal_or_401()?;
    let review = review.into_inner();

    tracing::Span::current().record("review_uuid", tracing::field::display(review));

    let request = validated(json)?;

    let review = state
        .reviews
        .flag_review(
            actor,
            review.into(),
            request.reason.trim().to_string(),
        )
        .await
        .map_err(into_api_error)?;

    Ok(Json(ReviewResponse::new("Review flagged", review)))
}
