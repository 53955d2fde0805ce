//! Moderate Review Handler

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

use bookstore_app::domain::reviews::records::Moderation;

use crate::{
    errors::{ApiError, FieldError},
    extensions::*,
    reviews::{errors::into_api_error, models::ReviewResponse},
    state::State,
    validation::{Checks, Validate, validated},
};

/// Moderation Request
#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub(crate) struct ModerationRequest {
    /// `approve` clears the flag, `remove` hides the review
    pub decision: String,
}

impl Validate for ModerationRequest {
    fn validate(&self, errors: &mut Vec<FieldError>) {
        if self.decision.parse::<Moderation>().is_err() {
            Checks::new(errors).fail("decision", "must be approve or remove");
        }
    }
}

/// Moderate Review Handler
#[endpoint(
    tags("reviews"),
    summary = "Moderate Review",
    security(("bearer_auth" = [])),
    responses(
        (status_code = StatusCode::OK, description = "Decision applied"),
        (status_code = StatusCode::FORBIDDEN, description = "Admins only"),
    ),
)]
#[tracing::instrument(
    name = "reviews.moderate",
    skip(review, json, depot),
    fields(review_uuid = tracing::field::Empty, decision = tracing::field::Empty),
    err
)]
pub(crate) async fn handler(
    review: PathParam<Uuid>,
    json: JsonBody<ModerationRequest>,
    depot: &mut Depot,
) -> Result<Json<ReviewResponse>, ApiError> {
    let state = depot.obtain_or_500::<Arc<State>>()?;
    let actor = depot.principal_or_401()?;
    let review = review.into_inner();

    tracing::Span::current().record("review_uuid", tracing::field::display(review));

    if !actor.is_admin() {
        return Err(ApiError::forbidden("Only admins can moderate reviews"));
    }

    let decision = validated(json)?
        .decision
        .parse::<Moderation>()
        .map_err(|source| ApiError::bad_request(source.to_string()))?;

    tracing::Span::current().record("decision", decision.as_str());

    let review = state
        .reviews
        .moderate_review(actor, review.into(), decision)
        .await
        .map_err(into_api_error)?;

    Ok(Json(ReviewResponse::new("Review moderated", review)))
}
