//! Update Review Handler

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

use bookstore_app::domain::reviews::{
    data::ReviewUpdate,
    records::{MAX_RATING, MIN_RATING, Rating},
};

use crate::{
    errors::{ApiError, FieldError},
    extensions::*,
    reviews::{
        errors::into_api_error,
        handlers::{MAX_COMMENT_LEN, MAX_TITLE_LEN},
        models::ReviewResponse,
    },
    state::State,
    validation::{Checks, Validate, validated},
};

/// Update Review Request. Omitted fields are left unchanged.
#[derive(Debug, Default, Serialize, Deserialize, ToSchema)]
pub(crate) struct UpdateReviewRequest {
    pub rating: Option<u8>,
    pub title: Option<String>,
    pub comment: Option<String>,
}

impl Validate for UpdateReviewRequest {
    fn validate(&self, errors: &mut Vec<FieldError>) {
        let mut checks = Checks::new(errors);

        if let Some(rating) = self.rating {
            checks.range("rating", rating, MIN_RATING, MAX_RATING);
        }

        checks
            .optional_text("title", self.title.as_deref(), MAX_TITLE_LEN)
            .optional_text("comment", self.comment.as_deref(), MAX_COMMENT_LEN);
    }
}

impl TryFrom<UpdateReviewRequest> for ReviewUpdate {
    type Error = ApiError;

    fn try_from(request: UpdateReviewRequest) -> Result<Self, Self::Error> {
        let rating = request
            .rating
            .map(Rating::new)
            .transpose()
            .map_err(|source| ApiError::bad_request(source.to_string()))?;

        Ok(ReviewUpdate {
            rating,
            title: request.title.map(|title| title.trim().to_string()),
            comment: request.comment.map(|comment| comment.trim().to_string()),
        })
    }
}

/// Update Review Handler
#[endpoint(
    tags("reviews"),
    summary = "Update Review",
    security(("bearer_auth" = [])),
    responses(
        (status_code = StatusCode::OK, description = "Review updated"),
        (status_code = StatusCode::FORBIDDEN, description = "Not the author"),
    ),
)]
#[tracing::instrument(
    name = "reviews.update",
    skip(review, json, depot),
    fields(review_uuid = tracing::field::Empty),
    err
)]
pub(crate) async fn handler(
    review: PathParam<Uuid>,
    json: JsonBody<UpdateReviewRequest>,
    depot: &mut Depot,
) -> Result<Json<ReviewResponse>, ApiError> {
    let state = depot.obtain_or_500::<Arc<State>>()?;
    let actor = depot.principal_or_401()?;
    let review = review.into_inner();

    tracing::Span::current().record("review_uuid", tracing::field::display(review));

    let update = ReviewUpdate::try_from(validated(json)?)?;

    let review = state
        .reviews
        .update_review(actor, review.into(), update)
        .await
        .map_err(into_api_error)?;

    Ok(Json(ReviewResponse::new("Review updated", review)))
}
