//! Create Review Handler

use std::sync::Arc;

use salvo::{
    http::header::LOCATION,
    oapi::{ToSchema, extract::JsonBody},
    prelude::*,
};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use bookstore_app::domain::reviews::{
    data::NewReview,
    records::{MAX_RATING, MIN_RATING, Rating, ReviewUuid},
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

/// Create Review Request
#[derive(Debug, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub(crate) struct CreateReviewRequest {
    pub book_uuid: Uuid,

    /// 1 to 5 stars
    pub rating: u8,
    pub title: String,
    pub comment: String,
}

impl Validate for CreateReviewRequest {
    fn validate(&self, errors: &mut Vec<FieldError>) {
        Checks::new(errors)
            .range("rating", self.rating, MIN_RATING, MAX_RATING)
            .text("title", &self.title, MAX_TITLE_LEN)
            .text("comment", &self.comment, MAX_COMMENT_LEN);
    }
}

impl TryFrom<CreateReviewRequest> for NewReview {
    type Error = ApiError;

    fn try_from(request: CreateReviewRequest) -> Result<Self, Self::Error> {
        let rating = Rating::new(request.rating)
            .map_err(|source| ApiError::bad_request(source.to_string()))?;

        Ok(NewReview {
            uuid: ReviewUuid::new(),
            book: request.book_uuid.into(),
            rating,
            title: request.title.trim().to_string(),
            comment: request.comment.trim().to_string(),
        })
    }
}

/// Create Review Handler
///
/// One review per book and user. Reviews of purchased books are marked
/// verified.
#[endpoint(
    tags("reviews"),
    summary = "Review Book",
    security(("bearer_auth" = [])),
    responses(
        (status_code = StatusCode::CREATED, description = "Review created"),
        (status_code = StatusCode::BAD_REQUEST, description = "Already reviewed or book unavailable"),
    ),
)]
#[tracing::instrument(
    name = "reviews.create",
    skip(json, depot, res),
    fields(book_uuid = tracing::field::Empty),
    err
)]
pub(crate) async fn handler(
    json: JsonBody<CreateReviewRequest>,
    depot: &mut Depot,
    res: &mut Response,
) -> Result<Json<ReviewResponse>, ApiError> {
    let state = depot.obtain_or_500::<Arc<State>>()?;
    let actor = depot.principal_or_401()?;
    let review = NewReview::try_from(validated(json)?)?;

    tracing::Span::current().record("book_uuid", tracing::field::display(review.book));

    let review = state
        .reviews
        .create_review(actor, review)
        .await
        .map_err(into_api_error)?;

    res.add_header(LOCATION, format!("/api/reviews/{}", review.uuid), true)
        .or_500("failed to set location header")?
        .status_code(StatusCode::CREATED);

    Ok(Json(ReviewResponse::new("Review created", review)))
}

#[cfg(test)]
mod tests {
    use salvo::test::{ResponseExt, TestClient};
    use serde_json::{Value, json};
    use testresult::TestResult;

    use bookstore_app::domain::{
        books::records::BookUuid,
        reviews::{MockReviewsService, ReviewsServiceError},
    };

    use crate::{
        reviews::handlers::tests::make_review,
        test_helpers::{buyer, reviews_service},
    };

    use super::*;

    fn make_service(reviews: MockReviewsService) -> Service {
        reviews_service(
            reviews,
            Some(buyer()),
            Router::with_path("api/reviews").post(handler),
        )
    }

    #[tokio::test]
    async fn test_create_review_returns_201() -> TestResult {
        let book = BookUuid::new();
        let rating = Rating::new(4)?;
        let mut reviews = MockReviewsService::new();

        reviews
            .expect_create_review()
            .once()
            .withf(move |_, review| {
                review.book == book && review.rating == rating && review.title == "A classic"
            })
            .return_once(move |_, review| Ok(make_review(review.uuid, book, rating)));

        let mut res = TestClient::post("http://example.com/api/reviews")
            .json(&json!({
                "bookUuid": book.to_string(),
                "rating": 4,
                "title": " A classic ",
                "comment": "Still holds up.",
            }))
            .send(&make_service(reviews))
            .await;

        assert_eq!(res.status_code, Some(StatusCode::CREATED));

        let body: ReviewResponse = res.take_json().await?;
        let location = res.headers().get("location").and_then(|v| v.to_str().ok());

        assert_eq!(
            location,
            Some(format!("/api/reviews/{}", body.review.uuid).as_str())
        );
        assert!(body.review.verified);

        Ok(())
    }

    #[tokio::test]
    async fn test_rating_outside_one_to_five_is_rejected() -> TestResult {
        let mut res = TestClient::post("http://example.com/api/reviews")
            .json(&json!({
                "bookUuid": Uuid::now_v7(),
                "rating": 6,
                "title": "Too good",
                "comment": "Six stars.",
            }))
            .send(&make_service(MockReviewsService::new()))
            .await;

        assert_eq!(res.status_code, Some(StatusCode::BAD_REQUEST));

        let body: Value = res.take_json().await?;

        assert_eq!(
            body.pointer("/errors/0/field").and_then(Value::as_str),
            Some("rating")
        );

        Ok(())
    }

    #[tokio::test]
    async fn test_second_review_of_a_book_returns_400() -> TestResult {
        let mut reviews = MockReviewsService::new();

        reviews
            .expect_create_review()
            .once()
            .return_once(|_, _| Err(ReviewsServiceError::AlreadyExists));

        let res = TestClient::post("http://example.com/api/reviews")
            .json(&json!({
                "bookUuid": Uuid::now_v7(),
                "rating": 3,
                "title": "Again",
                "comment": "Changed my mind.",
            }))
            .send(&make_service(reviews))
            .await;

        assert_eq!(res.status_code, Some(StatusCode::BAD_REQUEST));

        Ok(())
    }
}
