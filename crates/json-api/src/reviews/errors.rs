//! Review Errors

use bookstore_app::domain::reviews::ReviewsServiceError;

use crate::errors::ApiError;

pub(crate) fn into_api_error(error: ReviewsServiceError) -> ApiError {
    match error {
        ReviewsServiceError::AlreadyExists => {
            ApiError::bad_request("You have already reviewed this book")
        }
        ReviewsServiceError::NotFound => ApiError::not_found("Review not found"),
        ReviewsServiceError::Forbidden => ApiError::forbidden("Not allowed to change this review"),
        ReviewsServiceError::BookUnavailable => {
            ApiError::bad_request("Book is not available for review")
                .with_error("bookUuid", "is not in the catalog")
        }
        ReviewsServiceError::OwnReview => {
            ApiError::bad_request("You cannot vote on your own review")
        }
        ReviewsServiceError::InvalidReference
        | ReviewsServiceError::MissingRequiredData
        | ReviewsServiceError::InvalidData => ApiError::bad_request("Invalid review payload"),
        ReviewsServiceError::Sql(source) => ApiError::internal("reviews storage error", &source),
    }
}

#[cfg(test)]
mod tests {
    use salvo::http::StatusCode;

    use super::*;

    #[test]
    fn second_review_is_a_bad_request() {
        let error = into_api_error(ReviewsServiceError::AlreadyExists);

        assert_eq!(error.status(), StatusCode::BAD_REQUEST);
        assert_eq!(error.message(), "You have already reviewed this book");
    }

    #[test]
    fn foreign_review_is_forbidden() {
        assert_eq!(
            into_api_error(ReviewsServiceError::Forbidden).status(),
            StatusCode::FORBIDDEN
        );
    }
}
