//! Book Errors

use bookstore_app::domain::{books::BooksServiceError, stock::StockError};

use crate::errors::ApiError;

pub(crate) fn into_api_error(error: BooksServiceError) -> ApiError {
    match error {
        BooksServiceError::AlreadyExists => {
            ApiError::bad_request("A book with this ISBN already exists")
                .with_error("isbn", "is already taken")
        }
        BooksServiceError::NotFound => ApiError::not_found("Book not found"),
        BooksServiceError::Forbidden => ApiError::forbidden("Not allowed to manage this book"),
        BooksServiceError::InvalidReference
        | BooksServiceError::MissingRequiredData
        | BooksServiceError::InvalidData => ApiError::bad_request("Invalid book payload"),
        BooksServiceError::Stock(StockError::Insufficient {
            requested,
            available,
        }) => ApiError::bad_request(format!(
            "Cannot remove {requested} copies, only {available} in stock"
        )),
        BooksServiceError::Stock(source) => ApiError::bad_request(source.to_string()),
        BooksServiceError::Sql(source) => ApiError::internal("books storage error", &source),
    }
}

#[cfg(test)]
mod tests {
    use salvo::http::StatusCode;

    use super::*;

    #[test]
    fn duplicate_isbn_is_a_bad_request() {
        let error = into_api_error(BooksServiceError::AlreadyExists);

        assert_eq!(error.status(), StatusCode::BAD_REQUEST);
        assert_eq!(error.errors().len(), 1);
    }

    #[test]
    fn stock_underflow_reports_what_is_available() {
        let error = into_api_error(BooksServiceError::Stock(StockError::Insufficient {
            requested: 7,
            available: 3,
        }));

        assert_eq!(error.status(), StatusCode::BAD_REQUEST);
        assert_eq!(error.message(), "Cannot remove 7 copies, only 3 in stock");
    }
}
