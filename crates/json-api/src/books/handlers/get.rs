//! Get Book Handler

use std::sync::Arc;

use salvo::{oapi::extract::PathParam, prelude::*};
use uuid::Uuid;

use crate::{
    books::{errors::into_api_error, models::BookResponse},
    errors::ApiError,
    extensions::*,
    state::State,
};

/// Get Book Handler
///
/// Counts as a view of the book.
#[endpoint(tags("books"), summary = "Get Book")]
pub(crate) async fn handler(
    book: PathParam<Uuid>,
    depot: &mut Depot,
) -> Result<Json<BookResponse>, ApiError> {
    let state = depot.obtain_or_500::<Arc<State>>()?;

    let book = state
        .books
        .get_book(book.into_inner().into())
        .await
        .map_err(into_api_error)?;

    Ok(Json(BookResponse::new("Book retrieved", book)))
}

#[cfg(test)]
mod tests {
    use salvo::test::{ResponseExt, TestClient};
    use testresult::TestResult;

    use bookstore_app::domain::books::{BooksServiceError, MockBooksService, records::BookUuid};

    use crate::{books::handlers::tests::make_book, test_helpers::books_service};

    use super::*;

    fn make_service(books: MockBooksService) -> Service {
        books_service(books, None, Router::with_path("api/books/{book}").get(handler))
    }

    #[tokio::test]
    async fn test_get_book_returns_200() -> TestResult {
        let uuid = BookUuid::new();
        let mut books = MockBooksService::new();

        books
            .expect_get_book()
            .once()
            .withf(move |book| *book == uuid)
            .return_once(move |_| Ok(make_book(uuid)));

        let mut res = TestClient::get(format!("http://example.com/api/books/{uuid}"))
            .send(&make_service(books))
            .await;

        assert_eq!(res.status_code, Some(StatusCode::OK));

        let body: BookResponse = res.take_json().await?;

        assert_eq!(body.book.uuid, uuid.into_uuid());
        assert_eq!(body.book.status, "active");
        assert_eq!(body.book.price, 39_99);

        Ok(())
    }

    #[tokio::test]
    async fn test_get_missing_book_returns_404() -> TestResult {
        let mut books = MockBooksService::new();

        books
            .expect_get_book()
            .once()
            .return_once(|_| Err(BooksServiceError::NotFound));

        let res = TestClient::get(format!("http://example.com/api/books/{}", Uuid::now_v7()))
            .send(&make_service(books))
            .await;

        assert_eq!(res.status_code, Some(StatusCode::NOT_FOUND));

        Ok(())
    }

    #[tokio::test]
    async fn test_get_book_with_malformed_uuid_returns_400() -> TestResult {
        let res = TestClient::get("http://example.com/api/books/not-a-uuid")
            .send(&make_service(MockBooksService::new()))
            .await;

        assert_eq!(res.status_code, Some(StatusCode::BAD_REQUEST));

        Ok(())
    }
}
