//! Adjust Book Stock Handler

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
    books::{errors::into_api_error, handlers::MAX_STOCK, models::BookResponse},
    errors::{ApiError, FieldError},
    extensions::*,
    state::State,
    validation::{Checks, Validate, validated},
};

/// Adjust Stock Request
#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub(crate) struct AdjustStockRequest {
    /// Copies to add (positive) or remove (negative)
    pub delta: i64,
}

impl Validate for AdjustStockRequest {
    fn validate(&self, errors: &mut Vec<FieldError>) {
        let max = i64::from(MAX_STOCK);
        let mut checks = Checks::new(errors);

        if self.delta == 0 {
            checks.fail("delta", "must not be zero");
        } else {
            checks.range("delta", self.delta, -max, max);
        }
    }
}

/// Adjust Stock Handler
///
/// Status follows stock: reaching zero marks the book out of stock, restocking
/// puts it back on sale.
#[endpoint(
    tags("books"),
    summary = "Adjust Book Stock",
    security(("bearer_auth" = [])),
    responses(
        (status_code = StatusCode::OK, description = "Stock adjusted"),
        (status_code = StatusCode::BAD_REQUEST, description = "Stock would go below zero"),
        (status_code = StatusCode::FORBIDDEN, description = "Not the book's seller"),
    ),
)]
#[tracing::instrument(
    name = "books.adjust_stock",
    skip(book, json, depot),
    fields(book_uuid = tracing::field::Empty, delta = tracing::field::Empty),
    err
)]
pub(crate) async fn handler(
    book: PathParam<Uuid>,
    json: JsonBody<AdjustStockRequest>,
    depot: &mut Depot,
) -> Result<Json<BookResponse>, ApiError> {
    let state = depot.obtain_or_500::<Arc<State>>()?;
    let actor = depot.principal_or_401()?;
    let request = validated(json)?;
    let book = book.into_inner();

    let span = tracing::Span::current();

    span.record("book_uuid", tracing::field::display(book));
    span.record("delta", request.delta);

    let book = state
        .books
        .adjust_stock(actor, book.into(), request.delta)
        .await
        .map_err(into_api_error)?;

    Ok(Json(BookResponse::new("Stock updated", book)))
}

#[cfg(test)]
mod tests {
    use salvo::test::{ResponseExt, TestClient};
    use serde_json::json;
    use testresult::TestResult;

    use bookstore_app::domain::{
        books::{
            BooksServiceError, MockBooksService,
            records::{BookStatus, BookUuid},
        },
        stock::StockError,
    };

    use crate::{
        books::handlers::tests::make_book,
        test_helpers::{books_service, seller},
    };

    use super::*;

    fn make_service(books: MockBooksService) -> Service {
        books_service(
            books,
            Some(seller()),
            Router::with_path("api/books/{book}/stock").put(handler),
        )
    }

    #[tokio::test]
    async fn test_selling_out_marks_the_book_out_of_stock() -> TestResult {
        let uuid = BookUuid::new();
        let mut books = MockBooksService::new();

        books
            .expect_adjust_stock()
            .once()
            .withf(move |_, book, delta| *book == uuid && *delta == -5)
            .return_once(move |_, _, _| {
                let mut book = make_book(uuid);

                book.stock = 0;
                book.status = BookStatus::OutOfStock;

                Ok(book)
            });

        let mut res = TestClient::put(format!("http://example.com/api/books/{uuid}/stock"))
            .json(&json!({ "delta": -5 }))
            .send(&make_service(books))
            .await;

        assert_eq!(res.status_code, Some(StatusCode::OK));

        let body: BookResponse = res.take_json().await?;

        assert_eq!(body.book.stock, 0);
        assert_eq!(body.book.status, "out_of_stock");

        Ok(())
    }

    #[tokio::test]
    async fn test_removing_more_than_in_stock_returns_400() -> TestResult {
        let mut books = MockBooksService::new();

        books.expect_adjust_stock().once().return_once(|_, _, _| {
            Err(BooksServiceError::Stock(StockError::Insufficient {
                requested: 6,
                available: 5,
            }))
        });

        let res = TestClient::put(format!("http://example.com/api/books/{}/stock", Uuid::now_v7()))
            .json(&json!({ "delta": -6 }))
            .send(&make_service(books))
            .await;

        assert_eq!(res.status_code, Some(StatusCode::BAD_REQUEST));

        Ok(())
    }

    #[tokio::test]
    async fn test_zero_delta_is_rejected() -> TestResult {
        let res = TestClient::put(format!("http://example.com/api/books/{}/stock", Uuid::now_v7()))
            .json(&json!({ "delta": 0 }))
            .send(&make_service(MockBooksService::new()))
            .await;

        assert_eq!(res.status_code, Some(StatusCode::BAD_REQUEST));

        Ok(())
    }
}
