//! Create Book Handler

use std::sync::Arc;

use salvo::{
    http::header::LOCATION,
    oapi::{ToSchema, extract::JsonBody},
    prelude::*,
};
use serde::{Deserialize, Serialize};

use bookstore_app::domain::books::{data::NewBook, records::BookUuid};

use crate::{
    books::{
        errors::into_api_error,
        handlers::{MAX_AUTHOR_LEN, MAX_DESCRIPTION_LEN, MAX_PRICE, MAX_STOCK, MAX_TITLE_LEN},
        models::BookResponse,
    },
    errors::{ApiError, FieldError},
    extensions::*,
    state::State,
    validation::{Checks, Validate, validated},
};

/// Create Book Request
#[derive(Debug, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub(crate) struct CreateBookRequest {
    pub title: String,
    pub author: String,
    pub isbn: Option<String>,
    pub description: Option<String>,

    /// Price in cents
    pub price: u64,

    /// Copies available for sale
    pub stock: u32,
}

impl Validate for CreateBookRequest {
    fn validate(&self, errors: &mut Vec<FieldError>) {
        let mut checks = Checks::new(errors);

        checks
            .text("title", &self.title, MAX_TITLE_LEN)
            .text("author", &self.author, MAX_AUTHOR_LEN)
            .optional_text("description", self.description.as_deref(), MAX_DESCRIPTION_LEN)
            .range("price", self.price, 0, MAX_PRICE)
            .range("stock", self.stock, 0, MAX_STOCK);

        if let Some(isbn) = &self.isbn
            && !is_isbn(isbn)
        {
            checks.fail("isbn", "must be a 10 or 13 digit ISBN");
        }
    }
}

/// ISBN-10 or ISBN-13, hyphens allowed. Only ISBN-10 may end in `X`.
pub(crate) fn is_isbn(value: &str) -> bool {
    let compact: Vec<char> = value.chars().filter(|c| *c != '-').collect();

    match compact.split_last() {
        Some((last, rest)) if compact.len() == 10 => {
            rest.iter().all(char::is_ascii_digit) && (last.is_ascii_digit() || *last == 'X')
        }
        _ if compact.len() == 13 => compact.iter().all(char::is_ascii_digit),
        _ => false,
    }
}

impl From<CreateBookRequest> for NewBook {
    fn from(request: CreateBookRequest) -> Self {
        NewBook {
            uuid: BookUuid::new(),
            title: request.title.trim().to_string(),
            author: request.author.trim().to_string(),
            isbn: request.isbn,
            description: request.description,
            price: request.price,
            stock: request.stock,
        }
    }
}

/// Create Book Handler
#[endpoint(
    tags("books"),
    summary = "List a Book for Sale",
    security(("bearer_auth" = [])),
    responses(
        (status_code = StatusCode::CREATED, description = "Book created"),
        (status_code = StatusCode::BAD_REQUEST, description = "Invalid payload or duplicate ISBN"),
        (status_code = StatusCode::FORBIDDEN, description = "Only sellers and admins may list books"),
    ),
)]
#[tracing::instrument(
    name = "books.create",
    skip(json, depot, res),
    fields(user_uuid = tracing::field::Empty, book_uuid = tracing::field::Empty),
    err
)]
pub(crate) async fn handler(
    json: JsonBody<CreateBookRequest>,
    depot: &mut Depot,
    res: &mut Response,
) -> Result<Json<BookResponse>, ApiError> {
    let state = depot.obtain_or_500::<Arc<State>>()?;
    let actor = depot.principal_or_401()?;
    let request = validated(json)?;

    let book = state
        .books
        .create_book(actor, request.into())
        .await
        .map_err(into_api_error)?;

    let span = tracing::Span::current();

    span.record("user_uuid", tracing::field::display(actor.user));
    span.record("book_uuid", tracing::field::display(book.uuid));

    res.add_header(LOCATION, format!("/api/books/{}", book.uuid), true)
        .or_500("failed to set location header")?
        .status_code(StatusCode::CREATED);

    Ok(Json(BookResponse::new("Book created", book)))
}

#[cfg(test)]
mod tests {
    use salvo::test::{ResponseExt, TestClient};
    use serde_json::{Value, json};
    use testresult::TestResult;

    use bookstore_app::domain::books::{BooksServiceError, MockBooksService};

    use crate::{
        books::handlers::tests::make_book,
        test_helpers::{TEST_USER_UUID, books_service, buyer, seller},
    };

    use super::*;

    fn make_service(books: MockBooksService) -> Service {
        books_service(
            books,
            Some(seller()),
            Router::with_path("api/books").post(handler),
        )
    }

    fn payload() -> Value {
        json!({
            "title": "Programming Rust",
            "author": "Jim Blandy",
            "isbn": "978-1-4920-5259-3",
            "price": 49_99,
            "stock": 3,
        })
    }

    #[tokio::test]
    async fn test_create_book_returns_201_with_location() -> TestResult {
        let mut books = MockBooksService::new();

        books
            .expect_create_book()
            .once()
            .withf(|actor, book| {
                actor.user == TEST_USER_UUID
                    && book.title == "Programming Rust"
                    && book.isbn.as_deref() == Some("978-1-4920-5259-3")
                    && book.price == 49_99
                    && book.stock == 3
            })
            .return_once(|_, book| Ok(make_book(book.uuid)));

        let mut res = TestClient::post("http://example.com/api/books")
            .json(&payload())
            .send(&make_service(books))
            .await;

        assert_eq!(res.status_code, Some(StatusCode::CREATED));

        let location = res
            .headers()
            .get(LOCATION)
            .and_then(|value| value.to_str().ok())
            .map(str::to_owned);

        let body: BookResponse = res.take_json().await?;

        assert_eq!(body.message, "Book created");
        assert_eq!(location, Some(format!("/api/books/{}", body.book.uuid)));

        Ok(())
    }

    #[tokio::test]
    async fn test_create_book_validates_before_calling_the_service() -> TestResult {
        let mut res = TestClient::post("http://example.com/api/books")
            .json(&json!({
                "title": " ",
                "author": "Jim Blandy",
                "isbn": "12345",
                "price": 10,
                "stock": 1,
            }))
            .send(&make_service(MockBooksService::new()))
            .await;

        assert_eq!(res.status_code, Some(StatusCode::BAD_REQUEST));

        let body: Value = res.take_json().await?;
        let fields: Vec<&str> = body["errors"]
            .as_array()
            .map(|errors| errors.iter().filter_map(|e| e["field"].as_str()).collect())
            .unwrap_or_default();

        assert_eq!(fields, vec!["title", "isbn"]);

        Ok(())
    }

    #[tokio::test]
    async fn test_create_book_as_buyer_returns_403() -> TestResult {
        let mut books = MockBooksService::new();

        books
            .expect_create_book()
            .once()
            .return_once(|_, _| Err(BooksServiceError::Forbidden));

        let res = TestClient::post("http://example.com/api/books")
            .json(&payload())
            .send(&books_service(
                books,
                Some(buyer()),
                Router::with_path("api/books").post(handler),
            ))
            .await;

        assert_eq!(res.status_code, Some(StatusCode::FORBIDDEN));

        Ok(())
    }

    #[tokio::test]
    async fn test_create_book_duplicate_isbn_returns_400() -> TestResult {
        let mut books = MockBooksService::new();

        books
            .expect_create_book()
            .once()
            .return_once(|_, _| Err(BooksServiceError::AlreadyExists));

        let res = TestClient::post("http://example.com/api/books")
            .json(&payload())
            .send(&make_service(books))
            .await;

        assert_eq!(res.status_code, Some(StatusCode::BAD_REQUEST));

        Ok(())
    }

    #[tokio::test]
    async fn test_create_book_without_principal_returns_401() -> TestResult {
        let res = TestClient::post("http://example.com/api/books")
            .json(&payload())
            .send(&books_service(
                MockBooksService::new(),
                None,
                Router::with_path("api/books").post(handler),
            ))
            .await;

        assert_eq!(res.status_code, Some(StatusCode::UNAUTHORIZED));

        Ok(())
    }

    #[test]
    fn isbn_shapes() {
        assert!(is_isbn("978-1-4920-5259-3"));
        assert!(is_isbn("0-306-40615-2"));
        assert!(is_isbn("080442957X"));
        assert!(!is_isbn("97814920525X3"));
        assert!(!is_isbn("12345"));
        assert!(!is_isbn(""));
    }
}
