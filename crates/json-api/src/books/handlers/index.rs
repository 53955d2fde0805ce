//! List Books Handler

use std::sync::Arc;

use salvo::{
    oapi::{ToSchema, extract::QueryParam},
    prelude::*,
};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use bookstore_app::domain::{
    Page,
    books::{data::BookQuery, records::BookStatus},
};

use crate::{
    books::{errors::into_api_error, models::BookModel},
    errors::ApiError,
    extensions::*,
    state::State,
};

/// Book Listing Response
#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub(crate) struct BooksResponse {
    pub message: String,
    pub books: Vec<BookModel>,
    pub limit: u32,
    pub offset: u32,
}

/// List Books Handler
///
/// Newest first. `search` matches title or author, case-insensitively.
#[endpoint(tags("books"), summary = "List Books")]
pub(crate) async fn handler(
    search: QueryParam<String, false>,
    status: QueryParam<String, false>,
    seller: QueryParam<Uuid, false>,
    limit: QueryParam<u32, false>,
    offset: QueryParam<u32, false>,
    depot: &mut Depot,
) -> Result<Json<BooksResponse>, ApiError> {
    let state = depot.obtain_or_500::<Arc<State>>()?;

    let status = status
        .into_inner()
        .map(|status| status.parse::<BookStatus>())
        .transpose()
        .map_err(|error| {
            ApiError::bad_request("Invalid query").with_error("status", error.to_string())
        })?;

    let query = BookQuery {
        search: search.into_inner().filter(|search| !search.trim().is_empty()),
        status,
        seller: seller.into_inner().map(Into::into),
        page: Page::new(limit.into_inner(), offset.into_inner()),
    };

    let page = query.page;

    let books = state
        .books
        .list_books(query)
        .await
        .map_err(into_api_error)?;

    Ok(Json(BooksResponse {
        message: "Books retrieved".to_string(),
        books: books.into_iter().map(BookModel::from).collect(),
        limit: page.limit,
        offset: page.offset,
    }))
}
