//! Book Models

use salvo::oapi::ToSchema;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use bookstore_app::domain::books::records::BookRecord;

/// Book
#[derive(Debug, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub(crate) struct BookModel {
    pub uuid: Uuid,
    pub seller_uuid: Uuid,
    pub title: String,
    pub author: String,
    pub isbn: Option<String>,
    pub description: Option<String>,

    /// Price in cents
    pub price: u64,
    pub stock: u32,

    /// `active`, `inactive` or `out_of_stock`
    pub status: String,
    pub sales_count: u32,
    pub view_count: u64,
    pub average_rating: f64,
    pub review_count: u32,
    pub created_at: String,
    pub updated_at: String,
}

impl From<BookRecord> for BookModel {
    fn from(book: BookRecord) -> Self {
        Self {
            uuid: book.uuid.into(),
            seller_uuid: book.seller_uuid.into(),
            title: book.title,
            author: book.author,
            isbn: book.isbn,
            description: book.description,
            price: book.price,
            stock: book.stock,
            status: book.status.to_string(),
            sales_count: book.sales_count,
            view_count: book.view_count,
            average_rating: book.average_rating,
            review_count: book.review_count,
            created_at: book.created_at.to_string(),
            updated_at: book.updated_at.to_string(),
        }
    }
}

/// Single Book Response
#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub(crate) struct BookResponse {
    pub message: String,
    pub book: BookModel,
}

impl BookResponse {
    pub(crate) fn new(message: &str, book: BookRecord) -> Self {
        Self {
            message: message.to_string(),
            book: book.into(),
        }
    }
}
