//! Books Data

use crate::domain::{
    Page,
    books::records::{BookStatus, BookUuid},
    users::records::UserUuid,
};

/// New Book Data
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewBook {
    pub uuid: BookUuid,
    pub title: String,
    pub author: String,
    pub isbn: Option<String>,
    pub description: Option<String>,
    pub price: u64,
    pub stock: u32,
}

/// Book Update Data. `None` leaves the field unchanged.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct BookUpdate {
    pub title: Option<String>,
    pub author: Option<String>,
    pub description: Option<String>,
    pub price: Option<u64>,
    pub listed: Option<bool>,
}

/// Catalog listing filters.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct BookQuery {
    pub search: Option<String>,
    pub status: Option<BookStatus>,
    pub seller: Option<UserUuid>,
    pub page: Page,
}
