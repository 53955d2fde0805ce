//! Book Records

use std::{fmt, str::FromStr};

use jiff::Timestamp;

use crate::{
    domain::{UnknownVariant, users::records::UserUuid},
    uuids::TypedUuid,
};

/// Book UUID
pub type BookUuid = TypedUuid<BookRecord>;

/// Whether a book can be bought.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum BookStatus {
    Active,
    Inactive,
    OutOfStock,
}

impl BookStatus {
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Active => "active",
            Self::Inactive => "inactive",
            Self::OutOfStock => "out_of_stock",
        }
    }
}

impl fmt::Display for BookStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for BookStatus {
    type Err = UnknownVariant;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "active" => Ok(Self::Active),
            "inactive" => Ok(Self::Inactive),
            "out_of_stock" => Ok(Self::OutOfStock),
            other => Err(UnknownVariant::new("book status", other)),
        }
    }
}

/// Book Record
#[derive(Debug, Clone, PartialEq)]
pub struct BookRecord {
    pub uuid: BookUuid,
    pub seller_uuid: UserUuid,
    pub title: String,
    pub author: String,
    pub isbn: Option<String>,
    pub description: Option<String>,
    pub price: u64,
    pub stock: u32,
    pub status: BookStatus,
    pub sales_count: u32,
    pub view_count: u64,
    pub average_rating: f64,
    pub review_count: u32,
    pub created_at: Timestamp,
    pub updated_at: Timestamp,
    pub deleted_at: Option<Timestamp>,
}

impl BookRecord {
    /// Not deleted and currently `Active`.
    #[must_use]
    pub fn is_purchasable(&self) -> bool {
        self.deleted_at.is_none() && self.status == BookStatus::Active
    }
}
