//! Orders service errors.

use sqlx::{
    Error,
    error::{DatabaseError, ErrorKind},
};
use thiserror::Error;

use crate::domain::{
    books::records::BookUuid, orders::records::OrderStatus, pricing::PricingError,
};

#[derive(Debug, Error)]
pub enum OrdersServiceError {
    #[error("order already exists")]
    AlreadyExists,

    #[error("order not found")]
    NotFound,

    #[error("not allowed to access this order")]
    Forbidden,

    #[error("order has no items")]
    EmptyOrder,

    #[error("quantity for book {book} must be at least 1")]
    InvalidQuantity { book: BookUuid },

    #[error("book {book} is not available")]
    BookUnavailable { book: BookUuid },

    #[error("only {available} of {requested} requested copies of book {book} are in stock")]
    InsufficientStock {
        book: BookUuid,
        requested: u64,
        available: u32,
    },

    #[error("cannot move order from {from} to {to}")]
    InvalidTransition { from: OrderStatus, to: OrderStatus },

    #[error("order cannot be cancelled while {status}")]
    NotCancellable { status: OrderStatus },

    #[error(transparent)]
    Pricing(#[from] PricingError),

    #[error("related resource not found")]
    InvalidReference,

    #[error("missing required data")]
    MissingRequiredData,

    #[error("invalid data")]
    InvalidData,

    #[error("storage error")]
    Sql(#[source] Error),
}

impl From<Error> for OrdersServiceError {
    fn from(error: Error) -> Self {
        if matches!(error, Error::RowNotFound) {
            return Self::NotFound;
        }

        match error.as_database_error().map(DatabaseError::kind) {
            Some(ErrorKind::UniqueViolation) => Self::AlreadyExists,
            Some(ErrorKind::ForeignKeyViolation) => Self::InvalidReference,
            Some(ErrorKind::NotNullViolation) => Self::MissingRequiredData,
            Some(ErrorKind::CheckViolation) => Self::InvalidData,
            Some(ErrorKind::Other | _) | None => Self::Sql(error),
        }
    }
}
