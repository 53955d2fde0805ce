//! Cart Errors

use bookstore_app::domain::carts::CartsServiceError;

use crate::errors::ApiError;

pub(crate) fn into_api_error(error: CartsServiceError) -> ApiError {
    match error {
        CartsServiceError::AlreadyExists => ApiError::bad_request("Book is already in the cart"),
        CartsServiceError::NotFound => ApiError::not_found("Book is not in the cart"),
        CartsServiceError::BookUnavailable { .. } => {
            ApiError::bad_request("Book is not available").with_error("bookUuid", "is not for sale")
        }
        CartsServiceError::QuantityOutOfRange { max, .. } => ApiError::bad_request(format!(
            "Quantity must be between 1 and {max}"
        ))
        .with_error("quantity", format!("must be between 1 and {max}")),
        CartsServiceError::OutOfStock {
            requested,
            available,
        } => ApiError::bad_request(format!(
            "Only {available} copies in stock, {requested} requested"
        ))
        .with_error("quantity", format!("must be at most {available}")),
        CartsServiceError::InvalidReference
        | CartsServiceError::MissingRequiredData
        | CartsServiceError::InvalidData => ApiError::bad_request("Invalid cart payload"),
        CartsServiceError::Sql(source) => ApiError::internal("carts storage error", &source),
    }
}
