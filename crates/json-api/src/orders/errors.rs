//! Order Errors

use bookstore_app::domain::orders::OrdersServiceError;

use crate::errors::ApiError;

pub(crate) fn into_api_error(error: OrdersServiceError) -> ApiError {
    match error {
        OrdersServiceError::AlreadyExists => ApiError::bad_request("Order already exists"),
        OrdersServiceError::NotFound => ApiError::not_found("Order not found"),
        OrdersServiceError::Forbidden => ApiError::forbidden("Not allowed to access this order"),
        OrdersServiceError::EmptyOrder => {
            ApiError::bad_request("Order has no items").with_error("items", "must not be empty")
        }
        OrdersServiceError::InvalidQuantity { book } => {
            ApiError::bad_request(format!("Quantity for book {book} must be at least 1"))
                .with_error("items", "quantities must be at least 1")
        }
        OrdersServiceError::BookUnavailable { book } => {
            ApiError::bad_request(format!("Book {book} is not available"))
        }
        OrdersServiceError::InsufficientStock {
            book,
            requested,
            available,
        } => ApiError::bad_request(format!(
            "Only {available} copies of book {book} in stock, {requested} requested"
        )),
        OrdersServiceError::InvalidTransition { from, to } => ApiError::bad_request(format!(
            "Cannot move order from {from} to {to}"
        ))
        .with_error("status", format!("cannot follow {from}")),
        OrdersServiceError::NotCancellable { status } => {
            ApiError::bad_request(format!("Order cannot be cancelled once {status}"))
        }
        OrdersServiceError::Pricing(source) => ApiError::bad_request(format!(
            "Order total could not be computed: {source}"
        )),
        OrdersServiceError::InvalidReference
        | OrdersServiceError::MissingRequiredData
        | OrdersServiceError::InvalidData => ApiError::bad_request("Invalid order payload"),
        OrdersServiceError::Sql(source) => ApiError::internal("orders storage error", &source),
    }
}

/// Metric label for a checkout refused by a business rule.
pub(crate) fn rejection_reason(error: &OrdersServiceError) -> Option<&'static str> {
    match error {
        OrdersServiceError::EmptyOrder => Some("empty_order"),
        OrdersServiceError::InvalidQuantity { .. } => Some("invalid_quantity"),
        OrdersServiceError::BookUnavailable { .. } => Some("book_unavailable"),
        OrdersServiceError::InsufficientStock { .. } => Some("insufficient_stock"),
        OrdersServiceError::Pricing(_) => Some("pricing"),
        _ => None,
    }
}
