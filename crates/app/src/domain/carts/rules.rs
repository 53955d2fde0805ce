//! Cart line rules.

use crate::domain::{
    books::records::{BookRecord, BookStatus},
    carts::{
        errors::CartsServiceError,
        records::{CartIssue, CartItemRecord},
    },
};

/// Most copies of one book a cart line may hold.
pub const MAX_LINE_QUANTITY: u32 = 10;

/// Reject quantities outside `1..=MAX_LINE_QUANTITY`.
///
/// # Errors
///
/// Returns [`CartsServiceError::QuantityOutOfRange`].
pub fn check_line_quantity(quantity: u32) -> Result<(), CartsServiceError> {
    if (1..=MAX_LINE_QUANTITY).contains(&quantity) {
        Ok(())
    } else {
        Err(CartsServiceError::QuantityOutOfRange {
            quantity,
            max: MAX_LINE_QUANTITY,
        })
    }
}

/// Check that `quantity` copies of `book` can sit in a cart.
///
/// Deleted or delisted books are unavailable; `OutOfStock` books fail the
/// stock check with nothing available.
///
/// # Errors
///
/// Returns `BookUnavailable`, `QuantityOutOfRange`, or `OutOfStock`.
pub fn check_book_line(book: &BookRecord, quantity: u32) -> Result<(), CartsServiceError> {
    if book.deleted_at.is_some() || book.status == BookStatus::Inactive {
        return Err(CartsServiceError::BookUnavailable { book: book.uuid });
    }

    check_line_quantity(quantity)?;

    if quantity > book.stock {
        return Err(CartsServiceError::OutOfStock {
            requested: quantity,
            available: book.stock,
        });
    }

    Ok(())
}

/// Quantity of a line after folding a guest line into a user line: the sum,
/// capped at both the line limit and current stock.
#[must_use]
pub fn merged_quantity(user: u32, session: u32, stock: u32) -> u32 {
    user.saturating_add(session)
        .min(MAX_LINE_QUANTITY)
        .min(stock)
}

/// Problems with a cart line against the book's current state.
#[must_use]
pub fn line_issues(item: &CartItemRecord, book: Option<&BookRecord>) -> Vec<CartIssue> {
    let Some(book) = book.filter(|book| book.deleted_at.is_none()) else {
        return vec![CartIssue::BookUnavailable {
            book: item.book_uuid,
        }];
    };

    if book.status == BookStatus::Inactive {
        return vec![CartIssue::BookUnavailable { book: book.uuid }];
    }

    let mut issues = Vec::new();

    if item.quantity > book.stock {
        issues.push(CartIssue::InsufficientStock {
            book: book.uuid,
            requested: item.quantity,
            available: book.stock,
        });
    }

    if item.price != book.price {
        issues.push(CartIssue::PriceChanged {
            book: book.uuid,
            cart_price: item.price,
            current_price: book.price,
        });
    }

    issues
}
