//! Pure stock arithmetic.

use thiserror::Error;

use crate::domain::books::records::BookStatus;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum StockError {
    #[error("insufficient stock: requested {requested}, available {available}")]
    Insufficient { requested: u64, available: u32 },

    #[error("sales count cannot go below zero")]
    SalesUnderflow,

    #[error("stock arithmetic overflowed")]
    Overflow,
}

/// Signed change to a book's stock and sales counters.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StockChange {
    pub stock: i64,
    pub sales: i64,
}

impl StockChange {
    /// A checkout: stock goes down, sales go up.
    #[must_use]
    pub fn sale(quantity: u32) -> Self {
        Self {
            stock: -i64::from(quantity),
            sales: i64::from(quantity),
        }
    }

    /// A cancelled order: the sale is undone.
    #[must_use]
    pub fn return_to_stock(quantity: u32) -> Self {
        Self {
            stock: i64::from(quantity),
            sales: -i64::from(quantity),
        }
    }

    /// A manual adjustment by the seller. Sales are untouched.
    #[must_use]
    pub const fn manual(delta: i64) -> Self {
        Self {
            stock: delta,
            sales: 0,
        }
    }
}

/// The stock-related columns of a book.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StockLevel {
    pub stock: u32,
    pub sales_count: u32,
    pub status: BookStatus,
    /// Soft-deleted books never become `Active` again.
    pub deleted: bool,
}

impl StockLevel {
    /// Apply a change, recomputing status.
    ///
    /// Stock reaching zero forces `OutOfStock`; stock returning from zero
    /// reactivates the book unless it was deleted, in which case it reads
    /// `Inactive`. `Inactive` books with stock stay `Inactive`.
    ///
    /// # Errors
    ///
    /// Returns an error when stock or sales would go negative, or on overflow.
    pub fn apply(self, change: StockChange) -> Result<Self, StockError> {
        let stock = i64::from(self.stock)
            .checked_add(change.stock)
            .ok_or(StockError::Overflow)?;

        if stock < 0 {
            return Err(StockError::Insufficient {
                requested: change.stock.unsigned_abs(),
                available: self.stock,
            });
        }

        let sales = i64::from(self.sales_count)
            .checked_add(change.sales)
            .ok_or(StockError::Overflow)?;

        if sales < 0 {
            return Err(StockError::SalesUnderflow);
        }

        let stock = u32::try_from(stock).map_err(|_| StockError::Overflow)?;
        let sales_count = u32::try_from(sales).map_err(|_| StockError::Overflow)?;

        let status = match (stock, self.status) {
            (0, _) => BookStatus::OutOfStock,
            (_, BookStatus::OutOfStock) if self.deleted => BookStatus::Inactive,
            (_, BookStatus::OutOfStock) => BookStatus::Active,
            (_, status) => status,
        };

        Ok(Self {
            stock,
            sales_count,
            status,
            deleted: self.deleted,
        })
    }

    /// Status after a seller lists or delists the book. Zero stock always
    /// reads as `OutOfStock`.
    #[must_use]
    pub const fn listing(self, listed: bool) -> BookStatus {
        match (self.stock, listed) {
            (0, _) => BookStatus::OutOfStock,
            (_, true) => BookStatus::Active,
            (_, false) => BookStatus::Inactive,
        }
    }

    /// Initial status for a newly listed book.
    #[must_use]
    pub const fn initial_status(stock: u32) -> BookStatus {
        if stock == 0 {
            BookStatus::OutOfStock
        } else {
            BookStatus::Active
        }
    }
}
