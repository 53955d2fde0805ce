//! Order pricing.
//!
//! All amounts are integer minor units (cents).

use thiserror::Error;

/// Sales tax rate applied to the subtotal, in percent.
pub const TAX_RATE_PERCENT: u64 = 8;

/// Subtotal at or above which shipping is free.
pub const FREE_SHIPPING_THRESHOLD: u64 = 50_00;

/// Flat shipping fee charged below the free shipping threshold.
pub const FLAT_SHIPPING_FEE: u64 = 5_99;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum PricingError {
    #[error("price arithmetic overflowed")]
    Overflow,

    #[error("discount of {discount} exceeds order value of {value}")]
    DiscountTooLarge { discount: u64, value: u64 },
}

/// One priced line of an order.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PricedLine {
    pub unit_price: u64,
    pub quantity: u32,
}

impl PricedLine {
    /// Unit price times quantity.
    ///
    /// # Errors
    ///
    /// Returns [`PricingError::Overflow`] when the product does not fit in a `u64`.
    pub fn line_total(&self) -> Result<u64, PricingError> {
        self.unit_price
            .checked_mul(u64::from(self.quantity))
            .ok_or(PricingError::Overflow)
    }
}

/// Derived order amounts. `total == subtotal + tax + shipping - discount`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct PriceBreakdown {
    pub subtotal: u64,
    pub tax: u64,
    pub shipping: u64,
    pub discount: u64,
    pub total: u64,
}

impl PriceBreakdown {
    /// Price a set of lines.
    ///
    /// # Errors
    ///
    /// Returns an error on overflow or when `discount` exceeds the pre-discount total.
    pub fn calculate(lines: &[PricedLine], discount: u64) -> Result<Self, PricingError> {
        let subtotal = lines.iter().try_fold(0_u64, |acc, line| {
            acc.checked_add(line.line_total()?)
                .ok_or(PricingError::Overflow)
        })?;

        let tax = tax_for(subtotal)?;
        let shipping = shipping_for(subtotal);

        let value = subtotal
            .checked_add(tax)
            .and_then(|v| v.checked_add(shipping))
            .ok_or(PricingError::Overflow)?;

        let total = value
            .checked_sub(discount)
            .ok_or(PricingError::DiscountTooLarge { discount, value })?;

        Ok(Self {
            subtotal,
            tax,
            shipping,
            discount,
            total,
        })
    }

    /// Whether the stored amounts still add up.
    #[must_use]
    pub fn is_consistent(&self) -> bool {
        self.subtotal
            .checked_add(self.tax)
            .and_then(|v| v.checked_add(self.shipping))
            .and_then(|v| v.checked_sub(self.discount))
            == Some(self.total)
    }
}

/// Tax on a subtotal, rounded half up to the nearest cent.
fn tax_for(subtotal: u64) -> Result<u64, PricingError> {
    subtotal
        .checked_mul(TAX_RATE_PERCENT)
        .and_then(|v| v.checked_add(50))
        .map(|v| v / 100)
        .ok_or(PricingError::Overflow)
}

fn shipping_for(subtotal: u64) -> u64 {
    if subtotal >= FREE_SHIPPING_THRESHOLD {
        0
    } else {
        FLAT_SHIPPING_FEE
    }
}
