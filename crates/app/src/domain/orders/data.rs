//! Order Data

use thiserror::Error;

use crate::domain::{
    Page,
    books::records::BookUuid,
    orders::records::{Address, OrderRecord, OrderStatus, OrderUuid, PaymentMethod},
};

/// Accepted length of an idempotency key.
pub const IDEMPOTENCY_KEY_LEN: std::ops::RangeInclusive<usize> = 16..=128;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("idempotency key must be 16-128 visible ASCII characters")]
pub struct InvalidIdempotencyKey;

/// Client-chosen key that makes a checkout safe to retry.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct IdempotencyKey(String);

impl IdempotencyKey {
    /// Validate a client-supplied key.
    ///
    /// # Errors
    ///
    /// Returns an error for keys outside 16-128 visible ASCII characters.
    pub fn parse(value: &str) -> Result<Self, InvalidIdempotencyKey> {
        if IDEMPOTENCY_KEY_LEN.contains(&value.len()) && value.bytes().all(|b| b.is_ascii_graphic())
        {
            Ok(Self(value.to_string()))
        } else {
            Err(InvalidIdempotencyKey)
        }
    }

    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

/// Requested copies of one book.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct NewOrderLine {
    pub book: BookUuid,
    pub quantity: u32,
}

/// New Order Data
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewOrder {
    pub uuid: OrderUuid,
    pub items: Vec<NewOrderLine>,
    pub shipping_address: Address,
    pub billing_address: Option<Address>,
    pub payment_method: PaymentMethod,
    pub idempotency_key: Option<IdempotencyKey>,
    pub clear_cart: bool,
}

/// Staff-driven status change.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StatusUpdate {
    pub status: OrderStatus,
    pub note: Option<String>,
    pub tracking_number: Option<String>,
}

/// Order listing filters.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct OrderQuery {
    pub status: Option<OrderStatus>,
    pub page: Page,
}

/// Outcome of a checkout.
#[derive(Debug, Clone, PartialEq)]
pub enum OrderPlacement {
    /// A new order was placed.
    Created(OrderRecord),

    /// The idempotency key matched an earlier order; nothing was changed.
    Replayed(OrderRecord),
}

impl OrderPlacement {
    #[must_use]
    pub fn is_replay(&self) -> bool {
        matches!(self, Self::Replayed(_))
    }

    #[must_use]
    pub fn into_order(self) -> OrderRecord {
        match self {
            Self::Created(order) | Self::Replayed(order) => order,
        }
    }
}
